//! HTTP transport using reqwest
//!
//! POSTs the batch to the JMAP API URL. Request-level rejections come back
//! as RFC 7807 problem documents (`urn:ietf:params:jmap:error:*`) and are
//! surfaced as `JmapError::RequestRejected`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{AuthConfig, ClientConfig};
use crate::transport::Transport;
use crate::types::{JmapError, Result};

/// Immutable HTTP connection to one JMAP API endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
}

// -- Problem details (RFC 7807) --

#[derive(Debug, Deserialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: String,
    status: Option<u16>,
    detail: Option<String>,
    limit: Option<String>,
}

impl HttpTransport {
    /// Build from client configuration, resolving credentials once
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(auth) = &config.auth {
            let value = HeaderValue::from_str(&Self::build_auth_header(auth)?)
                .map_err(|e| JmapError::Config(format!("Invalid authorization header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers);

        if !config.tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| JmapError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build the Authorization header value
    fn build_auth_header(auth: &AuthConfig) -> Result<String> {
        match auth {
            AuthConfig::Basic { user, password } => {
                let passwd = password.resolve()?;
                let credentials = format!("{}:{}", user, passwd);
                let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                Ok(format!("Basic {}", encoded))
            }
            AuthConfig::Bearer { token } => Ok(format!("Bearer {}", token.resolve()?)),
        }
    }
}

/// Map a non-success HTTP response to an error
pub(crate) fn rejection(status: u16, body: &str) -> JmapError {
    match serde_json::from_str::<ProblemDetails>(body) {
        Ok(problem) => {
            let mut message = problem.problem_type;
            if let Some(detail) = problem.detail {
                message = format!("{} ({})", message, detail);
            }
            if let Some(limit) = problem.limit {
                message = format!("{} [limit: {}]", message, limit);
            }
            JmapError::RequestRejected {
                status: problem.status.unwrap_or(status),
                problem: message,
            }
        }
        Err(_) => JmapError::Transport(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        debug!("POST {} ({} bytes)", self.api_url, body.len());

        let response = self
            .client
            .post(&self.api_url)
            .body(body)
            .send()
            .await
            .map_err(|e| JmapError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("JMAP request rejected: HTTP {}", status);
            return Err(rejection(status.as_u16(), &text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| JmapError::Transport(format!("reading response failed: {}", e)))?;

        info!("JMAP response received: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
