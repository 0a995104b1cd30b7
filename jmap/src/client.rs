//! JMAP client
//!
//! Wires one exchange together: a fresh request builder per batch, the
//! transport for the round trip, and the correlator for the response.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::request::{RequestBuilder, SerializedBatch};
use crate::response::{CorrelationReport, Correlator, Response};
use crate::transport::Transport;
use crate::types::{Result, CORE_CAPABILITY};

#[cfg(feature = "http")]
use crate::config::ClientConfig;
#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Client for one JMAP API endpoint
///
/// Holds no per-exchange state: every batch gets its own builder and call
/// id allocator, so the client can be shared across tasks.
pub struct JmapClient<T: Transport> {
    transport: T,
    catalog: Arc<Catalog>,
    using: Vec<String>,
}

impl<T: Transport> JmapClient<T> {
    /// Client with the standard catalog, declaring only the core capability
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            catalog: Arc::new(Catalog::standard()),
            using: vec![CORE_CAPABILITY.to_string()],
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_capabilities<I, S>(mut self, using: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.using = using.into_iter().map(Into::into).collect();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Start a new batch, checked against this client's catalog
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new()
            .with_capabilities(self.using.iter().cloned())
            .with_catalog(self.catalog.clone())
    }

    /// Send a built batch and correlate the response
    ///
    /// Transport failures and responses without any result fail the whole
    /// batch; everything else is reported per call.
    pub async fn send(&self, batch: &SerializedBatch) -> Result<CorrelationReport> {
        info!("Sending JMAP batch of {} invocations", batch.len());

        let bytes = self.transport.send(batch.to_bytes().to_vec()).await?;
        let response = Response::from_slice(&bytes)?;
        debug!(
            "Received {} results (session state {:?})",
            response.method_responses.len(),
            response.session_state
        );

        Correlator::new(batch, &self.catalog).correlate(response)
    }

    /// Build and send in one step
    pub async fn execute(&self, builder: RequestBuilder) -> Result<CorrelationReport> {
        let batch = builder.build()?;
        self.send(&batch).await
    }
}

#[cfg(feature = "http")]
impl JmapClient<HttpTransport> {
    /// Client over HTTP, configured from a `ClientConfig`
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(transport).with_capabilities(config.using.iter().cloned()))
    }
}
