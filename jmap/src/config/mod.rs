use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::types::error::JmapError;
use crate::types::CORE_CAPABILITY;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JMAP API URL requests are POSTed to
    pub url: String,

    /// Authentication method (none when absent)
    pub auth: Option<AuthConfig>,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Capabilities declared in every request
    #[serde(default = "default_using")]
    pub using: Vec<String>,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub tls: bool,
}

/// Authentication configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    /// HTTP Basic authentication
    Basic {
        /// Username (usually email address)
        user: String,
        /// Password (can use command for keychain integration)
        password: PasswordSource,
    },
    /// Bearer token, e.g. an app-specific API token
    Bearer { token: PasswordSource },
}

/// Password source - can be raw value or command to execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PasswordSource {
    /// Raw password value
    Raw(String),
    /// Command to execute to get password
    Command { command: String },
}

impl PasswordSource {
    /// Resolve the secret, running the command if needed
    pub fn resolve(&self) -> Result<String, JmapError> {
        match self {
            PasswordSource::Raw(password) => Ok(password.clone()),
            PasswordSource::Command { command } => {
                info!("Executing password command");
                let output = Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .output()
                    .map_err(|e| {
                        JmapError::Config(format!("Failed to run password command: {}", e))
                    })?;

                if !output.status.success() {
                    return Err(JmapError::Config("Password command failed".to_string()));
                }

                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_using() -> Vec<String> {
    vec![CORE_CAPABILITY.to_string()]
}

fn default_true() -> bool {
    true
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
            timeout_secs: default_timeout(),
            using: default_using(),
            tls: default_true(),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, JmapError> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| JmapError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the API URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), JmapError> {
        let url = url::Url::parse(&self.url)
            .map_err(|e| JmapError::Config(format!("Invalid url '{}': {}", self.url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(JmapError::Config(format!(
                "Unsupported url scheme '{}'",
                scheme
            ))),
        }
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // XDG config path
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("jmap").join("config.toml"));
    }

    // Home directory fallback
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".config").join("jmap").join("config.toml"));
    }

    paths
}

/// Load configuration from the first default path that exists
pub fn load_config() -> Result<ClientConfig, JmapError> {
    info!("Loading configuration from default paths");

    for path in default_config_paths() {
        if path.exists() {
            info!("Found config at: {:?}", path);
            return load_config_from_path(&path);
        }
    }

    Err(JmapError::Config("No config file found".to_string()))
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<ClientConfig, JmapError> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| JmapError::Config(format!("Failed to read config: {}", e)))?;

    ClientConfig::from_toml_str(&content)
}
