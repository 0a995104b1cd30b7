use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Method-level error types (RFC 8620 §3.6.2 and RFC 8621)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MethodErrorType {
    ServerUnavailable,
    ServerFail,
    ServerPartialFail,
    UnknownMethod,
    InvalidArguments,
    InvalidResultReference,
    Forbidden,
    AccountNotFound,
    AccountNotSupportedByMethod,
    AccountReadOnly,
    RequestTooLarge,
    StateMismatch,
    CannotCalculateChanges,
    AnchorNotFound,
    UnsupportedSort,
    UnsupportedFilter,
    TooManyChanges,
    FromAccountNotFound,
    FromAccountNotSupportedByMethod,
    NotFound,
    /// Any type this client does not know, kept verbatim
    Other(String),
}

impl MethodErrorType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ServerUnavailable => "serverUnavailable",
            Self::ServerFail => "serverFail",
            Self::ServerPartialFail => "serverPartialFail",
            Self::UnknownMethod => "unknownMethod",
            Self::InvalidArguments => "invalidArguments",
            Self::InvalidResultReference => "invalidResultReference",
            Self::Forbidden => "forbidden",
            Self::AccountNotFound => "accountNotFound",
            Self::AccountNotSupportedByMethod => "accountNotSupportedByMethod",
            Self::AccountReadOnly => "accountReadOnly",
            Self::RequestTooLarge => "requestTooLarge",
            Self::StateMismatch => "stateMismatch",
            Self::CannotCalculateChanges => "cannotCalculateChanges",
            Self::AnchorNotFound => "anchorNotFound",
            Self::UnsupportedSort => "unsupportedSort",
            Self::UnsupportedFilter => "unsupportedFilter",
            Self::TooManyChanges => "tooManyChanges",
            Self::FromAccountNotFound => "fromAccountNotFound",
            Self::FromAccountNotSupportedByMethod => "fromAccountNotSupportedByMethod",
            Self::NotFound => "notFound",
            Self::Other(other) => other,
        }
    }

    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServerUnavailable)
    }
}

impl From<String> for MethodErrorType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "serverUnavailable" => Self::ServerUnavailable,
            "serverFail" => Self::ServerFail,
            "serverPartialFail" => Self::ServerPartialFail,
            "unknownMethod" => Self::UnknownMethod,
            "invalidArguments" => Self::InvalidArguments,
            "invalidResultReference" => Self::InvalidResultReference,
            "forbidden" => Self::Forbidden,
            "accountNotFound" => Self::AccountNotFound,
            "accountNotSupportedByMethod" => Self::AccountNotSupportedByMethod,
            "accountReadOnly" => Self::AccountReadOnly,
            "requestTooLarge" => Self::RequestTooLarge,
            "stateMismatch" => Self::StateMismatch,
            "cannotCalculateChanges" => Self::CannotCalculateChanges,
            "anchorNotFound" => Self::AnchorNotFound,
            "unsupportedSort" => Self::UnsupportedSort,
            "unsupportedFilter" => Self::UnsupportedFilter,
            "tooManyChanges" => Self::TooManyChanges,
            "fromAccountNotFound" => Self::FromAccountNotFound,
            "fromAccountNotSupportedByMethod" => Self::FromAccountNotSupportedByMethod,
            "notFound" => Self::NotFound,
            _ => Self::Other(value),
        }
    }
}

impl From<MethodErrorType> for String {
    fn from(value: MethodErrorType) -> Self {
        match value {
            MethodErrorType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MethodErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error result of exactly one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    #[serde(rename = "type")]
    pub error_type: MethodErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extra properties some error types carry, e.g. `arguments`
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl MethodError {
    pub fn new(error_type: MethodErrorType) -> Self {
        Self {
            error_type,
            description: None,
            details: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.error_type, description),
            None => write!(f, "{}", self.error_type),
        }
    }
}

impl std::error::Error for MethodError {}
