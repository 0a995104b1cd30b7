//! Unified error types for the engine
//!
//! This module defines error types that:
//! - Separate whole-batch failures (`JmapError`) from per-call
//!   correlation failures (`CorrelationError`)
//! - Are serializable so callers can forward them as-is
//! - Carry the call id whenever one is known

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CallId;

/// Error type for batch construction, transport and whole-batch failures
///
/// Construction-time variants are raised synchronously by the request
/// builder and never reach the wire. Transport-time variants mean the
/// outcome of every invocation in the batch is unknown.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum JmapError {
    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    #[error("Cannot build an empty batch")]
    EmptyBatch,

    #[error("Duplicate call id: {0}")]
    DuplicateCallId(CallId),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected by server ({status}): {problem}")]
    RequestRejected { status: u16, problem: String },

    #[error("Response contains no method results")]
    EmptyResponse,

    #[error("No successful result for call id {0}")]
    NoResult(CallId),

    #[error("Path '{path}' does not resolve: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for JmapError {
    fn from(err: std::io::Error) -> Self {
        JmapError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for JmapError {
    fn from(err: toml::de::Error) -> Self {
        JmapError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for JmapError {
    fn from(err: serde_json::Error) -> Self {
        JmapError::Parse(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for JmapError {
    fn from(err: reqwest::Error) -> Self {
        JmapError::Transport(err.to_string())
    }
}

/// Protocol-level error attached to one call id of a correlated exchange
///
/// These are collected into the correlation report, never raised: the
/// remaining invocations of the batch are still resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CorrelationError {
    /// The server answered a call id the client never sent
    #[error("Response references unknown call id {id} ({name})")]
    UnknownCallId { id: CallId, name: String },

    /// The server sent no result for this invocation
    #[error("No result for call id {id}")]
    MissingResult { id: CallId },

    /// Two successful creations in the batch claimed the same creation id
    #[error("Creation id '{creation_id}' of call {id} was already created by call {first}")]
    DuplicateCreationId {
        id: CallId,
        creation_id: String,
        first: CallId,
    },

    /// The payload did not match the shape registered for the method
    #[error("Could not decode result of call {id} ({name}): {message}")]
    Decode {
        id: CallId,
        name: String,
        message: String,
    },
}

impl CorrelationError {
    /// Call id this error is attached to
    pub fn call_id(&self) -> &CallId {
        match self {
            Self::UnknownCallId { id, .. } => id,
            Self::MissingResult { id } => id,
            Self::DuplicateCreationId { id, .. } => id,
            Self::Decode { id, .. } => id,
        }
    }
}

/// Result type alias using JmapError
pub type Result<T> = std::result::Result<T, JmapError>;
