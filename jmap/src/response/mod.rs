//! Response side of an exchange
//!
//! - `ResultEntry`: one `[name, arguments, call id]` triple of the response
//! - `MethodError`: per-invocation error result (`["error", {...}, id]`)
//! - `Correlator`: matches entries to the invocations of the sent batch

pub mod correlator;
pub mod method_error;
pub mod pointer;

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CallId, Result};

pub use correlator::{
    CallReport, CorrelationReport, CorrelationState, Correlator, CreationIdMap, Decoded, Outcome,
};
pub use method_error::{MethodError, MethodErrorType};
pub use pointer::PointerError;

/// Method name the server uses for error results
pub const ERROR_METHOD: &str = "error";

/// Wire envelope of a JMAP response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub method_responses: Vec<ResultEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
}

impl Response {
    pub fn new(method_responses: Vec<ResultEntry>) -> Self {
        Self {
            method_responses,
            created_ids: None,
            session_state: None,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One result of the response batch
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub name: String,
    pub arguments: Value,
    pub id: CallId,
}

impl ResultEntry {
    pub fn new(name: impl Into<String>, arguments: Value, id: impl Into<CallId>) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: id.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.name == ERROR_METHOD
    }
}

impl Serialize for ResultEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.name, &self.arguments, &self.id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResultEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (name, arguments, id) = <(String, Value, CallId)>::deserialize(deserializer)?;
        Ok(Self {
            name,
            arguments,
            id,
        })
    }
}
