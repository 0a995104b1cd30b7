//! Back-references between invocations of one batch
//!
//! - `ResultReference`: "the value at `path` in the result of call `result_of`",
//!   substituted by the server before the referencing call runs.
//! - `CreationIdReference`: "the id the server assigns to the object created
//!   under this creation id", written on the wire as `#<creation id>`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CallId;

/// Wire prefix marking both referenced argument names and creation ids
pub const REFERENCE_PREFIX: char = '#';

/// Reference to a value inside the result of an earlier invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReference {
    /// Call id of the source invocation
    pub result_of: CallId,
    /// Method name of the source invocation
    pub name: String,
    /// JSON pointer into the source result, `*` matching every array item
    pub path: String,
}

impl ResultReference {
    pub fn new(
        result_of: impl Into<CallId>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            result_of: result_of.into(),
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Reference to an object created earlier in the same batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreationIdReference {
    creation_id: String,
}

impl CreationIdReference {
    pub fn new(creation_id: impl Into<String>) -> Self {
        Self {
            creation_id: creation_id.into(),
        }
    }

    /// Parse the wire form `#<creation id>`
    pub fn parse(value: &str) -> Option<Self> {
        value
            .strip_prefix(REFERENCE_PREFIX)
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }

    pub fn creation_id(&self) -> &str {
        &self.creation_id
    }

    /// Wire form, usable anywhere an id is expected
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CreationIdReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", REFERENCE_PREFIX, self.creation_id)
    }
}

impl Serialize for CreationIdReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CreationIdReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("'{}' is not a creation id reference", value))
        })
    }
}
