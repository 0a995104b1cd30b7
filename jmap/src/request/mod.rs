//! Request side of an exchange
//!
//! Invocations are pure data: a method name, its arguments and a call id.
//! Arguments may embed back-references, which are encoded the JMAP way:
//! a result reference under argument `ids` travels as
//! `"#ids": {"resultOf": .., "name": .., "path": ..}`.

pub mod builder;
pub mod call_id;
pub mod reference;

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CallId, JmapError, Result};

pub use builder::{RequestBuilder, SerializedBatch};
pub use call_id::CallIdAllocator;
pub use reference::{CreationIdReference, ResultReference, REFERENCE_PREFIX};

/// One argument value: a literal or a reference
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Value),
    ResultOf(ResultReference),
    CreationId(CreationIdReference),
}

impl Argument {
    pub fn as_reference(&self) -> Option<&ResultReference> {
        match self {
            Self::ResultOf(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<ResultReference> for Argument {
    fn from(reference: ResultReference) -> Self {
        Self::ResultOf(reference)
    }
}

impl From<CreationIdReference> for Argument {
    fn from(reference: CreationIdReference) -> Self {
        Self::CreationId(reference)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

/// Arguments of one invocation, keyed by argument name
///
/// Keys are kept sorted so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(BTreeMap<String, Argument>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument. A literal under a `#name` key that reads as a
    /// result reference is stored as that reference under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Argument>) -> &mut Self {
        let name = name.into();
        let value = value.into();

        if let (Some(stripped), Argument::Value(literal)) =
            (name.strip_prefix(REFERENCE_PREFIX), &value)
        {
            if let Ok(reference) = ResultReference::deserialize(literal) {
                self.0.insert(stripped.to_string(), Argument::ResultOf(reference));
                return self;
            }
        }

        self.0.insert(name, value);
        self
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert any serializable literal
    pub fn with_value<V: Serialize>(self, name: impl Into<String>, value: V) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.with(name, Argument::Value(value)))
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.0.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    /// Every result reference embedded in these arguments
    pub fn references(&self) -> impl Iterator<Item = (&str, &ResultReference)> {
        self.iter()
            .filter_map(|(name, arg)| arg.as_reference().map(|r| (name, r)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the wire form of an arguments object
    pub fn from_wire(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut arguments = Self::new();
                for (name, value) in map {
                    if let Some(stripped) = name.strip_prefix(REFERENCE_PREFIX) {
                        let reference: ResultReference = serde_json::from_value(value)?;
                        arguments.insert(stripped, reference);
                        continue;
                    }

                    // "#x" strings stay literal: on the wire a creation id
                    // reference cannot be told apart from plain text
                    arguments.insert(name, value);
                }
                Ok(arguments)
            }
            other => Err(JmapError::Parse(format!(
                "Arguments must be a JSON object, got {}",
                other
            ))),
        }
    }
}

impl Serialize for Arguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, arg) in &self.0 {
            match arg {
                Argument::Value(value) => map.serialize_entry(name, value)?,
                Argument::ResultOf(reference) => {
                    map.serialize_entry(&format!("{}{}", REFERENCE_PREFIX, name), reference)?
                }
                Argument::CreationId(reference) => map.serialize_entry(name, reference)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Arguments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Arguments::from_wire(value).map_err(de::Error::custom)
    }
}

/// One named method call within a batch
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub name: String,
    pub arguments: Arguments,
    pub id: CallId,
}

impl Invocation {
    pub fn new(name: impl Into<String>, arguments: Arguments, id: CallId) -> Self {
        Self {
            name: name.into(),
            arguments,
            id,
        }
    }

    /// Decode the wire triple `[name, arguments, id]`
    pub fn from_wire(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

impl Serialize for Invocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.name, &self.arguments, &self.id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Invocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (name, arguments, id) = <(String, Arguments, CallId)>::deserialize(deserializer)?;
        Ok(Self {
            name,
            arguments,
            id,
        })
    }
}
