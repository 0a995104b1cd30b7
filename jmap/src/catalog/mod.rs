//! Method call catalog
//!
//! A lookup table from method name to its shape: which arguments it takes,
//! which of them may carry a result reference, and how to decode its
//! successful result. The correlator treats it as a pure function table.
//!
//! Typed requests for the standard methods (`/get`, `/set`, `/query`,
//! `/changes`, `/queryChanges`) are generic over [`Entity`], so adding an
//! entity type is one trait impl plus [`Catalog::register`].

pub mod changes;
pub mod get;
pub mod query;
pub mod set;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::request::Arguments;
use crate::types::{Contact, Mailbox, Result};

pub use changes::{ChangesRequest, ChangesResponse, QueryChangesRequest, QueryChangesResponse};
pub use get::{GetRequest, GetResponse};
pub use query::{Comparator, QueryRequest, QueryResponse};
pub use set::{SetError, SetRequest, SetResponse};

/// A JMAP data type the standard methods operate on
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Type name used as method prefix, e.g. "Contact"
    const NAME: &'static str;

    /// Filter condition accepted by `/query` and `/queryChanges`
    type Filter: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// A typed method call that can be added to a request builder
pub trait Method {
    /// Decoded shape of a successful result
    type Response: DeserializeOwned + Send + Sync + 'static;

    fn name(&self) -> String;

    fn into_arguments(self) -> Result<Arguments>;
}

/// Standard method families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Get,
    Set,
    Query,
    Changes,
    QueryChanges,
    Copy,
    Echo,
    Other,
}

impl MethodKind {
    /// Infer the family from a method name suffix, e.g. "Email/set"
    pub fn from_method_name(name: &str) -> Self {
        match name.rsplit_once('/').map(|(_, verb)| verb) {
            Some("get") => Self::Get,
            Some("set") => Self::Set,
            Some("query") => Self::Query,
            Some("changes") => Self::Changes,
            Some("queryChanges") => Self::QueryChanges,
            Some("copy") => Self::Copy,
            Some("echo") => Self::Echo,
            _ => Self::Other,
        }
    }

    /// Whether successful results carry a `created` map of creation ids
    pub fn creates_objects(&self) -> bool {
        matches!(self, Self::Set | Self::Copy)
    }
}

/// Descriptor of one argument of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentField {
    pub name: &'static str,
    pub required: bool,
    /// Whether a result reference may stand in for the value
    pub referable: bool,
}

impl ArgumentField {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            referable: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            referable: false,
        }
    }

    pub const fn referable(mut self) -> Self {
        self.referable = true;
        self
    }
}

type Decoder = fn(&Value) -> std::result::Result<Box<dyn Any + Send + Sync>, serde_json::Error>;

fn decode_as<R>(
    payload: &Value,
) -> std::result::Result<Box<dyn Any + Send + Sync>, serde_json::Error>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    Ok(Box::new(R::deserialize(payload)?))
}

/// Shape of one method: argument descriptors plus result decoder
#[derive(Clone)]
pub struct MethodShape {
    pub name: String,
    pub kind: MethodKind,
    pub fields: Vec<ArgumentField>,
    decoder: Decoder,
}

impl fmt::Debug for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodShape")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .finish()
    }
}

impl MethodShape {
    pub fn new<R>(name: impl Into<String>, kind: MethodKind, fields: Vec<ArgumentField>) -> Self
    where
        R: DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            fields,
            decoder: decode_as::<R>,
        }
    }

    pub fn field(&self, name: &str) -> Option<&ArgumentField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn decode(
        &self,
        payload: &Value,
    ) -> std::result::Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
        (self.decoder)(payload)
    }

    /// Check arguments against this shape: required fields present,
    /// references only where substitution is allowed
    pub fn check(&self, arguments: &Arguments) -> std::result::Result<(), String> {
        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| f.required && !arguments.contains(f.name))
        {
            return Err(format!(
                "{} requires argument '{}'",
                self.name, missing.name
            ));
        }

        for (name, _) in arguments.references() {
            if let Some(field) = self.field(name) {
                if !field.referable {
                    return Err(format!(
                        "{} does not accept a result reference for '{}'",
                        self.name, name
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Lookup table of known method shapes
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    shapes: HashMap<String, MethodShape>,
}

impl Catalog {
    /// Empty catalog: every method decodes to its raw JSON value
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with `Core/echo` and the standard methods of the bundled entities
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.insert(MethodShape::new::<Value>("Core/echo", MethodKind::Echo, Vec::new()));
        catalog.register::<Contact>();
        catalog.register::<Mailbox>();
        catalog
    }

    /// Register `/get`, `/set`, `/query`, `/changes` and `/queryChanges` for an entity
    pub fn register<T: Entity>(&mut self) -> &mut Self {
        self.insert(get::shape::<T>());
        self.insert(set::shape::<T>());
        self.insert(query::shape::<T>());
        self.insert(changes::changes_shape::<T>());
        self.insert(changes::query_changes_shape::<T>());
        self
    }

    pub fn insert(&mut self, shape: MethodShape) -> &mut Self {
        self.shapes.insert(shape.name.clone(), shape);
        self
    }

    pub fn shape_of(&self, name: &str) -> Option<&MethodShape> {
        self.shapes.get(name)
    }

    /// Method family, falling back on the name suffix for unregistered methods
    pub fn kind_of(&self, name: &str) -> MethodKind {
        self.shape_of(name)
            .map(|shape| shape.kind)
            .unwrap_or_else(|| MethodKind::from_method_name(name))
    }

    /// Decode a successful result; unregistered methods yield the raw value
    pub fn decode(
        &self,
        name: &str,
        payload: &Value,
    ) -> std::result::Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
        match self.shape_of(name) {
            Some(shape) => shape.decode(payload),
            None => Ok(Box::new(payload.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Serialize an optional argument only when it is set
pub(crate) fn insert_opt<V: Serialize>(
    arguments: &mut Arguments,
    name: &str,
    value: Option<V>,
) -> Result<()> {
    if let Some(value) = value {
        arguments.insert(name, serde_json::to_value(value)?);
    }
    Ok(())
}
