//! Request builder
//!
//! Accumulates invocations in append order and checks every back-reference
//! as it is added: a result reference may only name a call that is already
//! in the batch. Because calls can only point backwards, the dependency
//! graph is acyclic by construction and append order is a valid execution
//! order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, Method};
use crate::request::{Arguments, CallIdAllocator, Invocation, ResultReference, REFERENCE_PREFIX};
use crate::types::{CallId, JmapError, Result, CORE_CAPABILITY};

/// Wire envelope of a JMAP request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub using: Vec<String>,
    pub method_calls: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<BTreeMap<String, String>>,
}

/// Builds one request batch
///
/// One builder serves exactly one exchange and is not meant to be shared
/// between threads; build independent batches with independent builders.
#[derive(Debug)]
pub struct RequestBuilder {
    using: Vec<String>,
    allocator: CallIdAllocator,
    invocations: Vec<Invocation>,
    positions: HashMap<CallId, usize>,
    created_ids: Option<BTreeMap<String, String>>,
    catalog: Option<Arc<Catalog>>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            using: vec![CORE_CAPABILITY.to_string()],
            allocator: CallIdAllocator::new(),
            invocations: Vec::new(),
            positions: HashMap::new(),
            created_ids: None,
            catalog: None,
        }
    }

    /// Replace the declared capabilities. The core capability is always kept.
    pub fn with_capabilities<I, S>(mut self, using: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.using = vec![CORE_CAPABILITY.to_string()];
        for capability in using.into_iter().map(Into::into) {
            if !self.using.contains(&capability) {
                self.using.push(capability);
            }
        }
        self
    }

    /// Check arguments of known methods against their catalog shape
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Forward creation ids from an earlier exchange so the server can
    /// resolve `#<creation id>` references to them
    pub fn created_ids(mut self, created_ids: BTreeMap<String, String>) -> Self {
        self.created_ids = Some(created_ids);
        self
    }

    /// Append an invocation under a freshly allocated call id
    pub fn add(&mut self, name: impl Into<String>, arguments: Arguments) -> Result<CallId> {
        let mut id = self.allocator.next();
        while self.positions.contains_key(&id) {
            id = self.allocator.next();
        }
        self.push(name.into(), arguments, id)
    }

    /// Append an invocation under a caller-chosen call id
    pub fn add_with_id(
        &mut self,
        name: impl Into<String>,
        arguments: Arguments,
        id: impl Into<CallId>,
    ) -> Result<CallId> {
        let id = id.into();
        if self.positions.contains_key(&id) {
            return Err(JmapError::DuplicateCallId(id));
        }
        self.push(name.into(), arguments, id)
    }

    /// Append a typed method call
    pub fn call<M: Method>(&mut self, method: M) -> Result<CallId> {
        let name = method.name();
        let arguments = method.into_arguments()?;
        self.add(name, arguments)
    }

    /// Reference the value at `path` in the result of a call already in the batch
    pub fn reference(&self, id: &CallId, path: impl Into<String>) -> Result<ResultReference> {
        let invocation = self.invocation(id).ok_or_else(|| {
            JmapError::DanglingReference(format!("call {} is not part of this batch", id))
        })?;
        Ok(ResultReference::new(id.clone(), invocation.name.clone(), path))
    }

    pub fn invocation(&self, id: &CallId) -> Option<&Invocation> {
        self.positions.get(id).map(|&pos| &self.invocations[pos])
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Freeze the batch into its wire form
    pub fn build(self) -> Result<SerializedBatch> {
        if self.invocations.is_empty() {
            return Err(JmapError::EmptyBatch);
        }

        let request = Request {
            using: self.using,
            method_calls: self.invocations,
            created_ids: self.created_ids,
        };
        let body = serde_json::to_vec(&request)?;

        debug!(
            "Built JMAP batch: {} invocations, {} bytes",
            request.method_calls.len(),
            body.len()
        );

        Ok(SerializedBatch {
            request,
            positions: self.positions,
            body,
        })
    }

    fn push(&mut self, name: String, arguments: Arguments, id: CallId) -> Result<CallId> {
        self.check_references(&arguments)?;

        if let Some(shape) = self.catalog.as_ref().and_then(|c| c.shape_of(&name)) {
            shape.check(&arguments).map_err(JmapError::InvalidArguments)?;
        }

        debug!("Adding invocation {} ({})", id, name);
        self.positions.insert(id.clone(), self.invocations.len());
        self.invocations.push(Invocation::new(name, arguments, id.clone()));
        Ok(id)
    }

    fn check_references(&self, arguments: &Arguments) -> Result<()> {
        // Well-formed "#name" literals were already turned into references
        if let Some((argument, _)) = arguments
            .iter()
            .find(|(name, _)| name.starts_with(REFERENCE_PREFIX))
        {
            return Err(JmapError::InvalidArguments(format!(
                "argument '{}' is not a well-formed result reference",
                argument
            )));
        }

        for (argument, reference) in arguments.references() {
            let source = self.invocation(&reference.result_of).ok_or_else(|| {
                JmapError::DanglingReference(format!(
                    "argument '{}' references call {} which does not precede it",
                    argument, reference.result_of
                ))
            })?;

            if source.name != reference.name {
                return Err(JmapError::DanglingReference(format!(
                    "argument '{}' references call {} as {} but it is {}",
                    argument, reference.result_of, reference.name, source.name
                )));
            }
        }
        Ok(())
    }
}

/// An immutable, wire-ready batch
///
/// The body is computed once; re-sending it is always safe since invocations
/// are pure data.
#[derive(Debug, Clone)]
pub struct SerializedBatch {
    request: Request,
    positions: HashMap<CallId, usize>,
    body: Vec<u8>,
}

impl SerializedBatch {
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.request.method_calls
    }

    /// Position of a call in the batch
    pub fn position(&self, id: &CallId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn invocation(&self, id: &CallId) -> Option<&Invocation> {
        self.position(id).map(|pos| &self.request.method_calls[pos])
    }

    pub fn len(&self) -> usize {
        self.request.method_calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.method_calls.is_empty()
    }

    /// The serialized request body
    pub fn to_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Serialize the batch again; identical to `to_bytes`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_args() -> Arguments {
        Arguments::new()
            .with("accountId", "a1")
            .with("filter", json!({"text": "ada"}))
    }

    #[test]
    fn test_chained_calls_keep_order() {
        let mut builder = RequestBuilder::new();
        let query = builder.add("Contact/query", query_args()).unwrap();
        let ids = builder.reference(&query, "/ids").unwrap();
        let get = builder
            .add("Contact/get", Arguments::new().with("accountId", "a1").with("ids", ids))
            .unwrap();

        assert_eq!(query.as_str(), "c0");
        assert_eq!(get.as_str(), "c1");

        let batch = builder.build().unwrap();
        let wire: serde_json::Value = serde_json::from_slice(batch.to_bytes()).unwrap();
        assert_eq!(wire["using"], json!([CORE_CAPABILITY]));
        assert_eq!(wire["methodCalls"][0][2], "c0");
        assert_eq!(wire["methodCalls"][1][2], "c1");
        assert_eq!(
            wire["methodCalls"][1][1]["#ids"],
            json!({"resultOf": "c0", "name": "Contact/query", "path": "/ids"})
        );
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut builder = RequestBuilder::new();
        let reference = ResultReference::new("c1", "Contact/query", "/ids");
        let err = builder
            .add("Contact/get", Arguments::new().with("ids", reference))
            .unwrap_err();
        assert!(matches!(err, JmapError::DanglingReference(_)));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut builder = RequestBuilder::new();
        let reference = ResultReference::new("c0", "Contact/get", "/list");
        let err = builder
            .add("Contact/get", Arguments::new().with("ids", reference))
            .unwrap_err();
        assert!(matches!(err, JmapError::DanglingReference(_)));
    }

    #[test]
    fn test_prefixed_literal_reference_checked() {
        let mut builder = RequestBuilder::new();
        let forward = json!({"resultOf": "c9", "name": "Contact/query", "path": "/ids"});
        let err = builder
            .add("Contact/get", Arguments::new().with("#ids", forward))
            .unwrap_err();
        assert!(matches!(err, JmapError::DanglingReference(_)));

        let query = builder.add("Contact/query", query_args()).unwrap();
        let backward = json!({"resultOf": query.as_str(), "name": "Contact/query", "path": "/ids"});
        let get = builder
            .add("Contact/get", Arguments::new().with("#ids", backward))
            .unwrap();
        let batch = builder.build().unwrap();
        assert_eq!(batch.invocation(&get).unwrap().arguments.references().count(), 1);
    }

    #[test]
    fn test_malformed_prefixed_argument_rejected() {
        let mut builder = RequestBuilder::new();
        let err = builder
            .add("Contact/get", Arguments::new().with("#ids", json!(["k1"])))
            .unwrap_err();
        assert!(matches!(err, JmapError::InvalidArguments(_)));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_reference_to_unknown_call() {
        let builder = RequestBuilder::new();
        let err = builder.reference(&CallId::from("c0"), "/ids").unwrap_err();
        assert!(matches!(err, JmapError::DanglingReference(_)));
    }

    #[test]
    fn test_reference_with_wrong_method_name() {
        let mut builder = RequestBuilder::new();
        builder.add("Contact/query", query_args()).unwrap();
        let reference = ResultReference::new("c0", "Mailbox/query", "/ids");
        let err = builder
            .add("Contact/get", Arguments::new().with("ids", reference))
            .unwrap_err();
        assert!(matches!(err, JmapError::DanglingReference(_)));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = RequestBuilder::new().build().unwrap_err();
        assert_eq!(err, JmapError::EmptyBatch);
    }

    #[test]
    fn test_duplicate_call_id_rejected() {
        let mut builder = RequestBuilder::new();
        builder.add_with_id("Core/echo", Arguments::new(), "first").unwrap();
        let err = builder
            .add_with_id("Core/echo", Arguments::new(), "first")
            .unwrap_err();
        assert_eq!(err, JmapError::DuplicateCallId(CallId::from("first")));
    }

    #[test]
    fn test_allocated_ids_skip_caller_ids() {
        let mut builder = RequestBuilder::new();
        builder.add_with_id("Core/echo", Arguments::new(), "c0").unwrap();
        let id = builder.add("Core/echo", Arguments::new()).unwrap();
        assert_eq!(id.as_str(), "c1");
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let mut builder =
            RequestBuilder::new().with_capabilities(["urn:ietf:params:jmap:contacts"]);
        let query = builder.add("Contact/query", query_args()).unwrap();
        let ids = builder.reference(&query, "/ids").unwrap();
        builder
            .add("Contact/get", Arguments::new().with("accountId", "a1").with("ids", ids))
            .unwrap();

        let batch = builder.build().unwrap();
        let first = batch.to_json().unwrap();
        let second = batch.to_json().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_bytes(), batch.to_bytes());
    }

    #[test]
    fn test_catalog_checks_arguments() {
        let mut builder = RequestBuilder::new().with_catalog(Arc::new(Catalog::standard()));
        let err = builder
            .add("Contact/get", Arguments::new().with("ids", json!(["k1"])))
            .unwrap_err();
        assert!(matches!(err, JmapError::InvalidArguments(_)));

        // Unknown methods pass through unchecked
        assert!(builder.add("Vendor/custom", Arguments::new()).is_ok());
    }

    #[test]
    fn test_created_ids_forwarded() {
        let mut builder = RequestBuilder::new()
            .created_ids(BTreeMap::from([("new1".to_string(), "srv-42".to_string())]));
        builder.add("Core/echo", Arguments::new()).unwrap();
        let batch = builder.build().unwrap();
        assert_eq!(
            batch.request().created_ids.as_ref().unwrap()["new1"],
            "srv-42"
        );
    }
}
