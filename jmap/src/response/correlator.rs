//! Response correlation
//!
//! Matches each result entry to the invocation that produced it, strictly by
//! call id (servers may reorder results), and decodes it through the method
//! catalog. Failures stay local to one call: a bad entry never prevents the
//! others from resolving, and every invocation of the batch ends up with
//! either an outcome or a protocol-level error in the report.
//!
//! States: `Awaiting` -> `Matching` -> `Resolved` | `Failed`. `correlate`
//! consumes the correlator, so a batch is correlated exactly once.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::request::SerializedBatch;
use crate::response::pointer;
use crate::response::{MethodError, Response, ResultEntry};
use crate::types::{CallId, CorrelationError, JmapError, Result};

/// Correlation state of one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationState {
    /// Batch sent, no response yet
    Awaiting,
    /// Entries are being matched
    Matching,
    /// Every entry matched a call and every call got a decodable result
    Resolved,
    /// At least one protocol-level error was recorded
    Failed,
}

/// Successfully decoded result of one invocation
pub struct Decoded {
    /// Method name of the result entry
    pub name: String,
    /// Result object as received
    pub raw: Value,
    typed: Option<Box<dyn Any + Send + Sync>>,
}

impl Decoded {
    /// Borrow the typed value, if it is a `T` and has not been taken
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.typed.as_ref()?.downcast_ref::<T>()
    }

    /// Move the typed value out, leaving the raw object in place
    pub fn take<T: Any>(&mut self) -> Option<T> {
        if !self.typed.as_ref()?.is::<T>() {
            return None;
        }
        self.typed.take()?.downcast::<T>().ok().map(|typed| *typed)
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("name", &self.name)
            .field("raw", &self.raw)
            .field("taken", &self.typed.is_none())
            .finish()
    }
}

/// Result of one invocation as reported by the server
#[derive(Debug)]
pub enum Outcome {
    Success(Decoded),
    Failure(MethodError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn method_error(&self) -> Option<&MethodError> {
        match self {
            Self::Failure(error) => Some(error),
            Self::Success(_) => None,
        }
    }

    pub fn decoded(&self) -> Option<&Decoded> {
        match self {
            Self::Success(decoded) => Some(decoded),
            Self::Failure(_) => None,
        }
    }
}

/// Creation id to server id mapping of one exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationIdMap {
    ids: BTreeMap<String, String>,
    #[serde(skip)]
    created_by: BTreeMap<String, CallId>,
}

impl CreationIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, creation_id: &str) -> Option<&str> {
        self.ids.get(creation_id).map(String::as_str)
    }

    /// Call that created the object, when known
    pub fn created_by(&self, creation_id: &str) -> Option<&CallId> {
        self.created_by.get(creation_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ids.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Merge mappings from a later exchange, later ids winning
    pub fn extend(&mut self, other: CreationIdMap) {
        self.ids.extend(other.ids);
        self.created_by.extend(other.created_by);
    }

    /// Plain map, e.g. to forward as `createdIds` in a follow-on request
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.ids
    }

    /// Record a creation. Returns the call that already claimed the
    /// creation id when it was created by a different call.
    fn record(&mut self, creation_id: &str, server_id: &str, call: &CallId) -> Option<CallId> {
        if let Some(first) = self.created_by.get(creation_id) {
            if first != call {
                return Some(first.clone());
            }
        }
        self.ids.insert(creation_id.to_string(), server_id.to_string());
        self.created_by.insert(creation_id.to_string(), call.clone());
        None
    }

    fn seed(&mut self, creation_id: String, server_id: String) {
        self.ids.entry(creation_id).or_insert(server_id);
    }
}

/// What happened to one invocation
#[derive(Debug)]
pub struct CallReport {
    pub id: CallId,
    /// Method name of the invocation as sent
    pub name: String,
    pub result: std::result::Result<Outcome, CorrelationError>,
    /// Further entries sharing this call id (implicit calls such as the
    /// `/set` a server runs after `/copy` with `onSuccessDestroyOriginal`)
    pub implicit: Vec<ResultEntry>,
    /// Protocol errors raised by the implicit entries; `result` is kept
    pub implicit_errors: Vec<CorrelationError>,
}

/// Correlates one response with the batch it answers
pub struct Correlator<'a> {
    batch: &'a SerializedBatch,
    catalog: &'a Catalog,
    state: CorrelationState,
}

impl<'a> Correlator<'a> {
    pub fn new(batch: &'a SerializedBatch, catalog: &'a Catalog) -> Self {
        Self {
            batch,
            catalog,
            state: CorrelationState::Awaiting,
        }
    }

    /// State before correlation. `correlate` consumes the correlator; the
    /// final state is on the report.
    pub fn state(&self) -> CorrelationState {
        self.state
    }

    /// Match every result entry to its invocation
    ///
    /// Fails as a whole only when the response carries no results at all.
    pub fn correlate(mut self, response: Response) -> Result<CorrelationReport> {
        if response.method_responses.is_empty() {
            warn!(
                "Response to a batch of {} invocations carries no results",
                self.batch.len()
            );
            self.state = CorrelationState::Failed;
            return Err(JmapError::EmptyResponse);
        }

        self.state = CorrelationState::Matching;
        debug!(
            "Correlating {} results against {} invocations",
            response.method_responses.len(),
            self.batch.len()
        );

        let invocations = self.batch.invocations();
        let mut slots: Vec<Option<std::result::Result<Outcome, CorrelationError>>> =
            invocations.iter().map(|_| None).collect();
        let mut implicit: Vec<Vec<ResultEntry>> = invocations.iter().map(|_| Vec::new()).collect();
        let mut implicit_errors: Vec<Vec<CorrelationError>> =
            invocations.iter().map(|_| Vec::new()).collect();
        let mut unmatched = Vec::new();
        let mut creation_ids = CreationIdMap::new();

        for entry in response.method_responses {
            let Some(pos) = self.batch.position(&entry.id) else {
                warn!("Result {} references unknown call id {}", entry.name, entry.id);
                unmatched.push(CorrelationError::UnknownCallId {
                    id: entry.id,
                    name: entry.name,
                });
                continue;
            };

            if slots[pos].is_some() {
                debug!("Implicit result {} for call {}", entry.name, entry.id);
                if !entry.is_error() && self.catalog.kind_of(&entry.name).creates_objects() {
                    if let Some(duplicate) = self.merge_created(&entry, &mut creation_ids) {
                        implicit_errors[pos].push(duplicate);
                    }
                }
                implicit[pos].push(entry);
                continue;
            }

            let mut result = self.decode(&entry);
            if matches!(result, Ok(Outcome::Success(_)))
                && self.catalog.kind_of(&entry.name).creates_objects()
            {
                if let Some(duplicate) = self.merge_created(&entry, &mut creation_ids) {
                    result = Err(duplicate);
                }
            }
            slots[pos] = Some(result);
        }

        if let Some(created_ids) = response.created_ids {
            for (creation_id, server_id) in created_ids {
                creation_ids.seed(creation_id, server_id);
            }
        }

        let calls: Vec<CallReport> = invocations
            .iter()
            .zip(slots)
            .zip(implicit)
            .zip(implicit_errors)
            .map(|(((invocation, slot), implicit), implicit_errors)| {
                let result = slot.unwrap_or_else(|| {
                    warn!("No result for call {} ({})", invocation.id, invocation.name);
                    Err(CorrelationError::MissingResult {
                        id: invocation.id.clone(),
                    })
                });
                CallReport {
                    id: invocation.id.clone(),
                    name: invocation.name.clone(),
                    result,
                    implicit,
                    implicit_errors,
                }
            })
            .collect();

        let failed = !unmatched.is_empty()
            || calls
                .iter()
                .any(|call| call.result.is_err() || !call.implicit_errors.is_empty());
        self.state = if failed {
            CorrelationState::Failed
        } else {
            CorrelationState::Resolved
        };

        info!(
            "Correlated batch: {} calls, {} method errors, {} protocol errors, {} created",
            calls.len(),
            calls
                .iter()
                .filter(|c| matches!(c.result, Ok(Outcome::Failure(_))))
                .count(),
            unmatched.len()
                + calls
                    .iter()
                    .map(|c| usize::from(c.result.is_err()) + c.implicit_errors.len())
                    .sum::<usize>(),
            creation_ids.len()
        );

        let positions = calls
            .iter()
            .enumerate()
            .map(|(pos, call)| (call.id.clone(), pos))
            .collect();

        Ok(CorrelationReport {
            state: self.state,
            calls,
            positions,
            unmatched,
            creation_ids,
            session_state: response.session_state,
        })
    }

    fn decode(&self, entry: &ResultEntry) -> std::result::Result<Outcome, CorrelationError> {
        let decode_error = |err: serde_json::Error| CorrelationError::Decode {
            id: entry.id.clone(),
            name: entry.name.clone(),
            message: err.to_string(),
        };

        if entry.is_error() {
            let error = MethodError::deserialize(&entry.arguments).map_err(decode_error)?;
            debug!("Call {} failed: {}", entry.id, error);
            return Ok(Outcome::Failure(error));
        }

        let typed = self
            .catalog
            .decode(&entry.name, &entry.arguments)
            .map_err(|err| {
                warn!("Could not decode {} result of call {}: {}", entry.name, entry.id, err);
                decode_error(err)
            })?;

        Ok(Outcome::Success(Decoded {
            name: entry.name.clone(),
            raw: entry.arguments.clone(),
            typed: Some(typed),
        }))
    }

    /// Merge the `created` map of a successful `/set` or `/copy` result.
    /// Returns the first duplicate creation id found, if any; the
    /// remaining ids are merged regardless.
    fn merge_created(
        &self,
        entry: &ResultEntry,
        creation_ids: &mut CreationIdMap,
    ) -> Option<CorrelationError> {
        let created = entry.arguments.get("created")?.as_object()?;
        let mut duplicate = None;

        for (creation_id, object) in created {
            let Some(server_id) = object.get("id").and_then(Value::as_str) else {
                warn!(
                    "Created object '{}' of call {} has no id",
                    creation_id, entry.id
                );
                continue;
            };

            if let Some(first) = creation_ids.record(creation_id, server_id, &entry.id) {
                warn!(
                    "Creation id '{}' of call {} already created by call {}",
                    creation_id, entry.id, first
                );
                duplicate.get_or_insert(CorrelationError::DuplicateCreationId {
                    id: entry.id.clone(),
                    creation_id: creation_id.clone(),
                    first,
                });
            }
        }

        duplicate
    }
}

/// Outcome of every invocation of one exchange
#[derive(Debug)]
pub struct CorrelationReport {
    state: CorrelationState,
    calls: Vec<CallReport>,
    positions: HashMap<CallId, usize>,
    unmatched: Vec<CorrelationError>,
    creation_ids: CreationIdMap,
    session_state: Option<String>,
}

impl CorrelationReport {
    pub fn state(&self) -> CorrelationState {
        self.state
    }

    /// No protocol-level error occurred. Method errors may still be present.
    pub fn is_resolved(&self) -> bool {
        self.state == CorrelationState::Resolved
    }

    /// Per-call reports, in request order
    pub fn calls(&self) -> &[CallReport] {
        &self.calls
    }

    pub fn call(&self, id: &CallId) -> Option<&CallReport> {
        self.positions.get(id).map(|&pos| &self.calls[pos])
    }

    pub fn outcome(&self, id: &CallId) -> Option<&std::result::Result<Outcome, CorrelationError>> {
        self.call(id).map(|call| &call.result)
    }

    /// Typed result of a successful call, borrowed
    pub fn get<T: Any>(&self, id: &CallId) -> Option<&T> {
        match self.outcome(id)? {
            Ok(Outcome::Success(decoded)) => decoded.get::<T>(),
            _ => None,
        }
    }

    /// Typed result of a successful call, moved to the caller
    pub fn take<T: Any>(&mut self, id: &CallId) -> Option<T> {
        let pos = *self.positions.get(id)?;
        match &mut self.calls[pos].result {
            Ok(Outcome::Success(decoded)) => decoded.take::<T>(),
            _ => None,
        }
    }

    /// Method error of a call, if the server reported one
    pub fn method_error(&self, id: &CallId) -> Option<&MethodError> {
        self.outcome(id)?.as_ref().ok()?.method_error()
    }

    pub fn method_errors(&self) -> impl Iterator<Item = (&CallId, &MethodError)> {
        self.calls.iter().filter_map(|call| match &call.result {
            Ok(Outcome::Failure(error)) => Some((&call.id, error)),
            _ => None,
        })
    }

    /// Every protocol-level error, per call first, then unknown call ids
    pub fn errors(&self) -> impl Iterator<Item = &CorrelationError> {
        self.calls
            .iter()
            .flat_map(|call| call.result.as_ref().err().into_iter().chain(&call.implicit_errors))
            .chain(self.unmatched.iter())
    }

    /// Entries that referenced call ids absent from the batch
    pub fn unmatched(&self) -> &[CorrelationError] {
        &self.unmatched
    }

    /// Read the value at a JSON pointer path in a call's raw result.
    ///
    /// A read-only projection for composing follow-on requests; the server
    /// alone resolves references inside one exchange.
    pub fn result_at(&self, id: &CallId, path: &str) -> Result<Value> {
        let decoded = match self.outcome(id) {
            Some(Ok(Outcome::Success(decoded))) => decoded,
            _ => return Err(JmapError::NoResult(id.clone())),
        };
        pointer::evaluate(&decoded.raw, path).map_err(|err| JmapError::InvalidPath {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    pub fn created_id(&self, creation_id: &str) -> Option<&str> {
        self.creation_ids.get(creation_id)
    }

    pub fn creation_ids(&self) -> &CreationIdMap {
        &self.creation_ids
    }

    pub fn into_creation_ids(self) -> CreationIdMap {
        self.creation_ids
    }

    pub fn session_state(&self) -> Option<&str> {
        self.session_state.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GetResponse, QueryResponse, SetResponse};
    use crate::request::{Arguments, RequestBuilder};
    use crate::types::{Contact, Mailbox};
    use serde_json::json;

    fn entry(name: &str, arguments: Value, id: &str) -> ResultEntry {
        ResultEntry::new(name, arguments, id)
    }

    fn echo_batch(count: usize) -> SerializedBatch {
        let mut builder = RequestBuilder::new();
        for i in 0..count {
            builder
                .add("Core/echo", Arguments::new().with("n", json!(i)))
                .unwrap();
        }
        builder.build().unwrap()
    }

    fn mailbox_set(builder: &mut RequestBuilder, creation_id: &str) -> CallId {
        builder
            .add(
                "Mailbox/set",
                Arguments::new()
                    .with("accountId", "a1")
                    .with("create", json!({creation_id: {"name": "Inbox"}})),
            )
            .unwrap()
    }

    fn set_result(creation_id: &str, server_id: &str) -> Value {
        json!({
            "accountId": "a1",
            "newState": "s2",
            "created": {creation_id: {"id": server_id}}
        })
    }

    #[test]
    fn test_results_matched_regardless_of_order() {
        let batch = echo_batch(3);
        let catalog = Catalog::standard();
        let response = Response::new(vec![
            entry("Core/echo", json!({"n": 2}), "c2"),
            entry("Core/echo", json!({"n": 0}), "c0"),
            entry("Core/echo", json!({"n": 1}), "c1"),
        ]);

        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();
        assert!(report.is_resolved());
        for (i, call) in report.calls().iter().enumerate() {
            assert_eq!(call.id.as_str(), format!("c{}", i));
            let echoed = report.get::<Value>(&call.id).unwrap();
            assert_eq!(echoed["n"], json!(i));
        }
    }

    #[test]
    fn test_chained_query_and_get() {
        let mut builder = RequestBuilder::new();
        let query = builder
            .add("Contact/query", Arguments::new().with("accountId", "a1"))
            .unwrap();
        let ids = builder.reference(&query, "/ids").unwrap();
        let get = builder
            .add("Contact/get", Arguments::new().with("accountId", "a1").with("ids", ids))
            .unwrap();
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response = Response::new(vec![
            entry(
                "Contact/query",
                json!({"accountId": "a1", "queryState": "q1", "ids": ["a", "b"]}),
                "c0",
            ),
            entry(
                "Contact/get",
                json!({
                    "accountId": "a1",
                    "state": "s1",
                    "list": [{"id": "a", "fullName": "Ada"}, {"id": "b", "fullName": "Bob"}]
                }),
                "c1",
            ),
        ]);

        let mut report = Correlator::new(&batch, &catalog).correlate(response).unwrap();
        assert!(report.is_resolved());
        assert_eq!(report.get::<QueryResponse>(&query).unwrap().ids, vec!["a", "b"]);
        assert_eq!(report.result_at(&query, "/ids/0").unwrap(), json!("a"));

        let contacts: GetResponse<Contact> = report.take(&get).unwrap();
        assert_eq!(contacts.list.len(), 2);
        // Taken values are gone, the raw result stays readable
        assert!(report.take::<GetResponse<Contact>>(&get).is_none());
        assert_eq!(report.result_at(&get, "/list/*/id").unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_creation_id_resolved() {
        let mut builder = RequestBuilder::new();
        let set = mailbox_set(&mut builder, "new1");
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response =
            Response::new(vec![entry("Mailbox/set", set_result("new1", "srv-42"), "c0")]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert_eq!(report.created_id("new1"), Some("srv-42"));
        assert_eq!(report.creation_ids().created_by("new1"), Some(&set));
        let result = report.get::<SetResponse<Mailbox>>(&set).unwrap();
        assert_eq!(result.new_state, "s2");
    }

    #[test]
    fn test_duplicate_creation_id_isolated() {
        let mut builder = RequestBuilder::new();
        let first = mailbox_set(&mut builder, "new1");
        let second = mailbox_set(&mut builder, "new1");
        let echo = builder.add("Core/echo", Arguments::new()).unwrap();
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response = Response::new(vec![
            entry("Mailbox/set", set_result("new1", "srv-1"), "c0"),
            entry("Mailbox/set", set_result("new1", "srv-2"), "c1"),
            entry("Core/echo", json!({}), "c2"),
        ]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert_eq!(report.state(), CorrelationState::Failed);
        assert!(matches!(report.outcome(&first), Some(Ok(Outcome::Success(_)))));
        assert_eq!(
            report.outcome(&second).unwrap().as_ref().unwrap_err(),
            &CorrelationError::DuplicateCreationId {
                id: second.clone(),
                creation_id: "new1".to_string(),
                first: first.clone(),
            }
        );
        assert!(matches!(report.outcome(&echo), Some(Ok(Outcome::Success(_)))));
        assert_eq!(report.created_id("new1"), Some("srv-1"));
    }

    #[test]
    fn test_missing_result_reported() {
        let batch = echo_batch(3);
        let catalog = Catalog::standard();
        let response = Response::new(vec![
            entry("Core/echo", json!({}), "c0"),
            entry("Core/echo", json!({}), "c2"),
        ]);

        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();
        assert!(!report.is_resolved());
        assert!(matches!(report.outcome(&"c0".into()), Some(Ok(Outcome::Success(_)))));
        assert!(matches!(report.outcome(&"c2".into()), Some(Ok(Outcome::Success(_)))));
        assert_eq!(
            report.outcome(&"c1".into()).unwrap().as_ref().unwrap_err(),
            &CorrelationError::MissingResult { id: "c1".into() }
        );
    }

    #[test]
    fn test_unknown_call_id_recorded() {
        let batch = echo_batch(1);
        let catalog = Catalog::standard();
        let response = Response::new(vec![
            entry("Core/echo", json!({}), "c0"),
            entry("Core/echo", json!({}), "c9"),
        ]);

        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();
        assert_eq!(report.state(), CorrelationState::Failed);
        assert!(matches!(report.outcome(&"c0".into()), Some(Ok(Outcome::Success(_)))));
        assert_eq!(
            report.unmatched(),
            &[CorrelationError::UnknownCallId {
                id: "c9".into(),
                name: "Core/echo".to_string()
            }]
        );
    }

    #[test]
    fn test_state_mismatch_isolated() {
        let mut builder = RequestBuilder::new();
        let echo = builder.add("Core/echo", Arguments::new()).unwrap();
        let set = builder
            .add(
                "Mailbox/set",
                Arguments::new()
                    .with("accountId", "a1")
                    .with("ifInState", "stale")
                    .with("destroy", json!(["m1"])),
            )
            .unwrap();
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response = Response::new(vec![
            entry("Core/echo", json!({}), "c0"),
            entry("error", json!({"type": "stateMismatch"}), "c1"),
        ]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert!(report.is_resolved());
        assert!(report.outcome(&echo).unwrap().as_ref().unwrap().is_success());
        assert_eq!(
            report.method_error(&set).unwrap().error_type,
            crate::response::MethodErrorType::StateMismatch
        );
        assert_eq!(report.method_errors().count(), 1);
    }

    #[test]
    fn test_decode_error_isolated() {
        let mut builder = RequestBuilder::new();
        let get = builder
            .add("Contact/get", Arguments::new().with("accountId", "a1"))
            .unwrap();
        let echo = builder.add("Core/echo", Arguments::new()).unwrap();
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response = Response::new(vec![
            entry("Contact/get", json!({"list": 42}), "c0"),
            entry("Core/echo", json!({"ok": true}), "c1"),
        ]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert!(matches!(
            report.outcome(&get),
            Some(Err(CorrelationError::Decode { .. }))
        ));
        assert_eq!(report.get::<Value>(&echo).unwrap()["ok"], json!(true));
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_malformed_error_entry_isolated() {
        let batch = echo_batch(2);
        let catalog = Catalog::standard();
        let response = Response::new(vec![
            entry("error", json!({}), "c0"),
            entry("Core/echo", json!({"n": 1}), "c1"),
        ]);

        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();
        assert_eq!(report.state(), CorrelationState::Failed);
        let Some(Err(CorrelationError::Decode { id, name, .. })) = report.outcome(&"c0".into())
        else {
            panic!("Expected a decode error for c0");
        };
        assert_eq!((id.as_str(), name.as_str()), ("c0", "error"));
        assert_eq!(report.get::<Value>(&"c1".into()).unwrap()["n"], json!(1));
        assert_eq!(report.method_errors().count(), 0);
    }

    #[test]
    fn test_empty_response_fails_batch() {
        let batch = echo_batch(1);
        let catalog = Catalog::standard();
        let err = Correlator::new(&batch, &catalog)
            .correlate(Response::new(Vec::new()))
            .unwrap_err();
        assert_eq!(err, JmapError::EmptyResponse);
    }

    #[test]
    fn test_implicit_result_creation_ids_merged() {
        let mut builder = RequestBuilder::new();
        let copy = builder
            .add(
                "Email/copy",
                Arguments::new()
                    .with("fromAccountId", "a1")
                    .with("accountId", "a2")
                    .with("create", json!({"k1": {"id": "e1", "mailboxIds": {"m1": true}}}))
                    .with("onSuccessDestroyOriginal", json!(true)),
            )
            .unwrap();
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response = Response::new(vec![
            entry("Email/copy", json!({"created": {"k1": {"id": "e9"}}}), "c0"),
            entry("Email/set", json!({"destroyed": ["e1"]}), "c0"),
        ]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert!(report.is_resolved());
        assert_eq!(report.created_id("k1"), Some("e9"));
        let call = report.call(&copy).unwrap();
        assert_eq!(call.implicit.len(), 1);
        assert_eq!(call.implicit[0].name, "Email/set");
    }

    #[test]
    fn test_implicit_duplicate_keeps_primary_result() {
        let mut builder = RequestBuilder::new();
        let set = mailbox_set(&mut builder, "k1");
        let copy = builder
            .add(
                "Email/copy",
                Arguments::new()
                    .with("fromAccountId", "a1")
                    .with("accountId", "a2")
                    .with("onSuccessDestroyOriginal", json!(true)),
            )
            .unwrap();
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let response = Response::new(vec![
            entry("Mailbox/set", set_result("k1", "m1"), "c0"),
            entry("Email/copy", json!({"created": {"k2": {"id": "e2"}}}), "c1"),
            entry("Email/set", json!({"created": {"k1": {"id": "e9"}}}), "c1"),
        ]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert_eq!(report.state(), CorrelationState::Failed);
        assert!(report.outcome(&copy).unwrap().as_ref().unwrap().is_success());
        assert_eq!(report.result_at(&copy, "/created/k2/id").unwrap(), json!("e2"));

        let call = report.call(&copy).unwrap();
        assert_eq!(
            call.implicit_errors,
            vec![CorrelationError::DuplicateCreationId {
                id: copy.clone(),
                creation_id: "k1".to_string(),
                first: set.clone(),
            }]
        );
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.created_id("k1"), Some("m1"));
        assert_eq!(report.created_id("k2"), Some("e2"));
    }

    #[test]
    fn test_envelope_created_ids_seed_map() {
        let mut builder = RequestBuilder::new();
        mailbox_set(&mut builder, "new2");
        let batch = builder.build().unwrap();
        let catalog = Catalog::standard();

        let mut response =
            Response::new(vec![entry("Mailbox/set", set_result("new2", "srv-2"), "c0")]);
        response.created_ids = Some(BTreeMap::from([
            ("new1".to_string(), "srv-1".to_string()),
            ("new2".to_string(), "srv-2".to_string()),
        ]));

        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();
        assert!(report.is_resolved());
        assert_eq!(report.created_id("new1"), Some("srv-1"));
        assert_eq!(report.creation_ids().created_by("new1"), None);
        assert_eq!(report.creation_ids().len(), 2);
    }

    #[test]
    fn test_result_at_failed_call() {
        let batch = echo_batch(1);
        let catalog = Catalog::standard();
        let response = Response::new(vec![entry("error", json!({"type": "serverFail"}), "c0")]);
        let report = Correlator::new(&batch, &catalog).correlate(response).unwrap();

        assert_eq!(
            report.result_at(&"c0".into(), "/ids"),
            Err(JmapError::NoResult("c0".into()))
        );
    }
}
