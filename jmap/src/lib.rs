//! JMAP client engine
//!
//! Batches JMAP method calls into one request, lets later calls reference
//! the results of earlier ones, and correlates the response back to every
//! call by id.
//!
//! ## Module Organization
//!
//! - `types/`: call ids, errors and bundled entity types
//! - `request/`: call id allocation, references, the request builder
//! - `response/`: method errors, JSON pointers, the response correlator
//! - `catalog/`: standard method shapes per entity type
//! - `transport/`: the send boundary and its HTTP implementation
//! - `config/`: client configuration
//! - `client`: one exchange end to end
//!
//! ```rust,ignore
//! let client = JmapClient::from_config(&config::load_config()?)?;
//!
//! let mut request = client.request();
//! let query = request.call(QueryRequest::<Contact>::new(account_id))?;
//! let ids = request.reference(&query, "/ids")?;
//! let get = request.call(GetRequest::<Contact>::new(account_id).ids_ref(ids))?;
//!
//! let mut report = client.execute(request).await?;
//! let contacts: GetResponse<Contact> = report.take(&get).unwrap();
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod logging;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use catalog::{Catalog, Entity, Method};
pub use client::JmapClient;
pub use config::ClientConfig;
pub use request::{
    Argument, Arguments, CreationIdReference, Invocation, RequestBuilder, ResultReference,
    SerializedBatch,
};
pub use response::{
    CorrelationReport, CorrelationState, Correlator, CreationIdMap, MethodError, MethodErrorType,
    Outcome, Response, ResultEntry,
};
pub use transport::Transport;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use types::{CallId, CorrelationError, JmapError, Result};
