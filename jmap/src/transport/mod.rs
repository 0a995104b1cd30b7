//! Transport boundary
//!
//! The engine only needs one operation from the network: send a serialized
//! batch and get the serialized response back. Retries, if any, belong to
//! the transport; batches are pure data and always safe to re-send.

#[cfg(feature = "http")]
pub mod http;

use async_trait::async_trait;

use crate::types::Result;

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

/// Exchanges one serialized request for one serialized response
///
/// Implementations report every failure before a response body is
/// available as `JmapError::Transport` (or `RequestRejected` for a
/// request-level rejection); the batch is then wholly failed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        (**self).send(body).await
    }
}
