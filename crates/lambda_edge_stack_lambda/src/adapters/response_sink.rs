use async_trait::async_trait;

use crate::error::AdapterError;

/// Delivers the serialized custom resource response to its pre-signed URL.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Returns the HTTP status code of the callback response.
    async fn put_response(&self, response_url: &str, body: Vec<u8>) -> Result<u16, AdapterError>;
}
