use async_trait::async_trait;

use crate::error::AdapterError;
use crate::runtime::naming::CodeLocation;

/// Versioned object storage holding republished code packages.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Returns the version id assigned to the new object, if the bucket is versioned.
    async fn put_object(
        &self,
        location: &CodeLocation,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<Option<String>, AdapterError>;

    async fn delete_object(&self, location: &CodeLocation) -> Result<(), AdapterError>;
}
