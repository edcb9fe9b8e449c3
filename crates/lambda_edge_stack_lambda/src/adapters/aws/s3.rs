use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::adapters::aws::{sdk_error, AwsContext};
use crate::adapters::code_store::CodeStore;
use crate::error::AdapterError;
use crate::runtime::naming::CodeLocation;

pub struct S3CodeStore {
    context: AwsContext,
}

impl S3CodeStore {
    pub fn new(context: AwsContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl CodeStore for S3CodeStore {
    async fn put_object(
        &self,
        location: &CodeLocation,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<Option<String>, AdapterError> {
        debug!(bucket = %location.bucket, key = %location.key, size = body.len(), "Uploading code package");

        let output = self
            .context
            .s3_client(&location.region)
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|error| sdk_error("PutObject", error))?;

        Ok(output.version_id().map(str::to_string))
    }

    async fn delete_object(&self, location: &CodeLocation) -> Result<(), AdapterError> {
        debug!(bucket = %location.bucket, key = %location.key, "Deleting code package");

        self.context
            .s3_client(&location.region)
            .delete_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| sdk_error("DeleteObject", error))
    }
}
