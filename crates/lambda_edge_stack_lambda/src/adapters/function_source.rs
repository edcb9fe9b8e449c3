use async_trait::async_trait;

use crate::error::AdapterError;
use crate::runtime::arn::LambdaArn;

/// Configuration and code pointer of the function being republished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSnapshot {
    pub description: Option<String>,
    pub runtime: String,
    pub handler: String,
    pub memory_size: i32,
    pub timeout: i32,
    pub tracing_mode: String,
    /// Pre-signed URL of the deployment package.
    pub code_location: String,
}

#[async_trait]
pub trait FunctionSource: Send + Sync {
    async fn get_function(&self, target: &LambdaArn) -> Result<FunctionSnapshot, AdapterError>;

    /// Downloads the whole package into memory.
    async fn download_code(&self, code_location: &str) -> Result<Vec<u8>, AdapterError>;
}
