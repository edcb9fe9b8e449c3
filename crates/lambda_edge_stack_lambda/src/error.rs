//! Error taxonomy for adapters, orchestration and response delivery.
//!
//! Orchestration errors stop at the dispatcher, where they become a FAILED
//! response. Only [`SignalError`] is returned to the Lambda runtime.

use thiserror::Error;

use crate::config::ConfigError;
use crate::runtime::contract::ContractError;

/// Failure reported by an external collaborator (control plane, storage, HTTP).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// A waiter reached a failure state or its own deadline before the
    /// resource settled, e.g. Lambda@Edge replicas still being retracted.
    #[error("Resource is not ready: {message}")]
    ResourceNotReady { message: String },

    #[error("{operation} failed: {message}")]
    Sdk {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    #[error("HTTP transport failed: {0}")]
    Transport(String),

    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl AdapterError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::ResourceNotReady { .. })
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Sdk { code, .. } => code.as_deref(),
            Self::ResourceNotReady { .. } => Some("ResourceNotReady"),
            _ => None,
        }
    }
}

/// Any failure of the deploy or teardown workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Object version is undefined. Make sure versioning is enabled on \"{bucket}\" bucket")]
    MissingObjectVersion { bucket: String },
}

impl HandlerError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::Adapter(error) if error.is_not_ready())
    }

    /// Service error code, when the failure came from a collaborator.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Adapter(error) => error.code(),
            _ => None,
        }
    }
}

/// The outcome could not be delivered to CloudFormation.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to serialize custom resource response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to deliver custom resource response: {0}")]
    Transport(#[from] AdapterError),

    /// The request did not parse and carried no `ResponseURL` to report to.
    #[error("custom resource request cannot be answered: {0}")]
    Unanswerable(ContractError),
}
