use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::runtime::naming::{ChangeSetKind, StackWaitState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackParameter {
    pub key: String,
    pub value: String,
}

impl StackParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetRequest {
    pub stack_name: String,
    pub change_set_name: String,
    pub kind: ChangeSetKind,
    pub description: String,
    pub capabilities: Vec<String>,
    pub template_body: String,
    pub parameters: Vec<StackParameter>,
}

impl ChangeSetRequest {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|parameter| parameter.key == key)
            .map(|parameter| parameter.value.as_str())
    }
}

/// Control plane hosting the companion stack.
///
/// Wait operations poll until the resource settles. A waiter that hits a
/// failure state or its own deadline reports [`AdapterError::ResourceNotReady`].
#[async_trait]
pub trait StackEngine: Send + Sync {
    async fn create_change_set(&self, request: &ChangeSetRequest) -> Result<(), AdapterError>;

    async fn wait_for_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), AdapterError>;

    async fn execute_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), AdapterError>;

    async fn wait_for_stack(
        &self,
        stack_name: &str,
        state: StackWaitState,
    ) -> Result<(), AdapterError>;

    async fn stack_outputs(&self, stack_name: &str)
        -> Result<BTreeMap<String, String>, AdapterError>;

    async fn delete_stack(&self, stack_name: &str) -> Result<(), AdapterError>;
}
