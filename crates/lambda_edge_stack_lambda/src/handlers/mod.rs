pub mod deploy;
pub mod dispatch;
pub mod signal;
pub mod teardown;

use std::time::Duration;

use tokio::time::Instant;

use crate::adapters::code_store::CodeStore;
use crate::adapters::function_source::FunctionSource;
use crate::adapters::stack_engine::StackEngine;

/// External collaborators used by the deploy and teardown workflows.
#[derive(Clone, Copy)]
pub struct EdgeServices<'a> {
    pub functions: &'a dyn FunctionSource,
    pub code_store: &'a dyn CodeStore,
    pub stacks: &'a dyn StackEngine,
}

/// Per-invocation facts supplied by the Lambda runtime.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub log_stream_name: String,
    pub deadline: Instant,
}

impl InvocationContext {
    pub fn with_remaining(log_stream_name: impl Into<String>, remaining: Duration) -> Self {
        Self {
            log_stream_name: log_stream_name.into(),
            deadline: Instant::now() + remaining,
        }
    }

    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
