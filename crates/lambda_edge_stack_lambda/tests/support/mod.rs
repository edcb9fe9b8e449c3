#![allow(dead_code)]

use std::time::Duration;

use lambda_edge_stack_lambda::error::SignalError;
use lambda_edge_stack_lambda::handlers::dispatch::{dispatch, dispatch_payload};
use lambda_edge_stack_lambda::handlers::signal::DispatchReceipt;
use lambda_edge_stack_lambda::handlers::{EdgeServices, InvocationContext};
use lambda_edge_stack_lambda::runtime::contract::ProvisioningEvent;
use lambda_edge_stack_lambda::test_helpers::{
    edge_env, FakeFunctionSource, RecordingResponseSink, ScriptedStackEngine, StackCall,
    VersionedCodeStore,
};
use serde_json::Value;

pub const LOG_STREAM: &str = "2026/10/19/[$LATEST]4f1c0de5a8b14f0e9c3c2f1e6a7b8c9d";

/// Owns one set of fakes so a test can replay several requests against the
/// same simulated account.
pub struct Harness {
    pub functions: FakeFunctionSource,
    pub code_store: VersionedCodeStore,
    pub stacks: ScriptedStackEngine,
    pub sink: RecordingResponseSink,
    pub budget: Duration,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            functions: FakeFunctionSource::new(),
            code_store: VersionedCodeStore::new(),
            stacks: ScriptedStackEngine::new(),
            sink: RecordingResponseSink::new(),
            budget: Duration::from_secs(900),
        }
    }

    pub fn with_stacks(mut self, stacks: ScriptedStackEngine) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    fn services(&self) -> EdgeServices<'_> {
        EdgeServices {
            functions: &self.functions,
            code_store: &self.code_store,
            stacks: &self.stacks,
        }
    }

    /// Dispatches with the standard environment.
    pub async fn dispatch(&self, event: &ProvisioningEvent) -> Result<DispatchReceipt, SignalError> {
        self.dispatch_with_env(event, &edge_env).await
    }

    pub async fn dispatch_with_env(
        &self,
        event: &ProvisioningEvent,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<DispatchReceipt, SignalError> {
        let invocation = InvocationContext::with_remaining(LOG_STREAM, self.budget);
        dispatch(event, &invocation, env, self.services(), &self.sink).await
    }

    /// Dispatches an untyped payload, the way the Lambda runtime delivers it.
    pub async fn dispatch_payload(&self, payload: Value) -> Result<DispatchReceipt, SignalError> {
        let invocation = InvocationContext::with_remaining(LOG_STREAM, self.budget);
        dispatch_payload(payload, &invocation, &edge_env, self.services(), &self.sink).await
    }

    /// Stacks named in any recorded call, in call order, without duplicates.
    pub fn touched_stacks(&self) -> Vec<String> {
        let mut names = Vec::new();
        for call in self.stacks.calls() {
            let name = match call {
                StackCall::WaitForStack(name, _)
                | StackCall::DescribeOutputs(name)
                | StackCall::DeleteStack(name) => name,
                _ => continue,
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn delete_attempts(&self) -> usize {
        self.stacks
            .calls()
            .iter()
            .filter(|call| matches!(call, StackCall::DeleteStack(_)))
            .count()
    }
}
