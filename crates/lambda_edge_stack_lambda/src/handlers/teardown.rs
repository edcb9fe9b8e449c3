//! Deletes the companion stack and the republished code package.
//!
//! Lambda@Edge replicas are retracted asynchronously, so the first stack
//! deletion often fails while replicas still exist. The teardown sleeps for
//! whatever invocation budget is left beyond [`STACK_DELETION_ESTIMATE`] and
//! deletes the stack exactly once more.
//!
//! [`STACK_DELETION_ESTIMATE`]: crate::runtime::retry::STACK_DELETION_ESTIMATE

use std::time::Duration;

use tracing::{info, warn};

use crate::config::EdgeConfig;
use crate::error::{AdapterError, HandlerError};
use crate::handlers::{EdgeServices, InvocationContext};
use crate::runtime::arn::{LambdaArn, StackArn};
use crate::runtime::contract::ProvisioningEvent;
use crate::runtime::naming::{companion_stack_name, CodeLocation, StackWaitState};
use crate::runtime::retry::{DeletionRetryPolicy, RetryDecision};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TeardownState {
    Idle,
    DeletingStack,
    WaitingRetryDelay(Duration),
    DeletingStackRetry,
    StackDeleted,
    DeletingArtifact,
    Done,
}

pub async fn teardown(
    event: &ProvisioningEvent,
    config: &EdgeConfig,
    services: EdgeServices<'_>,
    invocation: &InvocationContext,
) -> Result<(), HandlerError> {
    teardown_with_policy(
        event,
        config,
        services,
        invocation,
        DeletionRetryPolicy::default(),
    )
    .await
}

pub async fn teardown_with_policy(
    event: &ProvisioningEvent,
    config: &EdgeConfig,
    services: EdgeServices<'_>,
    invocation: &InvocationContext,
    policy: DeletionRetryPolicy,
) -> Result<(), HandlerError> {
    let source_stack = StackArn::parse(&event.stack_id)?;
    let stack_name = companion_stack_name(&source_stack.name, &event.logical_resource_id);

    let mut state = TeardownState::Idle;
    loop {
        state = match state {
            TeardownState::Idle => TeardownState::DeletingStack,
            TeardownState::DeletingStack => match delete_stack(services, &stack_name).await {
                Ok(()) => TeardownState::StackDeleted,
                Err(error) if error.is_not_ready() => {
                    // Budget is read at failure time, after the first deletion consumed its share.
                    match policy.decide(invocation.remaining_time()) {
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                stack_name = %stack_name,
                                delay_ms = delay.as_millis() as u64,
                                error = %error,
                                "Stack is not deleted yet, retrying once"
                            );
                            TeardownState::WaitingRetryDelay(delay)
                        }
                        RetryDecision::GiveUp => {
                            warn!(stack_name = %stack_name, "Not enough time left to retry stack deletion");
                            return Err(error.into());
                        }
                    }
                }
                Err(error) => return Err(error.into()),
            },
            TeardownState::WaitingRetryDelay(delay) => {
                tokio::time::sleep(delay).await;
                TeardownState::DeletingStackRetry
            }
            TeardownState::DeletingStackRetry => {
                delete_stack(services, &stack_name).await?;
                TeardownState::StackDeleted
            }
            TeardownState::StackDeleted => TeardownState::DeletingArtifact,
            TeardownState::DeletingArtifact => {
                let source = LambdaArn::parse(event.lambda_source_arn()?)?;
                let location = CodeLocation::for_function(
                    &config.region,
                    &config.code_bucket,
                    &config.code_key_prefix,
                    &source.name,
                );
                info!(bucket = %location.bucket, key = %location.key, "Deleting source code");
                services.code_store.delete_object(&location).await?;
                TeardownState::Done
            }
            TeardownState::Done => return Ok(()),
        };
    }
}

async fn delete_stack(services: EdgeServices<'_>, stack_name: &str) -> Result<(), AdapterError> {
    info!(stack_name = %stack_name, "Deleting stack");
    services.stacks.delete_stack(stack_name).await?;
    services
        .stacks
        .wait_for_stack(stack_name, StackWaitState::DeleteComplete)
        .await?;
    info!(stack_name = %stack_name, "Stack deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::contract::RequestType;
    use crate::test_helpers::{
        edge_config, not_ready, sample_event, FakeFunctionSource, ScriptedStackEngine, StackCall,
        VersionedCodeStore,
    };
    use tokio::time::Instant;

    struct Fixture {
        functions: FakeFunctionSource,
        code_store: VersionedCodeStore,
        stacks: ScriptedStackEngine,
    }

    impl Fixture {
        fn new(stacks: ScriptedStackEngine) -> Self {
            Self {
                functions: FakeFunctionSource::new(),
                code_store: VersionedCodeStore::new(),
                stacks,
            }
        }

        fn services(&self) -> EdgeServices<'_> {
            EdgeServices {
                functions: &self.functions,
                code_store: &self.code_store,
                stacks: &self.stacks,
            }
        }
    }

    fn delete_calls(stacks: &ScriptedStackEngine) -> usize {
        stacks
            .calls()
            .iter()
            .filter(|call| matches!(call, StackCall::DeleteStack(_)))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn deletes_stack_then_code_package() {
        let fixture = Fixture::new(ScriptedStackEngine::new());
        let invocation = InvocationContext::with_remaining("stream", Duration::from_secs(300));

        teardown(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
        )
        .await
        .expect("teardown should succeed");

        assert_eq!(
            fixture.stacks.calls(),
            vec![
                StackCall::DeleteStack("website-EdgeAuth".to_string()),
                StackCall::WaitForStack(
                    "website-EdgeAuth".to_string(),
                    StackWaitState::DeleteComplete
                ),
            ]
        );
        assert_eq!(
            fixture.code_store.deletes(),
            vec![("edge-code".to_string(), "lambda-edge/foo".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_sleeping_the_spare_budget() {
        let stacks = ScriptedStackEngine::new();
        stacks.script_delete_waits(vec![Err(not_ready()), Ok(())]);
        let fixture = Fixture::new(stacks);
        let invocation = InvocationContext::with_remaining("stream", Duration::from_millis(90_000));
        let started = Instant::now();

        teardown(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
        )
        .await
        .expect("retry should succeed");

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(30_000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(30_010), "{elapsed:?}");
        assert_eq!(delete_calls(&fixture.stacks), 2);
        assert_eq!(fixture.code_store.deletes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_not_ready_failure_is_final() {
        let stacks = ScriptedStackEngine::new();
        stacks.script_delete_waits(vec![Err(not_ready()), Err(not_ready()), Ok(())]);
        let fixture = Fixture::new(stacks);
        let invocation = InvocationContext::with_remaining("stream", Duration::from_secs(900));

        let error = teardown(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
        )
        .await
        .expect_err("second failure should surface");

        assert!(error.is_not_ready());
        assert_eq!(delete_calls(&fixture.stacks), 2);
        assert!(fixture.code_store.deletes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_without_sleeping_when_budget_is_short() {
        let stacks = ScriptedStackEngine::new();
        stacks.script_delete_waits(vec![Err(not_ready())]);
        let fixture = Fixture::new(stacks);
        let invocation = InvocationContext::with_remaining("stream", Duration::from_millis(60_000));
        let started = Instant::now();

        let error = teardown(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
        )
        .await
        .expect_err("no budget for a retry");

        assert!(error.is_not_ready());
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(delete_calls(&fixture.stacks), 1);
        assert!(fixture.code_store.deletes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn other_stack_errors_are_not_retried() {
        let stacks = ScriptedStackEngine::new();
        stacks.fail(
            "DeleteStack",
            AdapterError::Sdk {
                operation: "DeleteStack",
                code: Some("AccessDenied".to_string()),
                message: "denied".to_string(),
            },
        );
        let fixture = Fixture::new(stacks);
        let invocation = InvocationContext::with_remaining("stream", Duration::from_secs(900));

        let error = teardown(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
        )
        .await
        .expect_err("access denied is fatal");

        assert!(!error.is_not_ready());
        assert_eq!(delete_calls(&fixture.stacks), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_estimate_shapes_the_delay() {
        let stacks = ScriptedStackEngine::new();
        stacks.script_delete_waits(vec![Err(not_ready()), Ok(())]);
        let fixture = Fixture::new(stacks);
        let invocation = InvocationContext::with_remaining("stream", Duration::from_secs(10));
        let started = Instant::now();

        teardown_with_policy(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
            DeletionRetryPolicy {
                deletion_estimate: Duration::from_secs(4),
            },
        )
        .await
        .expect("retry should succeed");

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(6_010), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn artifact_delete_failure_surfaces() {
        let fixture = Fixture {
            code_store: VersionedCodeStore::failing_delete(AdapterError::Sdk {
                operation: "DeleteObject",
                code: Some("AccessDenied".to_string()),
                message: "Access Denied".to_string(),
            }),
            ..Fixture::new(ScriptedStackEngine::new())
        };
        let invocation = InvocationContext::with_remaining("stream", Duration::from_secs(300));

        let error = teardown(
            &sample_event(RequestType::Delete),
            &edge_config(),
            fixture.services(),
            &invocation,
        )
        .await
        .expect_err("storage error is fatal");

        assert_eq!(error.to_string(), "DeleteObject failed: Access Denied");
        assert_eq!(delete_calls(&fixture.stacks), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn source_arn_is_only_checked_after_the_stack_is_gone() {
        let fixture = Fixture::new(ScriptedStackEngine::new());
        let invocation = InvocationContext::with_remaining("stream", Duration::from_secs(300));
        let mut event = sample_event(RequestType::Delete);
        event.resource_properties.parameters.lambda_source_arn = Some("not-an-arn".to_string());

        let error = teardown(&event, &edge_config(), fixture.services(), &invocation)
            .await
            .expect_err("invalid arn");

        assert_eq!(
            error.to_string(),
            "Parameter LambdaSourceArn \"not-an-arn\" must be a valid Lambda ARN"
        );
        assert_eq!(delete_calls(&fixture.stacks), 1);
        assert!(fixture.code_store.deletes().is_empty());
    }
}
