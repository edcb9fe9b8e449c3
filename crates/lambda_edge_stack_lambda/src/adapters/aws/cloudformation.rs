use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudformation::client::Waiters;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{Capability, ChangeSetType, Parameter};
use aws_smithy_runtime_api::client::waiters::error::WaiterError;

use crate::adapters::aws::{sdk_error, AwsContext};
use crate::adapters::stack_engine::{ChangeSetRequest, StackEngine};
use crate::error::AdapterError;
use crate::runtime::naming::{ChangeSetKind, StackWaitState};

/// Matches the 120 x 30s polling window of the CloudFormation waiters.
pub const WAITER_MAX_WAIT: Duration = Duration::from_secs(60 * 60);

pub struct CloudFormationStackEngine {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStackEngine {
    pub fn new(context: &AwsContext, region: &str) -> Self {
        Self {
            client: context.cloudformation_client(region),
        }
    }
}

fn change_set_type(kind: ChangeSetKind) -> ChangeSetType {
    match kind {
        ChangeSetKind::Create => ChangeSetType::Create,
        ChangeSetKind::Update => ChangeSetType::Update,
    }
}

/// A waiter that lands in a failure state or runs out of time means the
/// resource is not ready; anything else is an ordinary operation failure.
fn waiter_error<O, E>(waiter: &'static str, error: WaiterError<O, E>) -> AdapterError
where
    WaiterError<O, E>: std::error::Error + ProvideErrorMetadata,
{
    let not_ready = matches!(
        error,
        WaiterError::FailureState(_) | WaiterError::ExceededMaxWait(_)
    );
    let code = error.code().map(str::to_string);
    let message = DisplayErrorContext(error).to_string();

    if not_ready {
        AdapterError::ResourceNotReady {
            message: format!("{waiter}: {message}"),
        }
    } else {
        AdapterError::Sdk {
            operation: waiter,
            code,
            message,
        }
    }
}

#[async_trait]
impl StackEngine for CloudFormationStackEngine {
    async fn create_change_set(&self, request: &ChangeSetRequest) -> Result<(), AdapterError> {
        let parameters = request
            .parameters
            .iter()
            .map(|parameter| {
                Parameter::builder()
                    .parameter_key(&parameter.key)
                    .parameter_value(&parameter.value)
                    .build()
            })
            .collect::<Vec<_>>();
        let capabilities = request
            .capabilities
            .iter()
            .map(|capability| Capability::from(capability.as_str()))
            .collect::<Vec<_>>();

        self.client
            .create_change_set()
            .stack_name(&request.stack_name)
            .change_set_name(&request.change_set_name)
            .change_set_type(change_set_type(request.kind))
            .description(&request.description)
            .template_body(&request.template_body)
            .set_capabilities(Some(capabilities))
            .set_parameters(Some(parameters))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| sdk_error("CreateChangeSet", error))
    }

    async fn wait_for_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), AdapterError> {
        self.client
            .wait_until_change_set_create_complete()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .wait(WAITER_MAX_WAIT)
            .await
            .map(|_| ())
            .map_err(|error| waiter_error("change-set-create-complete", error))
    }

    async fn execute_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), AdapterError> {
        self.client
            .execute_change_set()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| sdk_error("ExecuteChangeSet", error))
    }

    async fn wait_for_stack(
        &self,
        stack_name: &str,
        state: StackWaitState,
    ) -> Result<(), AdapterError> {
        let waiter = state.as_str();
        match state {
            StackWaitState::CreateComplete => self
                .client
                .wait_until_stack_create_complete()
                .stack_name(stack_name)
                .wait(WAITER_MAX_WAIT)
                .await
                .map(|_| ())
                .map_err(|error| waiter_error(waiter, error)),
            StackWaitState::UpdateComplete => self
                .client
                .wait_until_stack_update_complete()
                .stack_name(stack_name)
                .wait(WAITER_MAX_WAIT)
                .await
                .map(|_| ())
                .map_err(|error| waiter_error(waiter, error)),
            StackWaitState::DeleteComplete => self
                .client
                .wait_until_stack_delete_complete()
                .stack_name(stack_name)
                .wait(WAITER_MAX_WAIT)
                .await
                .map(|_| ())
                .map_err(|error| waiter_error(waiter, error)),
        }
    }

    async fn stack_outputs(
        &self,
        stack_name: &str,
    ) -> Result<BTreeMap<String, String>, AdapterError> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|error| sdk_error("DescribeStacks", error))?;

        let stack = output.stacks().first().ok_or(AdapterError::MissingField {
            operation: "DescribeStacks",
            field: "Stacks",
        })?;

        Ok(stack
            .outputs()
            .iter()
            .filter_map(|output| {
                let key = output.output_key()?;
                Some((
                    key.to_string(),
                    output.output_value().unwrap_or_default().to_string(),
                ))
            })
            .collect())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), AdapterError> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| sdk_error("DeleteStack", error))
    }
}
