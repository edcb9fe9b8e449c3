use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;

use crate::adapters::function_source::FunctionSnapshot;
use crate::adapters::stack_engine::{ChangeSetRequest, StackParameter};
use crate::config::EdgeConfig;
use crate::error::HandlerError;
use crate::handlers::EdgeServices;
use crate::runtime::arn::{LambdaArn, StackArn};
use crate::runtime::contract::ProvisioningEvent;
use crate::runtime::naming::{
    change_set_name, companion_stack_name, ChangeSetKind, CodeLocation, CODE_CONTENT_TYPE,
};

/// Template of the companion stack hosting the replicated function.
pub const COMPANION_TEMPLATE: &str = include_str!("../../templates/lambda_edge.yml");
pub const DEFAULT_STACK_DESCRIPTION: &str = "Lambda@Edge deployed from a custom resource";
pub const STACK_CAPABILITIES: &[&str] = &["CAPABILITY_IAM"];

/// Companion stack outputs, keyed by output name.
pub type DeploymentOutcome = BTreeMap<String, String>;

/// Republishes the source function's code and creates or updates the companion stack.
///
/// Each step waits for the previous one. A failing step aborts the deploy;
/// rolling back a half-applied change set is left to CloudFormation.
pub async fn deploy(
    event: &ProvisioningEvent,
    kind: ChangeSetKind,
    config: &EdgeConfig,
    services: EdgeServices<'_>,
) -> Result<DeploymentOutcome, HandlerError> {
    let source_stack = StackArn::parse(&event.stack_id)?;
    let source = LambdaArn::parse(event.lambda_source_arn()?)?;
    let stack_name = companion_stack_name(&source_stack.name, &event.logical_resource_id);

    info!(source_arn = %source.arn, "Fetching source function configuration");
    let snapshot = services.functions.get_function(&source).await?;

    info!(code_location = %snapshot.code_location, "Downloading source code");
    let code = services
        .functions
        .download_code(&snapshot.code_location)
        .await?;

    let mut code_location = CodeLocation::for_function(
        &config.region,
        &config.code_bucket,
        &config.code_key_prefix,
        &source.name,
    );
    info!(
        region = %code_location.region,
        bucket = %code_location.bucket,
        key = %code_location.key,
        size = code.len(),
        "Uploading source code"
    );
    let version = services
        .code_store
        .put_object(&code_location, code, CODE_CONTENT_TYPE)
        .await?
        .ok_or_else(|| HandlerError::MissingObjectVersion {
            bucket: code_location.bucket.clone(),
        })?;
    code_location.version = Some(version.clone());
    info!(version = %version, "Source code uploaded");

    let request = change_set_request(
        &stack_name,
        &change_set_name(&stack_name, Utc::now().timestamp_millis()),
        kind,
        &snapshot,
        event.lambda_role_arn(),
        &code_location,
        &version,
    );
    let stacks = services.stacks;

    info!(
        stack_name = %stack_name,
        change_set = %request.change_set_name,
        kind = kind.as_str(),
        "Creating change set"
    );
    stacks.create_change_set(&request).await?;
    stacks
        .wait_for_change_set(&stack_name, &request.change_set_name)
        .await?;

    info!(change_set = %request.change_set_name, "Executing change set");
    stacks
        .execute_change_set(&stack_name, &request.change_set_name)
        .await?;

    let completion = kind.completion_state();
    info!(stack_name = %stack_name, state = %completion, "Waiting for stack");
    stacks.wait_for_stack(&stack_name, completion).await?;

    let outputs = stacks.stack_outputs(&stack_name).await?;
    info!(stack_name = %stack_name, outputs = outputs.len(), "Stack deployed");
    Ok(outputs)
}

fn change_set_request(
    stack_name: &str,
    change_set_name: &str,
    kind: ChangeSetKind,
    snapshot: &FunctionSnapshot,
    role_arn: &str,
    code_location: &CodeLocation,
    version: &str,
) -> ChangeSetRequest {
    let description = snapshot.description.clone().unwrap_or_default();

    ChangeSetRequest {
        stack_name: stack_name.to_string(),
        change_set_name: change_set_name.to_string(),
        kind,
        description: if description.is_empty() {
            DEFAULT_STACK_DESCRIPTION.to_string()
        } else {
            description.clone()
        },
        capabilities: STACK_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
        template_body: COMPANION_TEMPLATE.to_string(),
        parameters: vec![
            StackParameter::new("FunctionDescription", description),
            StackParameter::new("FunctionRuntime", &snapshot.runtime),
            StackParameter::new("FunctionHandler", &snapshot.handler),
            StackParameter::new("FunctionMemorySize", snapshot.memory_size.to_string()),
            StackParameter::new("FunctionTimeout", snapshot.timeout.to_string()),
            StackParameter::new("FunctionTracing", &snapshot.tracing_mode),
            StackParameter::new("FunctionRole", role_arn),
            StackParameter::new("CodeUriBucket", &code_location.bucket),
            StackParameter::new("CodeUriKey", &code_location.key),
            StackParameter::new("CodeUriVersion", version),
        ],
    }
}
