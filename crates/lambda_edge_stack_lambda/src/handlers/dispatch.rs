//! Entry point for one custom resource request.
//!
//! Every request is answered exactly once: workflow errors are caught here and
//! reported as FAILED, and only a delivery failure escapes to the caller.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::response_sink::ResponseSink;
use crate::config::EdgeConfig;
use crate::error::{HandlerError, SignalError};
use crate::handlers::deploy::deploy;
use crate::handlers::signal::{send_response, DispatchReceipt, ProvisioningOutcome};
use crate::handlers::teardown::teardown;
use crate::handlers::{EdgeServices, InvocationContext};
use crate::runtime::contract::{
    physical_resource_id, ContractError, ProvisioningEvent, ResponseTarget,
};
use crate::runtime::naming::ChangeSetKind;
use crate::runtime::response::ResponseData;

/// Parses the raw invocation payload and dispatches it.
///
/// A payload that does not parse is answered FAILED at whatever `ResponseURL`
/// it carries, without running either workflow.
pub async fn dispatch_payload(
    payload: Value,
    invocation: &InvocationContext,
    env: &dyn Fn(&str) -> Option<String>,
    services: EdgeServices<'_>,
    sink: &dyn ResponseSink,
) -> Result<DispatchReceipt, SignalError> {
    let parse_error = match ProvisioningEvent::deserialize(&payload) {
        Ok(event) => return dispatch(&event, invocation, env, services, sink).await,
        Err(parse_error) => parse_error,
    };

    let failure = ContractError::MalformedEvent(parse_error.to_string());
    error!(error = %failure, "Custom resource request failed");
    let Some(target) = ResponseTarget::from_raw(&payload) else {
        return Err(SignalError::Unanswerable(failure));
    };

    let outcome = ProvisioningOutcome::Failed {
        physical_resource_id: payload
            .get("PhysicalResourceId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| invocation.log_stream_name.clone()),
        message: failure.to_string(),
    };
    send_response(sink, &target, &outcome, &invocation.log_stream_name).await
}

pub async fn dispatch(
    event: &ProvisioningEvent,
    invocation: &InvocationContext,
    env: &dyn Fn(&str) -> Option<String>,
    services: EdgeServices<'_>,
    sink: &dyn ResponseSink,
) -> Result<DispatchReceipt, SignalError> {
    info!(
        request_type = %event.request_type,
        logical_resource_id = %event.logical_resource_id,
        request_id = %event.request_id,
        "Received custom resource request"
    );

    let outcome = match provision(event, invocation, env, services).await {
        Ok((physical_resource_id, data)) => ProvisioningOutcome::Succeeded {
            physical_resource_id,
            data,
        },
        Err(failure) => {
            error!(
                request_type = %event.request_type,
                code = failure.code(),
                error = %failure,
                "Custom resource request failed"
            );
            ProvisioningOutcome::Failed {
                // Without a usable id the log stream still points operators at the failure.
                physical_resource_id: physical_resource_id(event)
                    .unwrap_or_else(|_| invocation.log_stream_name.clone()),
                message: failure.to_string(),
            }
        }
    };

    send_response(
        sink,
        &event.response_target(),
        &outcome,
        &invocation.log_stream_name,
    )
    .await
}

async fn provision(
    event: &ProvisioningEvent,
    invocation: &InvocationContext,
    env: &dyn Fn(&str) -> Option<String>,
    services: EdgeServices<'_>,
) -> Result<(String, ResponseData), HandlerError> {
    event.validate_resource_type()?;
    let physical_resource_id = physical_resource_id(event)?;
    let config = EdgeConfig::from_lookup(env)?;

    let data = match ChangeSetKind::for_request(event.request_type) {
        Some(kind) => ResponseData::from(deploy(event, kind, &config, services).await?),
        None => {
            teardown(event, &config, services, invocation).await?;
            ResponseData::empty()
        }
    };

    Ok((physical_resource_id, data))
}
