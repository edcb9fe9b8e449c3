use tracing::{info, warn};

use crate::adapters::response_sink::ResponseSink;
use crate::error::SignalError;
use crate::runtime::contract::{log_stream_reason, ResponseBody, ResponseStatus, ResponseTarget};
use crate::runtime::response::{normalize_response_data, raw_response_data, ResponseData};

/// Final result of one provisioning request, ready to be reported.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisioningOutcome {
    Succeeded {
        physical_resource_id: String,
        data: ResponseData,
    },
    Failed {
        physical_resource_id: String,
        message: String,
    },
}

impl ProvisioningOutcome {
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Succeeded { .. } => ResponseStatus::Success,
            Self::Failed { .. } => ResponseStatus::Failed,
        }
    }

    pub fn physical_resource_id(&self) -> &str {
        match self {
            Self::Succeeded {
                physical_resource_id,
                ..
            }
            | Self::Failed {
                physical_resource_id,
                ..
            } => physical_resource_id,
        }
    }
}

/// What was reported back to CloudFormation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    pub http_status: u16,
}

pub fn response_body(
    target: &ResponseTarget,
    outcome: &ProvisioningOutcome,
    log_stream_name: &str,
) -> ResponseBody {
    let (reason, data) = match outcome {
        ProvisioningOutcome::Succeeded { data, .. } => {
            (log_stream_reason(log_stream_name), normalize_response_data(data))
        }
        ProvisioningOutcome::Failed { message, .. } => (
            format!("{message}. {}", log_stream_reason(log_stream_name)),
            raw_response_data(&ResponseData::error(message.clone())),
        ),
    };

    ResponseBody {
        status: outcome.status(),
        reason,
        physical_resource_id: outcome.physical_resource_id().to_string(),
        stack_id: target.stack_id.clone(),
        request_id: target.request_id.clone(),
        logical_resource_id: target.logical_resource_id.clone(),
        no_echo: false,
        data,
    }
}

/// Serializes the outcome and PUTs it to the request's `ResponseURL`.
///
/// A non-2xx status is logged but not treated as an error: the body was
/// delivered and CloudFormation owns the rest.
pub async fn send_response(
    sink: &dyn ResponseSink,
    target: &ResponseTarget,
    outcome: &ProvisioningOutcome,
    log_stream_name: &str,
) -> Result<DispatchReceipt, SignalError> {
    let body = response_body(target, outcome, log_stream_name);
    let payload = serde_json::to_vec(&body)?;

    info!(
        status = ?body.status,
        physical_resource_id = %body.physical_resource_id,
        size = payload.len(),
        "Sending custom resource response"
    );
    let http_status = sink.put_response(&target.response_url, payload).await?;
    if (200..300).contains(&http_status) {
        info!(http_status, "Custom resource response delivered");
    } else {
        warn!(http_status, "Custom resource response was not accepted");
    }

    Ok(DispatchReceipt {
        status: body.status,
        physical_resource_id: body.physical_resource_id,
        http_status,
    })
}
