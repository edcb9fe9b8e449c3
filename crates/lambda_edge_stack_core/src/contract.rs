use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const LAMBDA_EDGE_RESOURCE_TYPE: &str = "Custom::LambdaEdge";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters block of the custom resource properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeParameters {
    #[serde(rename = "LambdaSourceArn", default, skip_serializing_if = "Option::is_none")]
    pub lambda_source_arn: Option<String>,
    #[serde(rename = "LambdaRoleArn", default, skip_serializing_if = "Option::is_none")]
    pub lambda_role_arn: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceProperties {
    #[serde(rename = "Parameters", default)]
    pub parameters: EdgeParameters,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// CloudFormation custom resource request, as delivered to the handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisioningEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    /// Defaults to empty so a missing type is rejected as invalid, not unparseable.
    #[serde(default)]
    pub resource_type: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<ResourceProperties>,
}

impl ProvisioningEvent {
    pub fn response_target(&self) -> ResponseTarget {
        ResponseTarget {
            response_url: self.response_url.clone(),
            stack_id: self.stack_id.clone(),
            request_id: self.request_id.clone(),
            logical_resource_id: self.logical_resource_id.clone(),
        }
    }

    pub fn parameters(&self) -> &EdgeParameters {
        &self.resource_properties.parameters
    }

    pub fn lambda_source_arn(&self) -> Result<&str, ContractError> {
        self.parameters()
            .lambda_source_arn
            .as_deref()
            .ok_or(ContractError::MissingParameter("LambdaSourceArn"))
    }

    /// Role override passed to the companion stack; empty when unset.
    pub fn lambda_role_arn(&self) -> &str {
        self.parameters().lambda_role_arn.as_deref().unwrap_or("")
    }

    pub fn validate_resource_type(&self) -> Result<(), ContractError> {
        if self.resource_type == LAMBDA_EDGE_RESOURCE_TYPE {
            Ok(())
        } else {
            Err(ContractError::InvalidResourceType(self.resource_type.clone()))
        }
    }
}

/// Where a response goes and which request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTarget {
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl ResponseTarget {
    /// Salvages the addressing fields of a request that did not parse.
    ///
    /// Returns `None` without a string `ResponseURL`, since nothing can be
    /// reported then. Other identifiers fall back to empty strings.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let field = |name: &str| {
            raw.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(Self {
            response_url: raw.get("ResponseURL")?.as_str()?.to_string(),
            stack_id: field("StackId"),
            request_id: field("RequestId"),
            logical_resource_id: field("LogicalResourceId"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Invalid custom resource request: {0}")]
    MalformedEvent(String),
    #[error(
        "Resource type \"{0}\" is invalid, it should be \"{expected}\"",
        expected = LAMBDA_EDGE_RESOURCE_TYPE
    )]
    InvalidResourceType(String),
    #[error("Parameter LambdaSourceArn \"{0}\" must be a valid Lambda ARN")]
    InvalidLambdaArn(String),
    #[error("StackId \"{0}\" must be a valid CloudFormation stack ARN")]
    InvalidStackArn(String),
    #[error("Parameter {0} is required")]
    MissingParameter(&'static str),
    #[error("Physical resource ID should be set when action is \"{0}\"")]
    MissingPhysicalResourceId(RequestType),
}

/// Resolves the physical resource id reported back to CloudFormation.
///
/// Only a Create request may lack one; it is then derived from the stack id
/// and request id, which together identify the request on this resource.
pub fn physical_resource_id(event: &ProvisioningEvent) -> Result<String, ContractError> {
    if let Some(id) = &event.physical_resource_id {
        return Ok(id.clone());
    }

    if event.request_type != RequestType::Create {
        return Err(ContractError::MissingPhysicalResourceId(event.request_type));
    }

    let mut hasher = Sha256::new();
    hasher.update(event.stack_id.as_bytes());
    hasher.update(event.request_id.as_bytes());
    Ok(STANDARD.encode(hasher.finalize()))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body of the HTTPS PUT sent to the pre-signed `ResponseURL`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseBody {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: Value,
}

pub fn log_stream_reason(log_stream_name: &str) -> String {
    format!("See the details in CloudWatch Log Stream: {log_stream_name}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create_event_json() -> Value {
        json!({
            "RequestType": "Create",
            "ResponseURL": "https://cloudformation-custom-resource-response.s3.amazonaws.com/signed",
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/website/abc",
            "RequestId": "req-1",
            "ResourceType": "Custom::LambdaEdge",
            "LogicalResourceId": "EdgeAuth",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:provider",
                "Parameters": {
                    "LambdaSourceArn": "arn:aws:lambda:us-east-1:123:function:foo"
                }
            }
        })
    }

    #[test]
    fn deserializes_cloudformation_wire_names() {
        let event: ProvisioningEvent =
            serde_json::from_value(create_event_json()).expect("event should parse");

        assert_eq!(event.request_type, RequestType::Create);
        assert_eq!(event.logical_resource_id, "EdgeAuth");
        assert_eq!(event.physical_resource_id, None);
        assert_eq!(
            event.lambda_source_arn().expect("source arn"),
            "arn:aws:lambda:us-east-1:123:function:foo"
        );
        assert_eq!(event.lambda_role_arn(), "");
        assert!(event.resource_properties.extra.contains_key("ServiceToken"));
    }

    #[test]
    fn missing_parameters_are_reported_not_rejected_at_parse_time() {
        let mut raw = create_event_json();
        raw.as_object_mut()
            .expect("object")
            .remove("ResourceProperties");
        let event: ProvisioningEvent = serde_json::from_value(raw).expect("event should parse");

        assert_eq!(
            event.lambda_source_arn(),
            Err(ContractError::MissingParameter("LambdaSourceArn"))
        );
    }

    #[test]
    fn missing_resource_type_parses_and_is_rejected() {
        let mut raw = create_event_json();
        raw.as_object_mut().expect("object").remove("ResourceType");
        let event: ProvisioningEvent = serde_json::from_value(raw).expect("event should parse");

        assert_eq!(
            event.validate_resource_type(),
            Err(ContractError::InvalidResourceType(String::new()))
        );
    }

    #[test]
    fn response_target_is_salvaged_from_unparseable_requests() {
        let mut raw = create_event_json();
        raw["ResourceProperties"]["Parameters"]["LambdaSourceArn"] = json!(["a", "b"]);
        raw["RequestId"] = json!(42);
        assert!(serde_json::from_value::<ProvisioningEvent>(raw.clone()).is_err());

        let target = ResponseTarget::from_raw(&raw).expect("response url is present");

        assert_eq!(
            target,
            ResponseTarget {
                response_url:
                    "https://cloudformation-custom-resource-response.s3.amazonaws.com/signed"
                        .to_string(),
                stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/website/abc"
                    .to_string(),
                request_id: String::new(),
                logical_resource_id: "EdgeAuth".to_string(),
            }
        );
    }

    #[test]
    fn requests_without_a_response_url_cannot_be_answered() {
        let mut raw = create_event_json();
        raw["ResponseURL"] = Value::Null;

        assert_eq!(ResponseTarget::from_raw(&raw), None);
        assert_eq!(ResponseTarget::from_raw(&json!("not an object")), None);
    }

    #[test]
    fn rejects_foreign_resource_type() {
        let mut event: ProvisioningEvent =
            serde_json::from_value(create_event_json()).expect("event should parse");
        event.resource_type = "Custom::Other".to_string();

        let error = event.validate_resource_type().expect_err("should reject");
        assert_eq!(
            error.to_string(),
            "Resource type \"Custom::Other\" is invalid, it should be \"Custom::LambdaEdge\""
        );
    }

    #[test]
    fn derives_create_physical_id_from_stack_and_request() {
        let event: ProvisioningEvent =
            serde_json::from_value(create_event_json()).expect("event should parse");

        let first = physical_resource_id(&event).expect("create derives an id");
        let second = physical_resource_id(&event).expect("create derives an id");
        assert_eq!(first, second);

        let digest = Sha256::digest(
            "arn:aws:cloudformation:us-east-1:123456789012:stack/website/abcreq-1".as_bytes(),
        );
        assert_eq!(first, STANDARD.encode(digest));
    }

    #[test]
    fn existing_physical_id_wins() {
        let mut event: ProvisioningEvent =
            serde_json::from_value(create_event_json()).expect("event should parse");
        event.request_type = RequestType::Update;
        event.physical_resource_id = Some("existing-id".to_string());

        assert_eq!(physical_resource_id(&event).as_deref(), Ok("existing-id"));
    }

    #[test]
    fn update_and_delete_require_physical_id() {
        let mut event: ProvisioningEvent =
            serde_json::from_value(create_event_json()).expect("event should parse");

        for request_type in [RequestType::Update, RequestType::Delete] {
            event.request_type = request_type;
            assert_eq!(
                physical_resource_id(&event),
                Err(ContractError::MissingPhysicalResourceId(request_type))
            );
        }
    }

    #[test]
    fn response_body_uses_wire_names() {
        let body = ResponseBody {
            status: ResponseStatus::Failed,
            reason: log_stream_reason("2026/10/19/[$LATEST]abc"),
            physical_resource_id: "pid".to_string(),
            stack_id: "stack".to_string(),
            request_id: "req".to_string(),
            logical_resource_id: "EdgeAuth".to_string(),
            no_echo: false,
            data: json!({}),
        };

        let value = serde_json::to_value(&body).expect("body should serialize");
        assert_eq!(value["Status"], "FAILED");
        assert_eq!(value["NoEcho"], false);
        assert_eq!(value["PhysicalResourceId"], "pid");
        assert_eq!(
            value["Reason"],
            "See the details in CloudWatch Log Stream: 2026/10/19/[$LATEST]abc"
        );
    }
}
