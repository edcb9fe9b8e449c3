use crate::contract::RequestType;

/// Content type the Lambda service needs to unpack the republished code.
pub const CODE_CONTENT_TYPE: &str = "application/zip";

/// Where the republished code package lives in the edge region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocation {
    pub region: String,
    pub bucket: String,
    pub key: String,
    pub version: Option<String>,
}

impl CodeLocation {
    pub fn for_function(region: &str, bucket: &str, key_prefix: &str, function_name: &str) -> Self {
        Self {
            region: region.to_string(),
            bucket: bucket.to_string(),
            key: code_object_key(key_prefix, function_name),
            version: None,
        }
    }
}

pub fn code_object_key(key_prefix: &str, function_name: &str) -> String {
    format!("{key_prefix}{function_name}")
}

pub fn companion_stack_name(source_stack_name: &str, logical_resource_id: &str) -> String {
    format!("{source_stack_name}-{logical_resource_id}")
}

/// Change set names are suffixed with the epoch so repeated attempts never collide.
pub fn change_set_name(stack_name: &str, epoch_millis: i64) -> String {
    format!("{stack_name}-{epoch_millis}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetKind {
    Create,
    Update,
}

impl ChangeSetKind {
    pub fn for_request(request_type: RequestType) -> Option<Self> {
        match request_type {
            RequestType::Create => Some(Self::Create),
            RequestType::Update => Some(Self::Update),
            RequestType::Delete => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
        }
    }

    /// Terminal stack state to wait for once the change set is executed.
    pub fn completion_state(self) -> StackWaitState {
        match self {
            Self::Create => StackWaitState::CreateComplete,
            Self::Update => StackWaitState::UpdateComplete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackWaitState {
    CreateComplete,
    UpdateComplete,
    DeleteComplete,
}

impl StackWaitState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateComplete => "stack-create-complete",
            Self::UpdateComplete => "stack-update-complete",
            Self::DeleteComplete => "stack-delete-complete",
        }
    }
}

impl std::fmt::Display for StackWaitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_stack_name_joins_source_stack_and_logical_id() {
        assert_eq!(companion_stack_name("website", "EdgeAuth"), "website-EdgeAuth");
    }

    #[test]
    fn code_key_is_prefix_plus_function_name() {
        let location = CodeLocation::for_function("us-east-1", "edge-code", "lambda-edge/", "foo");

        assert_eq!(location.key, "lambda-edge/foo");
        assert_eq!(location.bucket, "edge-code");
        assert_eq!(location.version, None);
        assert_eq!(code_object_key("", "foo"), "foo");
    }

    #[test]
    fn change_set_name_carries_epoch_suffix() {
        assert_eq!(
            change_set_name("website-EdgeAuth", 1_760_000_000_000),
            "website-EdgeAuth-1760000000000"
        );
    }

    #[test]
    fn change_set_kind_follows_request_type() {
        let create = ChangeSetKind::for_request(RequestType::Create).expect("create kind");
        let update = ChangeSetKind::for_request(RequestType::Update).expect("update kind");

        assert_eq!(create.as_str(), "CREATE");
        assert_eq!(create.completion_state(), StackWaitState::CreateComplete);
        assert_eq!(update.as_str(), "UPDATE");
        assert_eq!(update.completion_state(), StackWaitState::UpdateComplete);
        assert_eq!(ChangeSetKind::for_request(RequestType::Delete), None);
    }
}
