//! In-memory collaborators and canned events for tests.
//!
//! The fakes record every call so tests can assert on ordering and side
//! effects without talking to AWS.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::code_store::CodeStore;
use crate::adapters::function_source::{FunctionSnapshot, FunctionSource};
use crate::adapters::response_sink::ResponseSink;
use crate::adapters::stack_engine::{ChangeSetRequest, StackEngine};
use crate::config::{EdgeConfig, CODE_BUCKET_VAR, CODE_KEY_PREFIX_VAR, EDGE_REGION_VAR};
use crate::error::AdapterError;
use crate::runtime::arn::LambdaArn;
use crate::runtime::contract::{
    physical_resource_id, EdgeParameters, ProvisioningEvent, RequestType, ResourceProperties,
    LAMBDA_EDGE_RESOURCE_TYPE,
};
use crate::runtime::naming::{CodeLocation, StackWaitState};

pub const TEST_STACK_ID: &str =
    "arn:aws:cloudformation:us-east-1:123456789012:stack/website/2f7f3a10-6f0e-11ef-9a4b-0a1b2c3d4e5f";
pub const TEST_SOURCE_ARN: &str = "arn:aws:lambda:us-east-1:123:function:foo";
pub const TEST_RESPONSE_URL: &str =
    "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/signed";
pub const TEST_CODE: &[u8] = b"PK\x03\x04edge-function";

/// A request on the `EdgeAuth` resource of the `website` stack.
///
/// Update and Delete carry the physical id a previous Create reported.
pub fn sample_event(request_type: RequestType) -> ProvisioningEvent {
    let mut event = ProvisioningEvent {
        request_type: RequestType::Create,
        response_url: TEST_RESPONSE_URL.to_string(),
        stack_id: TEST_STACK_ID.to_string(),
        request_id: "0b1f6a52-1e4c-4d0e-9d1b-6b0e3c7d2a11".to_string(),
        resource_type: LAMBDA_EDGE_RESOURCE_TYPE.to_string(),
        logical_resource_id: "EdgeAuth".to_string(),
        physical_resource_id: None,
        resource_properties: ResourceProperties {
            parameters: EdgeParameters {
                lambda_source_arn: Some(TEST_SOURCE_ARN.to_string()),
                lambda_role_arn: None,
            },
            extra: serde_json::Map::new(),
        },
        old_resource_properties: None,
    };

    if request_type != RequestType::Create {
        event.physical_resource_id =
            Some(physical_resource_id(&event).expect("create event yields a physical id"));
        event.request_type = request_type;
        event.request_id = format!("{}-{}", event.request_id, request_type.as_str());
    }
    event
}

pub fn edge_config() -> EdgeConfig {
    EdgeConfig {
        code_bucket: "edge-code".to_string(),
        code_key_prefix: "lambda-edge/".to_string(),
        region: "us-east-1".to_string(),
    }
}

/// Environment lookup resolving to [`edge_config`].
pub fn edge_env(key: &str) -> Option<String> {
    let config = edge_config();
    match key {
        CODE_BUCKET_VAR => Some(config.code_bucket),
        CODE_KEY_PREFIX_VAR => Some(config.code_key_prefix),
        EDGE_REGION_VAR => Some(config.region),
        _ => None,
    }
}

/// Waiter failure reported while edge replicas are still being retracted.
pub fn not_ready() -> AdapterError {
    AdapterError::ResourceNotReady {
        message: "waiter reached failure state DELETE_FAILED".to_string(),
    }
}

pub fn sample_snapshot() -> FunctionSnapshot {
    FunctionSnapshot {
        description: Some("Adds security headers".to_string()),
        runtime: "nodejs20.x".to_string(),
        handler: "index.handler".to_string(),
        memory_size: 128,
        timeout: 5,
        tracing_mode: "PassThrough".to_string(),
        code_location: "https://awslambda-us-east-1-tasks.s3.amazonaws.com/snapshots/foo".to_string(),
    }
}

pub struct FakeFunctionSource {
    pub snapshot: FunctionSnapshot,
    pub code: Vec<u8>,
    pub failure: Option<AdapterError>,
    requests: Mutex<Vec<String>>,
}

impl FakeFunctionSource {
    pub fn new() -> Self {
        Self {
            snapshot: sample_snapshot(),
            code: TEST_CODE.to_vec(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AdapterError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    pub fn code(&self) -> Vec<u8> {
        self.code.clone()
    }

    /// Function names requested, with the qualifier appended when present.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Default for FakeFunctionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunctionSource for FakeFunctionSource {
    async fn get_function(&self, target: &LambdaArn) -> Result<FunctionSnapshot, AdapterError> {
        let request = match &target.version {
            Some(version) => format!("{}:{version}", target.name),
            None => target.name.clone(),
        };
        self.requests.lock().expect("requests lock").push(request);

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.snapshot.clone()),
        }
    }

    async fn download_code(&self, _code_location: &str) -> Result<Vec<u8>, AdapterError> {
        Ok(self.code.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub version: Option<String>,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Object store that hands out `v1`, `v2`, ... for every put on a versioned bucket.
pub struct VersionedCodeStore {
    versioning_enabled: bool,
    delete_failure: Option<AdapterError>,
    puts: Mutex<Vec<StoredObject>>,
    deletes: Mutex<Vec<(String, String)>>,
}

impl VersionedCodeStore {
    pub fn new() -> Self {
        Self {
            versioning_enabled: true,
            delete_failure: None,
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn unversioned() -> Self {
        Self {
            versioning_enabled: false,
            ..Self::new()
        }
    }

    pub fn failing_delete(error: AdapterError) -> Self {
        Self {
            delete_failure: Some(error),
            ..Self::new()
        }
    }

    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().expect("puts lock").clone()
    }

    /// `(bucket, key)` of every delete request.
    pub fn deletes(&self) -> Vec<(String, String)> {
        self.deletes.lock().expect("deletes lock").clone()
    }
}

impl Default for VersionedCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeStore for VersionedCodeStore {
    async fn put_object(
        &self,
        location: &CodeLocation,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<Option<String>, AdapterError> {
        let mut puts = self.puts.lock().expect("puts lock");
        let version = self
            .versioning_enabled
            .then(|| format!("v{}", puts.len() + 1));
        puts.push(StoredObject {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
            version: version.clone(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(version)
    }

    async fn delete_object(&self, location: &CodeLocation) -> Result<(), AdapterError> {
        if let Some(error) = &self.delete_failure {
            return Err(error.clone());
        }
        self.deletes
            .lock()
            .expect("deletes lock")
            .push((location.bucket.clone(), location.key.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCall {
    CreateChangeSet(String),
    WaitForChangeSet(String),
    ExecuteChangeSet(String),
    WaitForStack(String, StackWaitState),
    DescribeOutputs(String),
    DeleteStack(String),
}

/// Stack engine with a call journal, scripted delete waits and per-operation failures.
///
/// Failures are keyed by API operation name (`CreateChangeSet`, `WaitForStack`,
/// `DescribeStacks`, ...) and apply to every call of that operation.
pub struct ScriptedStackEngine {
    outputs: BTreeMap<String, String>,
    calls: Mutex<Vec<StackCall>>,
    change_sets: Mutex<Vec<ChangeSetRequest>>,
    delete_waits: Mutex<VecDeque<Result<(), AdapterError>>>,
    failures: Mutex<HashMap<&'static str, AdapterError>>,
}

impl ScriptedStackEngine {
    pub fn new() -> Self {
        Self {
            outputs: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
            change_sets: Mutex::new(Vec::new()),
            delete_waits: Mutex::new(VecDeque::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_outputs<'a>(mut self, outputs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.outputs = outputs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self
    }

    /// Results of successive delete waits; once exhausted, waits succeed.
    pub fn script_delete_waits(&self, results: Vec<Result<(), AdapterError>>) {
        self.delete_waits
            .lock()
            .expect("delete waits lock")
            .extend(results);
    }

    pub fn fail(&self, operation: &'static str, error: AdapterError) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(operation, error);
    }

    pub fn calls(&self) -> Vec<StackCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn change_sets(&self) -> Vec<ChangeSetRequest> {
        self.change_sets.lock().expect("change sets lock").clone()
    }

    fn record(&self, operation: &'static str, call: StackCall) -> Result<(), AdapterError> {
        self.calls.lock().expect("calls lock").push(call);
        match self.failures.lock().expect("failures lock").get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Default for ScriptedStackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StackEngine for ScriptedStackEngine {
    async fn create_change_set(&self, request: &ChangeSetRequest) -> Result<(), AdapterError> {
        self.change_sets
            .lock()
            .expect("change sets lock")
            .push(request.clone());
        self.record(
            "CreateChangeSet",
            StackCall::CreateChangeSet(request.change_set_name.clone()),
        )
    }

    async fn wait_for_change_set(
        &self,
        _stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), AdapterError> {
        self.record(
            "WaitForChangeSet",
            StackCall::WaitForChangeSet(change_set_name.to_string()),
        )
    }

    async fn execute_change_set(
        &self,
        _stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), AdapterError> {
        self.record(
            "ExecuteChangeSet",
            StackCall::ExecuteChangeSet(change_set_name.to_string()),
        )
    }

    async fn wait_for_stack(
        &self,
        stack_name: &str,
        state: StackWaitState,
    ) -> Result<(), AdapterError> {
        self.record(
            "WaitForStack",
            StackCall::WaitForStack(stack_name.to_string(), state),
        )?;
        if state == StackWaitState::DeleteComplete {
            if let Some(result) = self.delete_waits.lock().expect("delete waits lock").pop_front() {
                return result;
            }
        }
        Ok(())
    }

    async fn stack_outputs(
        &self,
        stack_name: &str,
    ) -> Result<BTreeMap<String, String>, AdapterError> {
        self.record(
            "DescribeStacks",
            StackCall::DescribeOutputs(stack_name.to_string()),
        )?;
        Ok(self.outputs.clone())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), AdapterError> {
        self.record("DeleteStack", StackCall::DeleteStack(stack_name.to_string()))
    }
}

/// Captures every callback body as parsed JSON.
pub struct RecordingResponseSink {
    status: u16,
    failure: Option<AdapterError>,
    deliveries: Mutex<Vec<(String, Value)>>,
}

impl RecordingResponseSink {
    pub fn new() -> Self {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            failure: None,
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AdapterError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    /// `(response_url, body)` of every delivery.
    pub fn deliveries(&self) -> Vec<(String, Value)> {
        self.deliveries.lock().expect("deliveries lock").clone()
    }

    pub fn last_body(&self) -> Value {
        self.deliveries()
            .pop()
            .map(|(_, body)| body)
            .expect("at least one delivery")
    }
}

impl Default for RecordingResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseSink for RecordingResponseSink {
    async fn put_response(&self, response_url: &str, body: Vec<u8>) -> Result<u16, AdapterError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let body: Value = serde_json::from_slice(&body).expect("response body is JSON");
        self.deliveries
            .lock()
            .expect("deliveries lock")
            .push((response_url.to_string(), body));
        Ok(self.status)
    }
}
