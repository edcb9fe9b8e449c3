//! Shared Lambda@Edge custom resource domain primitives.
//!
//! This crate owns the deterministic parts of the companion-stack lifecycle:
//! ARN grammars, the CloudFormation request/response contract, resource
//! naming and the teardown retry policy. It intentionally excludes AWS SDK and
//! Lambda runtime concerns.

pub mod arn;
pub mod contract;
pub mod naming;
pub mod response;
pub mod retry;
