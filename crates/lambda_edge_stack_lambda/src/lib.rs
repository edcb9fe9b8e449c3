//! AWS-oriented adapters and handlers for the `Custom::LambdaEdge` resource.
//!
//! This crate owns runtime integration details (the Lambda handler, AWS
//! control-plane and storage adapters, callback delivery) and exposes the
//! domain primitives of `lambda_edge_stack_core` through the `runtime` module.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod runtime;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
