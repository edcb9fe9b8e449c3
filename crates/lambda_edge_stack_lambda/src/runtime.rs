pub use lambda_edge_stack_core::{arn, contract, naming, response, retry};
