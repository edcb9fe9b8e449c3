pub mod aws;
pub mod code_store;
pub mod function_source;
pub mod response_sink;
pub mod stack_engine;
