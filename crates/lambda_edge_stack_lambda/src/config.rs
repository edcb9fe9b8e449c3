use thiserror::Error;

pub const CODE_BUCKET_VAR: &str = "LAMBDA_EDGE_CODE_BUCKET";
pub const CODE_KEY_PREFIX_VAR: &str = "LAMBDA_EDGE_CODE_KEY_PREFIX";
pub const EDGE_REGION_VAR: &str = "LAMBDA_EDGE_REGION";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Environment variable \"{0}\" is null or undefined")]
    MissingVariable(&'static str),
}

/// Where republished code goes and which region hosts the companion stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeConfig {
    pub code_bucket: String,
    pub code_key_prefix: String,
    pub region: String,
}

impl EdgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// An empty prefix is valid: keys are then the bare function name.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require =
            |key: &'static str| lookup(key).ok_or(ConfigError::MissingVariable(key));

        Ok(Self {
            code_bucket: require(CODE_BUCKET_VAR)?,
            code_key_prefix: require(CODE_KEY_PREFIX_VAR)?,
            region: require(EDGE_REGION_VAR)?,
        })
    }
}
