use thiserror::Error;

pub const ENV_PREFIX: &str = "GRADER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn missing(field_path: &str) -> Self {
        ConfigError::MissingEnvVar {
            env_var: to_env_var(field_path),
        }
    }
}

/// Environment variable that sets a settings key, e.g. `provider.api_key` -> `GRADER_PROVIDER__API_KEY`
pub fn to_env_var(field_path: &str) -> String {
    // deserialization errors only name the leaf field, so map the required ones back to their path
    let path = match field_path {
        "provider" | "type" => "provider.type",
        "api_key" => "provider.api_key",
        other => other,
    };
    format!("{}_{}", ENV_PREFIX, path.replace('.', "__").to_uppercase())
}
