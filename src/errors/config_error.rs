use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required setting not provided by YAML or environment
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// Setting present but unparsable or out of range
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// YAML configuration file could not be read or parsed
    #[error("Failed to load config file {path}: {reason}")]
    File { path: String, reason: String },
}
