//! Service configuration
//!
//! Configuration comes from environment variables (with `.env` support) and an
//! optional YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Example
//! ```rust,no_run
//! use studycast::config::ServiceConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServiceConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config = ServiceConfig::from_file(&PathBuf::from("studycast.yaml"))?;
//! println!("Media bucket: {}", config.media_bucket);
//! # Ok(())
//! # }
//! ```

mod yaml;

use std::path::Path;

pub use yaml::YamlConfig;

use crate::core::speech::{
    ASYNC_SYNTHESIZE_MAX_LENGTH, AudioFormat, SYNTHESIZE_MAX_LENGTH, SynthesisLimits,
};
use crate::errors::{ConfigError, ConfigResult};

pub const REGION_ENV: &str = "REGION";
pub const MEDIA_BUCKET_ENV: &str = "MEDIA_BUCKET";
pub const S3_ENDPOINT_ENV: &str = "S3_ENDPOINT";
pub const AUDIO_FORMAT_ENV: &str = "AUDIO_FORMAT";
pub const SYNTHESIZE_MAX_LENGTH_ENV: &str = "SYNTHESIZE_MAX_LENGTH";
pub const ASYNC_SYNTHESIZE_MAX_LENGTH_ENV: &str = "ASYNC_SYNTHESIZE_MAX_LENGTH";

pub const DEFAULT_REGION: &str = "us-east-1";

/// Service configuration shared by the store, the speech client and the engine.
#[derive(Clone)]
pub struct ServiceConfig {
    /// AWS region of the bucket and the speech service
    pub region: String,
    /// Bucket holding transcriptions, cached artifacts and audio
    pub media_bucket: String,
    /// Custom endpoint for S3-compatible storage
    pub s3_endpoint: Option<String>,

    // Explicit AWS credentials; the default chain is used when absent
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,

    /// Format of narrated audio
    pub audio_format: AudioFormat,
    /// Mode selection thresholds of the synthesis engine
    pub synthesis_limits: SynthesisLimits,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("region", &self.region)
            .field("media_bucket", &self.media_bucket)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "aws_session_token",
                &self.aws_session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("audio_format", &self.audio_format)
            .field("synthesis_limits", &self.synthesis_limits)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            media_bucket: String::new(),
            s3_endpoint: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            audio_format: AudioFormat::default(),
            synthesis_limits: SynthesisLimits::default(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_usize(name: &'static str) -> ConfigResult<Option<usize>> {
    env_string(name)
        .map(|raw| {
            raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("'{raw}' is not a positive integer: {e}"),
            })
        })
        .transpose()
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns an error if a numeric setting cannot be parsed or validation fails.
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self::env_base()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file on top of environment variables.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, a setting is invalid,
    /// or validation fails.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let yaml = YamlConfig::from_file(path)?;
        let mut config = Self::env_base()?;
        yaml.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn env_base() -> ConfigResult<Self> {
        let defaults = Self::default();
        let limits = SynthesisLimits {
            sync_max_length: env_usize(SYNTHESIZE_MAX_LENGTH_ENV)?
                .unwrap_or(SYNTHESIZE_MAX_LENGTH),
            async_max_length: env_usize(ASYNC_SYNTHESIZE_MAX_LENGTH_ENV)?
                .unwrap_or(ASYNC_SYNTHESIZE_MAX_LENGTH),
        };

        Ok(Self {
            region: env_string(REGION_ENV)
                .or_else(|| env_string("AWS_REGION"))
                .unwrap_or(defaults.region),
            media_bucket: env_string(MEDIA_BUCKET_ENV).unwrap_or_default(),
            s3_endpoint: env_string(S3_ENDPOINT_ENV),
            aws_access_key_id: env_string("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: env_string("AWS_SECRET_ACCESS_KEY"),
            aws_session_token: env_string("AWS_SESSION_TOKEN"),
            audio_format: env_string(AUDIO_FORMAT_ENV)
                .map(|f| AudioFormat::from_str_or_default(&f))
                .unwrap_or_default(),
            synthesis_limits: limits,
        })
    }

    /// Check required settings and cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.region.is_empty() {
            return Err(ConfigError::Missing(REGION_ENV));
        }
        if self.media_bucket.is_empty() {
            return Err(ConfigError::Missing(MEDIA_BUCKET_ENV));
        }
        let limits = self.synthesis_limits;
        if limits.sync_max_length == 0 {
            return Err(ConfigError::Invalid {
                name: SYNTHESIZE_MAX_LENGTH_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }
        if limits.sync_max_length >= limits.async_max_length {
            return Err(ConfigError::Invalid {
                name: ASYNC_SYNTHESIZE_MAX_LENGTH_ENV,
                reason: format!(
                    "must be greater than {} ({})",
                    SYNTHESIZE_MAX_LENGTH_ENV, limits.sync_max_length
                ),
            });
        }
        Ok(())
    }
}
