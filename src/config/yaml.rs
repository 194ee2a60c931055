use serde::Deserialize;
use std::path::Path;

use super::ServiceConfig;
use crate::core::speech::AudioFormat;
use crate::errors::{ConfigError, ConfigResult};

/// Complete YAML configuration structure
///
/// All fields are optional; values present here override the environment.
///
/// # Example YAML structure
/// ```yaml
/// aws:
///   region: "us-west-2"
///   access_key_id: "access-key"
///   secret_access_key: "secret-key"
///
/// storage:
///   media_bucket: "study-media"
///   endpoint: "http://localhost:9000"
///
/// synthesis:
///   audio_format: "mp3"
///   sync_max_length: 3000
///   async_max_length: 180000
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub aws: Option<AwsYaml>,
    pub storage: Option<StorageYaml>,
    pub synthesis: Option<SynthesisYaml>,
}

/// AWS settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AwsYaml {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

/// Result store settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub media_bucket: Option<String>,
    pub endpoint: Option<String>,
}

/// Speech synthesis settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    pub audio_format: Option<String>,
    pub sync_max_length: Option<usize>,
    pub async_max_length: Option<usize>,
}

impl YamlConfig {
    /// Load YAML configuration from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let file_error = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        serde_yaml::from_str(&contents).map_err(|e| file_error(format!("invalid YAML: {e}")))
    }

    /// Override `config` with every value present in this file.
    pub fn apply(self, config: &mut ServiceConfig) {
        if let Some(aws) = self.aws {
            if let Some(region) = aws.region {
                config.region = region;
            }
            if aws.access_key_id.is_some() {
                config.aws_access_key_id = aws.access_key_id;
            }
            if aws.secret_access_key.is_some() {
                config.aws_secret_access_key = aws.secret_access_key;
            }
            if aws.session_token.is_some() {
                config.aws_session_token = aws.session_token;
            }
        }

        if let Some(storage) = self.storage {
            if let Some(bucket) = storage.media_bucket {
                config.media_bucket = bucket;
            }
            if storage.endpoint.is_some() {
                config.s3_endpoint = storage.endpoint;
            }
        }

        if let Some(synthesis) = self.synthesis {
            if let Some(format) = synthesis.audio_format {
                config.audio_format = AudioFormat::from_str_or_default(&format);
            }
            if let Some(max) = synthesis.sync_max_length {
                config.synthesis_limits.sync_max_length = max;
            }
            if let Some(max) = synthesis.async_max_length {
                config.synthesis_limits.async_max_length = max;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
aws:
  region: "us-west-2"
  access_key_id: "access"
  secret_access_key: "secret"

storage:
  media_bucket: "study-media"
  endpoint: "http://localhost:9000"

synthesis:
  audio_format: "pcm"
  sync_max_length: 2000
  async_max_length: 100000
"#;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, yaml).unwrap();

        let yaml_config = YamlConfig::from_file(&path).unwrap();
        let mut config = ServiceConfig::default();
        yaml_config.apply(&mut config);

        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.media_bucket, "study-media");
        assert_eq!(config.s3_endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.aws_access_key_id.as_deref(), Some("access"));
        assert_eq!(config.aws_secret_access_key.as_deref(), Some("secret"));
        assert_eq!(config.audio_format, AudioFormat::Pcm);
        assert_eq!(config.synthesis_limits.sync_max_length, 2000);
        assert_eq!(config.synthesis_limits.async_max_length, 100000);
    }

    #[test]
    fn test_yaml_config_partial_keeps_base() {
        let yaml = r#"
storage:
  media_bucket: "only-bucket"
"#;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, yaml).unwrap();

        let mut config = ServiceConfig {
            region: "ap-south-1".to_string(),
            ..Default::default()
        };
        YamlConfig::from_file(&path).unwrap().apply(&mut config);

        assert_eq!(config.region, "ap-south-1");
        assert_eq!(config.media_bucket, "only-bucket");
        assert!(config.s3_endpoint.is_none());
    }

    #[test]
    fn test_yaml_config_missing_file() {
        let err = YamlConfig::from_file(Path::new("/nonexistent/studycast.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }

    #[test]
    fn test_yaml_config_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "synthesis: [not, a, map").unwrap();

        let err = YamlConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }
}
