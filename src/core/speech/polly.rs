//! Amazon Polly implementation of [`SpeechService`].
//!
//! # Authentication
//!
//! AWS credentials can be provided via:
//! 1. `aws_access_key_id` and `aws_secret_access_key` in the service configuration
//! 2. Environment variables: `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
//! 3. AWS credentials file (`~/.aws/credentials`)
//! 4. IAM role of the hosting platform (Lambda, ECS, EC2)

use std::collections::HashSet;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_polly::Client as PollyClient;
use aws_sdk_polly::config::Builder as PollyConfigBuilder;
use aws_sdk_polly::error::DisplayErrorContext;
use aws_sdk_polly::types::{Engine, LanguageCode, OutputFormat, Voice, VoiceId};
use bytes::Bytes;
use tracing::{debug, error};

use super::{SpeechInput, SpeechService, SynthesisTaskInfo, TaskStatus, VoiceDescriptor};
use crate::config::ServiceConfig;
use crate::errors::{SynthesisError, SynthesisResult};

fn upstream<E: std::error::Error>(operation: &str, e: E) -> SynthesisError {
    error!(operation = operation, error = %DisplayErrorContext(&e), "Polly API error");
    SynthesisError::Upstream(format!("Polly {} failed: {}", operation, DisplayErrorContext(&e)))
}

fn voice_from_sdk(voice: &Voice) -> Option<VoiceDescriptor> {
    Some(VoiceDescriptor {
        id: voice.id()?.as_str().to_string(),
        name: voice.name().map(str::to_string),
        language_code: voice.language_code()?.as_str().to_string(),
        engines: voice
            .supported_engines()
            .iter()
            .map(|engine| engine.as_str().to_string())
            .collect(),
    })
}

/// Speech service backed by Amazon Polly.
///
/// Asynchronous tasks write their output into `output_bucket`, under the key prefix
/// given by the engine.
#[derive(Debug, Clone)]
pub struct PollySpeechService {
    client: PollyClient,
    output_bucket: String,
}

impl PollySpeechService {
    pub fn new(client: PollyClient, output_bucket: impl Into<String>) -> Self {
        Self {
            client,
            output_bucket: output_bucket.into(),
        }
    }

    /// Build a Polly client for the configured region and credentials.
    pub async fn from_config(config: &ServiceConfig) -> Self {
        let region = Region::new(config.region.clone());

        let client = if let (Some(access_key), Some(secret_key)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                config.aws_session_token.clone(),
                None,
                "studycast",
            );
            let polly_config = PollyConfigBuilder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
                .build();
            PollyClient::from_conf(polly_config)
        } else {
            // Default credential chain (environment, profile, IAM role)
            let aws_config = aws_config::defaults(BehaviorVersion::latest())
                .region(region)
                .load()
                .await;
            PollyClient::new(&aws_config)
        };

        Self::new(client, config.media_bucket.clone())
    }
}

#[async_trait]
impl SpeechService for PollySpeechService {
    async fn supported_languages(&self) -> SynthesisResult<HashSet<String>> {
        let mut languages = HashSet::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_voices()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| upstream("DescribeVoices", e))?;

            languages.extend(
                response
                    .voices()
                    .iter()
                    .filter_map(|voice| voice.language_code())
                    .map(|code| code.as_str().to_string()),
            );

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(languages = languages.len(), "Loaded supported languages");
        Ok(languages)
    }

    async fn default_voice(&self, language_code: &str) -> SynthesisResult<Option<VoiceDescriptor>> {
        let response = self
            .client
            .describe_voices()
            .language_code(LanguageCode::from(language_code))
            .send()
            .await
            .map_err(|e| upstream("DescribeVoices", e))?;

        Ok(response.voices().iter().find_map(voice_from_sdk))
    }

    async fn synthesize(&self, input: SpeechInput<'_>) -> SynthesisResult<Bytes> {
        let response = self
            .client
            .synthesize_speech()
            .text(input.text)
            .output_format(OutputFormat::from(input.format.as_str()))
            .language_code(LanguageCode::from(input.language_code))
            .voice_id(VoiceId::from(input.voice.id.as_str()))
            .set_engine(input.voice.default_engine().map(Engine::from))
            .send()
            .await
            .map_err(|e| upstream("SynthesizeSpeech", e))?;

        let audio = response.audio_stream.collect().await.map_err(|e| {
            error!(error = %e, "Failed to read audio stream");
            SynthesisError::Upstream(format!("Failed to read audio stream: {}", e))
        })?;

        let bytes = audio.into_bytes();
        debug!(audio_bytes = bytes.len(), "Successfully synthesized audio");
        Ok(bytes)
    }

    async fn start_synthesis_task(
        &self,
        input: SpeechInput<'_>,
        output_key_prefix: &str,
    ) -> SynthesisResult<String> {
        let response = self
            .client
            .start_speech_synthesis_task()
            .text(input.text)
            .output_format(OutputFormat::from(input.format.as_str()))
            .language_code(LanguageCode::from(input.language_code))
            .voice_id(VoiceId::from(input.voice.id.as_str()))
            .set_engine(input.voice.default_engine().map(Engine::from))
            .output_s3_bucket_name(&self.output_bucket)
            .output_s3_key_prefix(output_key_prefix)
            .send()
            .await
            .map_err(|e| upstream("StartSpeechSynthesisTask", e))?;

        response
            .synthesis_task()
            .and_then(|task| task.task_id())
            .map(str::to_string)
            .ok_or(SynthesisError::MissingTaskId)
    }

    async fn synthesis_task(&self, task_id: &str) -> SynthesisResult<SynthesisTaskInfo> {
        let response = self
            .client
            .get_speech_synthesis_task()
            .task_id(task_id)
            .send()
            .await
            .map_err(|e| upstream("GetSpeechSynthesisTask", e))?;

        let task = response.synthesis_task().ok_or_else(|| {
            SynthesisError::Upstream(format!("No synthesis task returned for {}", task_id))
        })?;

        let status_name = task.task_status().map(|s| s.as_str()).unwrap_or_default();
        let status = TaskStatus::parse(status_name).ok_or_else(|| {
            SynthesisError::Upstream(format!(
                "Unknown synthesis task status '{}' for {}",
                status_name, task_id
            ))
        })?;

        Ok(SynthesisTaskInfo {
            task_id: task_id.to_string(),
            status,
            output_uri: task.output_uri().map(str::to_string),
            reason: task.task_status_reason().map(str::to_string),
        })
    }
}
