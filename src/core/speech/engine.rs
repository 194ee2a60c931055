//! Synthesis decision engine.

use std::sync::Arc;

use tracing::{debug, info};

use super::{AudioFormat, SpeechInput, SpeechService, SynthesisOutcome};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::store::ResultStore;

/// Longest text (exclusive, in characters) synthesized synchronously.
///
/// The synchronous API accepts more than this, but longer texts do not finish within
/// the caller's response-time budget.
pub const SYNTHESIZE_MAX_LENGTH: usize = 3000;

/// Longest text (exclusive, in characters) accepted by an asynchronous synthesis task.
pub const ASYNC_SYNTHESIZE_MAX_LENGTH: usize = 180_000;

/// Length thresholds used for mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisLimits {
    pub sync_max_length: usize,
    pub async_max_length: usize,
}

impl Default for SynthesisLimits {
    fn default() -> Self {
        Self {
            sync_max_length: SYNTHESIZE_MAX_LENGTH,
            async_max_length: ASYNC_SYNTHESIZE_MAX_LENGTH,
        }
    }
}

/// One narration request.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    /// Where the audio lives (sync) or the prefix the task writes under (async).
    pub audio_key: &'a str,
    pub text: &'a str,
    pub format: AudioFormat,
    pub language_code: &'a str,
    /// Skip the synchronous path. Set when the narrated text was itself a cache hit,
    /// which means an earlier attempt most likely ran out of time.
    pub force_async: bool,
}

/// Decides between reusing stored audio, synchronous and asynchronous synthesis.
#[derive(Clone)]
pub struct SynthesisEngine {
    store: Arc<dyn ResultStore>,
    speech: Arc<dyn SpeechService>,
    limits: SynthesisLimits,
}

impl SynthesisEngine {
    pub fn new(store: Arc<dyn ResultStore>, speech: Arc<dyn SpeechService>) -> Self {
        Self {
            store,
            speech,
            limits: SynthesisLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SynthesisLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Return stored audio for `request.audio_key`, or synthesize it.
    ///
    /// Speech service failures are returned to the caller unchanged; callers are
    /// expected to treat narration as optional.
    pub async fn get_or_synthesize(
        &self,
        request: SynthesisRequest<'_>,
    ) -> SynthesisResult<SynthesisOutcome> {
        if self.store.exists(request.audio_key).await? {
            debug!(audio_key = %request.audio_key, "Audio already stored");
            return Ok(SynthesisOutcome::Audio {
                audio_key: request.audio_key.to_string(),
            });
        }

        self.synthesize(request).await.inspect_err(|e| {
            debug!("Error synthesizing speech: {}", e);
        })
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> SynthesisResult<SynthesisOutcome> {
        let languages = self.speech.supported_languages().await?;
        if !languages.contains(request.language_code) {
            return Err(SynthesisError::UnsupportedLanguage(
                request.language_code.to_string(),
            ));
        }

        let voice = self
            .speech
            .default_voice(request.language_code)
            .await?
            .ok_or_else(|| SynthesisError::NoVoiceAvailable(request.language_code.to_string()))?;

        let input = SpeechInput {
            text: request.text,
            format: request.format,
            language_code: request.language_code,
            voice: &voice,
        };
        let text_length = request.text.chars().count();

        if text_length < self.limits.sync_max_length && !request.force_async {
            debug!(
                audio_key = %request.audio_key,
                text_len = text_length,
                voice = %voice.id,
                "Synthesizing speech synchronously"
            );
            let audio = self.speech.synthesize(input).await?;
            if audio.is_empty() {
                return Err(SynthesisError::MissingAudio);
            }
            let audio_key = self
                .store
                .put_bytes(request.audio_key, audio, request.format.mime_type())
                .await?;
            Ok(SynthesisOutcome::Audio { audio_key })
        } else if text_length < self.limits.async_max_length {
            let task_id = self
                .speech
                .start_synthesis_task(input, request.audio_key)
                .await?;
            info!(
                task_id = %task_id,
                text_len = text_length,
                forced = request.force_async,
                "Started asynchronous speech synthesis"
            );
            Ok(SynthesisOutcome::Task { task_id })
        } else {
            Err(SynthesisError::TextTooLong {
                length: text_length,
                max: self.limits.async_max_length,
            })
        }
    }
}
