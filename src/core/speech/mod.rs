//! Speech synthesis: service boundary, decision engine and task polling.
//!
//! The engine decides per call between three outcomes:
//!
//! - audio already stored under the requested key: return the key, no service call
//! - short text on a first request: synthesize synchronously, store the audio and
//!   return its key
//! - long text, or a repeated request: start an asynchronous synthesis task that
//!   writes under the key prefix, and return the task id for later polling
//!
//! # Architecture
//!
//! [`SpeechService`] is the seam to the managed speech backend. The production
//! implementation is [`PollySpeechService`] (Amazon Polly via the AWS SDK); tests
//! substitute an in-memory fake. Everything crossing the seam is decoded into the
//! typed structures below, so the engine never inspects raw service responses.

mod check_audio;
mod engine;
mod polly;


use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

pub use check_audio::{AudioStatus, check_audio};
pub use engine::{
    ASYNC_SYNTHESIZE_MAX_LENGTH, SYNTHESIZE_MAX_LENGTH, SynthesisEngine, SynthesisLimits,
    SynthesisRequest,
};
pub use polly::PollySpeechService;

use crate::errors::SynthesisResult;

// =============================================================================
// Audio Format
// =============================================================================

/// Audio output formats supported by the speech service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// MP3 format (default, compressed)
    #[default]
    Mp3,
    /// OGG Vorbis format (compressed)
    OggVorbis,
    /// PCM format (uncompressed, 16-bit signed little-endian)
    Pcm,
}

impl AudioFormat {
    /// Name used by the speech service API.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg_vorbis",
            Self::Pcm => "pcm",
        }
    }

    /// File extension of stored audio.
    #[inline]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg",
            Self::Pcm => "pcm",
        }
    }

    #[inline]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::OggVorbis => "audio/ogg",
            Self::Pcm => "audio/pcm",
        }
    }

    /// Parse from string, with fallback to Mp3.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mp3" | "mpeg" => Self::Mp3,
            "ogg_vorbis" | "ogg" | "vorbis" => Self::OggVorbis,
            "pcm" | "raw" => Self::Pcm,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Boundary types
// =============================================================================

/// A voice offered by the speech service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: Option<String>,
    pub language_code: String,
    /// Synthesis engines the voice supports, in service order.
    pub engines: Vec<String>,
}

impl VoiceDescriptor {
    /// Engine used for synthesis: the first one the voice supports.
    pub fn default_engine(&self) -> Option<&str> {
        self.engines.first().map(String::as_str)
    }
}

/// Result of a synthesis decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SynthesisOutcome {
    /// Audio is stored at this key.
    Audio { audio_key: String },
    /// Audio is being produced by an asynchronous task.
    Task { task_id: String },
}

impl SynthesisOutcome {
    pub fn audio_key(&self) -> Option<&str> {
        match self {
            Self::Audio { audio_key } => Some(audio_key),
            Self::Task { .. } => None,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Task { task_id } => Some(task_id),
            Self::Audio { .. } => None,
        }
    }
}

/// Lifecycle of an asynchronous synthesis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Parse the service's status name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "inprogress" | "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Snapshot of an asynchronous synthesis task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisTaskInfo {
    pub task_id: String,
    pub status: TaskStatus,
    /// Location of the audio once the task completes.
    pub output_uri: Option<String>,
    pub reason: Option<String>,
}

/// Text to be synthesized with a given voice.
#[derive(Debug, Clone, Copy)]
pub struct SpeechInput<'a> {
    pub text: &'a str,
    pub format: AudioFormat,
    pub language_code: &'a str,
    pub voice: &'a VoiceDescriptor,
}

// =============================================================================
// Speech service
// =============================================================================

/// Managed speech backend.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Language codes for which at least one voice exists.
    async fn supported_languages(&self) -> SynthesisResult<HashSet<String>>;

    /// First voice available for `language_code`, or `None`.
    async fn default_voice(&self, language_code: &str) -> SynthesisResult<Option<VoiceDescriptor>>;

    /// Synthesize `input` and return the complete audio.
    async fn synthesize(&self, input: SpeechInput<'_>) -> SynthesisResult<Bytes>;

    /// Start a task writing its audio under `output_key_prefix`; returns the task id.
    async fn start_synthesis_task(
        &self,
        input: SpeechInput<'_>,
        output_key_prefix: &str,
    ) -> SynthesisResult<String>;

    /// Current state of a task started with [`SpeechService::start_synthesis_task`].
    async fn synthesis_task(&self, task_id: &str) -> SynthesisResult<SynthesisTaskInfo>;
}
