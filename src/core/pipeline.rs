//! Cache-then-narrate control flow used by the artifact handlers.
//!
//! A text artifact (summary, answer, translation) is fetched through the response
//! cache, then narrated. When the text itself was a cache hit the request is a
//! repeat, usually because the previous attempt ran out of time during synchronous
//! synthesis, so narration goes straight to the asynchronous path.
//!
//! Narration is optional: a speech service failure is logged and the artifact is
//! returned without audio. Store and generation failures still abort.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::debug;

use super::cache::ResponseCache;
use super::speech::{AudioFormat, SynthesisEngine, SynthesisOutcome, SynthesisRequest};
use crate::errors::{StoreError, SynthesisError};
use crate::store::ResultStore;

/// A text artifact together with the location of its narration, if any.
///
/// Serializes as `{value, fileKey}` plus `audioFileKey` or `taskId` when narration
/// succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct NarratedArtifact<T> {
    pub value: T,
    pub file_key: String,
    /// `None` when synthesis failed.
    pub audio: Option<SynthesisOutcome>,
}

impl<T: Serialize> Serialize for NarratedArtifact<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.audio.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("NarratedArtifact", len)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("fileKey", &self.file_key)?;
        match &self.audio {
            Some(SynthesisOutcome::Audio { audio_key }) => {
                state.serialize_field("audioFileKey", audio_key)?
            }
            Some(SynthesisOutcome::Task { task_id }) => state.serialize_field("taskId", task_id)?,
            None => {}
        }
        state.end()
    }
}

/// Where the artifact and its audio are stored.
#[derive(Debug, Clone, Copy)]
pub struct NarrationTarget<'a> {
    pub text_key: &'a str,
    pub audio_key: &'a str,
    pub language_code: &'a str,
    pub format: AudioFormat,
}

/// Response cache plus synthesis engine sharing one result store.
#[derive(Clone)]
pub struct Narrator {
    cache: ResponseCache,
    engine: SynthesisEngine,
}

impl Narrator {
    pub fn new(store: Arc<dyn ResultStore>, engine: SynthesisEngine) -> Self {
        Self {
            cache: ResponseCache::new(store),
            engine,
        }
    }

    /// Fetch or generate the artifact at `target.text_key` and narrate it.
    pub async fn narrate<T, E, F, Fut>(
        &self,
        target: NarrationTarget<'_>,
        generate: F,
    ) -> Result<NarratedArtifact<T>, E>
    where
        T: Serialize + DeserializeOwned + AsRef<str>,
        E: From<StoreError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cached = self.cache.get_or_generate(target.text_key, generate).await?;

        let request = SynthesisRequest {
            audio_key: target.audio_key,
            text: cached.value.as_ref(),
            format: target.format,
            language_code: target.language_code,
            force_async: cached.was_cached,
        };

        let audio = match self.engine.get_or_synthesize(request).await {
            Ok(outcome) => Some(outcome),
            Err(SynthesisError::Store(e)) => return Err(e.into()),
            Err(e) => {
                debug!("Speech synthesis failed, returning text only: {}", e);
                None
            }
        };

        Ok(NarratedArtifact {
            value: cached.value,
            file_key: target.text_key.to_string(),
            audio,
        })
    }
}
