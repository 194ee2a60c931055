use serde::Serialize;
use tracing::debug;

use super::{SpeechService, TaskStatus};
use crate::core::keys::extract_key_from_url;
use crate::errors::SynthesisResult;

/// Completion state of an asynchronous narration, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioStatus {
    Completed {
        #[serde(rename = "audioFileKey")]
        audio_key: String,
    },
    Failed {
        message: String,
    },
    Processing,
}

/// Poll a synthesis task started by the engine.
///
/// A completed task resolves to the object key of its audio; scheduled and running
/// tasks are reported as processing.
pub async fn check_audio(speech: &dyn SpeechService, task_id: &str) -> SynthesisResult<AudioStatus> {
    let task = speech.synthesis_task(task_id).await.inspect_err(|e| {
        debug!("Error getting synthesis task {}: {}", task_id, e);
    })?;

    match task.status {
        TaskStatus::Completed => {
            let uri = task.output_uri.unwrap_or_default();
            let audio_key = extract_key_from_url(&uri)?;
            Ok(AudioStatus::Completed { audio_key })
        }
        TaskStatus::Failed => Ok(AudioStatus::Failed {
            message: task
                .reason
                .unwrap_or_else(|| "Text synthesis task to audio failed.".to_string()),
        }),
        TaskStatus::Scheduled | TaskStatus::InProgress => Ok(AudioStatus::Processing),
    }
}
