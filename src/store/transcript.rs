use serde::Deserialize;

use super::ResultStore;
use crate::core::keys::{FileKey, Folder};
use crate::errors::{StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct TranscriptionDocument {
    results: Option<TranscriptionResults>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResults {
    #[serde(default)]
    transcripts: Vec<Transcript>,
}

#[derive(Debug, Deserialize)]
struct Transcript {
    transcript: Option<String>,
}

/// Read the plain transcript text of a finished transcription job.
///
/// The job output lives at `{identity}/transcriptions/{job}.json` in the transcription
/// service's JSON layout; only the first transcript alternative is returned.
pub async fn read_transcript(
    store: &dyn ResultStore,
    identity: &str,
    job_name: &str,
) -> StoreResult<String> {
    let key = FileKey::new(identity, Folder::TRANSCRIPTIONS, job_name).build();
    let value = store.get_json(&key).await?;

    let document: TranscriptionDocument =
        serde_json::from_value(value).map_err(|e| StoreError::UnexpectedContent {
            key: key.clone(),
            reason: e.to_string(),
        })?;

    document
        .results
        .and_then(|results| results.transcripts.into_iter().next())
        .and_then(|first| first.transcript)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| StoreError::UnexpectedContent {
            key,
            reason: "transcription file is not as expected".to_string(),
        })
}
