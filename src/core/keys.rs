//! Object key construction for cached artifacts and synthesized audio.
//!
//! Key layout:
//!
//! ```text
//! {identity}/{folder}{job}[-{model_id}][-{timestamp}][-{language}].{format}
//! ```
//!
//! Without a timestamp the key is a pure function of its parts, which is what makes
//! the result cache content-addressed. A timestamp is only added when every call
//! must get a fresh artifact (assistant answers, for instance).

use std::borrow::Cow;
use std::fmt;

use time::OffsetDateTime;

use crate::errors::{SynthesisError, SynthesisResult};

/// Folder (category path) inside a user's key space. Always ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder(Cow<'static, str>);

impl Folder {
    pub const TRANSCRIPTIONS: Folder = Folder(Cow::Borrowed("transcriptions/"));
    pub const SUMMARIES: Folder = Folder(Cow::Borrowed("summaries/"));
    pub const FLASHCARDS: Folder = Folder(Cow::Borrowed("flashcards/"));
    pub const ASSISTANT: Folder = Folder(Cow::Borrowed("assistant/"));
    pub const TRANSLATIONS: Folder = Folder(Cow::Borrowed("translations/"));
    pub const AUDIOS: Folder = Folder(Cow::Borrowed("audios/"));
    pub const TEMPORARY: Folder = Folder(Cow::Borrowed("temp/"));

    /// Parse a folder name, adding the trailing slash if missing.
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim().trim_matches('/');
        Self(Cow::Owned(format!("{trimmed}/")))
    }

    /// Nest `child` under this folder, e.g. `summaries/` + `audios/`.
    pub fn join(&self, child: &Folder) -> Folder {
        Folder(Cow::Owned(format!("{}{}", self.0, child.0)))
    }

    /// Audio sibling of this folder (`summaries/` -> `summaries/audios/`).
    pub fn audios(&self) -> Folder {
        self.join(&Self::AUDIOS)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for artifact keys.
///
/// # Example
///
/// ```rust
/// use studycast::core::keys::{FileKey, Folder};
///
/// let key = FileKey::new("u1", Folder::SUMMARIES, "jobA")
///     .model_id("modelX")
///     .language("en")
///     .build();
/// assert_eq!(key, "u1/summaries/jobA-modelX-en.json");
/// ```
#[derive(Debug, Clone)]
pub struct FileKey {
    identity: String,
    folder: Folder,
    job_name: String,
    format: String,
    model_id: Option<String>,
    language: Option<String>,
    timestamp: Option<String>,
}

impl FileKey {
    pub fn new(identity: impl Into<String>, folder: Folder, job_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            folder,
            job_name: job_name.into(),
            format: "json".to_string(),
            model_id: None,
            language: None,
            timestamp: None,
        }
    }

    /// Output format / file extension (default `json`).
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Use an explicit timestamp segment.
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Stamp the key with the current time so that every call gets its own artifact.
    pub fn timestamped(self) -> Self {
        let now = OffsetDateTime::now_utc();
        let stamp = format!("{}.{:09}", now.unix_timestamp(), now.nanosecond());
        self.timestamp(stamp)
    }

    pub fn build(&self) -> String {
        let mut key = format!("{}/{}{}", self.identity, self.folder, self.job_name);
        for suffix in [&self.model_id, &self.timestamp, &self.language]
            .into_iter()
            .flatten()
        {
            key.push('-');
            key.push_str(suffix);
        }
        key.push('.');
        key.push_str(&self.format);
        key
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Key under which an asynchronous synthesis task writes its audio.
pub fn synthesis_file_key(prefix: &str, task_id: &str, extension: &str) -> String {
    format!("{prefix}{task_id}.{extension}")
}

/// Extract the object key from an S3 HTTPS URL.
///
/// `https://s3.us-west-2.amazonaws.com/my-bucket/u1/audios/output.mp3`
/// yields `u1/audios/output.mp3`.
pub fn extract_key_from_url(url: &str) -> SynthesisResult<String> {
    let invalid = |reason: &str| SynthesisError::InvalidOutputUri {
        uri: url.to_string(),
        reason: reason.to_string(),
    };

    // Without a scheme the first byte is taken as part of the host
    let after_scheme = url.find("//").map_or(1, |index| index + 2);
    let path_start = url
        .get(after_scheme..)
        .and_then(|rest| rest.find('/'))
        .map(|index| after_scheme + index)
        .ok_or_else(|| invalid("no path found in the URL"))?;

    match url[path_start + 1..].split_once('/') {
        Some((_bucket, key)) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(invalid("could not find the object key")),
    }
}
