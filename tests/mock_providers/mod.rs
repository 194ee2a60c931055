//! Mock speech provider and failing result store for integration tests.
//!
//! The provider behaves like the managed speech service for one voice per language:
//! - synchronous synthesis returns a fixed audio payload
//! - asynchronous tasks get sequential ids and stay in progress until completed
//!   with [`MockSpeechProvider::complete_task`]
//! - synthesis can be switched to fail, to simulate throttling or timeouts

// Not every test binary uses every helper
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use studycast::core::keys::synthesis_file_key;
use studycast::core::speech::{
    SpeechInput, SpeechService, SynthesisTaskInfo, TaskStatus, VoiceDescriptor,
};
use studycast::{
    ObjectResultStore, ResultStore, StoreError, StoreResult, SynthesisError, SynthesisResult,
};

pub const MOCK_AUDIO: &[u8] = b"ID3\x04mock-audio";
pub const OUTPUT_URL_BASE: &str = "https://s3.us-east-1.amazonaws.com/study-media";

#[derive(Debug, Default)]
pub struct CallCounts {
    pub languages: AtomicUsize,
    pub voices: AtomicUsize,
    pub sync: AtomicUsize,
    pub tasks_started: AtomicUsize,
}

impl CallCounts {
    pub fn sync(&self) -> usize {
        self.sync.load(Ordering::SeqCst)
    }

    pub fn tasks_started(&self) -> usize {
        self.tasks_started.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.languages.load(Ordering::SeqCst)
            + self.voices.load(Ordering::SeqCst)
            + self.sync()
            + self.tasks_started()
    }
}

pub struct MockSpeechProvider {
    voices: HashMap<String, VoiceDescriptor>,
    failing: AtomicBool,
    tasks: Mutex<HashMap<String, (SynthesisTaskInfo, String)>>,
    pub calls: CallCounts,
}

impl MockSpeechProvider {
    /// Provider with one voice each for `en-US` and `es-ES`.
    pub fn new() -> Self {
        let voices = [("en-US", "Joanna"), ("es-ES", "Lucia")]
            .into_iter()
            .map(|(language, id)| {
                (
                    language.to_string(),
                    VoiceDescriptor {
                        id: id.to_string(),
                        name: Some(id.to_string()),
                        language_code: language.to_string(),
                        engines: vec!["neural".to_string()],
                    },
                )
            })
            .collect();

        Self {
            voices,
            failing: AtomicBool::new(false),
            tasks: Mutex::new(HashMap::new()),
            calls: CallCounts::default(),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Mark a task as completed, as the service does once the audio is written.
    pub fn complete_task(&self, task_id: &str) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some((info, prefix)) = tasks.get_mut(task_id) {
            info.status = TaskStatus::Completed;
            let key = synthesis_file_key(prefix, task_id, "mp3");
            info.output_uri = Some(format!("{OUTPUT_URL_BASE}/{key}"));
        }
    }

    fn check_failing(&self) -> SynthesisResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SynthesisError::Upstream(
                "Rate exceeded (ThrottlingException)".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SpeechService for MockSpeechProvider {
    async fn supported_languages(&self) -> SynthesisResult<HashSet<String>> {
        self.calls.languages.fetch_add(1, Ordering::SeqCst);
        Ok(self.voices.keys().cloned().collect())
    }

    async fn default_voice(&self, language_code: &str) -> SynthesisResult<Option<VoiceDescriptor>> {
        self.calls.voices.fetch_add(1, Ordering::SeqCst);
        Ok(self.voices.get(language_code).cloned())
    }

    async fn synthesize(&self, _input: SpeechInput<'_>) -> SynthesisResult<Bytes> {
        self.calls.sync.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(Bytes::from_static(MOCK_AUDIO))
    }

    async fn start_synthesis_task(
        &self,
        _input: SpeechInput<'_>,
        output_key_prefix: &str,
    ) -> SynthesisResult<String> {
        let n = self.calls.tasks_started.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;

        let task_id = format!("task-{n:04}");
        let info = SynthesisTaskInfo {
            task_id: task_id.clone(),
            status: TaskStatus::InProgress,
            output_uri: None,
            reason: None,
        };
        self.tasks
            .lock()
            .unwrap()
            .insert(task_id.clone(), (info, output_key_prefix.to_string()));
        Ok(task_id)
    }

    async fn synthesis_task(&self, task_id: &str) -> SynthesisResult<SynthesisTaskInfo> {
        self.tasks
            .lock()
            .unwrap()
            .get(task_id)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| SynthesisError::Upstream(format!("Task {task_id} not found")))
    }
}

/// Result store whose audio objects live behind an unreachable backend.
///
/// JSON artifacts go to the wrapped store; any `exists` or write on an audio key
/// fails the way S3 does when the connection is refused.
pub struct AudioOutageStore {
    inner: ObjectResultStore,
}

impl AudioOutageStore {
    pub fn new() -> Self {
        Self {
            inner: ObjectResultStore::in_memory(),
        }
    }

    fn check(key: &str) -> StoreResult<()> {
        if key.ends_with(".mp3") {
            Err(StoreError::Backend(object_store::Error::Generic {
                store: "S3",
                source: "connection refused".into(),
            }))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResultStore for AudioOutageStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Self::check(key)?;
        self.inner.exists(key).await
    }

    async fn get_json(&self, key: &str) -> StoreResult<Value> {
        self.inner.get_json(key).await
    }

    async fn put_json(&self, key: &str, value: &Value) -> StoreResult<String> {
        self.inner.put_json(key, value).await
    }

    async fn put_bytes(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<String> {
        Self::check(key)?;
        self.inner.put_bytes(key, data, content_type).await
    }

    async fn move_object(&self, source: &str, destination: &str) -> StoreResult<()> {
        self.inner.move_object(source, destination).await
    }
}
