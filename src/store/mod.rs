//! Result store: durable key/value storage for cached artifacts and audio.
//!
//! The store is a thin layer over [`object_store`]. In production it points at the
//! media S3 bucket; tests use [`object_store::memory::InMemory`].
//!
//! Contract relied on by the cache and the synthesis engine:
//! - `exists` answers `false` only for a genuine miss. Any other backend failure is
//!   an error, because treating an unreachable store as "absent" would trigger
//!   needless upstream generation.
//! - `get_json` fails with [`StoreError::NotFound`] on a miss.
//! - writes replace the whole object; there is no partial write.

mod object;
mod transcript;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

pub use object::{JSON_CONTENT_TYPE, ObjectResultStore};
pub use transcript::read_transcript;

use crate::errors::StoreResult;

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Read the object at `key` as JSON.
    async fn get_json(&self, key: &str) -> StoreResult<Value>;

    /// Write `value` as JSON at `key`, returning the key.
    async fn put_json(&self, key: &str, value: &Value) -> StoreResult<String>;

    /// Write raw bytes at `key` with the given content type, returning the key.
    async fn put_bytes(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<String>;

    /// Move an object. When `destination` already exists it is kept as is and the
    /// source is left untouched.
    async fn move_object(&self, source: &str, destination: &str) -> StoreResult<()>;
}
