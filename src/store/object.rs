use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStore, PutOptions, PutPayload,
};
use serde_json::Value;
use tracing::{debug, info};

use super::ResultStore;
use crate::config::ServiceConfig;
use crate::errors::{StoreError, StoreResult};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// [`ResultStore`] backed by an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct ObjectResultStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectResultStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Process-local store, used by tests and dry runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Store on the configured media bucket.
    ///
    /// Explicit credentials from the configuration take precedence; otherwise the
    /// standard `AWS_*` environment variables are used.
    pub fn s3(config: &ServiceConfig) -> StoreResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.media_bucket)
            .with_region(&config.region);

        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        if let (Some(access_key), Some(secret_key)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            builder = builder
                .with_access_key_id(access_key)
                .with_secret_access_key(secret_key);
            if let Some(token) = &config.aws_session_token {
                builder = builder.with_token(token);
            }
        }

        let store = builder.build()?;
        info!(
            bucket = %config.media_bucket,
            region = %config.region,
            "Result store connected to S3"
        );
        Ok(Self::new(Arc::new(store)))
    }

    fn path(key: &str) -> StoreResult<ObjectPath> {
        ObjectPath::parse(key).map_err(|e| StoreError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_bytes(&self, key: &str) -> StoreResult<Bytes> {
        let path = Self::path(key)?;
        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                });
            }
            Err(e) => {
                debug!("Error getting object {} from store: {}", key, e);
                return Err(e.into());
            }
        };
        Ok(result.bytes().await?)
    }

    async fn put_with_content_type(
        &self,
        key: &str,
        payload: PutPayload,
        content_type: &str,
    ) -> StoreResult<String> {
        let path = Self::path(key)?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&path, payload, options)
            .await
            .map_err(|e| {
                debug!("Error writing object {} to store: {}", key, e);
                StoreError::from(e)
            })?;
        Ok(key.to_string())
    }
}

#[async_trait]
impl ResultStore for ObjectResultStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = Self::path(key)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => {
                debug!("Error checking object {} in store: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn get_json(&self, key: &str) -> StoreResult<Value> {
        let bytes = self.get_bytes(key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put_json(&self, key: &str, value: &Value) -> StoreResult<String> {
        let body = serde_json::to_vec_pretty(value)?;
        self.put_with_content_type(key, PutPayload::from(body), JSON_CONTENT_TYPE)
            .await
    }

    async fn put_bytes(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<String> {
        self.put_with_content_type(key, PutPayload::from(data), content_type)
            .await
    }

    async fn move_object(&self, source: &str, destination: &str) -> StoreResult<()> {
        if self.exists(destination).await? {
            debug!(
                "Object {} already exists, continuing with this object",
                destination
            );
            return Ok(());
        }

        let from = Self::path(source)?;
        let to = Self::path(destination)?;
        self.store.copy(&from, &to).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StoreError::NotFound {
                key: source.to_string(),
            },
            other => {
                debug!("Error moving object {} to {}: {}", source, destination, other);
                StoreError::from(other)
            }
        })?;
        self.store.delete(&from).await?;
        Ok(())
    }
}
