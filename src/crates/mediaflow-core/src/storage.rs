//! Object storage seam used by the resolver to materialize media buffers.
//!
//! The resolver never talks to a bucket directly; it is handed an
//! `&dyn ObjectStorage` the same way the teacher's Pregel loop is handed a
//! checkpoint saver, so a caller can swap in S3, a local filesystem, or an
//! in-memory fake for tests without the resolver knowing the difference.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;

/// Read access to wherever a canvas's media entities live.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Fetch the raw bytes for a stored file, keyed by its bucket + key.
    async fn load_buffer(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Best-effort MIME type lookup, independent of fetching the bytes.
    async fn mime_type(&self, bucket: &str, key: &str) -> Result<Option<String>>;
}

/// An in-memory [`ObjectStorage`] for tests and local runs.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    entries: RwLock<HashMap<(String, String), (Vec<u8>, Option<String>)>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, mime_type: Option<String>) {
        self.entries
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), (bytes, mime_type));
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn load_buffer(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.entries
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no object at {bucket}/{key}"),
                )
                .into()
            })
    }

    async fn mime_type(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .and_then(|(_, mime)| mime.clone()))
    }
}
