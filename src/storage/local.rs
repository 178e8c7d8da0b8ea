use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tracing::{debug, instrument};

use super::{ObjectContent, ObjectStore};
use crate::error::StoreError;
use crate::io::ContentMeta;

/// Directory-backed store laid out as `<root>/<bucket>/<key>`, for running
/// the pipeline without cloud credentials.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

fn io_error(op: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::with_source(format!("{op} {}", path.display()), err)
}

#[async_trait]
impl ObjectStore for LocalStore {
    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<ObjectContent>, StoreError> {
        let path = self.path_of(bucket, key);
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| io_error("stat", &path, e))?;
        if !metadata.is_file() {
            debug!(path = %path.display(), "not a regular file");
            return Ok(None);
        }

        let file = File::open(&path)
            .await
            .map_err(|e| io_error("open", &path, e))?;
        Ok(Some(ObjectContent {
            body: Box::new(file),
            meta: ContentMeta::from_key(key),
        }))
    }

    #[instrument(skip(self))]
    async fn copy(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StoreError> {
        let from = self.path_of(bucket, from_key);
        let to = self.path_of(bucket, to_key);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create", parent, e))?;
        }
        fs::copy(&from, &to)
            .await
            .map_err(|e| io_error("copy", &from, e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.path_of(bucket, key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // S3 deletes are idempotent; match that.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}
