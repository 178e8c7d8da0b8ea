//! Object storage seam: the three calls the pipeline makes, plus upload
//! presigning for the signed-URL handler.

mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::io::{ByteReader, ContentMeta};

/// An object's bytes as handed out by [`ObjectStore::get`].
pub struct ObjectContent {
    pub body: ByteReader,
    pub meta: ContentMeta,
}

impl std::fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContent")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` means the object exists but has no readable body.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<ObjectContent>, StoreError>;

    async fn copy(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StoreError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UploadSigner: Send + Sync {
    /// URL a client can `PUT` the object to until `expires_in` elapses.
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;
}
