use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info, instrument};

use super::{ObjectContent, ObjectStore, UploadSigner};
use crate::error::StoreError;
use crate::io::ContentMeta;

/// Everything but unreserved characters and the path separator.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn s3_error<E>(op: &str, bucket: &str, key: &str, err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::with_source(format!("{op} s3://{bucket}/{key}"), err)
}

fn copy_source(bucket: &str, key: &str) -> String {
    utf8_percent_encode(&format!("{bucket}/{key}"), COPY_SOURCE).to_string()
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<ObjectContent>, StoreError> {
        debug!("Getting stream from s3://{}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("get", bucket, key, e))?;

        let meta = ContentMeta {
            content_type: response.content_type().map(str::to_owned),
            content_encoding: response.content_encoding().map(str::to_owned),
        };
        Ok(Some(ObjectContent {
            body: Box::new(response.body.into_async_read()),
            meta,
        }))
    }

    #[instrument(skip(self))]
    async fn copy(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StoreError> {
        debug!(
            "Copying s3://{}/{} to s3://{}/{}",
            bucket, from_key, bucket, to_key
        );

        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(copy_source(bucket, from_key))
            .key(to_key)
            .send()
            .await
            .map_err(|e| s3_error("copy", bucket, from_key, e))?;

        info!(
            "Successfully copied s3://{}/{} to s3://{}/{}",
            bucket, from_key, bucket, to_key
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        debug!("Deleting s3://{}/{}", bucket, key);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("delete", bucket, key, e))?;

        info!("Successfully deleted s3://{}/{}", bucket, key);
        Ok(())
    }
}

#[async_trait]
impl UploadSigner for S3Store {
    #[instrument(skip(self))]
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StoreError::with_source("invalid presigning expiry", e))?;

        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| s3_error("presign", bucket, key, e))?;

        Ok(request.uri().to_string())
    }
}
