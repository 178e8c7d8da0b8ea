use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::UploadError;
use crate::pipeline::KeyLayout;
use crate::storage::UploadSigner;

/// Body returned to a client asking where to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUpload {
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
}

/// Hands out short-lived PUT URLs under the upload prefix.
pub struct UploadUrls<P> {
    signer: Arc<P>,
    bucket: String,
    layout: KeyLayout,
    expires_in: Duration,
}

impl<P: UploadSigner> UploadUrls<P> {
    pub fn new(
        signer: Arc<P>,
        bucket: impl Into<String>,
        layout: KeyLayout,
        expires_in: Duration,
    ) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
            layout,
            expires_in,
        }
    }

    #[instrument(skip(self))]
    pub async fn signed_upload(&self, name: Option<&str>) -> Result<SignedUpload, UploadError> {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() && !name.contains('/') => name,
            _ => return Err(UploadError::MissingFileName),
        };

        let key = self.layout.upload_key(name);
        let signed_url = self
            .signer
            .presign_put(&self.bucket, &key, self.expires_in)
            .await
            .map_err(|source| {
                error!(key = %key, error = %source, "presign failed");
                UploadError::Presign {
                    key: key.clone(),
                    source,
                }
            })?;

        info!(key = %key, "signed upload url issued");
        Ok(SignedUpload { signed_url })
    }
}

/// JSON body for a rejected request, `{"message": ...}`.
pub fn error_body(err: &UploadError) -> String {
    serde_json::json!({ "message": err.public_message() }).to_string()
}
