//! Streaming import of uploaded product CSV files into a catalog queue.
//!
//! - An S3 notification names newly uploaded objects under `uploaded/`.
//! - Each object is streamed (gzip/zstd and non-UTF-8 charsets handled on
//!   the way), decoded row by row, and every row is sent as a JSON message.
//! - Decoded objects move to `parsed/`; objects that fail to read or decode
//!   stay where they are.
//! - Upload API callers authenticate with HTTP Basic credentials checked
//!   against per-user environment variables.
//!
//! Data shape:
//! - `Record`: header name -> cell string, in header order.
//! - `ImportReport { outcome: IngestOutcome { accepted, failures }, relocation }`
mod auth;
pub mod aws;
mod codec;
pub mod config;
mod decoder;
mod error;
mod io;
mod pipeline;
pub mod queue;
pub mod storage;
pub mod telemetry;
mod trigger;
mod upload;

pub use crate::auth::{
    AuthResponse, AuthorizerEvent, BasicAuthorizer, CredentialStore, Credentials, Effect,
    EnvCredentials, PolicyDocument, Statement,
};
pub use crate::config::ImportConfig;
pub use crate::decoder::{decode_records, Record, RecordStream};
pub use crate::error::{
    AuthError, DecodeError, ImportError, QueueError, ReadError, RelocationError, StoreError,
    SubmissionError, UploadError,
};
pub use crate::io::{content_reader, ByteReader, ContentMeta};
pub use crate::pipeline::{ImportReport, Importer, IngestOutcome, KeyLayout, Relocation};
pub use crate::queue::MessageQueue;
pub use crate::storage::{ObjectContent, ObjectStore, UploadSigner};
pub use crate::trigger::{EventSummary, S3Bucket, S3Entity, S3Event, S3EventRecord, S3Object};
pub use crate::upload::{error_body, SignedUpload, UploadUrls};
