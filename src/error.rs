use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by an [`ObjectStore`](crate::ObjectStore) implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Failure reported by a [`MessageQueue`](crate::MessageQueue) implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct QueueError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl QueueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// The object's content could not be obtained.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unable to read object body as a stream for file: {key}")]
    NoBody { key: String },
    #[error("failed to get {key}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// The content did not parse as header-first comma-separated text.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("duplicate header {name:?} in {label}")]
    DuplicateHeader { label: String, name: String },
    #[error("malformed csv in {label}")]
    Csv {
        label: String,
        #[source]
        source: csv_async::Error,
    },
}

/// One row's outbound message was not accepted.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("row {row}: could not encode record")]
    Encode {
        row: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("row {row}: send failed")]
    Queue {
        row: usize,
        #[source]
        source: QueueError,
    },
    #[error("row {row}: submission task did not complete")]
    Aborted { row: usize },
}

impl SubmissionError {
    /// Zero-based data row the failed message was built from.
    pub fn row(&self) -> usize {
        match self {
            SubmissionError::Encode { row, .. }
            | SubmissionError::Queue { row, .. }
            | SubmissionError::Aborted { row } => *row,
        }
    }
}

/// Moving a decoded object out of the upload prefix failed.
#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("{key} is not under the upload prefix {prefix:?}")]
    OutsideUploadPrefix { key: String, prefix: String },
    #[error("failed to copy {from} to {to}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: StoreError,
    },
    #[error("copied {from} to {to} but failed to delete the original")]
    Delete {
        from: String,
        to: String,
        #[source]
        source: StoreError,
    },
}

/// Terminal per-object failure: nothing was relocated.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Rejected signed-upload request.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File name is required")]
    MissingFileName,
    #[error("failed to presign upload for {key}")]
    Presign {
        key: String,
        #[source]
        source: StoreError,
    },
}

impl UploadError {
    /// HTTP status the API layer answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::MissingFileName => 400,
            UploadError::Presign { .. } => 500,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            UploadError::MissingFileName => "File name is required",
            UploadError::Presign { .. } => "Internal Server Error",
        }
    }
}

/// Why a request to the upload API was denied.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("Authorization header is not Basic")]
    NotBasic,
    #[error("credentials are not valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("credentials are not UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
    #[error("username or password is missing in the credentials")]
    MissingCredentials,
    #[error("no stored password found for user: {username}")]
    UnknownUser { username: String },
    #[error("password mismatch for user: {username}")]
    PasswordMismatch { username: String },
}
