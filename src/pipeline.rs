//! Per-object import: read, decode, fan rows out to the queue, relocate.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::decoder::{decode_records, Record, RecordStream};
use crate::error::{DecodeError, ImportError, ReadError, RelocationError, SubmissionError};
use crate::io::content_reader;
use crate::queue::MessageQueue;
use crate::storage::ObjectStore;

/// Where uploads land and where decoded objects are moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    upload_prefix: String,
    parsed_prefix: String,
}

impl KeyLayout {
    pub fn new(upload_prefix: impl Into<String>, parsed_prefix: impl Into<String>) -> Self {
        Self {
            upload_prefix: upload_prefix.into(),
            parsed_prefix: parsed_prefix.into(),
        }
    }

    pub fn upload_key(&self, name: &str) -> String {
        format!("{}{}", self.upload_prefix, name)
    }

    /// `uploaded/<name>` -> `parsed/<name>`; `None` outside the upload prefix.
    pub fn parsed_key(&self, key: &str) -> Option<String> {
        key.strip_prefix(&self.upload_prefix)
            .map(|name| format!("{}{}", self.parsed_prefix, name))
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new("uploaded/", "parsed/")
    }
}

/// Tally of one object's row submissions.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub accepted: usize,
    /// In row order.
    pub failures: Vec<SubmissionError>,
}

impl IngestOutcome {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.accepted + self.failures.len()
    }
}

#[derive(Debug)]
pub enum Relocation {
    Moved { to: String },
    Failed(RelocationError),
}

impl Relocation {
    pub fn is_moved(&self) -> bool {
        matches!(self, Relocation::Moved { .. })
    }
}

/// Result of importing one object whose content decoded cleanly.
#[derive(Debug)]
pub struct ImportReport {
    pub bucket: String,
    pub key: String,
    pub outcome: IngestOutcome,
    pub relocation: Relocation,
}

/// Drives the import of uploaded objects. Holds only shared clients, so one
/// instance can serve concurrent imports of different keys.
pub struct Importer<S, Q> {
    store: Arc<S>,
    queue: Arc<Q>,
    layout: KeyLayout,
}

impl<S, Q> Clone for Importer<S, Q> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            layout: self.layout.clone(),
        }
    }
}

impl<S, Q> Importer<S, Q>
where
    S: ObjectStore + 'static,
    Q: MessageQueue + 'static,
{
    pub fn new(store: Arc<S>, queue: Arc<Q>) -> Self {
        Self {
            store,
            queue,
            layout: KeyLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: KeyLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Import one object. Read and decode failures are returned and leave
    /// the object where it is; row and relocation failures are reported in
    /// the [`ImportReport`].
    #[instrument(skip(self))]
    pub async fn import_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ImportReport, ImportError> {
        let content = match self.store.get(bucket, key).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                let key = key.to_string();
                return Err(ReadError::NoBody { key }.into());
            }
            Err(source) => {
                let key = key.to_string();
                return Err(ReadError::Store { key, source }.into());
            }
        };

        let reader = content_reader(content.body, &content.meta, key);
        let outcome = self.submit_rows(decode_records(reader, key), key).await?;
        let relocation = self.relocate(bucket, key).await;

        Ok(ImportReport {
            bucket: bucket.to_string(),
            key: key.to_string(),
            outcome,
            relocation,
        })
    }

    /// Spawn one send per decoded row, then wait for all of them. A decode
    /// error stops spawning but still lets in-flight sends settle.
    async fn submit_rows(
        &self,
        mut records: RecordStream,
        key: &str,
    ) -> Result<IngestOutcome, DecodeError> {
        let mut sends = JoinSet::new();
        let mut rows = 0usize;

        let decoded = loop {
            match records.next().await {
                Some(Ok(record)) => {
                    let row = rows;
                    rows += 1;
                    let queue = Arc::clone(&self.queue);
                    sends.spawn(async move {
                        let result = submit(queue.as_ref(), row, record).await;
                        (row, result)
                    });
                }
                Some(Err(err)) => break Err(err),
                None => break Ok(()),
            }
        };

        let outcome = settle(sends, rows).await;
        info!(
            key,
            accepted = outcome.accepted,
            failed = outcome.failed(),
            "submitted rows"
        );
        for failure in &outcome.failures {
            warn!(
                key,
                row = failure.row(),
                error = %failure,
                reason = ?std::error::Error::source(failure),
                "row submission failed"
            );
        }

        decoded.map(|()| outcome)
    }

    async fn relocate(&self, bucket: &str, key: &str) -> Relocation {
        let Some(parsed_key) = self.layout.parsed_key(key) else {
            let err = RelocationError::OutsideUploadPrefix {
                key: key.to_string(),
                prefix: self.layout.upload_prefix.clone(),
            };
            error!(error = %err, "not relocating");
            return Relocation::Failed(err);
        };

        if let Err(source) = self.store.copy(bucket, key, &parsed_key).await {
            let err = RelocationError::Copy {
                from: key.to_string(),
                to: parsed_key,
                source,
            };
            error!(
                error = %err,
                cause = ?std::error::Error::source(&err),
                "relocation failed"
            );
            return Relocation::Failed(err);
        }

        if let Err(source) = self.store.delete(bucket, key).await {
            let err = RelocationError::Delete {
                from: key.to_string(),
                to: parsed_key,
                source,
            };
            error!(
                error = %err,
                cause = ?std::error::Error::source(&err),
                "relocation failed"
            );
            return Relocation::Failed(err);
        }

        info!(from = key, to = %parsed_key, "moved");
        Relocation::Moved { to: parsed_key }
    }
}

async fn submit<Q: MessageQueue + ?Sized>(
    queue: &Q,
    row: usize,
    record: Record,
) -> Result<(), SubmissionError> {
    let body = record
        .to_json()
        .map_err(|source| SubmissionError::Encode { row, source })?;
    queue
        .send(body)
        .await
        .map_err(|source| SubmissionError::Queue { row, source })
}

async fn settle(
    mut sends: JoinSet<(usize, Result<(), SubmissionError>)>,
    rows: usize,
) -> IngestOutcome {
    let mut settled: Vec<Option<Result<(), SubmissionError>>> = (0..rows).map(|_| None).collect();

    while let Some(joined) = sends.join_next().await {
        match joined {
            Ok((row, result)) => settled[row] = Some(result),
            Err(err) => error!(error = %err, "submission task panicked"),
        }
    }

    let mut outcome = IngestOutcome::default();
    for (row, result) in settled.into_iter().enumerate() {
        match result {
            Some(Ok(())) => outcome.accepted += 1,
            Some(Err(err)) => outcome.failures.push(err),
            None => outcome.failures.push(SubmissionError::Aborted { row }),
        }
    }
    outcome
}
