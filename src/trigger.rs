//! Storage notification payload and its dispatch to [`Importer`].

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::{error, info};

use crate::pipeline::Importer;
use crate::queue::MessageQueue;
use crate::storage::ObjectStore;

/// The subset of an S3 event notification the importer reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    /// URL-encoded, with `+` for spaces.
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl S3EventRecord {
    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// The object key as stored, with the notification's URL encoding undone.
    pub fn object_key(&self) -> Cow<'_, str> {
        let raw = &self.s3.object.key;
        if !raw.contains(['+', '%']) {
            return Cow::Borrowed(raw);
        }
        let spaced = raw.replace('+', " ");
        match percent_decode_str(&spaced).decode_utf8() {
            Ok(decoded) => Cow::Owned(decoded.into_owned()),
            Err(_) => Cow::Owned(spaced),
        }
    }
}

/// What happened to the objects of one notification.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventSummary {
    /// Decoded and submitted, whether or not relocation succeeded.
    pub imported: usize,
    /// Of the imported objects, those left outside the parsed prefix.
    pub not_relocated: usize,
    /// Read or decode failures.
    pub failed: usize,
}

impl<S, Q> Importer<S, Q>
where
    S: ObjectStore + 'static,
    Q: MessageQueue + 'static,
{
    /// Import every object named by `event`, one after another. A failing
    /// object is logged and skipped; it never stops the rest.
    pub async fn handle_event(&self, event: &S3Event) -> EventSummary {
        info!(records = event.records.len(), "received S3 event");

        let mut summary = EventSummary::default();
        for record in &event.records {
            let bucket = record.bucket();
            let key = record.object_key();
            info!(
                bucket,
                key = %key,
                event = record.event_name.as_deref().unwrap_or("unknown"),
                size = record.s3.object.size,
                "importing object"
            );

            match self.import_object(bucket, &key).await {
                Ok(report) => {
                    summary.imported += 1;
                    if !report.relocation.is_moved() {
                        summary.not_relocated += 1;
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    error!(
                        bucket,
                        key = %key,
                        error = %err,
                        cause = ?std::error::Error::source(&err),
                        "Error processing file"
                    );
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> S3EventRecord {
        serde_json::from_value(serde_json::json!({
            "eventName": "ObjectCreated:Put",
            "s3": { "bucket": { "name": "imports" }, "object": { "key": key, "size": 12 } }
        }))
        .unwrap()
    }

    #[test]
    fn object_key_undoes_notification_encoding() {
        assert_eq!(
            record("uploaded/plain.csv").object_key(),
            "uploaded/plain.csv"
        );
        assert_eq!(
            record("uploaded/spring+sale%282024%29.csv").object_key(),
            "uploaded/spring sale(2024).csv"
        );
    }

    #[test]
    fn record_carries_event_name_and_size() {
        let record = record("uploaded/plain.csv");
        assert_eq!(record.event_name.as_deref(), Some("ObjectCreated:Put"));
        assert_eq!(record.s3.object.size, Some(12));
        assert_eq!(record.bucket(), "imports");
    }

    #[test]
    fn event_without_records_is_empty() {
        let event: S3Event = serde_json::from_str("{}").unwrap();
        assert!(event.records.is_empty());
    }
}
