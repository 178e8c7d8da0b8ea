//! Header-first CSV to [`Record`] stream.

use std::sync::Arc;

use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use futures::stream::{self, BoxStream, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::error::DecodeError;

/// One data row keyed by header name, in header order. Values are kept as
/// the raw cell strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, String>);

impl Record {
    fn from_row(headers: &[String], row: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .cloned()
                .zip(row.iter().map(str::to_owned))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The queue message body for this row.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter.into_iter().map(|(k, v)| (k.into(), v.into()));
        Self(fields.collect())
    }
}

/// Lazy, forward-only sequence of decoded rows. Ends after the first error.
pub type RecordStream = BoxStream<'static, Result<Record, DecodeError>>;

const READ_BUFFER: usize = 1 << 16;

struct DecodeState<R> {
    reader: AsyncReader<R>,
    headers: Option<Arc<[String]>>,
    label: String,
    rows: usize,
}

/// Decode `raw` as comma-separated text whose first line names the columns.
///
/// Every data row must have as many fields as the header; a row that does
/// not fails the stream with [`DecodeError::Csv`]. `label` only tags log
/// lines and errors.
pub fn decode_records<R>(raw: R, label: impl Into<String>) -> RecordStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .buffer_capacity(READ_BUFFER)
        .create_reader(raw);

    let state = DecodeState {
        reader,
        headers: None,
        label: label.into(),
        rows: 0,
    };
    stream::try_unfold(state, next_record).boxed()
}

async fn next_record<R>(
    mut state: DecodeState<R>,
) -> Result<Option<(Record, DecodeState<R>)>, DecodeError>
where
    R: AsyncRead + Unpin + Send,
{
    let headers = match &state.headers {
        Some(headers) => Arc::clone(headers),
        None => {
            let headers = read_headers(&mut state.reader, &state.label).await?;
            state.headers = Some(Arc::clone(&headers));
            headers
        }
    };

    let mut row = StringRecord::new();
    let more = state
        .reader
        .read_record(&mut row)
        .await
        .map_err(|source| DecodeError::Csv {
            label: state.label.clone(),
            source,
        })?;
    if !more {
        info!(label = %state.label, rows = state.rows, "finished processing file");
        return Ok(None);
    }

    let record = Record::from_row(&headers, &row);
    debug!(label = %state.label, row = state.rows, ?record, "record");
    state.rows += 1;
    Ok(Some((record, state)))
}

async fn read_headers<R>(
    reader: &mut AsyncReader<R>,
    label: &str,
) -> Result<Arc<[String]>, DecodeError>
where
    R: AsyncRead + Unpin + Send,
{
    let header_row = reader.headers().await.map_err(|source| DecodeError::Csv {
        label: label.to_string(),
        source,
    })?;

    let mut headers: Vec<String> = Vec::with_capacity(header_row.len());
    for name in header_row.iter() {
        if headers.iter().any(|seen| seen == name) {
            return Err(DecodeError::DuplicateHeader {
                label: label.to_string(),
                name: name.to_string(),
            });
        }
        headers.push(name.to_string());
    }
    Ok(headers.into())
}
