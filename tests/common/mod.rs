#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use csv_import::{
    ContentMeta, MessageQueue, ObjectContent, ObjectStore, QueueError, StoreError, UploadSigner,
};

pub const BUCKET: &str = "test-bucket";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Copy(String, String),
    Delete(String),
}

/// In-memory store that records every call made against it.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, ContentMeta)>>,
    pub calls: Mutex<Vec<StoreCall>>,
    pub fail_get: bool,
    pub no_body: bool,
    pub fail_copy: bool,
    pub fail_delete: bool,
    /// Read when `copy` is called; the value seen lands in `settled_at_copy`.
    pub settled: Option<Arc<AtomicUsize>>,
    pub settled_at_copy: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn with_object(key: &str, data: impl Into<Vec<u8>>) -> Self {
        let store = Self::default();
        store.put(key, data, ContentMeta::from_key(key));
        store
    }

    pub fn put(&self, key: &str, data: impl Into<Vec<u8>>, meta: ContentMeta) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.into(), meta));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn copies(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Copy(..)))
            .count()
    }

    pub fn deletes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Delete(..)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<ObjectContent>, StoreError> {
        assert_eq!(bucket, BUCKET);
        self.record(StoreCall::Get(key.to_string()));
        if self.fail_get {
            return Err(StoreError::new("S3 getObject error"));
        }
        if self.no_body {
            return Ok(None);
        }
        let (data, meta) = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::new(format!("NoSuchKey: {key}")))?;
        Ok(Some(ObjectContent {
            body: Box::new(Cursor::new(data)),
            meta,
        }))
    }

    async fn copy(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StoreError> {
        assert_eq!(bucket, BUCKET);
        self.record(StoreCall::Copy(from_key.to_string(), to_key.to_string()));
        if let Some(settled) = &self.settled {
            *self.settled_at_copy.lock().unwrap() = Some(settled.load(Ordering::SeqCst));
        }
        if self.fail_copy {
            return Err(StoreError::new("AccessDenied"));
        }
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get(from_key)
            .cloned()
            .ok_or_else(|| StoreError::new(format!("NoSuchKey: {from_key}")))?;
        objects.insert(to_key.to_string(), object);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        assert_eq!(bucket, BUCKET);
        self.record(StoreCall::Delete(key.to_string()));
        if self.fail_delete {
            return Err(StoreError::new("AccessDenied"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

type RejectFn = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Queue that keeps accepted bodies and rejects those matching `reject`.
/// `settled` counts sends that have returned, accepted or not.
#[derive(Default)]
pub struct RecordingQueue {
    accepted: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    settled: Arc<AtomicUsize>,
    delay: Option<Duration>,
    reject: Option<RejectFn>,
}

impl RecordingQueue {
    pub fn rejecting(reject: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            reject: Some(Box::new(reject)),
            ..Self::default()
        }
    }

    /// Every send sleeps for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn settled(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.settled)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<serde_json::Value> {
        self.accepted
            .lock()
            .unwrap()
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
    }
}

#[async_trait]
impl MessageQueue for RecordingQueue {
    async fn send(&self, body: String) -> Result<(), QueueError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            // let sibling sends interleave
            None => tokio::task::yield_now().await,
        }
        let result = if self.reject.as_ref().is_some_and(|reject| reject(&body)) {
            Err(QueueError::new("throttled"))
        } else {
            self.accepted.lock().unwrap().push(body);
            Ok(())
        };
        self.settled.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Signer that returns a fake URL, or fails when `fail` is set.
#[derive(Default)]
pub struct FakeSigner {
    pub fail: bool,
    pub signed: Mutex<Vec<(String, String, Duration)>>,
}

#[async_trait]
impl UploadSigner for FakeSigner {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        if self.fail {
            return Err(StoreError::new("no credentials"));
        }
        self.signed
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), expires_in));
        Ok(format!(
            "https://{bucket}.s3.amazonaws.com/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }
}
