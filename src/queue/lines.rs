use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::MessageQueue;
use crate::error::QueueError;

/// Writes each message body as one line to `W`. Used for local runs, where
/// stdout stands in for the queue.
#[derive(Debug)]
pub struct LineQueue<W> {
    out: Mutex<W>,
}

impl<W> LineQueue<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl LineQueue<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> MessageQueue for LineQueue<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, body: String) -> Result<(), QueueError> {
        let mut out = self.out.lock().await;
        let mut line = body.into_bytes();
        line.push(b'\n');
        out.write_all(&line)
            .await
            .map_err(|e| QueueError::with_source("write line", e))?;
        out.flush()
            .await
            .map_err(|e| QueueError::with_source("flush", e))
    }
}
