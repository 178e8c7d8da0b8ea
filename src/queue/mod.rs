//! Outbound message queue seam.

mod lines;
mod sqs;

pub use lines::LineQueue;
pub use sqs::SqsQueue;

use async_trait::async_trait;

use crate::error::QueueError;

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Send one message with `body` and no attributes.
    async fn send(&self, body: String) -> Result<(), QueueError>;
}
