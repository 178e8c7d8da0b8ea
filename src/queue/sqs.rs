use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::{debug, instrument};

use super::MessageQueue;
use crate::error::QueueError;

#[derive(Clone, Debug)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    #[instrument(skip(self, body), fields(queue = %self.queue_url, bytes = body.len()))]
    async fn send(&self, body: String) -> Result<(), QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::with_source("send_message", e))?;

        debug!(message_id = output.message_id().unwrap_or_default(), "sent");
        Ok(())
    }
}
