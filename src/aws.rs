//! Process-wide AWS clients, built on first use and shared afterwards.

use std::sync::Arc;

use aws_config::{BehaviorVersion, SdkConfig};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::ImportConfig;
use crate::queue::SqsQueue;
use crate::storage::S3Store;

static SDK_CONFIG: OnceCell<SdkConfig> = OnceCell::const_new();
static S3_STORE: OnceCell<Arc<S3Store>> = OnceCell::const_new();

async fn sdk_config(config: &ImportConfig) -> &'static SdkConfig {
    SDK_CONFIG
        .get_or_init(|| async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(endpoint) = &config.aws_endpoint_url {
                loader = loader.endpoint_url(endpoint);
            }
            loader.load().await
        })
        .await
}

pub async fn s3_store(config: &ImportConfig) -> Arc<S3Store> {
    let sdk = sdk_config(config).await;
    let store = S3_STORE
        .get_or_init(|| async {
            let s3_config = aws_sdk_s3::config::Builder::from(sdk)
                .force_path_style(config.aws_endpoint_url.is_some())
                .build();
            info!("S3 client initialized");
            Arc::new(S3Store::new(aws_sdk_s3::Client::from_conf(s3_config)))
        })
        .await;
    Arc::clone(store)
}

/// The queue rows are sent to; `None` when no queue URL is configured.
pub async fn catalog_queue(config: &ImportConfig) -> Option<Arc<SqsQueue>> {
    static SQS_QUEUE: OnceCell<Arc<SqsQueue>> = OnceCell::const_new();

    let queue_url = config.catalog_items_queue_url.as_deref()?;
    let sdk = sdk_config(config).await;
    let queue = SQS_QUEUE
        .get_or_init(|| async {
            info!(queue_url, "SQS client initialized");
            Arc::new(SqsQueue::new(aws_sdk_sqs::Client::new(sdk), queue_url))
        })
        .await;
    Some(Arc::clone(queue))
}
