use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use csv_import::queue::LineQueue;
use csv_import::storage::LocalStore;
use csv_import::telemetry::init_tracing;
use csv_import::{aws, ImportConfig, Importer, S3Event};
use tokio::io::AsyncReadExt;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("import-file-parser")
        .about("Import the CSV objects named by an S3 notification into the catalog queue")
        .arg(
            Arg::new("event")
                .long("event")
                .help("S3 notification JSON file; stdin when omitted or '-'")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("local-dir")
                .long("local-dir")
                .help("Read <dir>/<bucket>/<key> and print messages to stdout, no AWS")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Exit non-zero when any object fails to read or decode")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config = ImportConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, &config.log_format);

    let path = matches.get_one::<PathBuf>("event").map(PathBuf::as_path);
    let event = read_event(path).await?;

    let summary = if let Some(dir) = matches.get_one::<PathBuf>("local-dir") {
        let store = Arc::new(LocalStore::new(dir.clone()));
        Importer::new(store, Arc::new(LineQueue::stdout()))
            .with_layout(config.key_layout())
            .handle_event(&event)
            .await
    } else {
        let store = aws::s3_store(&config).await;
        let queue = aws::catalog_queue(&config)
            .await
            .context("IMPORT_CATALOG_ITEMS_QUEUE_URL must be set")?;
        Importer::new(store, queue)
            .with_layout(config.key_layout())
            .handle_event(&event)
            .await
    };

    info!(
        imported = summary.imported,
        not_relocated = summary.not_relocated,
        failed = summary.failed,
        "event processed"
    );
    if matches.get_flag("strict") && summary.failed > 0 {
        anyhow::bail!("{} object(s) failed to import", summary.failed);
    }
    Ok(())
}

async fn read_event(path: Option<&Path>) -> anyhow::Result<S3Event> {
    let raw = match path {
        Some(p) if p != Path::new("-") => {
            let context = || format!("failed to read {}", p.display());
            tokio::fs::read(p).await.with_context(context)?
        }
        _ => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };
    serde_json::from_slice(&raw).context("not an S3 notification")
}
