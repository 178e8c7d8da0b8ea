use std::sync::Arc;

use async_compression::tokio::write::GzipEncoder;
use csv_import::queue::LineQueue;
use csv_import::storage::LocalStore;
use csv_import::{Importer, S3Event};
use serde_json::json;
use tokio::io::AsyncWriteExt;

fn upload_event(key: &str) -> S3Event {
    serde_json::from_value(json!({
        "Records": [{ "s3": { "bucket": { "name": "imports" }, "object": { "key": key } } }]
    }))
    .unwrap()
}

#[tokio::test]
async fn imports_gzip_file_from_local_dir() -> anyhow::Result<()> {
    // Create a gzip-compressed CSV under <root>/<bucket>/uploaded/
    let dir = tempfile::tempdir()?;
    let uploaded = dir.path().join("imports").join("uploaded");
    tokio::fs::create_dir_all(&uploaded).await?;

    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(b"title,description,price,count\n").await?;
    for i in 0..10_000 {
        let row = format!("Product {i},\"Item {i}, boxed\",{}.50,{}\n", i % 90, i % 25);
        encoder.write_all(row.as_bytes()).await?;
    }
    encoder.shutdown().await?;
    let object = uploaded.join("products.csv.gz");
    tokio::fs::write(&object, encoder.into_inner()).await?;

    let queue = Arc::new(LineQueue::new(Vec::new()));
    let importer = Importer::new(Arc::new(LocalStore::new(dir.path())), Arc::clone(&queue));

    let summary = importer
        .handle_event(&upload_event("uploaded/products.csv.gz"))
        .await;
    drop(importer);

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.not_relocated, 0);
    assert!(!object.exists());
    assert!(dir.path().join("imports/parsed/products.csv.gz").exists());

    let lines = Arc::try_unwrap(queue)
        .map_err(|_| anyhow::anyhow!("queue still shared"))?
        .into_inner();
    let lines = String::from_utf8(lines)?;
    assert_eq!(lines.lines().count(), 10_000);
    let first = lines.lines().next().unwrap_or_default();
    let first: serde_json::Value = serde_json::from_str(first)?;
    assert_eq!(first.as_object().map(|row| row.len()), Some(4));
    Ok(())
}

#[tokio::test]
async fn directory_in_place_of_object_has_no_body() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let folder = dir.path().join("imports/uploaded/folder.csv");
    tokio::fs::create_dir_all(&folder).await?;

    let queue = Arc::new(LineQueue::new(Vec::new()));
    let importer = Importer::new(Arc::new(LocalStore::new(dir.path())), queue);

    let summary = importer
        .handle_event(&upload_event("uploaded/folder.csv"))
        .await;

    assert_eq!(summary.failed, 1);
    assert!(folder.is_dir());
    Ok(())
}
