use std::time::Duration;

use anyhow::Context;
use clap::{Arg, Command};
use csv_import::telemetry::init_tracing;
use csv_import::{aws, error_body, ImportConfig, UploadUrls};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("import-products-file")
        .about("Print a signed URL a client can PUT a product CSV to")
        .arg(
            Arg::new("name")
                .long("name")
                .help("File name under the upload prefix"),
        )
        .get_matches();

    let config = ImportConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, &config.log_format);

    let urls = UploadUrls::new(
        aws::s3_store(&config).await,
        config.bucket_name.clone(),
        config.key_layout(),
        Duration::from_secs(config.upload_url_ttl_secs),
    );

    let name = matches.get_one::<String>("name").map(String::as_str);
    match urls.signed_upload(name).await {
        Ok(signed) => {
            println!("{}", serde_json::to_string(&signed)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", error_body(&err));
            std::process::exit(if err.status_code() < 500 { 2 } else { 1 });
        }
    }
}
