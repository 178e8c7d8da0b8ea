use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Arg, Command};
use csv_import::telemetry::init_tracing;
use csv_import::{AuthorizerEvent, BasicAuthorizer, EnvCredentials, ImportConfig};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("basic-authorizer")
        .about("Answer an API authorizer event with an allow or deny policy")
        .arg(
            Arg::new("event")
                .long("event")
                .help("Authorizer event JSON file; stdin when omitted or '-'")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .get_matches();

    let config = ImportConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level, &config.log_format);

    let path = matches.get_one::<PathBuf>("event").map(PathBuf::as_path);
    let event = read_event(path).await?;

    let response = BasicAuthorizer::new(EnvCredentials).authorize(&event);
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

async fn read_event(path: Option<&Path>) -> anyhow::Result<AuthorizerEvent> {
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
    serde_json::from_slice(&raw).context("not an authorizer event")
}
