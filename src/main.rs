use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filesum::{
    api, config, logging,
    service::FileService,
    store::{FsBlobStore, SqliteMetadataStore, sweep_orphaned_blobs},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "filesum",
    about = "Upload documents and keep a short summary of each"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve {
        /// Overrides SERVER_HOST.
        #[arg(long)]
        host: Option<String>,
        /// Overrides SERVER_PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Delete stored blobs that have no metadata record.
    Sweep {
        /// Only consider blobs at least this old.
        #[arg(long, default_value_t = 3600)]
        min_age_secs: u64,
        /// Report orphans without deleting them.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_config().context("failed to load configuration")?;
    logging::init_tracing();

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(host, port).await,
        Command::Sweep {
            min_age_secs,
            dry_run,
        } => sweep(Duration::from_secs(min_age_secs), dry_run).await,
    }
}

async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = config::get_config();
    let service = FileService::from_config(config)?;
    let app = api::create_router(Arc::new(service), config.max_upload_bytes);

    let host = host.unwrap_or_else(|| config.server_host.clone());
    let port = port.unwrap_or(config.server_port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}

async fn sweep(min_age: Duration, dry_run: bool) -> Result<()> {
    let config = config::get_config();
    let blobs = FsBlobStore::new(&config.storage_dir).context("failed to open storage folder")?;
    let metadata = SqliteMetadataStore::open(&config.database_path)
        .context("failed to open metadata database")?;

    let report = sweep_orphaned_blobs(&blobs, &metadata, min_age, dry_run).await?;
    println!(
        "scanned {} blobs, {} orphaned, {} removed",
        report.scanned,
        report.orphaned.len(),
        report.removed
    );
    for file_id in &report.orphaned {
        println!("{file_id}");
    }
    Ok(())
}
