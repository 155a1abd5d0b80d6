//! cj-import - Journalist CSV bulk import
//!
//! Parses a CSV export of journalist contacts, maps its columns onto profile
//! fields, then imports the valid rows into the admin backend in two phases:
//! profiles first, email screenshots second.

use anyhow::{Context, Result};
use clap::Parser;
use cj_common::config::resolve_config_path;
use cj_common::events::{CjEvent, EventBus};
use cj_import::config::{load_config_with_logging, CliOverrides, ImportConfig, ENV_CONFIG};
use cj_import::ingest::{count_drive_screenshots, duplicate_mappings};
use cj_import::models::{FieldMapping, ImportSession};
use cj_import::report::render_preview;
use cj_import::services::{HttpAdminClient, ImportWorkflow, JournalistAdmin, MemoryAdmin};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "cj_import=info,cj_common=info";

#[derive(Parser, Debug)]
#[command(name = "cj-import", version, about = "Bulk import journalist profiles from a CSV file")]
struct Args {
    /// CSV file to import
    file: PathBuf,

    /// Override a column mapping, e.g. --map "Beat=categories" or --map "Notes=skip"
    #[arg(long = "map", value_name = "HEADER=FIELD", value_parser = parse_mapping)]
    mappings: Vec<(String, FieldMapping)>,

    /// Show the mapping table and valid row count, then exit
    #[arg(long)]
    preview: bool,

    /// Import into an in-memory directory instead of the backend
    #[arg(long)]
    dry_run: bool,

    /// Base URL of the admin backend
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Bearer token for the admin backend
    #[arg(long, value_name = "TOKEN")]
    access_token: Option<String>,

    /// Rows per bulk-import call
    #[arg(long)]
    batch_size: Option<usize>,

    /// Images per processing call
    #[arg(long)]
    image_batch_size: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout: Option<u64>,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn parse_mapping(value: &str) -> std::result::Result<(String, FieldMapping), String> {
    let (header, field) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected HEADER=FIELD, got '{}'", value))?;
    if header.trim().is_empty() {
        return Err("column header is empty".to_string());
    }
    Ok((header.trim().to_string(), field.parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), ENV_CONFIG, "cj-import");
    let ((), toml_config) = load_config_with_logging(config_path.as_deref(), |level| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_FILTER)));
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(filter)
            .init();

        info!("cj-import {}", cj_import::build_id());
    });

    let toml_config = toml_config.context("Failed to load config file")?;
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    let config = ImportConfig::resolve(
        &CliOverrides {
            api_url: args.api_url.clone(),
            access_token: args.access_token.clone(),
            batch_size: args.batch_size,
            image_batch_size: args.image_batch_size,
            request_timeout_secs: args.request_timeout,
        },
        &toml_config,
    )
    .context("Invalid configuration")?;

    // Upload
    let mut session = ImportSession::new();
    session
        .upload_file(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    // Mapping
    for (header, mapping) in &args.mappings {
        session
            .set_mapping_by_header(header, *mapping)
            .with_context(|| format!("Cannot apply --map {}={}", header, mapping))?;
    }

    for field in duplicate_mappings(session.mappings()) {
        warn!("More than one column maps to '{}'; the rightmost non-empty value wins", field);
    }

    let drive_screenshots = count_drive_screenshots(&session.valid_rows());
    if drive_screenshots > 0 {
        info!("{} rows have Google Drive email screenshots", drive_screenshots);
    }

    if args.preview {
        print!("{}", render_preview(&session));
        return Ok(());
    }

    // Importing
    let admin: Arc<dyn JournalistAdmin> = if args.dry_run {
        info!("Dry run: importing into an in-memory directory");
        Arc::new(MemoryAdmin::new())
    } else {
        let (api_url, access_token) = config.remote_credentials()?;
        let client = HttpAdminClient::new(api_url, Some(access_token.to_string()), config.request_timeout)
            .context("Failed to create admin client")?;
        info!("Admin endpoint: {}", client.endpoint());
        Arc::new(client)
    };

    let event_bus = EventBus::new(100);
    let progress_task = tokio::spawn(log_progress(event_bus.subscribe()));

    let workflow = ImportWorkflow::new(admin, event_bus)
        .with_batch_sizes(config.batch_size, config.image_batch_size);

    let summary = tokio::select! {
        result = workflow.run(&mut session) => result.context("Import refused")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted: this import run is lost. Rows already submitted stay imported; re-run to resume (existing emails are skipped).");
            anyhow::bail!("Import interrupted");
        }
    };

    // Workflow owned the last sender; the progress task ends once it drains
    drop(workflow);
    let _ = progress_task.await;

    print!("{}", summary.render());
    Ok(())
}

/// Log progress events until the bus closes
async fn log_progress(mut rx: broadcast::Receiver<CjEvent>) {
    loop {
        match rx.recv().await {
            Ok(CjEvent::ImportProgressUpdate { phase, current, total, percentage, .. }) => {
                info!("{}: {}/{} ({:.0}%)", phase.label(), current, total, percentage);
            }
            Ok(CjEvent::ImportBatchFailed { phase, first_row, batch_len, message, .. }) => {
                warn!(
                    "{}: batch of {} starting at {} failed: {}",
                    phase.label(),
                    batch_len,
                    first_row,
                    message
                );
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Progress display skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
