//! roi-ingest - Marketing ROI ingestion service
//!
//! `serve` runs the HTTP/SSE API used by the dashboard front end.
//! `analyze` runs one ingestion from the command line and writes the text
//! report.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use roi_common::config::load_toml_config_or_default;
use roi_common::events::EventBus;
use roi_common::{format_report, recommend, report_filename, FileInfo, UploadState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roi_ingest::services::{IngestionService, PredictorClient};
use roi_ingest::{build_router, AppState, IngestConfig, EVENT_BUS_CAPACITY};

/// Command-line arguments for roi-ingest
#[derive(Parser, Debug)]
#[command(name = "roi-ingest")]
#[command(about = "Marketing campaign ROI ingestion and dashboard service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Full URL of the predictor's upload endpoint
        #[arg(long)]
        predictor_url: Option<String>,
    },

    /// Score one file and write the report
    Analyze {
        /// Dataset to upload (.csv, .xlsx or .xls)
        file: PathBuf,

        /// Directory the report is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Number of recommendations in the report
        #[arg(short, long)]
        limit: Option<usize>,

        /// Full URL of the predictor's upload endpoint
        #[arg(long)]
        predictor_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is read before tracing so the log level can come from it;
    // any problem is reported once the subscriber is up.
    let (toml_config, config_problem) = load_toml_config_or_default();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &toml_config.logging.level;
                format!("roi_ingest={level},roi_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "roi-ingest {} ({}, {} build, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );
    if let Some(problem) = config_problem {
        warn!("{}; continuing with defaults", problem);
    }

    match cli.command {
        Command::Serve { port, predictor_url } => {
            let config = IngestConfig::resolve(port, predictor_url.as_deref(), &toml_config);
            serve(config).await
        }
        Command::Analyze {
            file,
            output_dir,
            limit,
            predictor_url,
        } => {
            let config = IngestConfig::resolve(None, predictor_url.as_deref(), &toml_config);
            analyze(config, &file, &output_dir, limit).await
        }
    }
}

async fn serve(config: IngestConfig) -> Result<()> {
    let predictor = PredictorClient::new(&config.predictor_url, config.request_timeout)
        .context("Failed to create predictor client")?;
    info!("Predictor: {}", predictor.predict_url());

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, Arc::new(predictor), event_bus);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn analyze(config: IngestConfig, file: &Path, output_dir: &Path, limit: Option<usize>) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("Not a file path: {}", file.display()))?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let predictor = PredictorClient::new(&config.predictor_url, config.request_timeout)
        .context("Failed to create predictor client")?;
    let service = IngestionService::new(
        Arc::new(predictor),
        EventBus::new(EVENT_BUS_CAPACITY),
        Default::default(),
    );

    let info = FileInfo::new(file_name, bytes.len() as u64, "");
    info!("Uploading {} ({})", info.name, info.display_size());

    let ticket = service.start_upload(info, bytes).await?;
    ticket.wait().await;

    let session = service.status().await;
    if session.state != UploadState::Complete {
        bail!(
            "Analysis failed: {}",
            session.error_message.as_deref().unwrap_or("upload did not complete")
        );
    }

    let source = service.data_source().await;
    let summary = source.summary().context("No summary after a completed upload")?;

    let today = Utc::now().date_naive();
    let recommendations = recommend(&summary.campaigns, limit.unwrap_or(config.recommendation_count));
    let report = format_report(summary, &recommendations, today);

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let report_path = output_dir.join(report_filename(today));
    tokio::fs::write(&report_path, report)
        .await
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    info!(
        total_campaigns = summary.total_campaigns,
        predicted_successful = summary.predicted_successful,
        "Analysis complete"
    );
    println!("{}", report_path.display());
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
