//! Scene generation worker binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aeon_gen_client::{progress, GenerationClient};
use aeon_models::JobState;
use aeon_planner::PlanRequest;
use aeon_worker::metrics::init_metrics;
use aeon_worker::{BatchReport, BatchRunner, WorkerConfig};

/// Generate one batch of video scenes and wait for the results.
#[derive(Debug, Parser)]
#[command(name = "aeon-worker", version)]
struct Args {
    /// Base prompt shared by every scene
    #[arg(long, env = "SCENE_PROMPT")]
    prompt: String,

    /// Total video length in seconds
    #[arg(long, env = "TOTAL_DURATION", default_value_t = 20)]
    total_duration: u32,

    /// Length of each scene in seconds
    #[arg(long, env = "SCENE_DURATION", default_value_t = 5)]
    scene_duration: u32,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Poll interval in milliseconds (derived from the estimate when unset)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Maximum number of poll cycles
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Load the model catalog from the backend before planning
    #[arg(long)]
    refresh_catalog: bool,

    /// Print the full batch report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    let args = Args::parse();
    let config = apply_args(WorkerConfig::from_env(), &args);
    info!(
        backend = %config.client.base_url,
        max_attempts = config.poll_max_attempts,
        refresh_catalog = config.refresh_model_catalog,
        "Starting aeon-worker"
    );

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled");
        Some(init_metrics()?)
    } else {
        None
    };

    let client = GenerationClient::new(config.client.clone())?;
    if !client.health_check().await? {
        warn!("Generation backend did not report healthy, continuing anyway");
    }

    // Ctrl-C cancels polling; scenes already launched keep running remotely
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, cancelling batch");
            let _ = cancel_tx.send(true);
        }
    });

    let (progress_tx, mut progress_rx) = progress::channel(16);
    let printer = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            let summary = &update.summary;
            eprintln!(
                "[poll {}] {}% done: {} completed, {} failed, {} in progress",
                update.attempt,
                summary.percent_done(),
                summary.completed,
                summary.failed,
                summary.in_progress
            );
        }
    });

    let request = PlanRequest::new(
        args.prompt.clone(),
        args.total_duration,
        args.scene_duration,
        config.width,
        config.height,
    );
    let runner = BatchRunner::new(client, config)
        .with_observer(Arc::new(progress_tx))
        .with_cancel(cancel_rx);

    let result = runner.run(&request).await;

    // Closes the progress channel
    drop(runner);
    printer.await.ok();

    if let Some(handle) = metrics_handle {
        debug!("Metrics snapshot:\n{}", handle.render());
    }

    match result {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            info!("Worker shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Batch failed: {}", e);
            if e.is_retryable() {
                info!("The batch may succeed if run again");
            }
            Err(e.into())
        }
    }
}

fn init_tracing() -> Result<()> {
    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("aeon_worker=info".parse()?)
        .add_directive("aeon_gen_client=info".parse()?)
        .add_directive("hyper=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    Ok(())
}

fn apply_args(mut config: WorkerConfig, args: &Args) -> WorkerConfig {
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval = Some(Duration::from_millis(ms));
    }
    if let Some(max_attempts) = args.max_attempts {
        config.poll_max_attempts = max_attempts;
    }
    config.refresh_model_catalog |= args.refresh_catalog;
    config
}

fn print_report(report: &BatchReport) {
    let outcome = &report.outcome;
    println!(
        "Batch {}: {} after {} polls ({} of {} scenes completed)",
        report.batch_id,
        outcome.state.as_str(),
        outcome.attempts,
        outcome.summary.completed,
        outcome.summary.total
    );

    for scene in &outcome.scenes {
        let detail = match scene.status.state {
            JobState::Completed => scene.status.output_url.as_deref().unwrap_or("-"),
            JobState::Failed => scene.status.error_detail.as_deref().unwrap_or("-"),
            JobState::Pending | JobState::Running => "unfinished",
        };
        println!(
            "  {:<32} {:<8} {:<10} {}",
            scene.scene_id.as_str(),
            scene.model_id,
            scene.status.state.as_str(),
            detail
        );
    }

    if !report.regeneration.is_empty() {
        println!(
            "{} scene(s) can be regenerated: {}",
            report.regeneration.len(),
            report
                .regeneration
                .iter()
                .map(|s| s.scene_id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
