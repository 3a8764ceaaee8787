use std::process::ExitCode;

use clap::Parser;
use dav_publish::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout only carries the upload summary.
fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("[ERROR] {e:#}");
        return ExitCode::FAILURE;
    }
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) => {
            tracing::info!(?report, "CLI completed successfully");
            println!(
                "Uploaded {} to {} (status {}, {} bytes{})",
                report.local_path.display(),
                report.url,
                report.status.as_u16(),
                report.bytes_sent,
                if report.compressed { ", zipped" } else { "" }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] Publish failed: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
