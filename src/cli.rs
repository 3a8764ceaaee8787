//! This module implements the CLI interface for dav-publish: command parsing, the mapping from
//! flags/environment variables to [`RawInputs`], and the async entrypoint used by both `main()`
//! and the integration tests.
//!
//! Every option can be given as a long flag or through the action-style `INPUT_*` environment
//! variable named next to it, so the binary works unchanged as a CI step.
//!
//! [`RawInputs`]: crate::load_config::RawInputs

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::PublishError;
use crate::load_config::{load_config, RawInputs};
use crate::publish::{publish, PublishReport, UploadJob};
use crate::webdav::WebDavClient;

/// CLI for dav-publish: push one file to a WebDAV store without clobbering existing objects.
#[derive(Parser)]
#[clap(
    name = "dav-publish",
    version,
    about = "Rename, timestamp, compress and upload a file to a WebDAV (Nextcloud) folder"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a single file to the remote folder
    Publish(PublishArgs),
}

#[derive(Args, Debug, Default)]
pub struct PublishArgs {
    /// Optional YAML file with non-secret settings; flags and env vars take precedence
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Local file to publish
    #[clap(long, env = "INPUT_FILE_PATH")]
    pub file_path: Option<String>,

    /// Remote folder URL, e.g. https://cloud.example.com/remote.php/dav/files/alice/releases
    #[clap(long, env = "INPUT_NEXTCLOUD_URL")]
    pub url: Option<String>,

    #[clap(long, env = "INPUT_USERNAME")]
    pub username: Option<String>,

    #[clap(long, env = "INPUT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Overwrite an existing remote object (true/false)
    #[clap(long = "override", env = "INPUT_OVERRIDE")]
    pub override_existing: Option<String>,

    /// Rename the local file before anything else ("false" or empty to skip)
    #[clap(long, env = "INPUT_RENAME")]
    pub rename: Option<String>,

    /// Compress into <file>.zip before upload (true/false)
    #[clap(long, env = "INPUT_ZIP")]
    pub zip: Option<String>,

    /// Append _YYYY_MM_DD to the file name (true/false)
    #[clap(long, env = "INPUT_DATE")]
    pub date: Option<String>,

    /// Append _HH_MM_SS to the file name (true/false)
    #[clap(long, env = "INPUT_TIME")]
    pub time: Option<String>,

    /// Per-request timeout in seconds
    #[clap(long, env = "INPUT_TIMEOUT")]
    pub timeout: Option<String>,

    /// Abort when the existence check returns anything other than 200/404/410 (true/false)
    #[clap(long, env = "INPUT_STRICT_CHECK")]
    pub strict_check: Option<String>,
}

impl From<PublishArgs> for RawInputs {
    fn from(args: PublishArgs) -> Self {
        RawInputs {
            file_path: args.file_path,
            url: args.url,
            username: args.username,
            password: args.password,
            override_existing: args.override_existing,
            rename: args.rename,
            zip: args.zip,
            date: args.date,
            time: args.time,
            timeout: args.timeout,
            strict_check: args.strict_check,
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<PublishReport, PublishError> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish(mut args) => {
            let config_path = args.config.take();
            let config = load_config(config_path.as_deref(), args.into())?;
            let store = WebDavClient::new(config.credentials.clone(), config.transport)?;
            let job = UploadJob::new(config);

            tracing::info!(command = "publish", "Starting publish");
            tokio::select! {
                result = publish(&job, &store) => result,
                Ok(()) = tokio::signal::ctrl_c() => {
                    tracing::warn!(command = "publish", "Interrupted, aborting publish");
                    Err(PublishError::Cancelled)
                }
            }
        }
    }
}
