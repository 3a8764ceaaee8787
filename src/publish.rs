//! High-level pipeline: rename → timestamp → compress → overwrite guard → transfer.
//!
//! This module turns one [`PublishConfig`] into one upload. Each stage is a function from the
//! current [`JobState`] to the next one (or a [`PublishError`]), chained with `?` so the first
//! failure aborts everything after it.
//!
//! # Stages
//! 1. Literal rename, if a rename target is configured.
//! 2. Date/time stamp, if either flag is set. Uses the timestamp captured when the
//!    [`UploadJob`] was built, so the name is stable for the lifetime of the job.
//! 3. Compression into `<file>.zip`, if requested.
//! 4. Overwrite guard: unless override is set, HEAD the *final* object name and refuse to continue
//!    if it exists.
//! 5. Transfer: PUT the final file; only 201 and 204 count as success.
//!
//! # Error Handling
//! Nothing is retried or undone. A successful rename followed by a failed compression leaves the
//! renamed file on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use reqwest::{StatusCode, Url};
use tracing::{error, info};

use crate::archive;
use crate::config::PublishConfig;
use crate::contract::{RemoteObjectRef, RemoteStore};
use crate::error::{PublishError, Stage};
use crate::exists::remote_exists;
use crate::rename;

/// One publish invocation: the validated config plus the timestamp captured at construction.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub config: PublishConfig,
    pub stamp: DateTime<Local>,
}

impl UploadJob {
    pub fn new(config: PublishConfig) -> Self {
        Self::with_stamp(config, Local::now())
    }

    pub fn with_stamp(config: PublishConfig, stamp: DateTime<Local>) -> Self {
        UploadJob { config, stamp }
    }
}

/// Mutable part of a job as it moves through the stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    /// The file the next stage (or the transfer) operates on.
    pub local_path: PathBuf,
    pub compressed: bool,
}

impl JobState {
    pub fn start(source_path: &Path) -> Self {
        JobState {
            local_path: source_path.to_path_buf(),
            compressed: false,
        }
    }

    /// Remote object name: the basename of the current local file.
    ///
    /// Non-UTF-8 basenames are refused rather than uploaded under a lossy name.
    pub fn object_name(&self) -> Result<String, PublishError> {
        let name = self.local_path.file_name().ok_or_else(|| {
            PublishError::Configuration(format!(
                "{} does not name a file",
                self.local_path.display()
            ))
        })?;
        name.to_str().map(str::to_owned).ok_or_else(|| {
            error!(path = %self.local_path.display(), "File name is not valid UTF-8");
            PublishError::Configuration(format!(
                "file name of {} is not valid UTF-8 and cannot be used as a remote object name",
                self.local_path.display()
            ))
        })
    }
}

/// Terminal success value.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub local_path: PathBuf,
    pub object_name: String,
    pub url: Url,
    pub status: StatusCode,
    pub compressed: bool,
    pub bytes_sent: u64,
}

/// Runs the whole pipeline for `job` against `store`.
pub async fn publish<S>(job: &UploadJob, store: &S) -> Result<PublishReport, PublishError>
where
    S: RemoteStore + ?Sized,
{
    info!(source = %job.config.source_path.display(), "[PUBLISH] Starting publish pipeline");

    let state = JobState::start(&job.config.source_path);
    let state = apply_literal_rename(job, state)?;
    let state = apply_timestamp(job, state)?;
    let state = apply_compression(job, state).await?;

    let object = RemoteObjectRef::new(job.config.remote_base.clone(), state.object_name()?);
    check_overwrite_guard(job, store, &object).await?;
    transfer(store, state, object).await
}

pub fn apply_literal_rename(job: &UploadJob, state: JobState) -> Result<JobState, PublishError> {
    let Some(new_name) = job.config.flags.rename.as_deref() else {
        return Ok(state);
    };
    info!(from = %state.local_path.display(), to = %new_name, "[PUBLISH][RENAME] Renaming file");
    let local_path = rename::rename_literal(&state.local_path, new_name)?;
    Ok(JobState { local_path, ..state })
}

pub fn apply_timestamp(job: &UploadJob, state: JobState) -> Result<JobState, PublishError> {
    let flags = &job.config.flags;
    if !flags.append_date && !flags.append_time {
        return Ok(state);
    }
    info!(
        path = %state.local_path.display(),
        date = flags.append_date,
        time = flags.append_time,
        "[PUBLISH][STAMP] Appending date/time to file name"
    );
    let local_path =
        rename::append_date_time(&state.local_path, flags.append_date, flags.append_time, &job.stamp)?;
    Ok(JobState { local_path, ..state })
}

/// Runs the archiver on the blocking pool so the caller can still be cancelled while it works.
pub async fn apply_compression(job: &UploadJob, state: JobState) -> Result<JobState, PublishError> {
    if !job.config.flags.compress {
        return Ok(state);
    }
    let source = state.local_path.clone();
    let local_path = tokio::task::spawn_blocking(move || archive::archive_single_file(&source))
        .await
        .map_err(|e| {
            error!(error = ?e, path = %state.local_path.display(), "[PUBLISH][ZIP] Compression task failed");
            PublishError::io(Stage::Compress, &state.local_path, std::io::Error::other(e))
        })??;
    info!(archive = %local_path.display(), "[PUBLISH][ZIP] Uploading zipped file");
    Ok(JobState {
        local_path,
        compressed: true,
    })
}

/// Fails with [`PublishError::AlreadyExists`] if `object` is confirmed present and override is
/// not set. Never touches the store when override is set.
pub async fn check_overwrite_guard<S>(
    job: &UploadJob,
    store: &S,
    object: &RemoteObjectRef,
) -> Result<(), PublishError>
where
    S: RemoteStore + ?Sized,
{
    if job.config.flags.override_existing {
        info!(url = %object.url(), "[PUBLISH][GUARD] Override set, skipping existence check");
        return Ok(());
    }

    if remote_exists(store, object, job.config.existence_policy).await? {
        let url = object.url().to_string();
        error!(url = %url, "[PUBLISH][GUARD] Remote object exists and override is not set");
        return Err(PublishError::AlreadyExists { url });
    }
    Ok(())
}

async fn transfer<S>(
    store: &S,
    state: JobState,
    object: RemoteObjectRef,
) -> Result<PublishReport, PublishError>
where
    S: RemoteStore + ?Sized,
{
    let url = object.url();
    info!(url = %url, path = %state.local_path.display(), "[PUBLISH][UPLOAD] Transferring file");

    let response = store.put_file(&object, &state.local_path).await?;
    if response.status != StatusCode::CREATED && response.status != StatusCode::NO_CONTENT {
        error!(
            url = %url,
            status = response.status.as_u16(),
            body = %response.body,
            "[PUBLISH][UPLOAD] Upload rejected"
        );
        return Err(PublishError::Upload {
            status: response.status,
            body: response.body,
        });
    }

    info!(
        url = %url,
        status = response.status.as_u16(),
        bytes = response.bytes_sent,
        "[PUBLISH][UPLOAD] File uploaded successfully"
    );
    Ok(PublishReport {
        local_path: state.local_path,
        object_name: object.object_name,
        url,
        status: response.status,
        compressed: state.compressed,
        bytes_sent: response.bytes_sent,
    })
}

