//! Local renaming stages: literal rename and date/time stamping.
//!
//! Both stages physically move the file with `std::fs::rename` and return the new path. There is
//! no staging and no undo; a later failure leaves the moved file where it is.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use crate::error::{PublishError, Stage};

const DATE_FORMAT: &str = "_%Y_%m_%d";
const TIME_FORMAT: &str = "_%H_%M_%S";

/// Moves `path` to a sibling named `new_name`, keeping the original directory.
pub fn rename_literal(path: &Path, new_name: &str) -> Result<PathBuf, PublishError> {
    validate_new_name(new_name)?;
    let new_path = sibling(path, new_name);
    move_file(path, &new_path, Stage::Rename)?;
    Ok(new_path)
}

/// Checks that a rename target is a bare file name.
///
/// Absolute paths, separators and `.`/`..` are rejected so the file can only move within its own
/// directory.
pub fn validate_new_name(new_name: &str) -> Result<(), PublishError> {
    let components: Vec<Component<'_>> = Path::new(new_name).components().collect();
    if matches!(components.as_slice(), [Component::Normal(_)])
        && !new_name.ends_with(std::path::is_separator)
    {
        return Ok(());
    }
    error!(new_name = %new_name, "Rename target is not a plain file name");
    Err(PublishError::Configuration(format!(
        "rename target must be a file name without directories, received: {new_name}"
    )))
}

/// Inserts `_YYYY_MM_DD` and/or `_HH_MM_SS` (taken from `stamp`) before the extension of `path`
/// and moves the file there.
///
/// With both flags false nothing is moved and `path` is returned as is.
pub fn append_date_time(
    path: &Path,
    include_date: bool,
    include_time: bool,
    stamp: &DateTime<Local>,
) -> Result<PathBuf, PublishError> {
    if !include_date && !include_time {
        debug!(path = %path.display(), "No date/time requested, leaving file name untouched");
        return Ok(path.to_path_buf());
    }

    let file_name = path.file_name().ok_or_else(|| {
        PublishError::io(
            Stage::Timestamp,
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let new_name = stamped_file_name(Path::new(file_name), include_date, include_time, stamp);
    let new_path = path.with_file_name(new_name);
    move_file(path, &new_path, Stage::Timestamp)?;
    Ok(new_path)
}

/// Computes the stamped file name without touching the filesystem.
///
/// `report.txt` becomes `report_2024_03_01_13_05_09.txt`. The extension is whatever follows the
/// last dot, so `backup.tar.gz` keeps only `.gz` after the stamp, and a dotfile such as `.env`
/// has no extension and is stamped at the end.
pub fn stamped_file_name(
    name: &Path,
    include_date: bool,
    include_time: bool,
    stamp: &DateTime<Local>,
) -> OsString {
    let mut suffix = String::new();
    if include_date {
        suffix.push_str(&stamp.format(DATE_FORMAT).to_string());
    }
    if include_time {
        suffix.push_str(&stamp.format(TIME_FORMAT).to_string());
    }

    let mut stamped = name.file_stem().map(OsString::from).unwrap_or_default();
    stamped.push(&suffix);
    if let Some(ext) = name.extension() {
        stamped.push(".");
        stamped.push(ext);
    }
    stamped
}

fn sibling(path: &Path, new_name: &str) -> PathBuf {
    match path.parent() {
        Some(dir) => dir.join(new_name),
        None => PathBuf::from(new_name),
    }
}

fn move_file(from: &Path, to: &Path, stage: Stage) -> Result<(), PublishError> {
    match fs::rename(from, to) {
        Ok(()) => {
            info!(from = %from.display(), to = %to.display(), %stage, "File renamed");
            Ok(())
        }
        Err(e) => {
            error!(error = ?e, from = %from.display(), to = %to.display(), %stage, "Failed to rename file");
            Err(PublishError::io(stage, from, e))
        }
    }
}
