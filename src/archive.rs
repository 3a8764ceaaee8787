//! Single-file ZIP archiving.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, Timelike};
use tracing::{debug, error, info, warn};
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::error::{PublishError, Stage};

/// Writes `<path>.zip` holding one deflated entry named after the basename of `path`.
///
/// The entry carries the source's modification time (and unix mode bits where available). The
/// original file is left in place. If anything fails after the archive file was created, the
/// partial archive is removed before the error is returned.
pub fn archive_single_file(path: &Path) -> Result<PathBuf, PublishError> {
    let archive_path = archive_path_for(path);
    info!(source = %path.display(), archive = %archive_path.display(), "Compressing file");

    let entry_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PublishError::io(
                Stage::Compress,
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;

    let source = File::open(path).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to open file to compress");
        PublishError::io(Stage::Compress, path, e)
    })?;
    let metadata = source
        .metadata()
        .map_err(|e| PublishError::io(Stage::Compress, path, e))?;

    let target = File::create(&archive_path).map_err(|e| {
        error!(error = ?e, path = %archive_path.display(), "Failed to create archive file");
        PublishError::io(Stage::Compress, &archive_path, e)
    })?;

    let options = entry_options(&metadata);
    match write_entry(target, source, &entry_name, options) {
        Ok(bytes) => {
            info!(
                archive = %archive_path.display(),
                entry = %entry_name,
                bytes,
                "File compressed successfully"
            );
            Ok(archive_path)
        }
        Err(e) => {
            error!(error = ?e, archive = %archive_path.display(), "Failed to write archive");
            if let Err(cleanup) = fs::remove_file(&archive_path) {
                warn!(error = ?cleanup, archive = %archive_path.display(), "Could not remove partial archive");
            }
            Err(PublishError::io(Stage::Compress, archive_path, e))
        }
    }
}

/// `report.txt` -> `report.txt.zip`.
pub fn archive_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".zip");
    PathBuf::from(name)
}

fn write_entry(
    target: File,
    source: File,
    entry_name: &str,
    options: FileOptions,
) -> io::Result<u64> {
    let mut writer = zip::ZipWriter::new(BufWriter::new(target));
    writer
        .start_file(entry_name, options)
        .map_err(io::Error::other)?;
    let bytes = io::copy(&mut BufReader::new(source), &mut writer)?;
    let mut inner = writer.finish().map_err(io::Error::other)?;
    io::Write::flush(&mut inner)?;
    inner.get_ref().sync_all()?;
    Ok(bytes)
}

fn entry_options(metadata: &fs::Metadata) -> FileOptions {
    let mut options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip_time(metadata.modified().ok()))
        .large_file(needs_zip64(metadata.len()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode() & 0o777);
    }

    options
}

/// Entries of 4 GiB and above must be written with zip64 extensions.
fn needs_zip64(len: u64) -> bool {
    len >= u64::from(u32::MAX)
}

/// ZIP timestamps are local time between 1980 and 2107; anything else falls back to the epoch.
fn zip_time(modified: Option<SystemTime>) -> zip::DateTime {
    let Some(modified) = modified else {
        return zip::DateTime::default();
    };
    let local: DateTime<Local> = modified.into();
    let year = u16::try_from(local.year()).unwrap_or(0);
    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .unwrap_or_else(|_| {
        debug!(year, "Modification time outside ZIP range, using default timestamp");
        zip::DateTime::default()
    })
}
