/// `load_config` module: merges an optional static YAML file with command-line/environment inputs
/// into a validated [`PublishConfig`].
///
/// This is the only place where untyped input (strings from flags or `INPUT_*` variables, YAML
/// from disk) is turned into the strongly-typed configuration the pipeline runs on.
///
/// # Responsibilities
/// - Parse the YAML file (non-secret settings only; unknown keys, including `password`, are
///   rejected so secrets do not end up in checked-in files)
/// - Let command-line/environment values override file values
/// - Parse textual booleans strictly, and fail on anything that is not a boolean
/// - Report every missing required input at once
///
/// # Errors
/// Every failure is a [`PublishError::Configuration`] and is raised before any stage of the
/// pipeline touches the filesystem or the network.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::config::{
    normalize_base_url, parse_flag, parse_rename, Credentials, ExistencePolicy, PublishConfig,
    PublishFlags, TransportConfig,
};
use crate::error::PublishError;
use crate::rename::validate_new_name;

/// Raw textual inputs as received from the command line or the environment.
#[derive(Debug, Default, Clone)]
pub struct RawInputs {
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub override_existing: Option<String>,
    pub rename: Option<String>,
    pub zip: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub timeout: Option<String>,
    pub strict_check: Option<String>,
}

/// Settings that may live in a YAML file. Credentials are deliberately absent.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub file_path: Option<PathBuf>,
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "override")]
    pub override_existing: Option<bool>,
    pub rename: Option<String>,
    pub zip: Option<bool>,
    pub date: Option<bool>,
    pub time: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub strict_check: Option<bool>,
}

/// Loads the optional YAML file at `path` and merges `raw` over it.
pub fn load_config(path: Option<&Path>, raw: RawInputs) -> Result<PublishConfig, PublishError> {
    let file = match path {
        Some(path) => read_config_file(path)?,
        None => FileConfig::default(),
    };
    let config = resolve(raw, file)?;
    config.trace_loaded();
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<FileConfig, PublishError> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(PublishError::Configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            )));
        }
    };

    if content.trim().is_empty() {
        info!(config_path = ?path, "Config file is empty, using defaults");
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str::<FileConfig>(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(PublishError::Configuration(format!(
                "failed to parse config YAML {}: {e}",
                path.display()
            )))
        }
    }
}

/// Merges raw inputs over file settings and validates the result.
///
/// Flags are parsed first, so a malformed boolean is reported even when required inputs are also
/// missing.
pub fn resolve(raw: RawInputs, file: FileConfig) -> Result<PublishConfig, PublishError> {
    let flags = PublishFlags {
        override_existing: merged_flag("override", raw.override_existing.as_deref(), file.override_existing)?,
        compress: merged_flag("zip", raw.zip.as_deref(), file.zip)?,
        append_date: merged_flag("date", raw.date.as_deref(), file.date)?,
        append_time: merged_flag("time", raw.time.as_deref(), file.time)?,
        rename: match non_blank(raw.rename) {
            Some(r) => parse_rename(Some(&r)),
            None => parse_rename(file.rename.as_deref()),
        },
    };
    if let Some(new_name) = flags.rename.as_deref() {
        validate_new_name(new_name)?;
    }
    let strict = merged_flag("strict check", raw.strict_check.as_deref(), file.strict_check)?;

    let file_path = non_blank(raw.file_path).or_else(|| {
        file.file_path
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.trim().is_empty())
    });
    let url = non_blank(raw.url).or_else(|| non_blank(file.url));
    let username = non_blank(raw.username).or_else(|| non_blank(file.username));
    let password = non_blank(raw.password);

    let mut missing = Vec::new();
    if file_path.is_none() {
        missing.push("file path");
    }
    if url.is_none() {
        missing.push("url");
    }
    if username.is_none() {
        missing.push("username");
    }
    if password.is_none() {
        missing.push("password");
    }
    let (Some(file_path), Some(url), Some(username), Some(secret)) =
        (file_path, url, username, password)
    else {
        error!(?missing, "Required inputs are missing");
        return Err(PublishError::Configuration(format!(
            "missing inputs: {}. Please ensure all necessary parameters are provided",
            missing.join(", ")
        )));
    };

    let remote_base = normalize_base_url(&url)?;
    let transport = TransportConfig {
        request_timeout: resolve_timeout(raw.timeout.as_deref(), file.timeout_secs)?,
        ..TransportConfig::default()
    };

    Ok(PublishConfig {
        source_path: PathBuf::from(file_path),
        remote_base,
        credentials: Credentials { username, secret },
        flags,
        existence_policy: if strict {
            ExistencePolicy::Strict
        } else {
            ExistencePolicy::Lenient
        },
        transport,
    })
}

fn merged_flag(name: &str, raw: Option<&str>, file: Option<bool>) -> Result<bool, PublishError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_flag(name, Some(value)),
        None => Ok(file.unwrap_or(false)),
    }
}

fn resolve_timeout(raw: Option<&str>, file: Option<u64>) -> Result<Duration, PublishError> {
    let secs = match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.parse::<u64>().map_err(|e| {
            PublishError::Configuration(format!(
                "invalid value for timeout. Must be a whole number of seconds, received: {value} ({e})"
            ))
        })?,
        None => match file {
            Some(secs) => secs,
            None => return Ok(TransportConfig::default().request_timeout),
        },
    };
    if secs == 0 {
        return Err(PublishError::Configuration(
            "timeout must be at least one second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
