// dav-publish/src/config.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info};

use crate::error::PublishError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Username/secret pair sent as basic auth on every remote request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Which transformations run before the upload, and whether the overwrite guard is bypassed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishFlags {
    pub override_existing: bool,
    pub compress: bool,
    pub append_date: bool,
    pub append_time: bool,
    pub rename: Option<String>,
}

/// How the overwrite guard interprets a HEAD response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistencePolicy {
    /// Only 200 counts as "exists"; every other status is treated as absent.
    #[default]
    Lenient,
    /// 200 exists, 404/410 absent, anything else aborts the job.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Fully validated configuration for one publish invocation.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub source_path: PathBuf,
    /// Always ends with exactly one `/`.
    pub remote_base: Url,
    pub credentials: Credentials,
    pub flags: PublishFlags,
    pub existence_policy: ExistencePolicy,
    pub transport: TransportConfig,
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            source_path = %self.source_path.display(),
            remote_base = %self.remote_base,
            username = %self.credentials.username,
            override_existing = self.flags.override_existing,
            compress = self.flags.compress,
            append_date = self.flags.append_date,
            append_time = self.flags.append_time,
            rename = self.flags.rename.as_deref().unwrap_or("<none>"),
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}

/// Parses a textual boolean flag.
///
/// Accepts `1`, `t`, `true` and `0`, `f`, `false` in any letter case. An absent or blank value is
/// `false`; anything else is a configuration error naming the flag.
pub fn parse_flag(name: &str, raw: Option<&str>) -> Result<bool, PublishError> {
    // Looser than a strict `true`/`false` match: surrounding whitespace is ignored, letter case is
    // not significant and a blank value reads as false. Words like `yes` are still rejected.
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(false),
        Some(v) => v,
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(PublishError::Configuration(format!(
            "invalid value for {name} flag. Must be true or false, received: {value}"
        ))),
    }
}

/// Interprets the rename input: blank and the literal `false` both mean "do not rename".
pub fn parse_rename(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        None | Some("") | Some("false") => None,
        Some(name) => Some(name.to_string()),
    }
}

/// Parses the remote base and normalizes it to end with a single `/`.
pub fn normalize_base_url(raw: &str) -> Result<Url, PublishError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/")).map_err(|e| {
        PublishError::Configuration(format!("remote base {raw:?} is not a valid URL: {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(PublishError::Configuration(format!(
            "remote base {raw:?} must be an http or https URL"
        )));
    }
    Ok(url)
}
