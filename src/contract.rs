//! # contract: the narrow interface the pipeline uses to reach a remote store
//!
//! The publish pipeline never talks HTTP directly. It addresses objects with a
//! [`RemoteObjectRef`] and issues exactly two kinds of request through the [`RemoteStore`]
//! trait: a metadata-only query (`head`) and a whole-file write (`put_file`).
//!
//! ## Implementations
//! - [`crate::webdav::WebDavClient`]: the real reqwest-backed client with basic auth.
//! - `MockRemoteStore`: generated by `mockall` for pipeline tests (exported under the
//!   `test-export-mocks` feature so integration tests can use it).
//!
//! ## Status handling
//! Implementations report raw HTTP statuses. Interpreting them (what counts as "exists", what
//! counts as a successful upload) is the caller's job, see [`crate::exists`] and
//! [`crate::publish`]. Implementations only fail on transport errors or unreadable local files.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use crate::error::PublishError;

/// Address of one object on the remote store: a normalized base plus a single file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectRef {
    /// Ends with exactly one `/`.
    pub base: Url,
    pub object_name: String,
}

impl RemoteObjectRef {
    pub fn new(base: Url, object_name: impl Into<String>) -> Self {
        RemoteObjectRef {
            base,
            object_name: object_name.into(),
        }
    }

    /// The exact request target. The object name becomes one percent-encoded path segment, so
    /// names containing spaces, `#` or `?` cannot escape into the query or fragment.
    pub fn url(&self) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.object_name);
        }
        url
    }
}

/// Status and body returned by a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: StatusCode,
    pub body: String,
    /// Number of bytes sent as the request body.
    pub bytes_sent: u64,
}

/// Trait for querying and writing single objects on a WebDAV-like store.
///
/// Credentials are owned by the implementor and attached to every request.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Metadata-only query (HEAD) for the object. Returns the raw status.
    async fn head(&self, object: &RemoteObjectRef) -> Result<StatusCode, PublishError>;

    /// Streams the local file at `local_path` as the full content of the object (PUT).
    async fn put_file(
        &self,
        object: &RemoteObjectRef,
        local_path: &Path,
    ) -> Result<RemoteResponse, PublishError>;
}
