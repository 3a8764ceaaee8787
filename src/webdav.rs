#![doc = "WebDAV client: the reqwest-backed implementation of the remote store seam."]
//
//! # WebDAV client
//!
//! [`WebDavClient`] implements [`RemoteStore`] against any HTTP server that answers `HEAD` and
//! `PUT` per object path (Nextcloud, ownCloud, Apache mod_dav, ...).
//!
//! - Every request carries the configured credentials as HTTP basic auth.
//! - Uploads stream the file from disk with an explicit `Content-Length`; the file is never
//!   buffered whole in memory.
//! - Connect and request timeouts come from [`TransportConfig`]; an expired timeout surfaces as
//!   [`PublishError::Network`] like any other transport failure.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::config::{Credentials, TransportConfig};
use crate::contract::{RemoteObjectRef, RemoteResponse, RemoteStore};
use crate::error::{PublishError, Stage};

const OCTET_STREAM: &str = "application/octet-stream";

pub struct WebDavClient {
    client: Client,
    credentials: Credentials,
}

impl WebDavClient {
    pub fn new(
        credentials: Credentials,
        transport: TransportConfig,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .connect_timeout(transport.connect_timeout)
            .timeout(transport.request_timeout)
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build HTTP client");
                PublishError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;
        info!(
            username = %credentials.username,
            request_timeout_secs = transport.request_timeout.as_secs(),
            connect_timeout_secs = transport.connect_timeout.as_secs(),
            "Initialized WebDavClient"
        );
        Ok(WebDavClient {
            client,
            credentials,
        })
    }

    fn transport_error(url: &str, e: reqwest::Error) -> PublishError {
        error!(
            error = ?e,
            url = %url,
            timeout = e.is_timeout(),
            connect = e.is_connect(),
            "HTTP request failed"
        );
        PublishError::network(url, e)
    }
}

#[async_trait]
impl RemoteStore for WebDavClient {
    async fn head(&self, object: &RemoteObjectRef) -> Result<StatusCode, PublishError> {
        let url = object.url();
        debug!(url = %url, "Sending HEAD request");

        let response = self
            .client
            .head(url.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.secret))
            .send()
            .await
            .map_err(|e| Self::transport_error(url.as_str(), e))?;

        Ok(response.status())
    }

    async fn put_file(
        &self,
        object: &RemoteObjectRef,
        local_path: &Path,
    ) -> Result<RemoteResponse, PublishError> {
        let url = object.url();

        let file = tokio::fs::File::open(local_path).await.map_err(|e| {
            error!(error = ?e, path = %local_path.display(), "Failed to open file for upload");
            PublishError::io(Stage::Transfer, local_path, e)
        })?;
        let length = file
            .metadata()
            .await
            .map_err(|e| PublishError::io(Stage::Transfer, local_path, e))?
            .len();

        info!(url = %url, path = %local_path.display(), bytes = length, "Sending PUT request");

        let body = Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .client
            .put(url.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.secret))
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await
            .map_err(|e| Self::transport_error(url.as_str(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        debug!(url = %url, status = status.as_u16(), body_len = body.len(), "PUT answered");

        Ok(RemoteResponse {
            status,
            body,
            bytes_sent: length,
        })
    }
}
