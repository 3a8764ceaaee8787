#![allow(dead_code)]

//! In-process fake WebDAV server for integration tests.
//!
//! Answers HEAD and PUT on any path, checks basic auth against [`USERNAME`]/[`PASSWORD`], keeps
//! uploaded objects in memory keyed by the raw (still percent-encoded) request path, and records
//! every request so tests can assert on ordering and headers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "s3cret";
/// `Basic base64("alice:s3cret")`
pub const EXPECTED_AUTH: &str = "Basic YWxpY2U6czNjcmV0";
pub const DAV_PREFIX: &str = "/remote.php/dav/files/alice/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
}

#[derive(Default)]
pub struct ServerState {
    pub objects: HashMap<String, Vec<u8>>,
    pub requests: Vec<RecordedRequest>,
    pub head_status: Option<StatusCode>,
    pub put_response: Option<(StatusCode, String)>,
}

#[derive(Clone)]
pub struct FakeDav {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<ServerState>>,
}

impl FakeDav {
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(ServerState::default()));
        let app = Router::new().fallback(dav).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake dav listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake dav server");
        });
        FakeDav { addr, state }
    }

    /// Folder URL without a trailing slash, as users usually type it.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, DAV_PREFIX.trim_end_matches('/'))
    }

    pub fn object_path(name: &str) -> String {
        format!("{DAV_PREFIX}{name}")
    }

    pub fn insert_object(&self, name: &str, content: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(Self::object_path(name), content.to_vec());
    }

    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&Self::object_path(name))
            .cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.requests().into_iter().map(|r| r.method).collect()
    }

    pub fn force_head_status(&self, status: StatusCode) {
        self.state.lock().unwrap().head_status = Some(status);
    }

    pub fn force_put_response(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().put_response = Some((status, body.to_string()));
    }
}

async fn dav(
    State(state): State<Arc<Mutex<ServerState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = uri.path().to_string();
    let authorization = header_value(header::AUTHORIZATION);

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: authorization.clone(),
        content_type: header_value(header::CONTENT_TYPE),
        content_length: header_value(header::CONTENT_LENGTH),
    });

    if authorization.as_deref() != Some(EXPECTED_AUTH) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string());
    }

    if method == Method::HEAD {
        if let Some(status) = state.head_status {
            return (status, String::new());
        }
        return if state.objects.contains_key(&path) {
            (StatusCode::OK, String::new())
        } else {
            (StatusCode::NOT_FOUND, String::new())
        };
    }

    if method == Method::PUT {
        if let Some((status, body)) = state.put_response.clone() {
            return (status, body);
        }
        let replaced = state.objects.insert(path, body.to_vec()).is_some();
        return if replaced {
            (StatusCode::NO_CONTENT, String::new())
        } else {
            (StatusCode::CREATED, String::new())
        };
    }

    (StatusCode::METHOD_NOT_ALLOWED, String::new())
}
