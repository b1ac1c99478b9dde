//! Test helpers for integration tests.
//!
//! Provides a fake log-serving backend speaking the status/entries JSON
//! protocol on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use logfollow::config::FeedConfig;
use logfollow::LogEntry;

/// Page size of the entries endpoint.
pub const PAGE_SIZE: usize = 25;

/// How the fake backend answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Normal JSON answers.
    #[default]
    Ok,
    /// HTTP 500 on both endpoints.
    ServerError,
    /// 200 with a body missing required fields.
    Malformed,
}

#[derive(Default)]
struct BackendState {
    entries: Vec<LogEntry>,
    mode: Mode,
    status_calls: usize,
    entries_calls: usize,
    queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<BackendState>>;

/// Fake backend running on a background task.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/status", get(status))
            .route("/entries", get(entries))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Feed configuration pointing at this backend.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            status_url: format!("http://{}/status", self.addr),
            entries_url: format!("http://{}/entries", self.addr),
            connect_timeout_secs: 2,
            total_timeout_secs: 5,
            ..FeedConfig::default()
        }
    }

    /// Append an entry as the producer would.
    pub fn push(&self, id: u64, log_time: i64) {
        self.state
            .lock()
            .unwrap()
            .entries
            .push(LogEntry::new(id, log_time, format!("<td>entry {id}</td>")));
    }

    /// Change how the backend answers.
    pub fn set_mode(&self, mode: Mode) {
        self.state.lock().unwrap().mode = mode;
    }

    /// Number of status requests served.
    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }

    /// Number of entries requests served.
    pub fn entries_calls(&self) -> usize {
        self.state.lock().unwrap().entries_calls
    }

    /// Query parameters of the most recent request.
    pub fn last_query(&self) -> HashMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .queries
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

fn markers(entries: &[LogEntry]) -> (u64, i64) {
    let last_id = entries.iter().map(|e| e.id).max().unwrap_or(0);
    let last_modified = entries.iter().map(|e| e.sort_key).max().unwrap_or(0);
    (last_id, last_modified)
}

fn failure(mode: Mode) -> Option<Response> {
    match mode {
        Mode::Ok => None,
        Mode::ServerError => Some(StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Mode::Malformed => Some(Json(json!({ "last_modified": 1 })).into_response()),
    }
}

async fn status(State(state): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Response {
    let mut state = state.lock().unwrap();
    state.status_calls += 1;
    state.queries.push(query);

    if let Some(response) = failure(state.mode) {
        return response;
    }

    let (last_id, last_modified) = markers(&state.entries);
    Json(json!({ "last_id": last_id, "last_modified": last_modified })).into_response()
}

async fn entries(State(state): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Response {
    let mut state = state.lock().unwrap();
    state.entries_calls += 1;
    let after: u64 = query
        .get("last_id")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    state.queries.push(query);

    if let Some(response) = failure(state.mode) {
        return response;
    }

    // Newest log time first, one page, like the log browser's own query.
    let mut page: Vec<LogEntry> = state
        .entries
        .iter()
        .filter(|e| e.id > after)
        .cloned()
        .collect();
    page.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    page.truncate(PAGE_SIZE);

    let (last_id, last_modified) = markers(&state.entries);
    Json(json!({
        "last_id": last_id,
        "last_modified": last_modified,
        "log_entries": page,
    }))
    .into_response()
}
