#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use standup_client::{PreferenceStore, StoreError};
use standup_core::{Channel, ChannelPreference, SavedSelection, Workspace, WorkspaceId};
use tokio::net::TcpListener;
use tokio::sync::Notify;

pub fn channel(id: &str, name: &str, is_private: bool) -> Channel {
    Channel { id: id.to_string(), name: name.to_string(), is_private }
}

pub fn saved(id: &str, time: &str, timezone: &str) -> SavedSelection {
    SavedSelection {
        id: id.to_string(),
        name: None,
        standup_time: Some(time.to_string()),
        timezone: Some(timezone.to_string()),
    }
}

#[derive(Default)]
pub struct Calls {
    pub workspace: AtomicUsize,
    pub channels: AtomicUsize,
    pub selection: AtomicUsize,
    pub saves: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.workspace.load(Ordering::SeqCst)
            + self.channels.load(Ordering::SeqCst)
            + self.selection.load(Ordering::SeqCst)
            + self.saves.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

/// In-memory store with scripted answers. Each operation can be held behind a gate so tests
/// decide completion order.
pub struct ScriptedStore {
    workspace: Result<Workspace, StoreError>,
    channels: Mutex<VecDeque<Result<Vec<Channel>, StoreError>>>,
    selection: Result<Option<SavedSelection>, StoreError>,
    saves: Mutex<VecDeque<Result<(), StoreError>>>,
    workspace_gate: Option<Arc<Notify>>,
    channels_gate: Option<Arc<Notify>>,
    selection_gate: Option<Arc<Notify>>,
    save_gate: Option<Arc<Notify>>,
    pub calls: Calls,
    pub saved: Mutex<Vec<(String, ChannelPreference)>>,
}

impl ScriptedStore {
    /// Workspace `W123` named Acme with `#general` and a private `#leads`, no saved selection.
    pub fn new() -> Self {
        Self {
            workspace: Ok(Workspace {
                workspace_id: "W123".to_string(),
                workspace_name: "Acme".to_string(),
            }),
            channels: Mutex::new(VecDeque::from([Ok(vec![
                channel("C1", "general", false),
                channel("C2", "leads", true),
            ])])),
            selection: Ok(None),
            saves: Mutex::new(VecDeque::from([Ok(())])),
            workspace_gate: None,
            channels_gate: None,
            selection_gate: None,
            save_gate: None,
            calls: Calls::default(),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn with_workspace(mut self, result: Result<Workspace, StoreError>) -> Self {
        self.workspace = result;
        self
    }

    /// Answers are consumed in order; the last one repeats.
    pub fn with_channels(self, results: Vec<Result<Vec<Channel>, StoreError>>) -> Self {
        *self.channels.lock().expect("channels lock") = results.into();
        self
    }

    pub fn with_selection(mut self, result: Result<Option<SavedSelection>, StoreError>) -> Self {
        self.selection = result;
        self
    }

    pub fn with_saves(self, results: Vec<Result<(), StoreError>>) -> Self {
        *self.saves.lock().expect("saves lock") = results.into();
        self
    }

    pub fn gate_workspace(&mut self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.workspace_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_channels(&mut self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.channels_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_selection(&mut self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.selection_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_save(&mut self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.save_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn saved_preferences(&self) -> Vec<(String, ChannelPreference)> {
        self.saved.lock().expect("saved lock").clone()
    }
}

fn next_scripted<T: Clone>(queue: &Mutex<VecDeque<T>>) -> T {
    let mut queue = queue.lock().expect("script lock");
    if queue.len() > 1 {
        queue.pop_front().expect("non-empty script")
    } else {
        queue.front().cloned().expect("script must not be empty")
    }
}

async fn pass(gate: &Option<Arc<Notify>>) {
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

#[async_trait]
impl PreferenceStore for ScriptedStore {
    async fn get_workspace(&self, _workspace_id: &WorkspaceId) -> Result<Workspace, StoreError> {
        self.calls.workspace.fetch_add(1, Ordering::SeqCst);
        pass(&self.workspace_gate).await;
        self.workspace.clone()
    }

    async fn list_channels(&self, _workspace_id: &WorkspaceId) -> Result<Vec<Channel>, StoreError> {
        self.calls.channels.fetch_add(1, Ordering::SeqCst);
        pass(&self.channels_gate).await;
        next_scripted(&self.channels)
    }

    async fn get_saved_selection(
        &self,
        _workspace_id: &WorkspaceId,
    ) -> Result<Option<SavedSelection>, StoreError> {
        self.calls.selection.fetch_add(1, Ordering::SeqCst);
        pass(&self.selection_gate).await;
        self.selection.clone()
    }

    async fn save_preference(
        &self,
        workspace_id: &WorkspaceId,
        preference: &ChannelPreference,
    ) -> Result<(), StoreError> {
        self.calls.saves.fetch_add(1, Ordering::SeqCst);
        pass(&self.save_gate).await;
        let result = next_scripted(&self.saves);
        if result.is_ok() {
            self.saved
                .lock()
                .expect("saved lock")
                .push((workspace_id.as_str().to_string(), preference.clone()));
        }
        result
    }
}

/// Canned responses for the fake HTTP backend, keyed by route.
#[derive(Clone)]
pub struct BackendScript {
    pub workspace: (StatusCode, Value),
    pub channels: (StatusCode, Value),
    pub selection: (StatusCode, Value),
    pub save: (StatusCode, Value),
}

impl Default for BackendScript {
    fn default() -> Self {
        Self {
            workspace: (
                StatusCode::OK,
                json!({"workspace_id": "W123", "workspace_name": "Acme"}),
            ),
            channels: (
                StatusCode::OK,
                json!({"channels": [{"id": "C1", "name": "general", "is_private": false}]}),
            ),
            selection: (StatusCode::OK, json!({"selected_channel": null})),
            save: (
                StatusCode::OK,
                json!({"success": true, "message": "Channel and schedule updated successfully"}),
            ),
        }
    }
}

#[derive(Clone)]
struct BackendState {
    script: BackendScript,
    posts: Arc<Mutex<Vec<(String, Value)>>>,
    paths: Arc<Mutex<Vec<String>>>,
}

pub struct FakeBackend {
    pub base_url: String,
    posts: Arc<Mutex<Vec<(String, Value)>>>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    pub async fn spawn(script: BackendScript) -> Self {
        let posts = Arc::new(Mutex::new(Vec::new()));
        let paths = Arc::new(Mutex::new(Vec::new()));
        let state =
            BackendState { script, posts: Arc::clone(&posts), paths: Arc::clone(&paths) };

        let app = Router::new()
            .route("/", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/workspaces/{workspace_id}", get(workspace))
            .route("/api/channels/{workspace_id}", get(channels).post(save))
            .route("/api/workspace/{workspace_id}/channel", get(selection))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let address: SocketAddr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url: format!("http://{address}"), posts, paths }
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().expect("posts lock").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().expect("paths lock").clone()
    }
}

/// Base URL of a port that was bound and released, so connections are refused.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe");
    let address = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{address}")
}

fn record(state: &BackendState, path: String) {
    state.paths.lock().expect("paths lock").push(path);
}

async fn workspace(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    record(&state, format!("GET /workspaces/{workspace_id}"));
    let (status, body) = state.script.workspace.clone();
    (status, Json(body))
}

async fn channels(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    record(&state, format!("GET /api/channels/{workspace_id}"));
    let (status, body) = state.script.channels.clone();
    (status, Json(body))
}

async fn selection(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    record(&state, format!("GET /api/workspace/{workspace_id}/channel"));
    let (status, body) = state.script.selection.clone();
    (status, Json(body))
}

async fn save(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&state, format!("POST /api/channels/{workspace_id}"));
    state.posts.lock().expect("posts lock").push((workspace_id, payload));
    let (status, body) = state.script.save.clone();
    (status, Json(body))
}
