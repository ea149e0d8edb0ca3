use std::env;
use std::sync::{Arc, Mutex, OnceLock};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use standup_cli::commands::setup::SetupArgs;
use standup_cli::commands::{config, doctor, install, setup};
use standup_core::config::{ConfigOverrides, LoadOptions};
use tokio::runtime::Runtime;

#[derive(Clone)]
struct Script {
    channels: (StatusCode, Value),
    save: (StatusCode, Value),
}

impl Default for Script {
    fn default() -> Self {
        Self {
            channels: (
                StatusCode::OK,
                json!({"channels": [
                    {"id": "C1", "name": "general", "is_private": false},
                    {"id": "C2", "name": "leads", "is_private": true}
                ]}),
            ),
            save: (StatusCode::OK, json!({"success": true})),
        }
    }
}

#[derive(Clone)]
struct BackendState {
    script: Script,
    requests: Arc<Mutex<Vec<String>>>,
    posts: Arc<Mutex<Vec<Value>>>,
}

/// In-process backend on its own runtime, since commands block on their own.
struct Backend {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    posts: Arc<Mutex<Vec<Value>>>,
    _runtime: Runtime,
}

impl Backend {
    fn spawn(script: Script) -> Self {
        let runtime = Runtime::new().expect("backend runtime");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let posts = Arc::new(Mutex::new(Vec::new()));
        let state =
            BackendState { script, requests: Arc::clone(&requests), posts: Arc::clone(&posts) };

        let app = Router::new()
            .route("/", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/workspaces/{workspace_id}", get(workspace))
            .route("/api/channels/{workspace_id}", get(channels).post(save))
            .route("/api/workspace/{workspace_id}/channel", get(selection))
            .with_state(state);

        let base_url = runtime.block_on(async {
            let listener =
                tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind backend");
            let address = listener.local_addr().expect("backend address");
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });
            format!("http://{address}")
        });

        Self { base_url, requests, posts, _runtime: runtime }
    }

    fn options(&self) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                backend_url: Some(self.base_url.clone()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn posts(&self) -> Vec<Value> {
        self.posts.lock().expect("posts lock").clone()
    }
}

async fn workspace(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
) -> Json<Value> {
    state.requests.lock().expect("requests lock").push(format!("GET /workspaces/{workspace_id}"));
    Json(json!({"workspace_id": workspace_id, "workspace_name": "Acme"}))
}

async fn channels(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().expect("requests lock").push(format!("GET /api/channels/{workspace_id}"));
    let (status, body) = state.script.channels.clone();
    (status, Json(body))
}

async fn selection(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
) -> Json<Value> {
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(format!("GET /api/workspace/{workspace_id}/channel"));
    Json(json!({"selected_channel": null}))
}

async fn save(
    State(state): State<BackendState>,
    Path(workspace_id): Path<String>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().expect("requests lock").push(format!("POST /api/channels/{workspace_id}"));
    state.posts.lock().expect("posts lock").push(payload);
    let (status, body) = state.script.save.clone();
    (status, Json(body))
}

fn full_selection() -> SetupArgs {
    SetupArgs {
        workspace_id: Some("W123".to_string()),
        channel: Some("C1".to_string()),
        time: Some("10:15".to_string()),
        timezone: Some("UTC".to_string()),
        save: true,
        json: true,
        ..SetupArgs::default()
    }
}

#[test]
fn setup_saves_flag_selection_once() {
    with_env(&[], || {
        let backend = Backend::spawn(Script::default());
        let result = setup::run(&backend.options(), &full_selection());
        assert_eq!(result.exit_code, 0, "expected successful save: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "setup");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["loads"].as_array().map(Vec::len), Some(3));
        assert_eq!(payload["saved"]["channel_name"], "general");
        assert!(payload["message"].as_str().unwrap_or_default().contains("/invite @your-bot-name"));

        assert_eq!(
            backend.posts(),
            vec![json!({
                "channel_id": "C1",
                "channel_name": "general",
                "standup_time": "10:15",
                "timezone": "UTC"
            })]
        );
    });
}

#[test]
fn setup_without_workspace_id_fails_before_any_request() {
    with_env(&[], || {
        let backend = Backend::spawn(Script::default());
        let args = SetupArgs { json: true, ..SetupArgs::default() };
        let result = setup::run(&backend.options(), &args);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "precondition");
        assert_eq!(payload["message"], "No workspace ID provided");
        assert_eq!(payload["error_page"]["title"], "Setup Error");
        assert!(backend.requests().is_empty());
    });
}

#[test]
fn setup_url_supplies_the_workspace_id() {
    with_env(&[], || {
        let backend = Backend::spawn(Script::default());
        let args = SetupArgs {
            setup_url: Some("https://standup.example/setup?workspace_id=W777".to_string()),
            ..SetupArgs::default()
        };
        let result = setup::run(&backend.options(), &args);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        assert!(result.output.contains("Workspace: Acme (W777)"));
        assert!(result.output.contains("[ ] #leads (private) (C2)"));
        assert!(backend.requests().contains(&"GET /workspaces/W777".to_string()));
    });
}

#[test]
fn channel_load_failure_exits_with_reason() {
    with_env(&[], || {
        let backend = Backend::spawn(Script {
            channels: (StatusCode::FORBIDDEN, json!({"error": "missing_scope"})),
            ..Script::default()
        });
        let result = setup::run(&backend.options(), &full_selection());
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "hard_load");
        assert_eq!(payload["message"], "Error loading channels: missing_scope");
        assert_eq!(payload["view"]["submit"]["enabled"], false);
        assert!(backend.posts().is_empty());
    });
}

#[test]
fn missing_channel_is_a_validation_failure() {
    with_env(&[], || {
        let backend = Backend::spawn(Script::default());
        let args = SetupArgs { channel: None, ..full_selection() };
        let result = setup::run(&backend.options(), &args);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "validation");
        assert_eq!(payload["message"], "Please select a channel.");
        assert!(backend.posts().is_empty());
    });
}

#[test]
fn backend_save_rejection_is_reported() {
    with_env(&[], || {
        let backend = Backend::spawn(Script {
            save: (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "database unavailable"})),
            ..Script::default()
        });
        let result = setup::run(&backend.options(), &full_selection());
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "save");
        assert_eq!(payload["message"], "Error saving settings: database unavailable");
        assert_eq!(backend.posts().len(), 1);
    });
}

#[test]
fn blocks_output_is_a_block_kit_message() {
    with_env(&[], || {
        let backend = Backend::spawn(Script::default());
        let args = SetupArgs {
            workspace_id: Some("W123".to_string()),
            blocks: true,
            ..SetupArgs::default()
        };
        let result = setup::run(&backend.options(), &args);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let block_ids: Vec<&str> = payload["blocks"]
            .as_array()
            .map(|blocks| blocks.iter().filter_map(|block| block["block_id"].as_str()).collect())
            .unwrap_or_default();
        assert!(block_ids.contains(&"setup.channel.v1"));
        assert!(block_ids.contains(&"setup.submit_hint.v1"));
    });
}

#[test]
fn invalid_backend_url_is_a_config_failure() {
    with_env(&[("STANDUP_BACKEND_URL", "ftp://standup.example")], || {
        let result = setup::run(&LoadOptions::default(), &full_selection());
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_value_sources() {
    with_env(&[("STANDUP_SLACK_BOT_HANDLE", "@daily-bot")], || {
        let options = LoadOptions {
            overrides: ConfigOverrides {
                backend_url: Some("https://api.standup.example".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        };
        let result = config::run(&options);
        assert_eq!(result.exit_code, 0);

        assert!(result.output.contains(
            "- backend.base_url = https://api.standup.example (source: flag (--backend-url))"
        ));
        assert!(result
            .output
            .contains("- slack.bot_handle = daily-bot (source: env (STANDUP_SLACK_BOT_HANDLE))"));
        assert!(result.output.contains("- backend.request_timeout_secs = <unset> (source: default)"));
    });
}

#[test]
fn install_prints_backend_install_url() {
    with_env(&[], || {
        let result = install::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "install");
        assert_eq!(payload["message"], "http://localhost:4000/slack/install");
    });
}

#[test]
fn doctor_passes_against_a_reachable_backend() {
    with_env(&[], || {
        let backend = Backend::spawn(Script::default());
        let result = doctor::run(&backend.options(), true);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"][1]["name"], "backend_reachability");
    });
}

#[test]
fn doctor_fails_when_backend_is_down() {
    with_env(&[], || {
        let address = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("probe address");
        let options = LoadOptions {
            overrides: ConfigOverrides {
                backend_url: Some(format!("http://{address}")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        };

        let result = doctor::run(&options, true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "fail");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STANDUP_BACKEND_URL",
        "STANDUP_BACKEND_REQUEST_TIMEOUT_SECS",
        "STANDUP_SLACK_BOT_HANDLE",
        "STANDUP_LOGGING_LEVEL",
        "STANDUP_LOGGING_FORMAT",
        "STANDUP_LOG_LEVEL",
        "STANDUP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
