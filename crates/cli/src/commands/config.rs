use std::env;
use std::fs;
use std::path::Path;

use standup_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

struct FieldSpec<'a> {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
    flag: Option<&'a str>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;

    let fields = [
        FieldSpec {
            key_path: "backend.base_url",
            value: config.backend.base_url.clone(),
            env_keys: &["STANDUP_BACKEND_URL"],
            flag: overrides.backend_url.as_ref().map(|_| "--backend-url"),
        },
        FieldSpec {
            key_path: "backend.request_timeout_secs",
            value: config
                .backend
                .request_timeout_secs
                .map(|secs| secs.to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["STANDUP_BACKEND_REQUEST_TIMEOUT_SECS"],
            flag: overrides.request_timeout_secs.map(|_| "--request-timeout-secs"),
        },
        FieldSpec {
            key_path: "slack.bot_handle",
            value: config.slack.bot_handle.clone(),
            env_keys: &["STANDUP_SLACK_BOT_HANDLE"],
            flag: overrides.bot_handle.as_ref().map(|_| "--bot-handle"),
        },
        FieldSpec {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["STANDUP_LOGGING_LEVEL", "STANDUP_LOG_LEVEL"],
            flag: overrides.log_level.as_ref().map(|_| "--log-level"),
        },
        FieldSpec {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["STANDUP_LOGGING_FORMAT", "STANDUP_LOG_FORMAT"],
            flag: None,
        },
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key_path, &field.value, source));
    }
    lines.push(format!("- install_url = {}", config.install_url()));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &FieldSpec<'_>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(flag) = field.flag {
        return format!("flag ({flag})");
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
