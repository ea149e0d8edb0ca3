use standup_core::config::{AppConfig, LoadOptions};

use super::{CommandResult, EXIT_CONFIG};

pub fn run(options: &LoadOptions) -> CommandResult {
    match AppConfig::load(options.clone()) {
        Ok(config) => CommandResult::success("install", config.install_url()),
        Err(error) => CommandResult::failure(
            "install",
            "config_validation",
            format!("config validation failed: {error}"),
            EXIT_CONFIG,
        ),
    }
}
