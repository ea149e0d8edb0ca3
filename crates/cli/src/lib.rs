pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use standup_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "standup",
    about = "Standup bot operator CLI",
    long_about = "Configure which channel the standup bot posts to, inspect configuration, and check backend readiness.",
    after_help = "Examples:\n  standup setup --workspace-id T0123 --channel C1 --time 09:30 --timezone UTC --save\n  standup doctor --json\n  standup config"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a standup.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override backend.base_url")]
    backend_url: Option<String>,
    #[arg(long, global = true, help = "Override backend.request_timeout_secs")]
    request_timeout_secs: Option<u64>,
    #[arg(long, global = true, help = "Override slack.bot_handle")]
    bot_handle: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
}

impl GlobalArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                backend_url: self.backend_url.clone(),
                request_timeout_secs: self.request_timeout_secs,
                bot_handle: self.bot_handle.clone(),
                log_level: self.log_level.clone(),
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Load a workspace's setup form, apply selections, and optionally save them")]
    Setup(commands::setup::SetupArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and check that the backend is reachable")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the URL that installs the bot into a Slack workspace")]
    Install,
    #[command(about = "List the supported standup timezones")]
    Timezones,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();
    init_logging(&options);

    let result = match cli.command {
        Command::Setup(args) => commands::setup::run(&options, &args),
        Command::Config => commands::config::run(&options),
        Command::Doctor { json } => commands::doctor::run(&options, json),
        Command::Install => commands::install::run(&options),
        Command::Timezones => {
            commands::CommandResult { exit_code: 0, output: commands::timezones::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the subscriber on stderr so command output on stdout stays parseable. A config
/// that fails to load falls back to defaults here; the command reports the error itself.
fn init_logging(options: &LoadOptions) {
    use standup_core::config::LogFormat::*;
    use tracing::Level;

    let config = AppConfig::load(options.clone()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_max_level(log_level)
                .compact()
                .init();
        }
        Pretty => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_max_level(log_level)
                .pretty()
                .init();
        }
        Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_max_level(log_level)
                .json()
                .init();
        }
    }
}
