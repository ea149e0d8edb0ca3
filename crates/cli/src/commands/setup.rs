use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use standup_client::navigation::workspace_id_from_setup_url;
use standup_client::{HttpPreferenceStore, PreferenceStore, SetupSession};
use standup_core::config::{AppConfig, LoadOptions};
use standup_core::setup::form::ChannelList;
use standup_core::setup::view::{ErrorPage, SetupView};
use standup_core::{ChannelPreference, FailureClass, FormIntent};
use standup_slack::setup::{render_error_page, render_setup};
use tracing::info;

use super::{
    runtime, CommandResult, EXIT_CHANNEL_LOAD, EXIT_CONFIG, EXIT_SAVE, EXIT_VALIDATION,
};

const EXIT_INTERNAL: u8 = 1;

#[derive(Clone, Debug, Default, Args)]
pub struct SetupArgs {
    #[arg(long, help = "Workspace to configure", conflicts_with = "setup_url")]
    pub workspace_id: Option<String>,
    #[arg(long, help = "Setup page URL carrying a `workspace_id` query parameter")]
    pub setup_url: Option<String>,
    #[arg(long, help = "Channel id to select")]
    pub channel: Option<String>,
    #[arg(long, value_name = "HH:MM", help = "Standup time")]
    pub time: Option<String>,
    #[arg(long, help = "Standup timezone, see `standup timezones`")]
    pub timezone: Option<String>,
    #[arg(long, help = "Save the selection once loads have landed")]
    pub save: bool,
    #[arg(long, help = "Emit machine-readable JSON output", conflicts_with = "blocks")]
    pub json: bool,
    #[arg(long, help = "Emit the Slack Block Kit rendering of the form")]
    pub blocks: bool,
}

impl SetupArgs {
    fn workspace_id(&self) -> Option<String> {
        self.workspace_id
            .clone()
            .or_else(|| self.setup_url.as_deref().and_then(workspace_id_from_setup_url))
    }

    /// Flag values behave like the administrator typing into the form.
    fn intents(&self) -> Vec<FormIntent> {
        let mut intents = Vec::new();
        if let Some(channel) = &self.channel {
            intents.push(FormIntent::SelectChannel(channel.clone()));
        }
        if let Some(time) = &self.time {
            intents.push(FormIntent::SetStandupTime(time.clone()));
        }
        if let Some(timezone) = &self.timezone {
            intents.push(FormIntent::SetTimezone(timezone.clone()));
        }
        intents
    }
}

/// What one pass through the setup flow produced.
#[derive(Debug)]
pub struct SetupOutcome {
    pub workspace_id: Option<String>,
    pub loads: Vec<&'static str>,
    pub page: Result<SetupView, ErrorPage>,
    pub saved: Option<ChannelPreference>,
    pub failure: Option<(FailureClass, String)>,
}

#[derive(Debug, Serialize)]
struct SetupReport<'a> {
    command: &'static str,
    status: &'static str,
    error_class: Option<&'static str>,
    workspace_id: Option<&'a str>,
    loads: &'a [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<&'a SetupView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_page: Option<&'a ErrorPage>,
    saved: Option<&'a ChannelPreference>,
    message: String,
}

pub fn run(options: &LoadOptions, args: &SetupArgs) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "setup",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };
    let store = match HttpPreferenceStore::from_config(&config.backend) {
        Ok(store) => store,
        Err(error) => {
            return CommandResult::failure(
                "setup",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("setup", "runtime", format!("{error:#}"), EXIT_INTERNAL)
        }
    };

    let outcome = runtime.block_on(execute(args, Arc::new(store), &config.slack.bot_handle));
    match render(args, &outcome) {
        Ok(output) => CommandResult { exit_code: exit_code(&outcome), output },
        Err(error) => {
            CommandResult::failure("setup", "serialization", format!("{error:#}"), EXIT_INTERNAL)
        }
    }
}

/// Runs one pass of the setup flow. Flag edits are applied before any load lands. Must run
/// inside a tokio runtime.
pub async fn execute(
    args: &SetupArgs,
    store: Arc<dyn PreferenceStore>,
    bot_handle: &str,
) -> SetupOutcome {
    let workspace_id = args.workspace_id();
    let mut session = match SetupSession::open(workspace_id.as_deref(), store) {
        Ok(session) => session,
        Err(error) => {
            return SetupOutcome {
                workspace_id,
                loads: Vec::new(),
                page: Err(ErrorPage::from(&error)),
                saved: None,
                failure: Some((FailureClass::Precondition, error.to_string())),
            }
        }
    };

    for intent in args.intents() {
        session.edit(intent);
    }

    let mut loads = Vec::new();
    while let Some(source) = session.next_update().await {
        info!(
            event_name = "cli.setup.load_landed",
            correlation_id = %session.correlation_id(),
            source = source.as_str(),
            "setup data loaded"
        );
        loads.push(source.as_str());
    }

    let mut saved = None;
    let mut failure = None;
    if args.save {
        match session.save().await {
            Ok(preference) => saved = Some(preference),
            Err(error) => {
                let message = session
                    .view(bot_handle)
                    .status
                    .map(|status| status.message)
                    .unwrap_or_else(|| error.to_string());
                failure = Some((error.class().unwrap_or(FailureClass::Save), message));
            }
        }
    } else if matches!(session.form().channel_list(), ChannelList::Failed) {
        let message =
            session.view(bot_handle).status.map(|status| status.message).unwrap_or_default();
        failure = Some((FailureClass::HardLoad, message));
    }

    let view = session.view(bot_handle);
    session.close();

    SetupOutcome { workspace_id, loads, page: Ok(view), saved, failure }
}

fn exit_code(outcome: &SetupOutcome) -> u8 {
    match outcome.failure.as_ref().map(|(class, _)| class) {
        None => 0,
        Some(FailureClass::Precondition) => EXIT_CONFIG,
        Some(FailureClass::HardLoad | FailureClass::SoftLoad) => EXIT_CHANNEL_LOAD,
        Some(FailureClass::Validation) => EXIT_VALIDATION,
        Some(FailureClass::Save) => EXIT_SAVE,
    }
}

fn summary(outcome: &SetupOutcome) -> String {
    match (&outcome.failure, &outcome.saved, &outcome.page) {
        (Some((_, message)), _, _) => message.clone(),
        (None, Some(_), Ok(view)) => {
            view.status.as_ref().map(|status| status.message.clone()).unwrap_or_default()
        }
        _ => "setup form loaded".to_string(),
    }
}

fn render(args: &SetupArgs, outcome: &SetupOutcome) -> Result<String> {
    if args.blocks {
        let message = match &outcome.page {
            Ok(view) => render_setup(view),
            Err(page) => render_error_page(page),
        };
        return serde_json::to_string_pretty(&message)
            .context("failed to serialize Block Kit message");
    }

    if args.json {
        let report = SetupReport {
            command: "setup",
            status: if outcome.failure.is_some() { "error" } else { "ok" },
            error_class: outcome.failure.as_ref().map(|(class, _)| class.as_str()),
            workspace_id: outcome.workspace_id.as_deref(),
            loads: &outcome.loads,
            view: outcome.page.as_ref().ok(),
            error_page: outcome.page.as_ref().err(),
            saved: outcome.saved.as_ref(),
            message: summary(outcome),
        };
        return serde_json::to_string(&report).context("failed to serialize setup report");
    }

    Ok(render_text(outcome))
}

fn render_text(outcome: &SetupOutcome) -> String {
    let view = match &outcome.page {
        Ok(view) => view,
        Err(page) => return format!("{}\n{}", page.title, page.message),
    };

    let mut lines = Vec::new();
    for source in &outcome.loads {
        lines.push(format!("loaded {source}"));
    }
    lines.push("Standup Bot Setup".to_string());
    lines.push(format!("Workspace: {} ({})", view.workspace_name, view.workspace_id));

    if view.channel_options.is_empty() {
        lines.push(format!("Channel: {}", view.channel_placeholder));
    } else {
        lines.push("Channel:".to_string());
        for option in &view.channel_options {
            let marker = if option.selected { "x" } else { " " };
            lines.push(format!("  [{marker}] {} ({})", option.label, option.value));
        }
    }

    let timezone = view
        .timezone_options
        .iter()
        .find(|option| option.selected)
        .map(|option| option.value.as_str())
        .unwrap_or("<none>");
    lines.push(format!("Time: {} {timezone}", view.standup_time));

    let availability = if view.submit.enabled { "enabled" } else { "disabled" };
    lines.push(format!("Submit: {} ({availability})", view.submit.label));

    if let Some(status) = &view.status {
        lines.push(format!("Status: {}", status.message));
    }
    if let Some(reminder) = &view.invite_reminder {
        lines.push(reminder.text());
    }

    lines.join("\n")
}
