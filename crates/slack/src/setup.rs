use serde::Deserialize;
use standup_core::setup::view::{ErrorPage, SetupView};
use standup_core::{FormIntent, SetupIntent, StatusKind};
use thiserror::Error;

use crate::blocks::{
    ButtonElement, ButtonStyle, Element, MessageBuilder, MessageTemplate, OptionObject,
    StaticSelectElement, TimepickerElement,
};

pub const CHANNEL_SELECT_ACTION: &str = "setup.channel.select.v1";
pub const TIME_PICK_ACTION: &str = "setup.time.pick.v1";
pub const TIMEZONE_SELECT_ACTION: &str = "setup.timezone.select.v1";
pub const SAVE_ACTION: &str = "setup.save.v1";
pub const RELOAD_ACTION: &str = "setup.reload.v1";

const SUBMIT_HINT: &str = "Save becomes available once a channel, time and timezone are selected.";

pub fn render_setup(view: &SetupView) -> MessageTemplate {
    let channels_failed = !view.channels_loading && view.channel_options.is_empty();

    let mut builder = MessageBuilder::new(format!("Standup setup for {}", view.workspace_name))
        .header("setup.header.v1", "Standup Bot Setup")
        .section("setup.workspace.v1", |section| {
            section.mrkdwn(format!("*Workspace:* {}", view.workspace_name));
        })
        .section("setup.channel.v1", |section| {
            if view.channel_options.is_empty() {
                section.mrkdwn(format!("*Standup channel*\n_{}_", view.channel_placeholder));
                return;
            }
            let select = view.channel_options.iter().fold(
                StaticSelectElement::new(CHANNEL_SELECT_ACTION, view.channel_placeholder),
                |select, option| {
                    select.option(OptionObject::new(&option.label, &option.value), option.selected)
                },
            );
            section.mrkdwn("*Standup channel*").accessory(Element::StaticSelect(select));
        })
        .section("setup.time.v1", |section| {
            section.mrkdwn("*Standup time*").accessory(Element::Timepicker(
                TimepickerElement::new(TIME_PICK_ACTION, "Pick a time")
                    .initial_time(view.standup_time.clone()),
            ));
        })
        .section("setup.timezone.v1", |section| {
            let select = view.timezone_options.iter().fold(
                StaticSelectElement::new(TIMEZONE_SELECT_ACTION, "Select a timezone..."),
                |select, option| {
                    select.option(OptionObject::new(&option.label, &option.value), option.selected)
                },
            );
            section.mrkdwn("*Timezone*").accessory(Element::StaticSelect(select));
        })
        .actions("setup.actions.v1", |actions| {
            let mut save = ButtonElement::new(SAVE_ACTION, view.submit.label).value(&view.workspace_id);
            if view.submit.enabled {
                save = save.style(ButtonStyle::Primary);
            }
            actions.button(save);
            if channels_failed {
                actions.button(ButtonElement::new(RELOAD_ACTION, "Reload").value(&view.workspace_id));
            }
        });

    let saving = view.status.as_ref().is_some_and(|status| status.kind == StatusKind::Saving);
    if !view.submit.enabled && !saving {
        builder = builder.context("setup.submit_hint.v1", |context| {
            context.plain(SUBMIT_HINT);
        });
    }

    if let Some(status) = &view.status {
        let icon = match status.kind {
            StatusKind::Loading | StatusKind::Saving => ":hourglass_flowing_sand:",
            StatusKind::Success => ":white_check_mark:",
            StatusKind::Error | StatusKind::Idle => ":warning:",
        };
        builder = builder.section("setup.status.v1", |section| {
            section.mrkdwn(format!("{icon} {}", status.message));
        });
    }

    if let Some(reminder) = &view.invite_reminder {
        builder = builder.context("setup.invite.v1", |context| {
            context.mrkdwn(format!(
                "Remember to invite the bot to *{}* by typing `{}` in that channel.",
                reminder.channel_label, reminder.command
            ));
        });
    }

    builder.build()
}

pub fn render_error_page(page: &ErrorPage) -> MessageTemplate {
    MessageBuilder::new(page.message.clone())
        .header("setup.error.header.v1", page.title)
        .section("setup.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {}", page.message));
        })
        .build()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

/// One entry of a Slack `block_actions` interaction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
    #[serde(default)]
    pub selected_time: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockActionsPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SetupActionError {
    #[error("could not decode interaction payload: {0}")]
    Decode(String),
    #[error("unsupported interaction payload type `{0}`")]
    UnsupportedPayload(String),
    #[error("unknown setup action `{0}`")]
    UnknownAction(String),
    #[error("action `{0}` carried no selection")]
    MissingSelection(String),
}

pub fn parse_action(action: &BlockAction) -> Result<SetupIntent, SetupActionError> {
    let selected = || {
        action
            .selected_option
            .as_ref()
            .map(|option| option.value.clone())
            .ok_or_else(|| SetupActionError::MissingSelection(action.action_id.clone()))
    };

    match action.action_id.as_str() {
        CHANNEL_SELECT_ACTION => Ok(SetupIntent::Edit(FormIntent::SelectChannel(selected()?))),
        TIMEZONE_SELECT_ACTION => Ok(SetupIntent::Edit(FormIntent::SetTimezone(selected()?))),
        TIME_PICK_ACTION => action
            .selected_time
            .clone()
            .map(|time| SetupIntent::Edit(FormIntent::SetStandupTime(time)))
            .ok_or_else(|| SetupActionError::MissingSelection(action.action_id.clone())),
        SAVE_ACTION => Ok(SetupIntent::Save),
        RELOAD_ACTION => Ok(SetupIntent::Reload),
        other => Err(SetupActionError::UnknownAction(other.to_owned())),
    }
}

pub fn parse_payload(raw: &str) -> Result<Vec<SetupIntent>, SetupActionError> {
    let payload: BlockActionsPayload =
        serde_json::from_str(raw).map_err(|error| SetupActionError::Decode(error.to_string()))?;
    if payload.kind != "block_actions" {
        return Err(SetupActionError::UnsupportedPayload(payload.kind));
    }
    payload.actions.iter().map(parse_action).collect()
}
