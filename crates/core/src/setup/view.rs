use serde::Serialize;

use crate::domain::schedule::Timezone;
use crate::errors::PreconditionError;
use crate::setup::form::{ChannelList, FormState};
use crate::setup::status::{invite_command, project_status, StatusView};

pub const WORKSPACE_NAME_LOADING: &str = "Loading...";
pub const CHANNEL_PLACEHOLDER_LOADING: &str = "Loading channels...";
pub const CHANNEL_PLACEHOLDER: &str = "Select a channel...";
pub const SUBMIT_LABEL: &str = "Save Channel & Schedule";
pub const SUBMIT_LABEL_SAVING: &str = "Saving...";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitControl {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InviteReminder {
    pub channel_label: String,
    pub command: String,
}

impl InviteReminder {
    pub fn text(&self) -> String {
        format!(
            "Remember to invite the bot to {} by typing {} in that channel.",
            self.channel_label, self.command
        )
    }
}

/// Read-only projection of the form. Renderers bind to this and never touch `FormState`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetupView {
    pub workspace_id: String,
    pub workspace_name: String,
    pub channel_placeholder: &'static str,
    pub channel_options: Vec<SelectOption>,
    pub channels_loading: bool,
    pub standup_time: String,
    pub timezone_options: Vec<SelectOption>,
    pub submit: SubmitControl,
    pub status: Option<StatusView>,
    pub invite_reminder: Option<InviteReminder>,
}

impl SetupView {
    pub fn project(form: &FormState, bot_handle: &str) -> Self {
        let workspace_name = form
            .workspace()
            .map(|workspace| workspace.workspace_name.clone())
            .unwrap_or_else(|| WORKSPACE_NAME_LOADING.to_owned());

        let channel_options = form
            .channels()
            .iter()
            .map(|channel| SelectOption {
                value: channel.id.clone(),
                label: channel.label(),
                selected: channel.id == form.selected_channel_id(),
            })
            .collect();

        let timezone_options = Timezone::ALL
            .iter()
            .map(|timezone| SelectOption {
                value: timezone.as_str().to_owned(),
                label: timezone.label().to_owned(),
                selected: timezone.as_str() == form.timezone(),
            })
            .collect();

        let channel_placeholder = match form.channel_list() {
            ChannelList::Loading => CHANNEL_PLACEHOLDER_LOADING,
            _ => CHANNEL_PLACEHOLDER,
        };

        let invite_reminder = reminder_label(form).map(|label| InviteReminder {
            channel_label: format!("#{label}"),
            command: invite_command(bot_handle),
        });

        Self {
            workspace_id: form.workspace_id().to_string(),
            workspace_name,
            channel_placeholder,
            channel_options,
            channels_loading: form.is_loading_channels(),
            standup_time: form.standup_time().to_owned(),
            timezone_options,
            submit: SubmitControl {
                label: if form.is_saving() { SUBMIT_LABEL_SAVING } else { SUBMIT_LABEL },
                enabled: form.can_submit(),
            },
            status: project_status(form.status(), bot_handle),
            invite_reminder,
        }
    }
}

/// Loaded channel name first, then the saved selection's name, then the raw id.
fn reminder_label(form: &FormState) -> Option<String> {
    let id = form.selected_channel_id();
    if id.is_empty() {
        return None;
    }
    if let Some(channel) = form.selected_channel() {
        return Some(channel.name.clone());
    }
    let saved_name = form
        .saved_selection()
        .filter(|selection| selection.id.trim() == id)
        .and_then(|selection| selection.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty());
    Some(saved_name.unwrap_or(id).to_owned())
}

/// Blocking page shown instead of the form when the flow cannot start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorPage {
    pub title: &'static str,
    pub message: String,
}

impl From<&PreconditionError> for ErrorPage {
    fn from(error: &PreconditionError) -> Self {
        Self { title: "Setup Error", message: error.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorPage, SetupView, CHANNEL_PLACEHOLDER, CHANNEL_PLACEHOLDER_LOADING};
    use crate::domain::channel::Channel;
    use crate::domain::preference::SavedSelection;
    use crate::domain::workspace::WorkspaceId;
    use crate::errors::PreconditionError;
    use crate::setup::form::{FormIntent, FormState, LoadUpdate};
    use crate::setup::status::StatusKind;

    fn loaded_form() -> FormState {
        let mut form = FormState::new(WorkspaceId::parse(Some("W123")).expect("valid id"));
        form.begin_load().expect("loading");
        form.apply(LoadUpdate::ChannelsLoaded(Ok(vec![
            Channel { id: "C1".to_owned(), name: "general".to_owned(), is_private: false },
            Channel { id: "C2".to_owned(), name: "leads".to_owned(), is_private: true },
        ])))
        .expect("channels");
        form
    }

    #[test]
    fn loading_form_shows_placeholders_and_disabled_submit() {
        let mut form = FormState::new(WorkspaceId::parse(Some("W123")).expect("valid id"));
        form.begin_load().expect("loading");
        let view = SetupView::project(&form, "standup-bot");

        assert_eq!(view.workspace_name, "Loading...");
        assert_eq!(view.channel_placeholder, CHANNEL_PLACEHOLDER_LOADING);
        assert!(view.channel_options.is_empty());
        assert!(!view.submit.enabled);
        assert_eq!(view.status.map(|status| status.kind), Some(StatusKind::Loading));
    }

    #[test]
    fn channel_options_mark_private_channels() {
        let view = SetupView::project(&loaded_form(), "standup-bot");

        let labels: Vec<&str> =
            view.channel_options.iter().map(|option| option.label.as_str()).collect();
        assert_eq!(labels, vec!["#general", "#leads (private)"]);
        assert_eq!(view.channel_placeholder, CHANNEL_PLACEHOLDER);
        assert_eq!(view.timezone_options.len(), 10);
        assert!(view
            .timezone_options
            .iter()
            .any(|option| option.value == "America/New_York" && option.selected));
    }

    #[test]
    fn invite_reminder_names_selected_channel() {
        let mut form = loaded_form();
        assert!(SetupView::project(&form, "standup-bot").invite_reminder.is_none());

        form.edit(FormIntent::SelectChannel("C2".to_owned()));
        let view = SetupView::project(&form, "standup-bot");
        let reminder = view.invite_reminder.expect("reminder for selected channel");

        assert_eq!(reminder.channel_label, "#leads");
        assert_eq!(reminder.command, "/invite @standup-bot");
        assert!(reminder.text().contains("#leads"));
        assert!(view.submit.enabled);
    }

    #[test]
    fn invite_reminder_falls_back_while_channels_load() {
        let mut form = FormState::new(WorkspaceId::parse(Some("W123")).expect("valid id"));
        form.begin_load().expect("loading");
        form.apply(LoadUpdate::PreferenceLoaded(Some(SavedSelection {
            id: "C1".to_owned(),
            name: None,
            standup_time: Some("09:00".to_owned()),
            timezone: Some("UTC".to_owned()),
        })))
        .expect("preference");

        let reminder = SetupView::project(&form, "standup-bot")
            .invite_reminder
            .expect("reminder for seeded channel");
        assert_eq!(reminder.channel_label, "#C1");

        form.edit(FormIntent::SelectChannel("C9".to_owned()));
        let reminder = SetupView::project(&form, "standup-bot").invite_reminder;
        assert_eq!(reminder.map(|reminder| reminder.channel_label), Some("#C9".to_owned()));
    }

    #[test]
    fn invite_reminder_uses_saved_channel_name_until_list_loads() {
        let mut form = FormState::new(WorkspaceId::parse(Some("W123")).expect("valid id"));
        form.begin_load().expect("loading");
        form.apply(LoadUpdate::PreferenceLoaded(Some(SavedSelection {
            id: "C2".to_owned(),
            name: Some("leads".to_owned()),
            standup_time: None,
            timezone: None,
        })))
        .expect("preference");

        let reminder = SetupView::project(&form, "standup-bot").invite_reminder;
        assert_eq!(reminder.map(|reminder| reminder.channel_label), Some("#leads".to_owned()));
    }

    #[test]
    fn submit_label_switches_while_saving() {
        let mut form = loaded_form();
        form.edit(FormIntent::SelectChannel("C1".to_owned()));
        form.begin_save().expect("valid save");

        let view = SetupView::project(&form, "standup-bot");
        assert_eq!(view.submit.label, "Saving...");
        assert!(!view.submit.enabled);
    }

    #[test]
    fn empty_field_disables_submit() {
        let mut form = loaded_form();
        form.edit(FormIntent::SelectChannel("C1".to_owned()));
        form.edit(FormIntent::SetTimezone(String::new()));

        assert!(!SetupView::project(&form, "standup-bot").submit.enabled);
    }

    #[test]
    fn precondition_failure_renders_blocking_page() {
        let page = ErrorPage::from(&PreconditionError::MissingWorkspaceId);
        assert_eq!(page.title, "Setup Error");
        assert_eq!(page.message, "No workspace ID provided");
    }
}
