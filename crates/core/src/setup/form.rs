use serde::Serialize;
use thiserror::Error;

use crate::domain::channel::{find_channel, Channel};
use crate::domain::preference::{ChannelPreference, SavedSelection};
use crate::domain::schedule::{parse_standup_time, Timezone, DEFAULT_STANDUP_TIME, DEFAULT_TIMEZONE};
use crate::domain::workspace::{Workspace, WorkspaceId};
use crate::errors::{ChannelLoadFailure, SaveFailure};
use crate::setup::status::{Status, StatusEvent, StatusTransitionError};
use crate::setup::validation::{validate_selection, FormField, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    Workspace,
    Channels,
    Preference,
}

impl LoadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Channels => "channels",
            Self::Preference => "preference",
        }
    }
}

/// Completion of one independent load. Soft failures are already resolved by the loader:
/// a failed workspace lookup arrives as a placeholder and a failed preference lookup as `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadUpdate {
    WorkspaceLoaded(Workspace),
    ChannelsLoaded(Result<Vec<Channel>, ChannelLoadFailure>),
    PreferenceLoaded(Option<SavedSelection>),
}

impl LoadUpdate {
    pub fn source(&self) -> LoadSource {
        match self {
            Self::WorkspaceLoaded(_) => LoadSource::Workspace,
            Self::ChannelsLoaded(_) => LoadSource::Channels,
            Self::PreferenceLoaded(_) => LoadSource::Preference,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormIntent {
    SelectChannel(String),
    SetStandupTime(String),
    SetTimezone(String),
}

impl FormIntent {
    pub fn field(&self) -> FormField {
        match self {
            Self::SelectChannel(_) => FormField::Channel,
            Self::SetStandupTime(_) => FormField::StandupTime,
            Self::SetTimezone(_) => FormField::Timezone,
        }
    }
}

/// Everything the view can dispatch. Edits are synchronous; save and reload need I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupIntent {
    Edit(FormIntent),
    Save,
    Reload,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelList {
    NotRequested,
    Loading,
    Loaded(Vec<Channel>),
    Failed,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SubmitBlocked {
    #[error("a save is already in flight")]
    SaveInFlight,
    #[error("channels are still loading")]
    ChannelsLoading,
    #[error("no channel list is available")]
    ChannelsUnavailable,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SaveRejection {
    #[error(transparent)]
    Blocked(#[from] SubmitBlocked),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSave {
    pub preference: ChannelPreference,
    /// False when the selected id is absent from the loaded list and the raw id was sent as
    /// the channel name.
    pub channel_known: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct EditedFields {
    channel: bool,
    standup_time: bool,
    timezone: bool,
}

impl EditedFields {
    fn contains(&self, field: FormField) -> bool {
        match field {
            FormField::Channel => self.channel,
            FormField::StandupTime => self.standup_time,
            FormField::Timezone => self.timezone,
        }
    }

    fn mark(&mut self, field: FormField) {
        match field {
            FormField::Channel => self.channel = true,
            FormField::StandupTime => self.standup_time = true,
            FormField::Timezone => self.timezone = true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub seeded: Vec<FormField>,
    /// Fields the saved preference carried but the user had already edited.
    pub kept_edits: Vec<FormField>,
    /// Saved values that were present but not usable (unsupported timezone, malformed time).
    pub discarded: Vec<FormField>,
}

/// Editable setup form. Only the owning controller mutates it; views read through accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormState {
    workspace_id: WorkspaceId,
    workspace: Option<Workspace>,
    channels: ChannelList,
    saved_selection: Option<SavedSelection>,
    selected_channel_id: String,
    standup_time: String,
    timezone: String,
    is_saving: bool,
    status: Status,
    edited: EditedFields,
}

impl FormState {
    pub fn new(workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id,
            workspace: None,
            channels: ChannelList::NotRequested,
            saved_selection: None,
            selected_channel_id: String::new(),
            standup_time: DEFAULT_STANDUP_TIME.to_owned(),
            timezone: DEFAULT_TIMEZONE.as_str().to_owned(),
            is_saving: false,
            status: Status::Idle,
            edited: EditedFields::default(),
        }
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn channel_list(&self) -> &ChannelList {
        &self.channels
    }

    pub fn channels(&self) -> &[Channel] {
        match &self.channels {
            ChannelList::Loaded(channels) => channels,
            _ => &[],
        }
    }

    pub fn saved_selection(&self) -> Option<&SavedSelection> {
        self.saved_selection.as_ref()
    }

    pub fn selected_channel_id(&self) -> &str {
        &self.selected_channel_id
    }

    pub fn selected_channel(&self) -> Option<&Channel> {
        find_channel(self.channels(), &self.selected_channel_id)
    }

    pub fn standup_time(&self) -> &str {
        &self.standup_time
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn is_loading_channels(&self) -> bool {
        matches!(self.channels, ChannelList::Loading)
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_edited(&self, field: FormField) -> bool {
        self.edited.contains(field)
    }

    /// Marks the channel list as in flight. Also used by a user-initiated reload, which
    /// retires any terminal status first.
    pub fn begin_load(&mut self) -> Result<(), StatusTransitionError> {
        let cleared = self.status.transition(StatusEvent::Cleared)?;
        self.status = cleared.transition(StatusEvent::LoadStarted)?;
        self.channels = ChannelList::Loading;
        Ok(())
    }

    /// Applies one load completion. Data is always applied; the returned error only reports a
    /// status transition that did not originate from the expected state.
    pub fn apply(&mut self, update: LoadUpdate) -> Result<ApplyOutcome, StatusTransitionError> {
        match update {
            LoadUpdate::WorkspaceLoaded(workspace) => {
                self.workspace = Some(workspace);
                Ok(ApplyOutcome::default())
            }
            LoadUpdate::ChannelsLoaded(Ok(channels)) => {
                self.channels = ChannelList::Loaded(channels);
                self.settle_load(StatusEvent::LoadSucceeded)?;
                Ok(ApplyOutcome::default())
            }
            LoadUpdate::ChannelsLoaded(Err(failure)) => {
                self.channels = ChannelList::Failed;
                self.settle_load(StatusEvent::LoadFailed(failure.to_string()))?;
                Ok(ApplyOutcome::default())
            }
            LoadUpdate::PreferenceLoaded(None) => Ok(ApplyOutcome::default()),
            LoadUpdate::PreferenceLoaded(Some(selection)) => {
                let outcome = self.seed_from(&selection);
                self.saved_selection = Some(selection);
                Ok(outcome)
            }
        }
    }

    fn settle_load(&mut self, event: StatusEvent) -> Result<(), StatusTransitionError> {
        if !matches!(self.status, Status::Loading) {
            return Err(StatusTransitionError { from: self.status.kind(), event: event.kind() });
        }
        self.status = self.status.transition(event)?;
        Ok(())
    }

    fn seed_from(&mut self, selection: &SavedSelection) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        let channel = Some(selection.id.trim()).filter(|value| !value.is_empty());
        let standup_time = selection.standup_time.as_deref().map(str::trim);
        let timezone = selection.timezone.as_deref().map(str::trim);

        if let Some(channel) = channel {
            if self.edited.contains(FormField::Channel) {
                outcome.kept_edits.push(FormField::Channel);
            } else {
                self.selected_channel_id = channel.to_owned();
                outcome.seeded.push(FormField::Channel);
            }
        }

        if let Some(standup_time) = standup_time {
            if self.edited.contains(FormField::StandupTime) {
                outcome.kept_edits.push(FormField::StandupTime);
            } else if parse_standup_time(standup_time).is_some() {
                self.standup_time = standup_time.to_owned();
                outcome.seeded.push(FormField::StandupTime);
            } else {
                outcome.discarded.push(FormField::StandupTime);
            }
        }

        if let Some(timezone) = timezone {
            if self.edited.contains(FormField::Timezone) {
                outcome.kept_edits.push(FormField::Timezone);
            } else if let Ok(parsed) = timezone.parse::<Timezone>() {
                self.timezone = parsed.as_str().to_owned();
                outcome.seeded.push(FormField::Timezone);
            } else {
                outcome.discarded.push(FormField::Timezone);
            }
        }

        outcome
    }

    /// Applies a user edit. The field is pinned from here on: later loads never overwrite it.
    pub fn edit(&mut self, intent: FormIntent) {
        self.edited.mark(intent.field());
        match intent {
            FormIntent::SelectChannel(value) => self.selected_channel_id = value.trim().to_owned(),
            FormIntent::SetStandupTime(value) => self.standup_time = value.trim().to_owned(),
            FormIntent::SetTimezone(value) => self.timezone = value.trim().to_owned(),
        }
        // Cleared never fails; in-flight activity is left untouched.
        if let Ok(next) = self.status.transition(StatusEvent::Cleared) {
            self.status = next;
        }
    }

    pub fn submit_blocker(&self) -> Option<SubmitBlocked> {
        if self.is_saving {
            return Some(SubmitBlocked::SaveInFlight);
        }
        match self.channels {
            ChannelList::Loaded(_) => None,
            ChannelList::Loading => Some(SubmitBlocked::ChannelsLoading),
            ChannelList::NotRequested | ChannelList::Failed => {
                Some(SubmitBlocked::ChannelsUnavailable)
            }
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.selected_channel_id.is_empty()
            && !self.standup_time.is_empty()
            && !self.timezone.is_empty()
            && self.submit_blocker().is_none()
    }

    /// Validates the selection and enters `saving`. Blocked submits leave the status alone;
    /// validation failures replace it with the rule's message. No I/O happens here.
    pub fn begin_save(&mut self) -> Result<PreparedSave, SaveRejection> {
        if let Some(blocked) = self.submit_blocker() {
            return Err(SaveRejection::Blocked(blocked));
        }

        self.status = self.status.transition(StatusEvent::Cleared)?;

        let selection =
            match validate_selection(&self.selected_channel_id, &self.standup_time, &self.timezone)
            {
                Ok(selection) => selection,
                Err(error) => {
                    self.status =
                        self.status.transition(StatusEvent::ValidationFailed(error.to_string()))?;
                    return Err(SaveRejection::Invalid(error));
                }
            };

        let known = find_channel(self.channels(), &selection.channel_id);
        let channel_known = known.is_some();
        let channel_name =
            known.map(|channel| channel.name.clone()).unwrap_or_else(|| selection.channel_id.clone());

        self.status = self.status.transition(StatusEvent::SaveStarted)?;
        self.is_saving = true;
        // Submitted values are pinned so a preference landing mid-save cannot replace them.
        self.edited.mark(FormField::Channel);
        self.edited.mark(FormField::StandupTime);
        self.edited.mark(FormField::Timezone);

        Ok(PreparedSave {
            preference: ChannelPreference {
                channel_id: selection.channel_id,
                channel_name,
                standup_time: selection.standup_time,
                timezone: selection.timezone.as_str().to_owned(),
            },
            channel_known,
        })
    }

    pub fn finish_save(&mut self, result: Result<(), SaveFailure>) -> Result<(), StatusTransitionError> {
        self.is_saving = false;
        let event = match result {
            Ok(()) => StatusEvent::SaveSucceeded,
            Err(failure) => StatusEvent::SaveFailed(failure.to_string()),
        };
        self.status = self.status.transition(event)?;
        Ok(())
    }
}
