use serde::Serialize;
use thiserror::Error;

pub const LOADING_MESSAGE: &str = "Loading channels...";
pub const SAVING_MESSAGE: &str = "Saving channel selection...";

/// Single-slot activity of the setup form.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Saving,
    Success,
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Idle,
    Loading,
    Saving,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusEvent {
    LoadStarted,
    LoadSucceeded,
    LoadFailed(String),
    SaveStarted,
    SaveSucceeded,
    SaveFailed(String),
    ValidationFailed(String),
    /// A new user action (edit, reload, save) retires the previous terminal status.
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusEventKind {
    LoadStarted,
    LoadSucceeded,
    LoadFailed,
    SaveStarted,
    SaveSucceeded,
    SaveFailed,
    ValidationFailed,
    Cleared,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid status transition from {from:?} on {event:?}")]
pub struct StatusTransitionError {
    pub from: StatusKind,
    pub event: StatusEventKind,
}

impl StatusEvent {
    pub fn kind(&self) -> StatusEventKind {
        match self {
            Self::LoadStarted => StatusEventKind::LoadStarted,
            Self::LoadSucceeded => StatusEventKind::LoadSucceeded,
            Self::LoadFailed(_) => StatusEventKind::LoadFailed,
            Self::SaveStarted => StatusEventKind::SaveStarted,
            Self::SaveSucceeded => StatusEventKind::SaveSucceeded,
            Self::SaveFailed(_) => StatusEventKind::SaveFailed,
            Self::ValidationFailed(_) => StatusEventKind::ValidationFailed,
            Self::Cleared => StatusEventKind::Cleared,
        }
    }
}

impl Status {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Idle => StatusKind::Idle,
            Self::Loading => StatusKind::Loading,
            Self::Saving => StatusKind::Saving,
            Self::Success => StatusKind::Success,
            Self::Error(_) => StatusKind::Error,
        }
    }

    pub fn transition(&self, event: StatusEvent) -> Result<Status, StatusTransitionError> {
        use Status::{Error, Idle, Loading, Saving, Success};

        let next = match (self, event) {
            (Idle | Loading, StatusEvent::LoadStarted) => Loading,
            (Loading, StatusEvent::LoadSucceeded) => Idle,
            (Loading, StatusEvent::LoadFailed(message)) => Error(message),
            (Idle, StatusEvent::SaveStarted) => Saving,
            (Saving, StatusEvent::SaveSucceeded) => Success,
            (Saving, StatusEvent::SaveFailed(message)) => Error(message),
            (Idle, StatusEvent::ValidationFailed(message)) => Error(message),
            (Idle | Success | Error(_), StatusEvent::Cleared) => Idle,
            // In-flight activity is not a terminal status; an edit leaves it in place.
            (Loading | Saving, StatusEvent::Cleared) => self.clone(),
            (current, event) => {
                return Err(StatusTransitionError { from: current.kind(), event: event.kind() });
            }
        };

        Ok(next)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub kind: StatusKind,
    pub message: String,
}

/// Projects the activity slot into the one message shown to the administrator.
pub fn project_status(status: &Status, bot_handle: &str) -> Option<StatusView> {
    let (kind, message) = match status {
        Status::Idle => return None,
        Status::Loading => (StatusKind::Loading, LOADING_MESSAGE.to_owned()),
        Status::Saving => (StatusKind::Saving, SAVING_MESSAGE.to_owned()),
        Status::Success => (StatusKind::Success, success_message(bot_handle)),
        Status::Error(message) => (StatusKind::Error, message.clone()),
    };
    Some(StatusView { kind, message })
}

pub fn invite_command(bot_handle: &str) -> String {
    format!("/invite @{}", bot_handle.trim().trim_start_matches('@'))
}

pub fn success_message(bot_handle: &str) -> String {
    format!(
        "Channel and schedule saved successfully! Don't forget to invite the bot to your channel using {}",
        invite_command(bot_handle)
    )
}
