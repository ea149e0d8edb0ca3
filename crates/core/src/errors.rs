use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("No workspace ID provided")]
    MissingWorkspaceId,
}

/// Hard failure of the channel list load. The display text is the user-facing status message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelLoadFailure {
    #[error("Error loading channels: {}", .reason.as_deref().unwrap_or("Unknown error"))]
    Rejected { reason: Option<String> },
    #[error("Error loading channels. Please try again.")]
    Unreachable,
}

/// Failed save round trip. The display text is the user-facing status message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SaveFailure {
    #[error("Error saving settings: {0}")]
    Reported(String),
    #[error("Error saving channel. Please try again.")]
    Generic,
}

impl SaveFailure {
    pub fn from_reason(reason: Option<String>) -> Self {
        match reason.map(|value| value.trim().to_owned()) {
            Some(value) if !value.is_empty() => Self::Reported(value),
            _ => Self::Generic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Precondition,
    SoftLoad,
    HardLoad,
    Validation,
    Save,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::SoftLoad => "soft_load",
            Self::HardLoad => "hard_load",
            Self::Validation => "validation",
            Self::Save => "save",
        }
    }
}
