use serde::Serialize;
use thiserror::Error;

use crate::domain::schedule::{parse_standup_time, Timezone};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Channel,
    StandupTime,
    Timezone,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::StandupTime => "standup_time",
            Self::Timezone => "timezone",
        }
    }
}

/// Rejected selection. Rules are checked in declaration order and the first failure wins.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a channel.")]
    MissingChannel,
    #[error("Please select a standup time.")]
    MissingStandupTime,
    #[error("Please enter the standup time as HH:MM (24-hour).")]
    MalformedStandupTime,
    #[error("Please select a timezone.")]
    MissingTimezone,
}

impl ValidationError {
    pub fn field(&self) -> FormField {
        match self {
            Self::MissingChannel => FormField::Channel,
            Self::MissingStandupTime | Self::MalformedStandupTime => FormField::StandupTime,
            Self::MissingTimezone => FormField::Timezone,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidSelection {
    pub channel_id: String,
    pub standup_time: String,
    pub timezone: Timezone,
}

pub fn validate_selection(
    channel_id: &str,
    standup_time: &str,
    timezone: &str,
) -> Result<ValidSelection, ValidationError> {
    let channel_id = channel_id.trim();
    if channel_id.is_empty() {
        return Err(ValidationError::MissingChannel);
    }

    let standup_time = standup_time.trim();
    if standup_time.is_empty() {
        return Err(ValidationError::MissingStandupTime);
    }
    if parse_standup_time(standup_time).is_none() {
        return Err(ValidationError::MalformedStandupTime);
    }

    // Empty and off-list values share one message: the control is a closed selection.
    let timezone = timezone.parse::<Timezone>().map_err(|_| ValidationError::MissingTimezone)?;

    Ok(ValidSelection {
        channel_id: channel_id.to_owned(),
        standup_time: standup_time.to_owned(),
        timezone,
    })
}
