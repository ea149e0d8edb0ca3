use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STANDUP_TIME: &str = "09:00";
pub const DEFAULT_TIMEZONE: Timezone = Timezone::AmericaNewYork;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timezone {
    #[serde(rename = "America/New_York")]
    AmericaNewYork,
    #[serde(rename = "America/Chicago")]
    AmericaChicago,
    #[serde(rename = "America/Denver")]
    AmericaDenver,
    #[serde(rename = "America/Los_Angeles")]
    AmericaLosAngeles,
    #[serde(rename = "Europe/London")]
    EuropeLondon,
    #[serde(rename = "Europe/Paris")]
    EuropeParis,
    #[serde(rename = "Asia/Tokyo")]
    AsiaTokyo,
    #[serde(rename = "Asia/Kolkata")]
    AsiaKolkata,
    #[serde(rename = "Australia/Sydney")]
    AustraliaSydney,
    #[serde(rename = "UTC")]
    Utc,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported timezone `{0}`")]
pub struct UnsupportedTimezone(pub String);

impl Timezone {
    /// Closed set offered to administrators, in display order.
    pub const ALL: [Timezone; 10] = [
        Timezone::AmericaNewYork,
        Timezone::AmericaChicago,
        Timezone::AmericaDenver,
        Timezone::AmericaLosAngeles,
        Timezone::EuropeLondon,
        Timezone::EuropeParis,
        Timezone::AsiaTokyo,
        Timezone::AsiaKolkata,
        Timezone::AustraliaSydney,
        Timezone::Utc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmericaNewYork => "America/New_York",
            Self::AmericaChicago => "America/Chicago",
            Self::AmericaDenver => "America/Denver",
            Self::AmericaLosAngeles => "America/Los_Angeles",
            Self::EuropeLondon => "Europe/London",
            Self::EuropeParis => "Europe/Paris",
            Self::AsiaTokyo => "Asia/Tokyo",
            Self::AsiaKolkata => "Asia/Kolkata",
            Self::AustraliaSydney => "Australia/Sydney",
            Self::Utc => "UTC",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AmericaNewYork => "Eastern Time (ET)",
            Self::AmericaChicago => "Central Time (CT)",
            Self::AmericaDenver => "Mountain Time (MT)",
            Self::AmericaLosAngeles => "Pacific Time (PT)",
            Self::EuropeLondon => "London (GMT/BST)",
            Self::EuropeParis => "Paris (CET/CEST)",
            Self::AsiaTokyo => "Tokyo (JST)",
            Self::AsiaKolkata => "India (IST)",
            Self::AustraliaSydney => "Sydney (AEST/AEDT)",
            Self::Utc => "UTC",
        }
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timezone {
    type Err = UnsupportedTimezone;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|timezone| timezone.as_str() == trimmed)
            .ok_or_else(|| UnsupportedTimezone(trimmed.to_owned()))
    }
}

/// Parses a 24-hour `HH:MM` value. Single-digit hours and seconds are rejected.
pub fn parse_standup_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M").ok()
}
