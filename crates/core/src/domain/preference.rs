use serde::{Deserialize, Serialize};

/// Persisted standup configuration for a workspace. Saving replaces any prior record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPreference {
    pub channel_id: String,
    pub channel_name: String,
    pub standup_time: String,
    pub timezone: String,
}

/// Previously saved selection as reported by the backend. Every field except the id is
/// optional because older records only carried the channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSelection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub standup_time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}
