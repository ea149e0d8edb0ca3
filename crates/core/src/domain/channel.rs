use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

impl Channel {
    /// Selection label, e.g. `#general` or `#leads (private)`.
    pub fn label(&self) -> String {
        if self.is_private {
            format!("#{} (private)", self.name)
        } else {
            format!("#{}", self.name)
        }
    }
}

pub fn find_channel<'a>(channels: &'a [Channel], channel_id: &str) -> Option<&'a Channel> {
    channels.iter().find(|channel| channel.id == channel_id)
}
