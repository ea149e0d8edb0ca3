use async_trait::async_trait;
use standup_core::{
    Channel, ChannelLoadFailure, ChannelPreference, SaveFailure, SavedSelection, Workspace,
    WorkspaceId,
};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend rejected the request with status {status}")]
    Rejected { status: u16, reason: Option<String> },
    #[error("backend is unreachable: {0}")]
    Unreachable(String),
    #[error("backend response could not be decoded: {0}")]
    Malformed(String),
    #[error("invalid backend url `{0}`")]
    InvalidBaseUrl(String),
}

impl StoreError {
    pub fn into_channel_failure(self) -> ChannelLoadFailure {
        match self {
            Self::Rejected { reason, .. } => ChannelLoadFailure::Rejected { reason },
            Self::Malformed(_) => ChannelLoadFailure::Rejected { reason: None },
            Self::Unreachable(_) | Self::InvalidBaseUrl(_) => ChannelLoadFailure::Unreachable,
        }
    }

    pub fn into_save_failure(self) -> SaveFailure {
        match self {
            Self::Rejected { reason, .. } => SaveFailure::from_reason(reason),
            _ => SaveFailure::Generic,
        }
    }
}

/// Backend preference API. Implementations are shared across the concurrent loads.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError>;

    async fn list_channels(&self, workspace_id: &WorkspaceId) -> Result<Vec<Channel>, StoreError>;

    /// `Ok(None)` when the workspace has never saved a selection.
    async fn get_saved_selection(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<SavedSelection>, StoreError>;

    /// Create-or-replace; the backend keeps one preference per workspace.
    async fn save_preference(
        &self,
        workspace_id: &WorkspaceId,
        preference: &ChannelPreference,
    ) -> Result<(), StoreError>;
}
