use std::sync::Arc;

use standup_core::{LoadUpdate, Workspace, WorkspaceId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::store::PreferenceStore;

/// Runs the three setup loads. Each load resolves its own soft failures, so every call yields
/// exactly one `LoadUpdate` and none of them can hold back the others.
#[derive(Clone)]
pub struct DataLoader {
    store: Arc<dyn PreferenceStore>,
    correlation_id: String,
}

impl DataLoader {
    pub fn new(store: Arc<dyn PreferenceStore>, correlation_id: impl Into<String>) -> Self {
        Self { store, correlation_id: correlation_id.into() }
    }

    pub async fn load_workspace(&self, workspace_id: &WorkspaceId) -> LoadUpdate {
        let workspace = match self.store.get_workspace(workspace_id).await {
            Ok(workspace) => workspace,
            Err(error) => {
                warn!(
                    event_name = "setup.load.workspace_failed",
                    correlation_id = %self.correlation_id,
                    workspace_id = %workspace_id,
                    error = %error,
                    "workspace lookup failed, showing placeholder name"
                );
                Workspace::placeholder(workspace_id)
            }
        };
        LoadUpdate::WorkspaceLoaded(workspace)
    }

    pub async fn load_channels(&self, workspace_id: &WorkspaceId) -> LoadUpdate {
        let result = self.store.list_channels(workspace_id).await;
        match &result {
            Ok(channels) => info!(
                event_name = "setup.load.channels_loaded",
                correlation_id = %self.correlation_id,
                workspace_id = %workspace_id,
                channel_count = channels.len(),
                "channel list loaded"
            ),
            Err(error) => warn!(
                event_name = "setup.load.channels_failed",
                correlation_id = %self.correlation_id,
                workspace_id = %workspace_id,
                error = %error,
                "channel list load failed"
            ),
        }
        LoadUpdate::ChannelsLoaded(result.map_err(|error| error.into_channel_failure()))
    }

    pub async fn load_preference(&self, workspace_id: &WorkspaceId) -> LoadUpdate {
        let selection = match self.store.get_saved_selection(workspace_id).await {
            Ok(selection) => {
                debug!(
                    event_name = "setup.load.preference_loaded",
                    correlation_id = %self.correlation_id,
                    workspace_id = %workspace_id,
                    found = selection.is_some(),
                    "saved preference lookup finished"
                );
                selection
            }
            Err(error) => {
                warn!(
                    event_name = "setup.load.preference_failed",
                    correlation_id = %self.correlation_id,
                    workspace_id = %workspace_id,
                    error = %error,
                    "saved preference lookup failed, treating as first-time setup"
                );
                None
            }
        };
        LoadUpdate::PreferenceLoaded(selection)
    }

    /// Spawns one task per load. A send error means the session was torn down, so the result
    /// is dropped on the floor.
    pub fn spawn_all(
        &self,
        workspace_id: &WorkspaceId,
        updates: &UnboundedSender<LoadUpdate>,
        tasks: &mut JoinSet<()>,
    ) {
        let workspace = self.clone();
        let id = workspace_id.clone();
        let tx = updates.clone();
        tasks.spawn(async move {
            let update = workspace.load_workspace(&id).await;
            workspace.deliver(&tx, update);
        });

        let channels = self.clone();
        let id = workspace_id.clone();
        let tx = updates.clone();
        tasks.spawn(async move {
            let update = channels.load_channels(&id).await;
            channels.deliver(&tx, update);
        });

        let preference = self.clone();
        let id = workspace_id.clone();
        let tx = updates.clone();
        tasks.spawn(async move {
            let update = preference.load_preference(&id).await;
            preference.deliver(&tx, update);
        });
    }

    fn deliver(&self, updates: &UnboundedSender<LoadUpdate>, update: LoadUpdate) {
        let source = update.source();
        if updates.send(update).is_err() {
            debug!(
                event_name = "setup.load.discarded",
                correlation_id = %self.correlation_id,
                source = source.as_str(),
                "load resolved after teardown, result discarded"
            );
        }
    }
}
