use std::sync::Arc;

use standup_core::setup::form::ApplyOutcome;
use standup_core::{
    ChannelLoadFailure, ChannelPreference, FailureClass, FormIntent, FormState, LoadSource, LoadUpdate,
    PreconditionError, SaveFailure, SaveRejection, SetupIntent, SetupView, StatusTransitionError,
    SubmitBlocked, ValidationError, Workspace, WorkspaceId,
};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::loader::DataLoader;
use crate::store::PreferenceStore;

const LOAD_COUNT: usize = 3;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("save is not available: {0}")]
    Blocked(SubmitBlocked),
    #[error(transparent)]
    Invalid(ValidationError),
    #[error(transparent)]
    Failed(SaveFailure),
    #[error(transparent)]
    State(#[from] StatusTransitionError),
    #[error("setup session is closed")]
    Closed,
}

impl From<SaveRejection> for SaveError {
    fn from(rejection: SaveRejection) -> Self {
        match rejection {
            SaveRejection::Blocked(blocked) => Self::Blocked(blocked),
            SaveRejection::Invalid(error) => Self::Invalid(error),
            SaveRejection::Transition(error) => Self::State(error),
        }
    }
}

impl SaveError {
    /// Failure class for surfaced errors. Internal state errors and closed sessions have none.
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            Self::Blocked(SubmitBlocked::ChannelsUnavailable) => Some(FailureClass::HardLoad),
            Self::Blocked(_) | Self::State(_) | Self::Closed => None,
            Self::Invalid(_) => Some(FailureClass::Validation),
            Self::Failed(_) => Some(FailureClass::Save),
        }
    }
}

/// One administrator's pass through the setup form.
///
/// The session is the only owner of `FormState`. Loads run as spawned tasks and report back
/// over a channel; their results are applied one at a time, in arrival order. `next_update`
/// and `settle` wait for them. `view`, `dispatch` and `save` first apply whatever has
/// already landed, and an in-flight `save` keeps applying loads as they arrive. Closing the
/// session (or dropping it) aborts the loads, and anything they produce afterwards is
/// discarded.
pub struct SetupSession {
    form: FormState,
    store: Arc<dyn PreferenceStore>,
    loader: DataLoader,
    updates: UnboundedReceiver<LoadUpdate>,
    tasks: JoinSet<()>,
    outstanding: usize,
    correlation_id: String,
    closed: bool,
}

impl SetupSession {
    /// Validates the navigation-supplied workspace id and starts all loads. A missing id
    /// fails before any request is issued. Must be called from within a tokio runtime.
    pub fn open(
        workspace_id: Option<&str>,
        store: Arc<dyn PreferenceStore>,
    ) -> Result<Self, PreconditionError> {
        let workspace_id = WorkspaceId::parse(workspace_id).map_err(|error| {
            warn!(
                event_name = "setup.session.precondition_failed",
                correlation_id = "none",
                error = %error,
                "setup flow cannot start"
            );
            error
        })?;

        let correlation_id = Uuid::new_v4().to_string();
        let loader = DataLoader::new(Arc::clone(&store), correlation_id.clone());
        let (_, updates) = mpsc::unbounded_channel();

        let mut session = Self {
            form: FormState::new(workspace_id),
            store,
            loader,
            updates,
            tasks: JoinSet::new(),
            outstanding: 0,
            correlation_id,
            closed: false,
        };
        session.start_loads();

        info!(
            event_name = "setup.session.opened",
            correlation_id = %session.correlation_id,
            workspace_id = %session.form.workspace_id(),
            "setup session opened"
        );
        Ok(session)
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn view(&mut self, bot_handle: &str) -> SetupView {
        self.drain_ready();
        SetupView::project(&self.form, bot_handle)
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn pending_loads(&self) -> usize {
        self.outstanding
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn start_loads(&mut self) {
        // Replacing the receiver orphans any earlier senders, so stale loads cannot land.
        self.tasks.abort_all();
        self.reap_finished();
        let (tx, rx) = mpsc::unbounded_channel();
        self.updates = rx;
        self.loader.spawn_all(self.form.workspace_id(), &tx, &mut self.tasks);
        self.outstanding = LOAD_COUNT;

        if let Err(error) = self.form.begin_load() {
            warn!(
                event_name = "setup.session.unexpected_transition",
                correlation_id = %self.correlation_id,
                error = %error,
                "could not enter loading state"
            );
        }
    }

    /// Waits for the next load and applies it. Returns `None` once every load has landed.
    pub async fn next_update(&mut self) -> Option<LoadSource> {
        if self.closed || self.outstanding == 0 {
            return None;
        }

        match self.updates.recv().await {
            Some(update) => Some(self.apply(update)),
            None => {
                self.abandon_loads();
                None
            }
        }
    }

    /// Applies every remaining load.
    pub async fn settle(&mut self) {
        while self.next_update().await.is_some() {}
    }

    /// Applies every load that has already landed without waiting for the rest.
    pub fn drain_ready(&mut self) -> Vec<LoadSource> {
        let mut applied = Vec::new();
        while !self.closed && self.outstanding > 0 {
            match self.updates.try_recv() {
                Ok(update) => applied.push(self.apply(update)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.abandon_loads();
                    break;
                }
            }
        }
        applied
    }

    fn reap_finished(&mut self) {
        while self.tasks.try_join_next().is_some() {}
    }

    fn apply(&mut self, update: LoadUpdate) -> LoadSource {
        let source = update.source();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.reap_finished();

        let update = match update {
            LoadUpdate::WorkspaceLoaded(workspace)
                if workspace.workspace_id != self.form.workspace_id().as_str() =>
            {
                warn!(
                    event_name = "setup.load.workspace_mismatch",
                    correlation_id = %self.correlation_id,
                    workspace_id = %self.form.workspace_id(),
                    returned_id = %workspace.workspace_id,
                    "backend returned a different workspace, showing placeholder name"
                );
                LoadUpdate::WorkspaceLoaded(Workspace::placeholder(self.form.workspace_id()))
            }
            other => other,
        };

        match self.form.apply(update) {
            Ok(outcome) => self.log_outcome(source, &outcome),
            Err(error) => warn!(
                event_name = "setup.session.unexpected_transition",
                correlation_id = %self.correlation_id,
                source = source.as_str(),
                error = %error,
                "load applied outside the loading state"
            ),
        }
        source
    }

    fn log_outcome(&self, source: LoadSource, outcome: &ApplyOutcome) {
        if !outcome.kept_edits.is_empty() {
            debug!(
                event_name = "setup.form.edits_kept",
                correlation_id = %self.correlation_id,
                fields = ?outcome.kept_edits,
                "saved preference arrived after user edits, edits kept"
            );
        }
        if !outcome.discarded.is_empty() {
            warn!(
                event_name = "setup.form.saved_values_discarded",
                correlation_id = %self.correlation_id,
                fields = ?outcome.discarded,
                "saved preference carried unusable values, defaults kept"
            );
        }
        debug!(
            event_name = "setup.load.applied",
            correlation_id = %self.correlation_id,
            source = source.as_str(),
            pending = self.outstanding,
            "load applied"
        );
    }

    /// Every sender is gone while loads are still owed, which only happens when a load task
    /// died. Settle whatever is missing so no indicator stays up.
    fn abandon_loads(&mut self) {
        warn!(
            event_name = "setup.load.abandoned",
            correlation_id = %self.correlation_id,
            pending = self.outstanding,
            "load tasks ended without reporting"
        );
        self.outstanding = 0;
        if self.form.workspace().is_none() {
            let placeholder = Workspace::placeholder(self.form.workspace_id());
            let _ = self.form.apply(LoadUpdate::WorkspaceLoaded(placeholder));
        }
        if self.form.is_loading_channels() {
            let _ = self.form.apply(LoadUpdate::ChannelsLoaded(Err(ChannelLoadFailure::Unreachable)));
        }
    }

    pub fn edit(&mut self, intent: FormIntent) {
        if self.closed {
            debug!(
                event_name = "setup.form.edit_ignored",
                correlation_id = %self.correlation_id,
                "edit after teardown ignored"
            );
            return;
        }
        debug!(
            event_name = "setup.form.edited",
            correlation_id = %self.correlation_id,
            field = intent.field().as_str(),
            "form field edited"
        );
        self.form.edit(intent);
    }

    /// Validates and persists the current selection. Loads that resolve while the request is
    /// in flight are applied as they arrive.
    pub async fn save(&mut self) -> Result<ChannelPreference, SaveError> {
        if self.closed {
            return Err(SaveError::Closed);
        }
        self.drain_ready();

        let prepared = self.form.begin_save().map_err(|rejection| {
            info!(
                event_name = "setup.save.rejected",
                correlation_id = %self.correlation_id,
                reason = %rejection,
                "save not attempted"
            );
            SaveError::from(rejection)
        })?;

        if !prepared.channel_known {
            warn!(
                event_name = "setup.save.channel_name_fallback",
                correlation_id = %self.correlation_id,
                channel_id = %prepared.preference.channel_id,
                "selected channel is not in the loaded list, sending its id as the name"
            );
        }
        info!(
            event_name = "setup.save.started",
            correlation_id = %self.correlation_id,
            workspace_id = %self.form.workspace_id(),
            channel_id = %prepared.preference.channel_id,
            standup_time = %prepared.preference.standup_time,
            timezone = %prepared.preference.timezone,
            "saving channel preference"
        );

        let store = Arc::clone(&self.store);
        let workspace_id = self.form.workspace_id().clone();
        let preference = prepared.preference.clone();
        let request = async move { store.save_preference(&workspace_id, &preference).await };
        tokio::pin!(request);

        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                update = self.updates.recv(), if self.outstanding > 0 => match update {
                    Some(update) => {
                        self.apply(update);
                    }
                    None => self.abandon_loads(),
                },
            }
        };

        match result {
            Ok(()) => {
                self.form.finish_save(Ok(()))?;
                info!(
                    event_name = "setup.save.succeeded",
                    correlation_id = %self.correlation_id,
                    workspace_id = %self.form.workspace_id(),
                    "channel preference saved"
                );
                Ok(prepared.preference)
            }
            Err(error) => {
                warn!(
                    event_name = "setup.save.failed",
                    correlation_id = %self.correlation_id,
                    workspace_id = %self.form.workspace_id(),
                    error = %error,
                    "channel preference save failed"
                );
                let failure = error.into_save_failure();
                self.form.finish_save(Err(failure.clone()))?;
                Err(SaveError::Failed(failure))
            }
        }
    }

    /// Restarts every load. User edits stay pinned.
    pub fn reload(&mut self) -> Result<(), SaveError> {
        if self.closed {
            return Err(SaveError::Closed);
        }
        info!(
            event_name = "setup.session.reload",
            correlation_id = %self.correlation_id,
            "reloading setup data"
        );
        self.start_loads();
        Ok(())
    }

    pub async fn dispatch(&mut self, intent: SetupIntent) -> Result<(), SaveError> {
        self.drain_ready();
        match intent {
            SetupIntent::Edit(edit) => {
                self.edit(edit);
                Ok(())
            }
            SetupIntent::Save => self.save().await.map(|_| ()),
            SetupIntent::Reload => self.reload(),
        }
    }

    /// Tears the session down. Pending loads are aborted and late results are dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.tasks.abort_all();
        self.updates.close();
        self.closed = true;
        info!(
            event_name = "setup.session.closed",
            correlation_id = %self.correlation_id,
            discarded_loads = self.outstanding,
            "setup session closed"
        );
        self.outstanding = 0;
    }
}
