use standup_client::{SaveError, SetupSession};
use tracing::debug;

use crate::blocks::MessageTemplate;
use crate::setup::{parse_payload, render_setup, SetupActionError};

/// Binds a setup session to the Slack surface: interactions become intents, and every
/// handled interaction answers with a fresh render of the form.
pub struct SetupInteraction {
    session: SetupSession,
    bot_handle: String,
}

impl SetupInteraction {
    pub fn new(session: SetupSession, bot_handle: impl Into<String>) -> Self {
        Self { session, bot_handle: bot_handle.into() }
    }

    pub fn session(&self) -> &SetupSession {
        &self.session
    }

    /// Renders the form with every load that has already landed.
    pub fn render(&mut self) -> MessageTemplate {
        render_setup(&self.session.view(&self.bot_handle))
    }

    /// Waits for outstanding loads, then renders.
    pub async fn render_settled(&mut self) -> MessageTemplate {
        self.session.settle().await;
        self.render()
    }

    /// Applies a `block_actions` payload. Validation and save failures are reported through
    /// the status block, so only payload errors are returned.
    pub async fn handle_payload(&mut self, raw: &str) -> Result<MessageTemplate, SetupActionError> {
        let intents = parse_payload(raw)?;
        for intent in intents {
            if let Err(error) = self.session.dispatch(intent).await {
                log_dispatch_error(self.session.correlation_id(), &error);
            }
        }
        Ok(self.render())
    }

    pub fn close(&mut self) {
        self.session.close();
    }
}

fn log_dispatch_error(correlation_id: &str, error: &SaveError) {
    debug!(
        event_name = "ingress.slack.setup_action_rejected",
        correlation_id = %correlation_id,
        error = %error,
        "setup action did not complete"
    );
}
