//! Slack surface for the standup setup flow.
//!
//! - **Block Kit** (`blocks`) - typed message builders
//! - **Setup form** (`setup`) - renders a `SetupView` and parses `block_actions` payloads
//!   into form intents
//! - **Interaction** (`interaction`) - drives a `SetupSession` from Slack interactions
//!
//! # Architecture
//!
//! ```text
//! block_actions payload → parse_payload → SetupIntent → SetupSession
//!                                                          ↓
//!                              Block Kit message ← render_setup(SetupView)
//! ```

pub mod blocks;
pub mod interaction;
pub mod setup;
