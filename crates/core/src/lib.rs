pub mod config;
pub mod domain;
pub mod errors;
pub mod setup;

pub use domain::channel::Channel;
pub use domain::preference::{ChannelPreference, SavedSelection};
pub use domain::schedule::{Timezone, DEFAULT_STANDUP_TIME, DEFAULT_TIMEZONE};
pub use domain::workspace::{Workspace, WorkspaceId};
pub use errors::{ChannelLoadFailure, FailureClass, PreconditionError, SaveFailure};
pub use setup::form::{
    FormIntent, FormState, LoadSource, LoadUpdate, PreparedSave, SaveRejection, SetupIntent,
    SubmitBlocked,
};
pub use setup::status::{Status, StatusKind, StatusTransitionError, StatusView};
pub use setup::validation::{FormField, ValidationError};
pub use setup::view::SetupView;
