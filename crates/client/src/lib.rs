pub mod http;
pub mod loader;
pub mod navigation;
pub mod session;
pub mod store;

pub use http::HttpPreferenceStore;
pub use loader::DataLoader;
pub use session::{SaveError, SetupSession};
pub use store::{PreferenceStore, StoreError};
