//! In-memory session state owned by the orchestrator and the host UI.

pub mod history;
pub mod layout;
pub mod session;
pub mod versions;

pub use history::VersionHistory;
pub use layout::{PanelKey, PanelLayout, PanelState, PanelWidth, ScreenSize};
pub use session::Session;
pub use versions::{VersionError, VersionList};
