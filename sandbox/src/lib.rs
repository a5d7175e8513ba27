//! Headless preview surface for generated web artifacts.
//!
//! This crate owns everything between "here is some generated markup" and
//! "here is the edited page to persist": a tolerant HTML reader, an arena
//! document with generation-checked node references, the hover / select /
//! edit interaction model, the inspector that mutates the selected element,
//! and the standalone export template. The host is responsible only for
//! forwarding input events and acting on the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Shell lifecycle, artifact updates, interaction, save |
//! | [`dom`] | Arena document and node references |
//! | [`html`] | Tolerant parse and serialize |
//! | [`style`] | Inline style declaration lists |
//! | [`input`] | Input event, key, and listener types |
//! | [`inspector`] | Style / class / image edits on the selection |
//! | [`export`] | Standalone HTML page for download or a new tab |

pub mod dom;
pub mod engine;
pub mod export;
pub mod html;
pub mod input;
pub mod inspector;
pub mod style;

pub use engine::{Action, SandboxCore, SandboxError, SavedMarkup, Selection};
