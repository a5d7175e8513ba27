//! Studio: prompt-to-UI generation core.
//!
//! ARCHITECTURE
//! ============
//! A session turns a natural-language prompt into a versioned web artifact:
//! the [`services::generation::Orchestrator`] streams a model response, the
//! [`extract`] parser splits prose from the fenced code block, and the
//! [`state`] types keep undo history and the persisted version list in step.
//! Collaborators (project storage and the model endpoint) sit behind the
//! traits in [`net`] so every flow runs against mocks in tests.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Environment-driven settings |
//! | [`error`] | Grepable error codes |
//! | [`extract`] | Streaming fence parser and fence stripping |
//! | [`state`] | History, version list, panel layout, session |
//! | [`net`] | Collaborator traits and their HTTP clients |
//! | [`services`] | Prompt synthesis, generation, debounced chat sync |

pub mod config;
pub mod error;
pub mod extract;
pub mod net;
pub mod services;
pub mod state;

pub use config::StudioConfig;
pub use error::ErrorCode;
pub use services::generation::{GenerationError, GenerationOutcome, Orchestrator, StudioEvent};
