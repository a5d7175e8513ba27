//! Session services.
//!
//! ARCHITECTURE
//! ============
//! [`generation`] drives a prompt through the model and into versions,
//! [`chat_sync`] persists the conversation behind a debounce, and [`prompt`]
//! builds the single request string the model endpoint takes.

pub mod chat_sync;
pub mod generation;
pub mod prompt;
