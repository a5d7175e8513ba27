//! Input model for the preview surface.
//!
//! The host translates raw pointer and keyboard events into [`InputEvent`]s
//! that name their target node. Which kinds the surface reacts to is governed
//! by [`Listeners`]: handlers are "installed" once after initialization, and
//! an event whose kind has no installed handler is dropped unseen.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::dom::NodeRef;

/// Keyboard key as reported by the host, e.g. `"Escape"`, `"a"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Whether this is the key that abandons the current selection.
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape" || self.0 == "Esc"
    }
}

/// One interaction event delivered to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer entered `target`.
    PointerOver { target: NodeRef },
    /// Pointer left `target`.
    PointerOut { target: NodeRef },
    /// Primary click on `target`.
    Click { target: NodeRef },
    /// Key pressed anywhere in the surface.
    KeyDown { key: Key },
}

impl InputEvent {
    #[must_use]
    pub fn kind(&self) -> ListenerKind {
        match self {
            Self::PointerOver { .. } | Self::PointerOut { .. } => ListenerKind::Pointer,
            Self::Click { .. } => ListenerKind::Click,
            Self::KeyDown { .. } => ListenerKind::Keyboard,
        }
    }
}

/// Handler groups that can be installed on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Pointer,
    Click,
    Keyboard,
}

/// Which handler groups are currently installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Listeners {
    pub pointer: bool,
    pub click: bool,
    pub keyboard: bool,
}

impl Listeners {
    /// All groups installed.
    #[must_use]
    pub fn all() -> Self {
        Self { pointer: true, click: true, keyboard: true }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pointer && self.click && self.keyboard
    }

    #[must_use]
    pub fn handles(&self, kind: ListenerKind) -> bool {
        match kind {
            ListenerKind::Pointer => self.pointer,
            ListenerKind::Click => self.click,
            ListenerKind::Keyboard => self.keyboard,
        }
    }

    /// Drop one handler group, as a host navigation or reload would.
    pub fn remove(&mut self, kind: ListenerKind) {
        match kind {
            ListenerKind::Pointer => self.pointer = false,
            ListenerKind::Click => self.click = false,
            ListenerKind::Keyboard => self.keyboard = false,
        }
    }
}
