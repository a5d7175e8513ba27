//! Preview engine: shell lifecycle, artifact reconciliation, and the
//! hover / select / edit interaction model.
//!
//! DESIGN
//! ======
//! The shell document (doctype, head with the styling runtime, `<body id="root">`)
//! is written once. Artifact updates replace only the mount element's children,
//! so the head and anything the styling runtime attached to it survive every
//! streaming update.
//!
//! Interaction state is a pair of weak [`NodeRef`]s (hover, selection). Every
//! artifact update frees the mount's old subtree, so both are re-validated
//! afterwards and a dead selection is reported as [`Action::SelectionChanged`]
//! with `None` rather than left dangling.
//!
//! Handlers return `Vec<Action>` for the host to carry out (prevent default,
//! focus, forward the selection to the inspector).

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, DomError, NodeData, NodeRef};
use crate::input::{InputEvent, Key, ListenerKind, Listeners};

/// Id of the element artifacts are rendered into.
pub const MOUNT_ID: &str = "root";

/// Shell written on initialization.
pub const SHELL_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<script src="https://cdn.tailwindcss.com"></script>
</head>
<body id="root"></body>
</html>"#;

/// Outline drawn around the hovered element.
pub const HOVER_OUTLINE: &str = "2px dotted blue";
/// Outline drawn around the selected element.
pub const SELECT_OUTLINE: &str = "2px solid red";

/// Attribute that makes the selected element directly editable.
pub const EDITABLE_ATTR: &str = "contenteditable";

/// Inline style properties that only exist for editing and never get saved.
const EDIT_ONLY_STYLES: [&str; 2] = ["outline", "cursor"];

/// Errors from engine commands.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    /// The shell document (or its mount element) does not exist yet.
    #[error("preview surface is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// What the host should do after an input or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Suppress the event's default behavior (link navigation, form submit).
    PreventDefault,
    /// Move keyboard focus to the node.
    Focus(NodeRef),
    /// The selection changed; `None` means cleared.
    SelectionChanged(Option<Selection>),
    RenderNeeded,
}

/// Snapshot of the selected element handed to the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub node: NodeRef,
    pub tag: String,
    pub classes: Vec<String>,
}

/// Edit-artifact-free markup produced by [`SandboxCore::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMarkup {
    /// Serialized root element.
    pub html: String,
}

/// Headless preview surface.
#[derive(Debug, Default)]
pub struct SandboxCore {
    pub doc: Document,
    mount: Option<NodeRef>,
    hovered: Option<NodeRef>,
    selected: Option<NodeRef>,
    listeners: Listeners,
    initialized: bool,
    updates: u64,
}

impl SandboxCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Lifecycle ---

    /// Write the shell and install interaction handlers. Runs once; later calls
    /// only repair a missing mount. Returns `true` if the shell was written.
    pub fn initialize(&mut self) -> bool {
        if self.initialized && self.mount_alive() {
            return false;
        }
        self.doc = Document::parse(SHELL_DOCUMENT);
        self.mount = self.doc.get_element_by_id(MOUNT_ID);
        self.hovered = None;
        self.selected = None;
        self.initialized = true;
        self.install_interaction();
        true
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Install every handler group if the mount exists.
    pub fn install_interaction(&mut self) {
        if self.mount_alive() {
            self.listeners = Listeners::all();
        }
    }

    /// Drop a handler group, as a host-side reload would.
    pub fn remove_listener(&mut self, kind: ListenerKind) {
        self.listeners.remove(kind);
    }

    #[must_use]
    pub fn listeners(&self) -> Listeners {
        self.listeners
    }

    /// Number of artifact updates applied so far.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    // --- Data inputs ---

    /// Render an artifact into the mount, leaving the shell untouched.
    ///
    /// Fence markers are stripped first; blank text is ignored. Returns
    /// `SelectionChanged(None)` when the selection did not survive the update.
    pub fn apply_artifact(&mut self, text: &str) -> Vec<Action> {
        let cleaned = clean_artifact(text);
        if cleaned.trim().is_empty() {
            return Vec::new();
        }
        if !self.mount_alive() {
            self.initialize();
        }
        if !self.listeners.is_complete() {
            tracing::debug!(listeners = ?self.listeners, "reinstalling interaction handlers");
            self.install_interaction();
        }
        let Some(mount) = self.mount else {
            return Vec::new();
        };
        if let Err(error) = self.doc.set_inner_html(mount, &cleaned) {
            tracing::debug!(%error, "artifact update skipped");
            return Vec::new();
        }
        self.updates += 1;

        let mut actions = self.revalidate();
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Input ---

    /// Route an event to its handler, or drop it if no handler is installed.
    pub fn dispatch(&mut self, event: InputEvent) -> Vec<Action> {
        if !self.listeners.handles(event.kind()) {
            return Vec::new();
        }
        match event {
            InputEvent::PointerOver { target } => self.on_pointer_over(target),
            InputEvent::PointerOut { target } => self.on_pointer_out(target),
            InputEvent::Click { target } => self.on_click(target),
            InputEvent::KeyDown { key } => self.on_key_down(&key),
        }
    }

    /// Outline the hovered element while nothing is selected.
    pub fn on_pointer_over(&mut self, target: NodeRef) -> Vec<Action> {
        if self.selected.is_some() || !self.is_selectable(target) {
            return Vec::new();
        }
        if let Some(previous) = self.hovered.take() {
            if previous != target {
                self.clear_outline(previous);
            }
        }
        if self.doc.set_style_property(target, "outline", HOVER_OUTLINE).is_err() {
            return Vec::new();
        }
        self.hovered = Some(target);
        vec![Action::RenderNeeded]
    }

    pub fn on_pointer_out(&mut self, _target: NodeRef) -> Vec<Action> {
        if self.selected.is_some() {
            return Vec::new();
        }
        match self.hovered.take() {
            Some(previous) => {
                self.clear_outline(previous);
                vec![Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Select the clicked element and make it editable.
    pub fn on_click(&mut self, target: NodeRef) -> Vec<Action> {
        let mut actions = vec![Action::PreventDefault];
        if !self.is_selectable(target) {
            return actions;
        }
        if let Some(previous) = self.selected.take() {
            self.clear_edit_state(previous);
        }
        if let Some(previous) = self.hovered.take() {
            if previous != target {
                self.clear_outline(previous);
            }
        }
        let marked = self
            .doc
            .set_style_property(target, "outline", SELECT_OUTLINE)
            .and_then(|()| self.doc.set_attr(target, EDITABLE_ATTR, "true"));
        if marked.is_err() {
            return actions;
        }
        self.selected = Some(target);

        actions.push(Action::Focus(target));
        actions.push(Action::SelectionChanged(self.snapshot(target)));
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_escape() { self.clear_selection() } else { Vec::new() }
    }

    /// Drop the selection and its edit state.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        match self.selected.take() {
            Some(previous) => {
                self.clear_edit_state(previous);
                vec![Action::SelectionChanged(None), Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Replace the selected element's text with `text` (plain, escaped on write).
    ///
    /// Returns `Ok(false)` when `node` is not the live, editable selection.
    ///
    /// # Errors
    ///
    /// Propagates document errors for the write itself.
    pub fn edit_text(&mut self, node: NodeRef, text: &str) -> Result<bool, SandboxError> {
        if self.selection_node() != Some(node) || self.doc.attr(node, EDITABLE_ATTR) != Some("true") {
            return Ok(false);
        }
        self.doc.set_text_content(node, text)?;
        Ok(true)
    }

    // --- Save ---

    /// Serialize the root element without hover/selection outlines, cursors,
    /// or editability markers. The live document is not modified.
    ///
    /// # Errors
    ///
    /// [`SandboxError::NotInitialized`] before the shell exists.
    pub fn save(&self) -> Result<SavedMarkup, SandboxError> {
        let root = self.doc.document_element().ok_or(SandboxError::NotInitialized)?;
        let mut copy = self.doc.clone_subtree(root).ok_or(SandboxError::NotInitialized)?;

        for node in copy.descendants(copy.root()) {
            if !matches!(copy.data(node), Some(NodeData::Element(_))) {
                continue;
            }
            for property in EDIT_ONLY_STYLES {
                if copy.style_property(node, property).is_some() {
                    copy.set_style_property(node, property, "")?;
                }
            }
            copy.remove_attr(node, EDITABLE_ATTR)?;
        }

        let copy_root = copy.document_element().ok_or(SandboxError::NotInitialized)?;
        Ok(SavedMarkup { html: copy.outer_html(copy_root) })
    }

    // --- Queries ---

    /// The live selection, if it still exists.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection_node().and_then(|node| self.snapshot(node))
    }

    #[must_use]
    pub fn selection_node(&self) -> Option<NodeRef> {
        self.selected.filter(|node| self.doc.is_attached(*node))
    }

    #[must_use]
    pub fn hovered(&self) -> Option<NodeRef> {
        self.hovered.filter(|node| self.doc.is_attached(*node))
    }

    #[must_use]
    pub fn mount(&self) -> Option<NodeRef> {
        self.mount.filter(|node| self.doc.is_attached(*node))
    }

    /// Markup currently rendered inside the mount.
    #[must_use]
    pub fn mount_html(&self) -> String {
        self.mount().map(|m| self.doc.inner_html(m)).unwrap_or_default()
    }

    // --- Private helpers ---

    fn mount_alive(&self) -> bool {
        self.mount.is_some_and(|m| self.doc.is_attached(m))
    }

    fn is_selectable(&self, target: NodeRef) -> bool {
        self.doc.element(target).is_some()
            && self.doc.is_attached(target)
            && Some(target) != self.mount
            && Some(target) != self.doc.document_element()
    }

    fn snapshot(&self, node: NodeRef) -> Option<Selection> {
        let tag = self.doc.tag(node)?.to_ascii_lowercase();
        Some(Selection { node, tag, classes: self.doc.class_list(node) })
    }

    fn revalidate(&mut self) -> Vec<Action> {
        if self.hovered.is_some_and(|h| !self.doc.is_attached(h)) {
            self.hovered = None;
        }
        match self.selected {
            Some(node) if !self.doc.is_attached(node) => {
                tracing::debug!(index = node.index(), "selection went stale on update");
                self.selected = None;
                vec![Action::SelectionChanged(None)]
            }
            _ => Vec::new(),
        }
    }

    fn clear_outline(&mut self, node: NodeRef) {
        if self.doc.set_style_property(node, "outline", "").is_err() {
            tracing::debug!(index = node.index(), "hover target already gone");
        }
    }

    fn clear_edit_state(&mut self, node: NodeRef) {
        self.clear_outline(node);
        if self.doc.remove_attr(node, EDITABLE_ATTR).is_err() {
            tracing::debug!(index = node.index(), "selection target already gone");
        }
    }
}

/// Strip fence markers the way the preview does before rendering, along with
/// a stray `html,` language tag some responses lead with.
#[must_use]
pub fn clean_artifact(text: &str) -> String {
    let unfenced = text.replace("```html", "").replace("```", "");
    match unfenced.trim_start().strip_prefix("html,") {
        Some(rest) => rest.to_owned(),
        None => unfenced,
    }
}
