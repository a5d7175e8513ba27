//! Inspector: style, class, and image edits on the selected element.
//!
//! The inspector follows the engine's [`Action::SelectionChanged`] events and
//! writes straight to the live node. Its class list is a cached view of the
//! node's `class` attribute, refreshed by [`Inspector::sync`] (observe the
//! node, diff on change) so edits made elsewhere show up.
//!
//! Every mutation first checks that the node is still attached. A stale node
//! yields [`Applied::Stale`] and drops the target; nothing is written.
//!
//! [`Action::SelectionChanged`]: crate::engine::Action::SelectionChanged

#[cfg(test)]
#[path = "inspector_test.rs"]
mod inspector_test;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeRef};
use crate::engine::Selection;

/// Font sizes offered by the size picker, in px.
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 12..=64;

/// Errors from inspector operations that need a specific element kind.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InspectorError {
    #[error("selected element is <{tag}>, not an image")]
    NotAnImage { tag: String },
}

/// Outcome of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The node was written.
    Changed,
    /// Nothing to do (empty input, value already present or absent).
    Unchanged,
    /// No target, or the target is no longer attached.
    Stale,
}

/// Inline style properties the inspector edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleProperty {
    FontSize,
    Color,
    TextAlign,
    BackgroundColor,
    BorderRadius,
    Padding,
    Margin,
}

impl StyleProperty {
    /// Every property, in panel order.
    pub const ALL: [Self; 7] = [
        Self::FontSize,
        Self::Color,
        Self::TextAlign,
        Self::BackgroundColor,
        Self::BorderRadius,
        Self::Padding,
        Self::Margin,
    ];

    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            Self::FontSize => "font-size",
            Self::Color => "color",
            Self::TextAlign => "text-align",
            Self::BackgroundColor => "background-color",
            Self::BorderRadius => "border-radius",
            Self::Padding => "padding",
            Self::Margin => "margin",
        }
    }
}

/// Image attributes editable from the image panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAttr {
    Alt,
    Src,
    Width,
    Height,
}

impl ImageAttr {
    #[must_use]
    pub fn attr_name(self) -> &'static str {
        match self {
            Self::Alt => "alt",
            Self::Src => "src",
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

/// Current image attributes of the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
    pub width: Option<String>,
    pub height: Option<String>,
    pub border_radius: Option<String>,
}

/// Font size picker entries (`"12px"` … `"64px"`).
#[must_use]
pub fn font_size_options() -> Vec<String> {
    FONT_SIZE_RANGE.map(|px| format!("{px}px")).collect()
}

#[derive(Debug, Default)]
pub struct Inspector {
    target: Option<NodeRef>,
    classes: Vec<String>,
}

impl Inspector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow a selection change from the engine.
    pub fn on_selection_changed(&mut self, selection: Option<&Selection>) {
        match selection {
            Some(sel) => {
                self.target = Some(sel.node);
                self.classes.clone_from(&sel.classes);
            }
            None => {
                self.target = None;
                self.classes.clear();
            }
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<NodeRef> {
        self.target
    }

    /// Cached class list of the target.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Re-read the target's class attribute. Returns `true` if the cached view
    /// changed, including the target going stale.
    pub fn sync(&mut self, doc: &Document) -> bool {
        let Some(node) = self.live_target(doc) else {
            let changed = self.target.is_some() || !self.classes.is_empty();
            self.target = None;
            self.classes.clear();
            return changed;
        };
        let current = doc.class_list(node);
        if current == self.classes {
            return false;
        }
        self.classes = current;
        true
    }

    // --- Styles ---

    #[must_use]
    pub fn style_value(&self, doc: &Document, property: StyleProperty) -> Option<String> {
        let node = self.target.filter(|n| doc.is_attached(*n))?;
        doc.style_property(node, property.css_name())
    }

    /// Write an inline style; an empty value clears it.
    pub fn apply_style(&mut self, doc: &mut Document, property: StyleProperty, value: &str) -> Applied {
        let Some(node) = self.live_target(doc) else {
            return self.drop_stale();
        };
        if doc.style_property(node, property.css_name()).as_deref() == Some(value.trim()) {
            return Applied::Unchanged;
        }
        match doc.set_style_property(node, property.css_name(), value) {
            Ok(()) => Applied::Changed,
            Err(_) => self.drop_stale(),
        }
    }

    // --- Classes ---

    /// Add one class. Empty input and duplicates are no-ops.
    pub fn add_class(&mut self, doc: &mut Document, input: &str) -> Applied {
        let class = input.trim();
        let Some(node) = self.live_target(doc) else {
            return self.drop_stale();
        };
        self.sync(doc);
        if class.is_empty() || self.classes.iter().any(|c| c == class) {
            return Applied::Unchanged;
        }
        let mut next = self.classes.clone();
        next.push(class.to_owned());
        self.write_classes(doc, node, next)
    }

    /// Remove one class. Absent classes are no-ops.
    pub fn remove_class(&mut self, doc: &mut Document, class: &str) -> Applied {
        let Some(node) = self.live_target(doc) else {
            return self.drop_stale();
        };
        self.sync(doc);
        if !self.classes.iter().any(|c| c == class) {
            return Applied::Unchanged;
        }
        let next: Vec<String> = self.classes.iter().filter(|c| *c != class).cloned().collect();
        self.write_classes(doc, node, next)
    }

    // --- Images ---

    /// Image attributes of the target, or `None` if it is not a live `<img>`.
    #[must_use]
    pub fn image(&self, doc: &Document) -> Option<ImageInfo> {
        let node = self.target.filter(|n| doc.is_attached(*n))?;
        let el = doc.element(node).filter(|el| el.is("img"))?;
        Some(ImageInfo {
            src: el.attr("src").unwrap_or_default().to_owned(),
            alt: el.attr("alt").unwrap_or_default().to_owned(),
            width: el.attr("width").map(str::to_owned),
            height: el.attr("height").map(str::to_owned),
            border_radius: doc.style_property(node, "border-radius"),
        })
    }

    /// Set an image attribute.
    ///
    /// # Errors
    ///
    /// [`InspectorError::NotAnImage`] when the live target is not an `<img>`.
    pub fn set_image_attr(&mut self, doc: &mut Document, attr: ImageAttr, value: &str) -> Result<Applied, InspectorError> {
        let Some(node) = self.live_target(doc) else {
            return Ok(self.drop_stale());
        };
        require_image(doc, node)?;
        if doc.attr(node, attr.attr_name()) == Some(value) {
            return Ok(Applied::Unchanged);
        }
        match doc.set_attr(node, attr.attr_name(), value) {
            Ok(()) => Ok(Applied::Changed),
            Err(_) => Ok(self.drop_stale()),
        }
    }

    /// Set the image's corner rounding.
    ///
    /// # Errors
    ///
    /// [`InspectorError::NotAnImage`] when the live target is not an `<img>`.
    pub fn set_image_radius(&mut self, doc: &mut Document, value: &str) -> Result<Applied, InspectorError> {
        let Some(node) = self.live_target(doc) else {
            return Ok(self.drop_stale());
        };
        require_image(doc, node)?;
        Ok(self.apply_style(doc, StyleProperty::BorderRadius, value))
    }

    // --- Private helpers ---

    fn live_target(&self, doc: &Document) -> Option<NodeRef> {
        self.target.filter(|n| doc.is_attached(*n))
    }

    fn drop_stale(&mut self) -> Applied {
        if let Some(node) = self.target.take() {
            tracing::debug!(index = node.index(), "inspector target went stale");
        }
        self.classes.clear();
        Applied::Stale
    }

    fn write_classes(&mut self, doc: &mut Document, node: NodeRef, next: Vec<String>) -> Applied {
        match doc.set_class_list(node, &next) {
            Ok(()) => {
                self.classes = next;
                Applied::Changed
            }
            Err(_) => self.drop_stale(),
        }
    }
}

fn require_image(doc: &Document, node: NodeRef) -> Result<(), InspectorError> {
    match doc.element(node) {
        Some(el) if el.is("img") => Ok(()),
        other => Err(InspectorError::NotAnImage {
            tag: other.map(|el| el.tag.to_ascii_lowercase()).unwrap_or_default(),
        }),
    }
}
