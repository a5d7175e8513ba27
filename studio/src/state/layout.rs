//! Docked panel layout: chat, preview, and settings across breakpoints.
//!
//! Each panel carries `minimized` / `expanded` flags. Crossing a breakpoint
//! re-derives every panel from that breakpoint's defaults; resizes within a
//! breakpoint keep whatever the user toggled.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use serde::{Deserialize, Serialize};

/// Viewports narrower than this are mobile.
pub const MOBILE_MAX_WIDTH: u32 = 768;
/// Viewports narrower than this (and not mobile) are tablet.
pub const TABLET_MAX_WIDTH: u32 = 1024;

pub const DEFAULT_CHAT_WIDTH: u32 = 400;
pub const CHAT_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 280..=600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenSize {
    Mobile,
    Tablet,
    Desktop,
}

impl ScreenSize {
    #[must_use]
    pub fn from_width(width: u32) -> Self {
        if width < MOBILE_MAX_WIDTH {
            Self::Mobile
        } else if width < TABLET_MAX_WIDTH {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKey {
    Chat,
    Preview,
    Settings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
    pub minimized: bool,
    pub expanded: bool,
}

impl PanelState {
    const OPEN: Self = Self { minimized: false, expanded: false };
    const MINIMIZED: Self = Self { minimized: true, expanded: false };
}

/// Rendered width of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelWidth {
    /// Not rendered (mobile, minimized).
    Hidden,
    /// Collapsed to an icon rail.
    Rail,
    /// All remaining space.
    Full,
    /// Share of the viewport.
    Fraction { num: u8, den: u8 },
    /// Fixed width in px.
    Fixed(u32),
}

impl PanelWidth {
    /// Utility class for the width.
    #[must_use]
    pub fn css_class(self) -> String {
        match self {
            Self::Hidden => "w-0".into(),
            Self::Rail => "w-12".into(),
            Self::Full => "w-full".into(),
            Self::Fraction { num, den } => format!("w-{num}/{den}"),
            Self::Fixed(px) => format!("w-{}", px / 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    screen: ScreenSize,
    chat: PanelState,
    preview: PanelState,
    settings: PanelState,
    chat_width: u32,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self::for_screen(ScreenSize::Desktop)
    }
}

impl PanelLayout {
    /// Layout for a viewport width.
    #[must_use]
    pub fn new(viewport_width: u32) -> Self {
        Self::for_screen(ScreenSize::from_width(viewport_width))
    }

    fn for_screen(screen: ScreenSize) -> Self {
        let (chat, settings) = match screen {
            ScreenSize::Mobile => (PanelState::MINIMIZED, PanelState::MINIMIZED),
            ScreenSize::Tablet => (PanelState::OPEN, PanelState::MINIMIZED),
            ScreenSize::Desktop => (PanelState::OPEN, PanelState::OPEN),
        };
        Self { screen, chat, preview: PanelState::OPEN, settings, chat_width: DEFAULT_CHAT_WIDTH }
    }

    #[must_use]
    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    #[must_use]
    pub fn state(&self, panel: PanelKey) -> PanelState {
        match panel {
            PanelKey::Chat => self.chat,
            PanelKey::Preview => self.preview,
            PanelKey::Settings => self.settings,
        }
    }

    /// Apply a viewport resize. Returns `true` when the breakpoint changed and
    /// panel states were re-derived.
    pub fn set_viewport_width(&mut self, width: u32) -> bool {
        let screen = ScreenSize::from_width(width);
        if screen == self.screen {
            return false;
        }
        let chat_width = self.chat_width;
        *self = Self::for_screen(screen);
        self.chat_width = chat_width;
        true
    }

    // --- Panel operations ---

    pub fn toggle(&mut self, panel: PanelKey) {
        let state = self.state_mut(panel);
        state.minimized = !state.minimized;
    }

    pub fn expand(&mut self, panel: PanelKey) {
        *self.state_mut(panel) = PanelState { minimized: false, expanded: true };
    }

    pub fn minimize(&mut self, panel: PanelKey) {
        *self.state_mut(panel) = PanelState::MINIMIZED;
    }

    pub fn reset(&mut self, panel: PanelKey) {
        *self.state_mut(panel) = PanelState::OPEN;
    }

    /// Mobile tab bar: show one of chat or preview, hide the other.
    pub fn select_mobile_tab(&mut self, panel: PanelKey) {
        match panel {
            PanelKey::Chat => {
                self.reset(PanelKey::Chat);
                self.minimize(PanelKey::Preview);
            }
            PanelKey::Preview => {
                self.reset(PanelKey::Preview);
                self.minimize(PanelKey::Chat);
            }
            PanelKey::Settings => self.toggle(PanelKey::Settings),
        }
    }

    #[must_use]
    pub fn width(&self, panel: PanelKey) -> PanelWidth {
        let state = self.state(panel);
        if self.screen == ScreenSize::Mobile {
            return if state.minimized { PanelWidth::Hidden } else { PanelWidth::Full };
        }
        if state.minimized {
            return PanelWidth::Rail;
        }
        let tablet = self.screen == ScreenSize::Tablet;
        match (panel, state.expanded) {
            (PanelKey::Preview, _) => PanelWidth::Full,
            (_, true) if tablet => PanelWidth::Fraction { num: 1, den: 2 },
            (_, true) => PanelWidth::Fraction { num: 2, den: 5 },
            (_, false) if tablet => PanelWidth::Fixed(320),
            (_, false) => PanelWidth::Fixed(384),
        }
    }

    // --- Chat resize ---

    #[must_use]
    pub fn chat_width(&self) -> u32 {
        self.chat_width
    }

    /// Drag the chat divider. Widths outside [`CHAT_WIDTH_RANGE`] are ignored.
    pub fn drag_chat_width(&mut self, px: u32) -> bool {
        if !CHAT_WIDTH_RANGE.contains(&px) {
            return false;
        }
        self.chat_width = px;
        true
    }

    fn state_mut(&mut self, panel: PanelKey) -> &mut PanelState {
        match panel {
            PanelKey::Chat => &mut self.chat,
            PanelKey::Preview => &mut self.preview,
            PanelKey::Settings => &mut self.settings,
        }
    }
}
