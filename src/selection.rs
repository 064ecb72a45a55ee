use crate::geometry::{Rect, SelectionRect, Viewport};

/// What the host reports for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSelection {
    pub text: String,
    pub collapsed: bool,
    /// Bounding box in viewport coordinates.
    pub bounds: Rect,
}

/// A usable selection: trimmed non-empty text with a non-degenerate box.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSnapshot {
    pub text: String,
    pub rect: SelectionRect,
}

impl SelectionSnapshot {
    pub fn capture(raw: &RawSelection, viewport: &Viewport) -> Option<Self> {
        if raw.collapsed || raw.bounds.is_empty() {
            return None;
        }
        let text = raw.text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            rect: SelectionRect::from_viewport_rect(raw.bounds, viewport),
        })
    }
}

/// Keys the monitor and presenter react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    /// Arrow/Home/End and the like; with shift held they extend a selection.
    Navigation,
    /// `a` with the platform modifier.
    SelectAll,
    Other,
}

/// Whether a key release may have changed the selection.
pub fn key_changes_selection(key: &Key, shift: bool) -> bool {
    match key {
        Key::SelectAll => true,
        Key::Navigation => shift,
        _ => false,
    }
}
