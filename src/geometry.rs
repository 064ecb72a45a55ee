//! Rectangles and placement of the floating UI relative to a selection.
//!
//! Document coordinates include the scroll offset; viewport coordinates do not.

use crate::constants::{
    AFFORDANCE_GAP, AFFORDANCE_HEIGHT, AFFORDANCE_WIDTH, DIALOG_GAP, DIALOG_HEIGHT, DIALOG_WIDTH,
    VIEWPORT_MARGIN,
};

/// A rectangle in viewport coordinates, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// Bounding box of a selection, in document coordinates plus its vertical
/// extent in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub width: f64,
    pub height: f64,
    pub viewport_top: f64,
    pub viewport_bottom: f64,
}

impl SelectionRect {
    pub fn from_viewport_rect(rect: Rect, viewport: &Viewport) -> Self {
        Self {
            top: rect.y + viewport.scroll_y,
            bottom: rect.y + rect.height + viewport.scroll_y,
            left: rect.x + viewport.scroll_x,
            right: rect.x + rect.width + viewport.scroll_x,
            width: rect.width,
            height: rect.height,
            viewport_top: rect.y,
            viewport_bottom: rect.y + rect.height,
        }
    }
}

/// Top-left corner in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin: Point,
    pub side: Side,
}

/// Keeps `[left, left + width]` inside the viewport, `VIEWPORT_MARGIN` from each edge.
/// A box wider than the available space is pinned to the left margin.
fn clamp_horizontal(left: f64, width: f64, viewport: &Viewport) -> f64 {
    let min = viewport.scroll_x + VIEWPORT_MARGIN;
    let max = viewport.scroll_x + viewport.width - width - VIEWPORT_MARGIN;
    if max < min {
        min
    } else {
        left.clamp(min, max)
    }
}

/// Trigger affordance: centred above the selection, below it when the space
/// above is too small.
pub fn place_affordance(rect: &SelectionRect, viewport: &Viewport) -> Placement {
    let centre = rect.left + rect.width / 2.0;
    let left = clamp_horizontal(centre - AFFORDANCE_WIDTH / 2.0, AFFORDANCE_WIDTH, viewport);

    if rect.viewport_top >= AFFORDANCE_HEIGHT + AFFORDANCE_GAP {
        Placement {
            origin: Point {
                left,
                top: rect.top - AFFORDANCE_HEIGHT - AFFORDANCE_GAP,
            },
            side: Side::Above,
        }
    } else {
        Placement {
            origin: Point {
                left,
                top: rect.bottom + AFFORDANCE_GAP,
            },
            side: Side::Below,
        }
    }
}

/// Response panel: below the selection, above it when it would overflow the
/// viewport bottom.
pub fn place_dialog(rect: &SelectionRect, viewport: &Viewport) -> Placement {
    let left = clamp_horizontal(rect.left, DIALOG_WIDTH, viewport);
    let overflows_bottom = rect.viewport_bottom + DIALOG_GAP + DIALOG_HEIGHT > viewport.height;

    if overflows_bottom {
        Placement {
            origin: Point {
                left,
                top: rect.top - DIALOG_GAP - DIALOG_HEIGHT,
            },
            side: Side::Above,
        }
    } else {
        Placement {
            origin: Point {
                left,
                top: rect.bottom + DIALOG_GAP,
            },
            side: Side::Below,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 500.0,
        }
    }

    fn selection(x: f64, y: f64, width: f64, height: f64) -> SelectionRect {
        SelectionRect::from_viewport_rect(Rect::new(x, y, width, height), &viewport())
    }

    #[test]
    fn test_selection_rect_document_coordinates() {
        let rect = selection(100.0, 200.0, 50.0, 20.0);
        assert_eq!(rect.top, 700.0);
        assert_eq!(rect.bottom, 720.0);
        assert_eq!(rect.left, 100.0);
        assert_eq!(rect.right, 150.0);
        assert_eq!(rect.viewport_top, 200.0);
        assert_eq!(rect.viewport_bottom, 220.0);
    }

    #[test]
    fn test_affordance_prefers_above() {
        let rect = selection(400.0, 200.0, 200.0, 20.0);
        let placement = place_affordance(&rect, &viewport());
        assert_eq!(placement.side, Side::Above);
        assert_eq!(
            placement.origin,
            Point {
                left: 440.0,
                top: 700.0 - AFFORDANCE_HEIGHT - AFFORDANCE_GAP
            }
        );
    }

    #[test]
    fn test_affordance_flips_below_near_top() {
        let rect = selection(400.0, 10.0, 200.0, 20.0);
        let placement = place_affordance(&rect, &viewport());
        assert_eq!(placement.side, Side::Below);
        assert_eq!(placement.origin.top, rect.bottom + AFFORDANCE_GAP);
    }

    #[test]
    fn test_dialog_below_when_room() {
        let rect = selection(100.0, 100.0, 80.0, 20.0);
        let placement = place_dialog(&rect, &viewport());
        assert_eq!(placement.side, Side::Below);
        assert_eq!(placement.origin.top, rect.bottom + DIALOG_GAP);
        assert_eq!(placement.origin.left, 100.0);
    }

    #[test]
    fn test_dialog_flips_above_near_bottom() {
        let rect = selection(100.0, 600.0, 80.0, 20.0);
        let placement = place_dialog(&rect, &viewport());
        assert_eq!(placement.side, Side::Above);
        assert_eq!(placement.origin.top, rect.top - DIALOG_GAP - DIALOG_HEIGHT);
    }

    #[test]
    fn test_dialog_clamped_to_margins() {
        let right_edge = selection(900.0, 100.0, 60.0, 20.0);
        let placement = place_dialog(&right_edge, &viewport());
        assert_eq!(placement.origin.left, 1000.0 - DIALOG_WIDTH - VIEWPORT_MARGIN);

        let left_edge = selection(2.0, 100.0, 60.0, 20.0);
        let placement = place_dialog(&left_edge, &viewport());
        assert_eq!(placement.origin.left, VIEWPORT_MARGIN);
    }

    #[test]
    fn test_narrow_viewport_pins_to_left_margin() {
        let narrow = Viewport {
            width: 300.0,
            height: 800.0,
            scroll_x: 40.0,
            scroll_y: 0.0,
        };
        let rect = SelectionRect::from_viewport_rect(Rect::new(100.0, 100.0, 50.0, 20.0), &narrow);
        let placement = place_dialog(&rect, &narrow);
        assert_eq!(placement.origin.left, 40.0 + VIEWPORT_MARGIN);
    }

    #[test]
    fn test_empty_rect() {
        assert!(Rect::new(1.0, 1.0, 0.0, 10.0).is_empty());
        assert!(!Rect::new(1.0, 1.0, 5.0, 10.0).is_empty());
    }
}
