//! Placement and contents of the floating selection toolbar.

use crate::rect::Rectangle;
use bitflags::bitflags;

const BUTTON_HALF_WIDTH: f64 = 18.0;
// Button height plus the gap between the toolbar and the selection.
const OFFSET_ABOVE: f64 = 46.0;

bitflags! {
    /// The actions offered by the toolbar.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ToolbarActions: u8 {
        /// Export the selection as a cropped document.
        const CROP = 1 << 0;
        /// Shrink the selection to its content.
        const TIGHTEN = 1 << 1;
        /// Rotate the exported page by another 90 degrees.
        const ROTATE = 1 << 2;
    }
}

/// Where the toolbar goes and what it offers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolbarLayout {
    /// Whether the toolbar is shown at all.
    pub visible: bool,
    /// Left edge in raster pixels.
    pub left: f64,
    /// Top edge in raster pixels.
    pub top: f64,
    /// The enabled actions.
    pub actions: ToolbarActions,
}

impl ToolbarLayout {
    /// A hidden toolbar.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            left: 0.0,
            top: 0.0,
            actions: ToolbarActions::empty(),
        }
    }

    /// A toolbar placed above `selection`, centered horizontally.
    pub fn for_selection(selection: &Rectangle) -> Self {
        let bounds = selection.bounds();
        let center_x = (selection.start.x + selection.end.x) / 2.0;

        let mut actions = ToolbarActions::CROP | ToolbarActions::ROTATE;
        if !selection.auto_tightened {
            actions |= ToolbarActions::TIGHTEN;
        }

        Self {
            visible: true,
            left: center_x - BUTTON_HALF_WIDTH,
            top: bounds.y0 - OFFSET_ABOVE,
            actions,
        }
    }
}
