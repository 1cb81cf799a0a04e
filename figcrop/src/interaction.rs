//! The pointer-driven selection editor.
//!
//! Three pointer events drive everything: a press either grabs a corner of an
//! existing rectangle or starts a new one, a move resizes or draws, and a
//! release finishes the gesture. [`transition`] is a plain function of the
//! current state, the event and the rectangle set, so it can be exercised
//! without any rendering surface.

use crate::rect::{Corner, Rectangle, RectangleSet};
use crate::settings::CropSettings;
use kurbo::Point;

/// A pointer event in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// The primary button was pressed.
    Down(Point),
    /// The pointer moved, with or without a button held.
    Move(Point),
    /// The primary button was released.
    Up,
}

/// What the editor is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A new rectangle is being dragged out from its start corner.
    Drawing {
        /// The index of the rectangle being drawn.
        index: usize,
    },
    /// A corner of an existing rectangle is being dragged.
    ResizingCorner {
        /// The index of the rectangle being resized.
        index: usize,
        /// The corner being dragged.
        corner: Corner,
    },
}

/// The pointer cursor to show over the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Over a draggable corner.
    Pointer,
    /// Anywhere else.
    Crosshair,
}

impl Cursor {
    /// The CSS cursor name.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Crosshair => "crosshair",
        }
    }
}

/// What should happen to the floating toolbar after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolbarChange {
    /// Leave it as it is.
    #[default]
    Unchanged,
    /// Remove it.
    Hide,
    /// Show it (again) next to the current selection.
    Show,
}

/// The outcome of handling one pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effects {
    /// The cursor to show, if it needs updating.
    pub cursor: Option<Cursor>,
    /// Whether the rectangles must be drawn over the page again.
    pub redraw: bool,
    /// What to do with the floating toolbar.
    pub toolbar: ToolbarChange,
}

/// The cursor for a pointer at `p`.
pub fn cursor_at(rects: &RectangleSet, p: Point, tolerance: f64) -> Cursor {
    if rects.is_over_any_corner(p, tolerance) {
        Cursor::Pointer
    } else {
        Cursor::Crosshair
    }
}

/// Apply one pointer event.
pub fn transition(
    state: InteractionState,
    event: PointerEvent,
    rects: &mut RectangleSet,
    settings: &CropSettings,
) -> (InteractionState, Effects) {
    match event {
        PointerEvent::Down(p) => {
            let effects = Effects {
                toolbar: ToolbarChange::Hide,
                ..Effects::default()
            };

            if let Some((index, corner)) = rects.hit_test(p, settings.corner_tolerance) {
                return (InteractionState::ResizingCorner { index, corner }, effects);
            }

            rects.clear();
            let index = rects.push(Rectangle::new(p.x, p.y));

            (InteractionState::Drawing { index }, effects)
        }
        PointerEvent::Move(p) => {
            let mut effects = Effects {
                cursor: Some(cursor_at(rects, p, settings.corner_tolerance)),
                ..Effects::default()
            };

            match state {
                InteractionState::ResizingCorner { index, corner } => {
                    if let Some(rect) = rects.get_mut(index) {
                        rect.resize_corner(corner, p);
                        effects.redraw = true;
                        effects.toolbar = ToolbarChange::Show;
                    }
                }
                InteractionState::Drawing { index } => {
                    if let Some(rect) = rects.get_mut(index) {
                        rect.end = p;
                        effects.redraw = true;
                    }
                }
                InteractionState::Idle => {}
            }

            (state, effects)
        }
        PointerEvent::Up => {
            let mut effects = Effects::default();

            match state {
                InteractionState::Drawing { index } => {
                    let valid = rects
                        .get(index)
                        .is_some_and(|r| r.is_valid(settings.min_selection_size));

                    if valid {
                        effects.toolbar = ToolbarChange::Show;
                    } else {
                        log::debug!("discarding selection below the minimum size");
                        rects.remove(index);
                        effects.redraw = true;
                        effects.toolbar = ToolbarChange::Hide;
                    }
                }
                InteractionState::ResizingCorner { index, .. } => {
                    if rects.get(index).is_some() {
                        effects.toolbar = ToolbarChange::Show;
                    }
                }
                InteractionState::Idle => {}
            }

            (InteractionState::Idle, effects)
        }
    }
}

/// The rectangles on the current page together with the gesture in progress.
#[derive(Debug, Clone, Default)]
pub struct SelectionEditor {
    state: InteractionState,
    rects: RectangleSet,
}

impl SelectionEditor {
    /// Create an editor with no rectangles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one pointer event.
    pub fn handle(&mut self, event: PointerEvent, settings: &CropSettings) -> Effects {
        let (state, effects) = transition(self.state, event, &mut self.rects, settings);
        self.state = state;
        effects
    }

    /// The current gesture.
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// All rectangles on the page.
    pub fn rectangles(&self) -> &RectangleSet {
        &self.rects
    }

    /// The live selection, if any.
    pub fn selection(&self) -> Option<&Rectangle> {
        self.rects.last()
    }

    /// The live selection, mutably.
    pub fn selection_mut(&mut self) -> Option<&mut Rectangle> {
        self.rects.last_mut()
    }

    /// Drop every rectangle and any gesture in progress.
    pub fn reset(&mut self) {
        self.rects.clear();
        self.state = InteractionState::Idle;
    }
}
