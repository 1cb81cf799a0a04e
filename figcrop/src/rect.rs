//! The selection rectangle and the set of rectangles on the current page.
//!
//! A rectangle stores the two corners the user dragged between, in raster
//! pixel space. The corners are not ordered: the drag may have started at
//! any corner. Anything that needs ordered bounds goes through
//! [`Rectangle::bounds`], which is always derived and never stored.

use kurbo::{Point, Rect};

/// One of the four corners of a [`Rectangle`].
///
/// A corner is named after the stored coordinates it combines, not after its
/// on-screen position: `TopLeft` is `(start.x, start.y)` even when the user
/// dragged upwards and `start` ends up below `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// `(start.x, start.y)`.
    TopLeft,
    /// `(end.x, start.y)`.
    TopRight,
    /// `(start.x, end.y)`.
    BottomLeft,
    /// `(end.x, end.y)`.
    BottomRight,
}

impl Corner {
    /// All corners, in hit-test order.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// The short name of the corner (`tl`, `tr`, `bl`, `br`).
    pub fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
        }
    }
}

/// A user-drawn crop region in raster pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// The corner where the drag started.
    pub start: Point,
    /// The opposite corner.
    pub end: Point,
    /// Whether the rectangle has been shrunk to its content since it was
    /// last drawn or resized.
    pub auto_tightened: bool,
}

impl Rectangle {
    /// Create a degenerate rectangle with both corners at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self::from_corners(Point::new(x, y), Point::new(x, y))
    }

    /// Create a rectangle from two opposite corners.
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            auto_tightened: false,
        }
    }

    /// The position of a named corner.
    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(self.start.x, self.start.y),
            Corner::TopRight => Point::new(self.end.x, self.start.y),
            Corner::BottomLeft => Point::new(self.start.x, self.end.y),
            Corner::BottomRight => Point::new(self.end.x, self.end.y),
        }
    }

    /// Move exactly one corner to `p`.
    ///
    /// The rectangle is no longer considered tightened afterwards.
    pub fn resize_corner(&mut self, corner: Corner, p: Point) {
        match corner {
            Corner::TopLeft => {
                self.start.x = p.x;
                self.start.y = p.y;
            }
            Corner::TopRight => {
                self.end.x = p.x;
                self.start.y = p.y;
            }
            Corner::BottomLeft => {
                self.start.x = p.x;
                self.end.y = p.y;
            }
            Corner::BottomRight => {
                self.end.x = p.x;
                self.end.y = p.y;
            }
        }
        self.auto_tightened = false;
    }

    /// The normalized bounds, with `x0 <= x1` and `y0 <= y1`.
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    /// Replace both corners with the corners of `bounds`.
    pub(crate) fn set_bounds(&mut self, bounds: Rect) {
        self.start = Point::new(bounds.x0, bounds.y0);
        self.end = Point::new(bounds.x1, bounds.y1);
    }

    /// Whether the rectangle is less than one pixel wide or high.
    pub fn is_degenerate(&self) -> bool {
        let b = self.bounds();
        b.width() < 1.0 || b.height() < 1.0
    }

    /// Whether the rectangle is at least `min_size` pixels in both axes.
    pub fn is_valid(&self, min_size: f64) -> bool {
        let b = self.bounds();
        !self.is_degenerate() && b.width() >= min_size && b.height() >= min_size
    }
}

/// Whether `p` lies within `tolerance` of `corner` on both axes.
pub fn is_over_corner(p: Point, corner: Point, tolerance: f64) -> bool {
    (corner.x - p.x).abs() < tolerance && (corner.y - p.y).abs() < tolerance
}

/// The rectangles drawn on the currently rendered page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectangleSet {
    rects: Vec<Rectangle>,
}

impl RectangleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every rectangle.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Append a rectangle and return its index.
    pub fn push(&mut self, rect: Rectangle) -> usize {
        self.rects.push(rect);
        self.rects.len() - 1
    }

    /// Remove the rectangle at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<Rectangle> {
        (index < self.rects.len()).then(|| self.rects.remove(index))
    }

    /// The rectangle at `index`.
    pub fn get(&self, index: usize) -> Option<&Rectangle> {
        self.rects.get(index)
    }

    /// The rectangle at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Rectangle> {
        self.rects.get_mut(index)
    }

    /// The most recently added rectangle.
    pub fn last(&self) -> Option<&Rectangle> {
        self.rects.last()
    }

    /// The most recently added rectangle, mutably.
    pub fn last_mut(&mut self) -> Option<&mut Rectangle> {
        self.rects.last_mut()
    }

    /// The number of rectangles.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether there are no rectangles.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Iterate over the rectangles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rectangle> {
        self.rects.iter()
    }

    /// Find the corner under `p`, searching the most recently added
    /// rectangle first.
    pub fn hit_test(&self, p: Point, tolerance: f64) -> Option<(usize, Corner)> {
        self.rects.iter().enumerate().rev().find_map(|(idx, rect)| {
            Corner::ALL
                .into_iter()
                .find(|c| is_over_corner(p, rect.corner(*c), tolerance))
                .map(|c| (idx, c))
        })
    }

    /// Whether `p` is over any corner of any rectangle.
    pub fn is_over_any_corner(&self, p: Point, tolerance: f64) -> bool {
        self.hit_test(p, tolerance).is_some()
    }
}
