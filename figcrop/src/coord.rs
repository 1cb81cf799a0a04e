//! Coordinate space mapping between a rendered raster and its PDF page.
//!
//! PDF uses a coordinate system with the origin at the bottom-left of the page,
//! y-axis pointing up, measured in points (1/72 inch). A rendered raster has its
//! origin at the top-left, y-axis pointing down, measured in pixels, and shows
//! the page's crop box after the page's `/Rotate` has been applied.
//!
//! A [`Viewport`] is created for every render and must not outlive it: once a
//! page is rendered again (at a new scale, or a different page), the old
//! viewport is stale.

use kurbo::{Point, Rect};

/// An axis-aligned rectangle in PDF point space, given as origin and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    /// The left edge.
    pub x: f64,
    /// The bottom edge.
    pub y: f64,
    /// The width, never negative.
    pub width: f64,
    /// The height, never negative.
    pub height: f64,
}

impl PdfRect {
    /// The rectangle as `[x0, y0, x1, y1]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

/// The mapping between one rendered raster and the page it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    page_index: usize,
    scale: f64,
    crop_box: Rect,
    rotation: u32,
    generation: u64,
}

impl Viewport {
    /// Create a viewport for a page.
    ///
    /// * `page_index`: the 0-based index of the rendered page
    /// * `scale`: the scale factor used when rendering (pixels per point)
    /// * `crop_box`: the page's crop box in PDF coordinates
    /// * `rotation`: page rotation in degrees (0, 90, 180, 270)
    pub fn new(page_index: usize, scale: f64, crop_box: Rect, rotation: u32) -> Self {
        Self {
            page_index,
            scale,
            crop_box: crop_box.abs(),
            rotation: rotation % 360,
            generation: 0,
        }
    }

    /// Create a viewport for an unrotated page whose crop box starts at the origin.
    pub fn from_page_size(page_index: usize, scale: f64, width_pt: f64, height_pt: f64) -> Self {
        Self::new(page_index, scale, Rect::new(0.0, 0.0, width_pt, height_pt), 0)
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// The 0-based index of the page this viewport belongs to.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Pixels per point.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The page's crop box in PDF coordinates.
    pub fn crop_box(&self) -> Rect {
        self.crop_box
    }

    /// The page rotation in degrees.
    pub fn rotation(&self) -> u32 {
        self.rotation
    }

    /// The render generation this viewport was produced by.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The displayed page size in points, after rotation.
    pub fn page_size(&self) -> (f64, f64) {
        let (w, h) = (self.crop_box.width(), self.crop_box.height());
        match self.rotation {
            90 | 270 => (h, w),
            _ => (w, h),
        }
    }

    /// The raster size in pixels.
    pub fn raster_size(&self) -> (f64, f64) {
        let (w, h) = self.page_size();
        (w * self.scale, h * self.scale)
    }

    /// Convert a raster pixel position to a point in PDF space.
    pub fn pixel_to_point(&self, p: Point) -> Point {
        // Convert from pixels to points (unscale).
        let x_pts = p.x / self.scale;
        let y_pts = p.y / self.scale;
        let cb = self.crop_box;

        match self.rotation {
            // 90° rotation: raster x maps to pdf y, raster y maps to pdf x.
            90 => Point::new(cb.x0 + y_pts, cb.y0 + x_pts),
            180 => Point::new(cb.x1 - x_pts, cb.y0 + y_pts),
            270 => Point::new(cb.x1 - y_pts, cb.y1 - x_pts),
            _ => Point::new(cb.x0 + x_pts, cb.y1 - y_pts),
        }
    }

    /// Convert a point in PDF space to a raster pixel position.
    pub fn point_to_pixel(&self, p: Point) -> Point {
        let cb = self.crop_box;
        let (x_pts, y_pts) = match self.rotation {
            90 => (p.y - cb.y0, p.x - cb.x0),
            180 => (cb.x1 - p.x, p.y - cb.y0),
            270 => (cb.y1 - p.y, cb.x1 - p.x),
            _ => (p.x - cb.x0, cb.y1 - p.y),
        };

        Point::new(x_pts * self.scale, y_pts * self.scale)
    }

    /// Convert pixel-space bounds to a crop rectangle in PDF space.
    ///
    /// Both opposite corners are transformed independently, since the
    /// y-flip (and any page rotation) means the pixel-space minimum corner
    /// does not map to the PDF-space minimum corner.
    pub fn crop_box_for(&self, bounds: Rect) -> PdfRect {
        let a = self.pixel_to_point(Point::new(bounds.x0, bounds.y0));
        let b = self.pixel_to_point(Point::new(bounds.x1, bounds.y1));

        let x = a.x.min(b.x);
        let y = a.y.min(b.y);

        PdfRect {
            x,
            y,
            width: a.x.max(b.x) - x,
            height: a.y.max(b.y) - y,
        }
    }
}
