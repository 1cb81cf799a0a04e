//! Page rendering and the single-render-in-flight guard.

use crate::coord::Viewport;
use crate::error::CropError;
use crate::raster::Raster;
use hayro::RenderSettings;
use hayro::hayro_interpret::InterpreterSettings;
use hayro_syntax::Pdf;
use hayro_syntax::page::Rotation;
use kurbo::Rect;
use vello_cpu::color::palette::css::WHITE;

/// A rendered page together with the mapping back to its PDF coordinates.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The page image.
    pub raster: Raster,
    /// The mapping between `raster` and the page.
    pub viewport: Viewport,
}

/// Something that can turn a page into pixels.
pub trait PageRenderer {
    /// Render page `page_index` (0-based) at `scale` pixels per point.
    fn render(&self, pdf: &Pdf, page_index: usize, scale: f32) -> Result<RenderedPage, CropError>;
}

/// A [`PageRenderer`] backed by `hayro`.
#[derive(Default)]
pub struct HayroRenderer {
    interpreter_settings: InterpreterSettings,
}

impl HayroRenderer {
    /// Create a renderer with the given interpreter settings.
    pub fn new(interpreter_settings: InterpreterSettings) -> Self {
        Self {
            interpreter_settings,
        }
    }
}

impl PageRenderer for HayroRenderer {
    fn render(&self, pdf: &Pdf, page_index: usize, scale: f32) -> Result<RenderedPage, CropError> {
        let page = pdf
            .pages()
            .get(page_index)
            .ok_or(CropError::InvalidPageIndex(page_index))?;

        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            bg_color: WHITE,
            ..Default::default()
        };

        let pixmap = hayro::render(page, &self.interpreter_settings, &render_settings);
        let width = u32::from(pixmap.width());
        let height = u32::from(pixmap.height());

        let rgba_data = pixmap.take_unpremultiplied();
        let byte_data: Vec<u8> = bytemuck::cast_vec(rgba_data);
        let raster = Raster::new(width, height, byte_data).ok_or(CropError::InvalidPdf)?;

        let rotation = match page.rotation() {
            Rotation::None => 0,
            Rotation::Horizontal => 90,
            Rotation::Flipped => 180,
            Rotation::FlippedHorizontal => 270,
        };
        let crop = page.intersected_crop_box();
        let viewport = Viewport::new(
            page_index,
            f64::from(scale),
            Rect::new(crop.x0, crop.y0, crop.x1, crop.y1),
            rotation,
        );

        Ok(RenderedPage { raster, viewport })
    }
}

/// Identifies one admitted render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
    page_index: usize,
}

impl RenderTicket {
    /// The page the render was requested for.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// The generation the render was requested in.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What to do with a finished render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The result is current and has been applied.
    Applied {
        /// Whether another render was requested (and dropped) while this one
        /// was in flight.
        rerender_requested: bool,
    },
    /// The page or document changed while rendering; the result was discarded.
    Stale,
}

/// Admits at most one render at a time and tags each one with a generation.
///
/// A request that arrives while a render is in flight is dropped, not queued.
/// Anything that changes what should be on screen calls
/// [`RenderGuard::invalidate`], so that a render finishing afterwards is
/// recognized as stale instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct RenderGuard {
    generation: u64,
    in_flight: bool,
    dropped_request: bool,
}

impl RenderGuard {
    /// Create an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a render of `page_index`.
    pub fn begin(&mut self, page_index: usize) -> Option<RenderTicket> {
        if self.in_flight {
            log::debug!("render of page {page_index} dropped, another render is in flight");
            self.dropped_request = true;
            return None;
        }

        self.in_flight = true;

        Some(RenderTicket {
            generation: self.generation,
            page_index,
        })
    }

    /// Finish the render identified by `ticket`.
    pub fn finish(&mut self, ticket: RenderTicket) -> RenderOutcome {
        self.in_flight = false;
        let rerender_requested = std::mem::take(&mut self.dropped_request);

        if ticket.generation != self.generation {
            log::debug!(
                "discarding stale render of page {} (generation {} != {})",
                ticket.page_index,
                ticket.generation,
                self.generation
            );
            return RenderOutcome::Stale;
        }

        RenderOutcome::Applied { rerender_requested }
    }

    /// Mark every render requested so far as outdated.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a render is in flight.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_is_dropped() {
        let mut guard = RenderGuard::new();
        let ticket = guard.begin(0).unwrap();

        assert!(guard.is_in_flight());
        assert!(guard.begin(1).is_none());

        assert_eq!(
            guard.finish(ticket),
            RenderOutcome::Applied {
                rerender_requested: true
            }
        );
        assert!(!guard.is_in_flight());
        assert!(guard.begin(1).is_some());
    }

    #[test]
    fn invalidated_render_is_stale() {
        let mut guard = RenderGuard::new();
        let ticket = guard.begin(0).unwrap();
        guard.invalidate();

        assert_eq!(guard.finish(ticket), RenderOutcome::Stale);

        let ticket = guard.begin(0).unwrap();
        assert_eq!(ticket.generation(), 1);
        assert_eq!(
            guard.finish(ticket),
            RenderOutcome::Applied {
                rerender_requested: false
            }
        );
    }
}
