//! Content-aware shrinking of a selection.
//!
//! A pixel counts as content when it is not fully transparent and at least
//! one of its color channels is darker than the brightness threshold. This is
//! a cheap stand-in for "part of a figure" on white or near-white pages: light
//! gray content is kept and white-on-white artwork is lost.

use crate::raster::Raster;
use crate::rect::Rectangle;
use crate::settings::CropSettings;
use kurbo::Rect;

/// Whether a pixel counts as content rather than page background.
pub fn is_foreground(rgba: [u8; 4], brightness_threshold: u8) -> bool {
    rgba[3] != 0 && rgba[..3].iter().any(|c| *c < brightness_threshold)
}

/// The pixel window `[x0, x1) x [y0, y1)` covered by `bounds`, clipped to the raster.
fn pixel_window(bounds: Rect, raster: &Raster) -> (u32, u32, u32, u32) {
    let clip = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;

    (
        clip(bounds.x0, raster.width()),
        clip(bounds.y0, raster.height()),
        clip(bounds.x1, raster.width()),
        clip(bounds.y1, raster.height()),
    )
}

/// The bounding box of all content pixels in `[x0, x1) x [y0, y1)`, in raster
/// pixel coordinates with exclusive maximum.
fn content_box(
    raster: &Raster,
    (x0, y0, x1, y1): (u32, u32, u32, u32),
    brightness_threshold: u8,
) -> Option<(u32, u32, u32, u32)> {
    let mut found: Option<(u32, u32, u32, u32)> = None;

    for y in y0..y1 {
        for x in x0..x1 {
            let Some(px) = raster.pixel(x, y) else {
                continue;
            };

            if !is_foreground(px, brightness_threshold) {
                continue;
            }

            found = Some(match found {
                None => (x, y, x + 1, y + 1),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x + 1), max_y.max(y + 1))
                }
            });
        }
    }

    found
}

/// Shrink `rect` to the content it covers in `raster`, plus a margin.
///
/// The margin is only added on edges that moved inward, and never pushes an
/// edge past where it was. Returns `true` if a tightening pass was applied.
/// A rectangle that is already tightened, degenerate, or covers no content
/// is left untouched.
pub fn tighten(rect: &mut Rectangle, raster: &Raster, settings: &CropSettings) -> bool {
    if rect.auto_tightened || rect.is_degenerate() {
        return false;
    }

    let bounds = rect.bounds();
    let window = pixel_window(bounds, raster);
    let (wx0, wy0, wx1, wy1) = window;

    if wx1 <= wx0 || wy1 <= wy0 {
        return false;
    }

    let Some((cx0, cy0, cx1, cy1)) = content_box(raster, window, settings.brightness_threshold)
    else {
        log::debug!("no content inside selection, leaving it untouched");
        return false;
    };

    let margin = settings.tighten_margin;
    let tight = Rect::new(
        if cx0 > wx0 {
            (cx0 as f64 - margin).max(bounds.x0)
        } else {
            bounds.x0
        },
        if cy0 > wy0 {
            (cy0 as f64 - margin).max(bounds.y0)
        } else {
            bounds.y0
        },
        if cx1 < wx1 {
            (cx1 as f64 + margin).min(bounds.x1)
        } else {
            bounds.x1
        },
        if cy1 < wy1 {
            (cy1 as f64 + margin).min(bounds.y1)
        } else {
            bounds.y1
        },
    );

    rect.set_bounds(tight);
    rect.auto_tightened = true;

    true
}
