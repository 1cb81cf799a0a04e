//! Drawing the selection over a rendered page.

use crate::raster::Raster;
use crate::rect::{Corner, RectangleSet};
use crate::settings::CropSettings;
use kurbo::Point;

const SELECTION_RGBA: [u8; 4] = [255, 0, 0, 255];

/// Return a copy of `base` with every rectangle outlined and a handle drawn
/// on each of its corners.
pub fn paint_selection(base: &Raster, rects: &RectangleSet, settings: &CropSettings) -> Raster {
    let mut out = base.clone();
    let radius = settings.corner_tolerance / 2.0;

    for rect in rects.iter() {
        let b = rect.bounds();
        let (x0, y0) = (b.x0.round() as i64, b.y0.round() as i64);
        let (x1, y1) = (b.x1.round() as i64, b.y1.round() as i64);

        out.fill_rect(x0, y0, x1 + 1, y0 + 1, SELECTION_RGBA); // top
        out.fill_rect(x0, y1, x1 + 1, y1 + 1, SELECTION_RGBA); // bottom
        out.fill_rect(x0, y0, x0 + 1, y1 + 1, SELECTION_RGBA); // left
        out.fill_rect(x1, y0, x1 + 1, y1 + 1, SELECTION_RGBA); // right

        for corner in Corner::ALL {
            draw_handle(&mut out, rect.corner(corner), radius);
        }
    }

    out
}

fn draw_handle(raster: &mut Raster, center: Point, radius: f64) {
    let r = radius.ceil() as i64;
    let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);

    for dy in -r..=r {
        for dx in -r..=r {
            if ((dx * dx + dy * dy) as f64) > radius * radius {
                continue;
            }

            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 {
                raster.set_pixel(x as u32, y as u32, SELECTION_RGBA);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::Rectangle;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn outlines_and_handles_are_drawn() {
        let base = Raster::filled(100, 100, WHITE);
        let mut rects = RectangleSet::new();
        rects.push(Rectangle::from_corners(
            Point::new(80.0, 70.0),
            Point::new(20.0, 10.0),
        ));

        let painted = paint_selection(&base, &rects, &CropSettings::default());

        // Edges.
        assert_eq!(painted.pixel(50, 10), Some(SELECTION_RGBA));
        assert_eq!(painted.pixel(50, 70), Some(SELECTION_RGBA));
        assert_eq!(painted.pixel(20, 40), Some(SELECTION_RGBA));
        assert_eq!(painted.pixel(80, 40), Some(SELECTION_RGBA));
        // Handle around a corner, outside the outline.
        assert_eq!(painted.pixel(17, 7), Some(SELECTION_RGBA));
        // Interior untouched, and the base is not modified.
        assert_eq!(painted.pixel(50, 40), Some(WHITE));
        assert_eq!(base.pixel(50, 10), Some(WHITE));
    }

    #[test]
    fn handles_near_the_edge_are_clipped() {
        let base = Raster::filled(10, 10, WHITE);
        let mut rects = RectangleSet::new();
        rects.push(Rectangle::from_corners(Point::new(0.0, 0.0), Point::new(9.0, 9.0)));

        let painted = paint_selection(&base, &rects, &CropSettings::default());
        assert_eq!(painted.pixel(0, 0), Some(SELECTION_RGBA));
        assert_eq!(painted.width(), 10);
    }
}
