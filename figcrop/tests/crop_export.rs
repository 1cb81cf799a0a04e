//! End-to-end tests: load a document, select a region and export it.

use figcrop::*;
use hayro_syntax::page::Rotation;

const LETTER: (f32, f32) = (612.0, 792.0);

struct Fixture {
    page_count: usize,
    size: (f32, f32),
    black_box: Option<pdf_writer::Rect>,
    annotated: bool,
    rotate: i32,
}

impl Fixture {
    fn letter(page_count: usize) -> Self {
        Self {
            page_count,
            size: LETTER,
            black_box: None,
            annotated: false,
            rotate: 0,
        }
    }

    fn build(&self) -> Vec<u8> {
        use pdf_writer::types::AnnotationType;
        use pdf_writer::{Content, Finish, Pdf, Rect, Ref, TextStr};

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let mut next_ref = 3;
        let mut alloc = || {
            let r = Ref::new(next_ref);
            next_ref += 1;
            r
        };

        let page_refs: Vec<Ref> = (0..self.page_count).map(|_| alloc()).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id)
            .kids(page_refs.iter().copied())
            .count(self.page_count as i32);

        for page_ref in page_refs {
            let content_id = alloc();
            let annot_id = alloc();

            let mut page = pdf.page(page_ref);
            page.parent(page_tree_id);
            page.media_box(Rect::new(0.0, 0.0, self.size.0, self.size.1));
            page.resources();
            page.contents(content_id);
            if self.rotate != 0 {
                page.rotate(self.rotate);
            }
            if self.annotated {
                page.annotations([annot_id]);
            }
            page.finish();

            let mut content = Content::new();
            if let Some(b) = self.black_box {
                content.set_fill_gray(0.0);
                content.rect(b.x1, b.y1, b.x2 - b.x1, b.y2 - b.y1);
                content.fill_nonzero();
            }
            pdf.stream(content_id, &content.finish());

            if self.annotated {
                let mut annot = pdf.annotation(annot_id);
                annot.subtype(AnnotationType::Text);
                annot.rect(Rect::new(50.0, 50.0, 80.0, 80.0));
                annot.contents(TextStr("note"));
                annot.finish();
            }
        }

        pdf.finish()
    }
}

fn session_with(fixture: &Fixture) -> CropSession {
    let mut session = CropSession::default();
    session
        .load_document(&fixture.build())
        .expect("fixture should load");
    session
        .render_current_page(&HayroRenderer::default())
        .expect("page should render");
    session
}

fn drag(session: &mut CropSession, from: (f64, f64), to: (f64, f64)) {
    session.pointer_down(from.0, from.1);
    session.pointer_move(to.0, to.1);
    session.pointer_up();
}

fn parse(bytes: Vec<u8>) -> hayro_syntax::Pdf {
    hayro_syntax::Pdf::new(std::sync::Arc::new(bytes)).expect("exported PDF should parse")
}

fn crop_box(pdf: &hayro_syntax::Pdf) -> Vec<f32> {
    pdf.pages()[0]
        .raw()
        .get::<Vec<f32>>(b"CropBox".as_ref())
        .expect("exported page should have /CropBox")
}

fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() <= tolerance,
            "expected {expected:?}, got {actual:?}"
        );
    }
}

#[test]
fn rendered_page_matches_scale() {
    let session = session_with(&Fixture::letter(1));
    let raster = session.raster().expect("page should be on screen");

    assert_eq!((raster.width(), raster.height()), (918, 1188));
    assert_eq!(session.viewport().unwrap().page_size(), (612.0, 792.0));
}

#[test]
fn selection_becomes_crop_box() {
    let mut session = session_with(&Fixture::letter(1));
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    let pdf = parse(session.export_selection().expect("export should succeed"));

    assert_eq!(pdf.pages().len(), 1);
    assert_close(
        &crop_box(&pdf),
        &[66.6667, 525.3333, 200.0, 725.3333],
        1e-3,
    );
}

#[test]
fn drag_direction_does_not_matter() {
    let mut forward = session_with(&Fixture::letter(1));
    drag(&mut forward, (100.0, 100.0), (300.0, 400.0));

    let mut backward = session_with(&Fixture::letter(1));
    drag(&mut backward, (300.0, 400.0), (100.0, 100.0));

    assert_eq!(
        forward.export_selection().unwrap(),
        backward.export_selection().unwrap()
    );
}

#[test]
fn export_is_deterministic() {
    let mut session = session_with(&Fixture::letter(2));
    drag(&mut session, (10.0, 20.0), (210.5, 333.3));

    let first = session.export_selection().unwrap();
    let second = session.export_selection().unwrap();
    assert_eq!(first, second);
}

#[test]
fn only_selected_page_is_exported() {
    let mut session = session_with(&Fixture::letter(3));
    assert!(session.set_page(2));
    session.render_current_page(&HayroRenderer::default()).unwrap();
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    let pdf = parse(session.export_selection().unwrap());
    assert_eq!(pdf.pages().len(), 1);
}

#[test]
fn annotations_are_not_exported() {
    let fixture = Fixture {
        annotated: true,
        ..Fixture::letter(1)
    };
    let source = parse(fixture.build());
    assert!(source.pages()[0].raw().contains_key(b"Annots".as_ref()));

    let mut session = session_with(&fixture);
    drag(&mut session, (50.0, 50.0), (400.0, 500.0));

    let pdf = parse(session.export_selection().unwrap());
    assert!(!pdf.pages()[0].raw().contains_key(b"Annots".as_ref()));
}

#[test]
fn rotation_accumulates() {
    let mut session = session_with(&Fixture::letter(1));
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    session.rotate();
    assert_eq!(session.rotate(), 180);

    let pdf = parse(session.export_selection().unwrap());
    let rotate = pdf.pages()[0]
        .raw()
        .get::<f32>(b"Rotate".as_ref())
        .expect("exported page should have /Rotate");
    assert_eq!(rotate, 180.0);
    assert!(matches!(pdf.pages()[0].rotation(), Rotation::Flipped));
}

#[test]
fn full_turn_exports_unrotated() {
    let mut session = session_with(&Fixture::letter(1));
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    for _ in 0..4 {
        session.rotate();
    }
    assert_eq!(session.rotation().degrees(), 360);

    let pdf = parse(session.export_selection().unwrap());
    assert!(matches!(pdf.pages()[0].rotation(), Rotation::None));
}

#[test]
fn blank_page_is_not_tightened() {
    let mut session = session_with(&Fixture::letter(1));
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    let before = session.selection().unwrap().bounds();
    assert!(!session.tighten_selection());
    assert_eq!(session.selection().unwrap().bounds(), before);
    assert!(!session.selection().unwrap().auto_tightened);
}

#[test]
fn tighten_snaps_to_drawn_content() {
    let fixture = Fixture {
        black_box: Some(pdf_writer::Rect::new(100.0, 400.0, 200.0, 500.0)),
        ..Fixture::letter(1)
    };
    let mut session = session_with(&fixture);
    drag(&mut session, (100.0, 400.0), (400.0, 700.0));

    assert!(session.tighten_selection());
    let selection = session.selection().unwrap();
    assert!(selection.auto_tightened);
    assert!(!session.toolbar().actions.contains(ToolbarActions::TIGHTEN));

    // The box covers pixels 150..300 horizontally and 438..588 vertically.
    let b = selection.bounds();
    assert_close(
        &[b.x0 as f32, b.y0 as f32, b.x1 as f32, b.y1 as f32],
        &[147.5, 435.5, 302.5, 590.5],
        1.5,
    );

    let pdf = parse(session.export_selection().unwrap());
    assert_close(&crop_box(&pdf), &[98.3, 398.3, 201.7, 501.7], 1.5);
}

#[test]
fn small_selection_is_discarded() {
    let mut session = session_with(&Fixture::letter(1));

    drag(&mut session, (100.0, 100.0), (110.0, 110.0));
    assert!(session.selection().is_none());
    assert!(!session.toolbar().visible);

    drag(&mut session, (50.0, 50.0), (200.0, 200.0));
    assert_eq!(session.editor().rectangles().len(), 1);
    assert!(session.toolbar().visible);
}

#[test]
fn corner_drag_resizes_selection() {
    let mut session = session_with(&Fixture::letter(1));
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    drag(&mut session, (305.0, 395.0), (350.0, 450.0));

    let selection = session.selection().unwrap();
    assert_eq!(selection.bounds(), kurbo::Rect::new(100.0, 100.0, 350.0, 450.0));
    assert_eq!(session.editor().rectangles().len(), 1);
}

#[test]
fn tiny_selection_cannot_be_exported() {
    let mut session = session_with(&Fixture::letter(1));
    drag(&mut session, (100.0, 100.0), (300.0, 400.0));

    // Shrink the selection with its corner to 15x15 pixels.
    drag(&mut session, (300.0, 400.0), (115.0, 115.0));
    let bounds = session.selection().unwrap().bounds();
    assert_eq!(bounds.size(), kurbo::Size::new(15.0, 15.0));

    assert_eq!(
        session.export_selection().unwrap_err(),
        CropError::InvalidRectangle
    );
}

#[test]
fn export_with_foreign_viewport_is_rejected() {
    let data = Fixture::letter(2).build();
    let pdf = hayro_syntax::Pdf::new(std::sync::Arc::new(data)).unwrap();
    let selection = Rectangle::from_corners(
        kurbo::Point::new(100.0, 100.0),
        kurbo::Point::new(300.0, 400.0),
    );
    let viewport = Viewport::from_page_size(1, 1.5, 612.0, 792.0);

    assert_eq!(
        export_crop(&pdf, 0, &selection, &viewport, 0, &CropSettings::default()).unwrap_err(),
        CropError::StaleViewport
    );
}

#[test]
fn non_letter_pages_use_their_own_height() {
    let fixture = Fixture {
        size: (200.0, 300.0),
        ..Fixture::letter(1)
    };
    let mut session = session_with(&fixture);
    drag(&mut session, (0.0, 0.0), (150.0, 150.0));

    let pdf = parse(session.export_selection().unwrap());
    assert_close(&crop_box(&pdf), &[0.0, 200.0, 100.0, 300.0], 1e-3);
}

#[test]
fn page_rotation_is_kept_on_export() {
    let fixture = Fixture {
        rotate: 90,
        ..Fixture::letter(1)
    };
    let mut session = session_with(&fixture);

    let raster = session.raster().unwrap();
    assert!(raster.width() > raster.height());

    // A landscape selection on the landscape view.
    drag(&mut session, (100.0, 100.0), (500.0, 300.0));

    let pdf = parse(session.export_selection().unwrap());
    let page = &pdf.pages()[0];
    assert!(matches!(page.rotation(), Rotation::Horizontal));

    let (width, height) = page.render_dimensions();
    assert!((width - 266.6667).abs() < 1e-2, "width {width}");
    assert!((height - 133.3333).abs() < 1e-2, "height {height}");

    session.rotate();
    let pdf = parse(session.export_selection().unwrap());
    assert!(matches!(pdf.pages()[0].rotation(), Rotation::Flipped));
}
