//! The state of one cropping session: the loaded document, the page on
//! screen, the selection and the export rotation.
//!
//! Everything here is driven serially by one user, so there is no locking.
//! Rendering may complete asynchronously on the caller's side; it is split
//! into [`CropSession::begin_render`] and [`CropSession::complete_render`] so
//! that a result arriving after the user moved on is recognized and dropped.

use crate::coord::Viewport;
use crate::error::CropError;
use crate::export::export_crop;
use crate::interaction::{Effects, PointerEvent, SelectionEditor, ToolbarChange};
use crate::paint::paint_selection;
use crate::raster::Raster;
use crate::rect::Rectangle;
use crate::render::{PageRenderer, RenderGuard, RenderOutcome, RenderTicket, RenderedPage};
use crate::settings::CropSettings;
use crate::tighten::tighten;
use crate::toolbar::ToolbarLayout;
use hayro_syntax::Pdf;
use kurbo::Point;

/// The rotation applied to exported pages.
///
/// Each click adds another 90 degrees. The total is kept as-is and only
/// reduced modulo 360 when exporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationState {
    degrees: i64,
}

impl RotationState {
    /// Add a quarter turn clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.degrees += 90;
    }

    /// The accumulated rotation.
    pub fn degrees(&self) -> i64 {
        self.degrees
    }

    /// The accumulated rotation reduced to `0..360`.
    pub fn normalized(&self) -> i64 {
        self.degrees.rem_euclid(360)
    }

    /// Back to no rotation.
    pub fn reset(&mut self) {
        self.degrees = 0;
    }
}

/// One user's cropping session.
pub struct CropSession {
    settings: CropSettings,
    pdf: Option<Pdf>,
    page_count: usize,
    current_page: usize,
    rendered: Option<RenderedPage>,
    guard: RenderGuard,
    editor: SelectionEditor,
    rotation: RotationState,
    overlay_visible: bool,
    toolbar_visible: bool,
}

impl Default for CropSession {
    fn default() -> Self {
        Self::new(CropSettings::default())
    }
}

impl CropSession {
    /// Create a session with no document loaded.
    pub fn new(settings: CropSettings) -> Self {
        Self {
            settings,
            pdf: None,
            page_count: 0,
            current_page: 0,
            rendered: None,
            guard: RenderGuard::new(),
            editor: SelectionEditor::new(),
            rotation: RotationState::default(),
            overlay_visible: false,
            toolbar_visible: false,
        }
    }

    /// The session settings.
    pub fn settings(&self) -> &CropSettings {
        &self.settings
    }

    /// Load a document from its bytes and go to its first page.
    ///
    /// Returns the number of pages.
    pub fn load_document(&mut self, data: &[u8]) -> Result<usize, CropError> {
        let pdf = Pdf::new(std::sync::Arc::new(data.to_vec())).map_err(|_| CropError::InvalidPdf)?;
        let page_count = pdf.pages().len();

        if page_count == 0 {
            return Err(CropError::InvalidPdf);
        }

        self.pdf = Some(pdf);
        self.page_count = page_count;
        self.current_page = 0;
        self.clear_page_state();
        self.overlay_visible = true;

        log::debug!("loaded document with {page_count} pages");

        Ok(page_count)
    }

    /// Whether a document is loaded.
    pub fn has_document(&self) -> bool {
        self.pdf.is_some()
    }

    /// The loaded document.
    pub fn document(&self) -> Option<&Pdf> {
        self.pdf.as_ref()
    }

    /// The number of pages, or 0 without a document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// The current page, 1-based.
    pub fn current_page(&self) -> usize {
        self.current_page + 1
    }

    /// Go to the next page. Returns `false` on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.pdf.is_some() && self.current_page + 1 < self.page_count {
            self.go_to(self.current_page + 1);
            true
        } else {
            false
        }
    }

    /// Go to the previous page. Returns `false` on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.pdf.is_some() && self.current_page > 0 {
            self.go_to(self.current_page - 1);
            true
        } else {
            false
        }
    }

    /// Go to a 1-based page number. Out-of-range numbers are rejected and
    /// leave the current page unchanged.
    pub fn set_page(&mut self, page: usize) -> bool {
        if self.pdf.is_some() && page > 0 && page <= self.page_count {
            self.go_to(page - 1);
            true
        } else {
            false
        }
    }

    /// Close the document and return to the initial view.
    pub fn go_home(&mut self) {
        self.pdf = None;
        self.page_count = 0;
        self.current_page = 0;
        self.clear_page_state();
        self.rotation.reset();
        self.overlay_visible = false;
    }

    fn go_to(&mut self, page_index: usize) {
        self.current_page = page_index;
        self.clear_page_state();
        self.overlay_visible = false;
    }

    fn clear_page_state(&mut self) {
        self.rendered = None;
        self.editor.reset();
        self.toolbar_visible = false;
        self.guard.invalidate();
    }

    /// Change the render scale, e.g. because the page container was resized.
    ///
    /// The current viewport and selection become invalid; the page has to be
    /// rendered again.
    pub fn set_render_scale(&mut self, scale: f32) {
        if scale == self.settings.render_scale {
            return;
        }

        self.settings.render_scale = scale;
        self.clear_page_state();
    }

    /// Ask to render the current page.
    ///
    /// Returns `None` without a document, or when a render is already in flight.
    pub fn begin_render(&mut self) -> Option<RenderTicket> {
        self.pdf.as_ref()?;
        self.guard.begin(self.current_page)
    }

    /// Hand in the result of the render started with `ticket`.
    pub fn complete_render(
        &mut self,
        ticket: RenderTicket,
        result: Result<RenderedPage, CropError>,
    ) -> Result<RenderOutcome, CropError> {
        let outcome = self.guard.finish(ticket);
        if outcome == RenderOutcome::Stale {
            return Ok(outcome);
        }

        let page = result?;
        let viewport = page.viewport.with_generation(ticket.generation());

        let same_mapping = self.rendered.as_ref().is_some_and(|r| {
            r.viewport.page_index() == viewport.page_index()
                && r.viewport.scale() == viewport.scale()
                && r.viewport.crop_box() == viewport.crop_box()
                && r.viewport.rotation() == viewport.rotation()
        });
        if !same_mapping {
            self.editor.reset();
            self.toolbar_visible = false;
        }

        self.rendered = Some(RenderedPage {
            raster: page.raster,
            viewport,
        });

        Ok(outcome)
    }

    /// Render the current page with `renderer`.
    ///
    /// Returns `Ok(None)` if the request was dropped because another render
    /// is in flight.
    pub fn render_current_page(
        &mut self,
        renderer: &impl PageRenderer,
    ) -> Result<Option<RenderOutcome>, CropError> {
        let Some(pdf) = self.pdf.as_ref() else {
            return Err(CropError::NoDocumentLoaded);
        };

        let Some(ticket) = self.guard.begin(self.current_page) else {
            return Ok(None);
        };

        let result = renderer.render(pdf, ticket.page_index(), self.settings.render_scale);
        self.complete_render(ticket, result).map(Some)
    }

    /// The viewport of the page on screen.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.rendered.as_ref().map(|r| &r.viewport)
    }

    /// The rendered page on screen.
    pub fn raster(&self) -> Option<&Raster> {
        self.rendered.as_ref().map(|r| &r.raster)
    }

    /// The rendered page with the selection drawn over it.
    pub fn painted_raster(&self) -> Option<Raster> {
        self.rendered
            .as_ref()
            .map(|r| paint_selection(&r.raster, self.editor.rectangles(), &self.settings))
    }

    /// Handle a pointer event in raster pixel coordinates.
    ///
    /// Events are ignored while no page is on screen.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Effects {
        if self.rendered.is_none() {
            return Effects::default();
        }

        if matches!(event, PointerEvent::Down(_)) {
            self.overlay_visible = false;
        }

        let effects = self.editor.handle(event, &self.settings);
        match effects.toolbar {
            ToolbarChange::Show => self.toolbar_visible = true,
            ToolbarChange::Hide => self.toolbar_visible = false,
            ToolbarChange::Unchanged => {}
        }

        effects
    }

    /// The pointer was pressed at `(x, y)`.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Effects {
        self.handle_pointer(PointerEvent::Down(Point::new(x, y)))
    }

    /// The pointer moved to `(x, y)`.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Effects {
        self.handle_pointer(PointerEvent::Move(Point::new(x, y)))
    }

    /// The pointer was released.
    pub fn pointer_up(&mut self) -> Effects {
        self.handle_pointer(PointerEvent::Up)
    }

    /// The selection editor.
    pub fn editor(&self) -> &SelectionEditor {
        &self.editor
    }

    /// The live selection, if any.
    pub fn selection(&self) -> Option<&Rectangle> {
        self.editor.selection()
    }

    /// Shrink the selection to its content. Returns `true` if it changed.
    pub fn tighten_selection(&mut self) -> bool {
        let Some(rendered) = self.rendered.as_ref() else {
            return false;
        };

        match self.editor.selection_mut() {
            Some(selection) if selection.is_valid(self.settings.min_selection_size) => {
                tighten(selection, &rendered.raster, &self.settings)
            }
            _ => false,
        }
    }

    /// Add a quarter turn to the export rotation and return the new total.
    pub fn rotate(&mut self) -> i64 {
        self.rotation.rotate_clockwise();
        self.rotation.degrees()
    }

    /// The export rotation.
    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    /// Whether the instruction overlay should be shown.
    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// The floating toolbar for the current selection.
    pub fn toolbar(&self) -> ToolbarLayout {
        match self.editor.selection() {
            Some(selection) if self.toolbar_visible => ToolbarLayout::for_selection(selection),
            _ => ToolbarLayout::hidden(),
        }
    }

    /// Export the current page, cropped to the selection and rotated.
    pub fn export_selection(&self) -> Result<Vec<u8>, CropError> {
        let pdf = self.pdf.as_ref().ok_or(CropError::NoDocumentLoaded)?;
        let rendered = self.rendered.as_ref().ok_or(CropError::StaleViewport)?;

        if rendered.viewport.generation() != self.guard.generation()
            || rendered.viewport.page_index() != self.current_page
        {
            return Err(CropError::StaleViewport);
        }

        let selection = self.editor.selection().ok_or(CropError::InvalidRectangle)?;

        export_crop(
            pdf,
            self.current_page,
            selection,
            &rendered.viewport,
            self.rotation.degrees(),
            &self.settings,
        )
    }
}
