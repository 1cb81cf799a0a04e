use figcrop::{
    ArchiveEntry, CropError, CropSession, CropSettings, Effects, HayroRenderer, Raster,
    RenderOutcome, figure_entries, resolve_query, unpack_source_archive,
};
use wasm_bindgen::prelude::*;

/// Sends log records to the browser console and to the page's log panel.
struct ConsoleLogger;

/// `module: message`, with the `figcrop::` prefix dropped from the module.
fn log_line(record: &log::Record<'_>) -> String {
    let target = record.target();
    let module = target.strip_prefix("figcrop::").unwrap_or(target);
    format!("{module}: {}", record.args())
}

/// Call `window.addLogEntry(level, line)` if the page defines it.
fn forward_to_log_panel(level: log::Level, line: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(hook) = js_sys::Reflect::get(&window, &"addLogEntry".into()) else {
        return;
    };
    if !hook.is_function() {
        return;
    }

    let level = level.as_str().to_ascii_lowercase();
    let _ = js_sys::Function::from(hook).call2(&window, &level.into(), &line.into());
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = log_line(record);
        let value = JsValue::from_str(&line);
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&value),
            log::Level::Warn => web_sys::console::warn_1(&value),
            log::Level::Info => web_sys::console::info_1(&value),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&value),
        }

        forward_to_log_panel(record.level(), &line);
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Change how much is logged. Accepts `error`, `warn`, `info`, `debug`,
/// `trace` or `off`; anything else is ignored.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => {
            log::set_max_level(filter);
            true
        }
        Err(_) => false,
    }
}

fn to_js(err: CropError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// `[width, height, pixels]`, the shape the page expects for `putImageData`.
fn raster_to_js(raster: Raster) -> js_sys::Array {
    let result = js_sys::Array::new_with_length(3);
    result.set(0, JsValue::from(raster.width()));
    result.set(1, JsValue::from(raster.height()));
    result.set(2, JsValue::from(raster.into_data()));
    result
}

fn cursor_name(effects: Effects) -> Option<String> {
    effects.cursor.map(|c| c.css_name().to_string())
}

#[wasm_bindgen]
pub struct FigureCropper {
    session: CropSession,
    renderer: HayroRenderer,
    figures: Vec<ArchiveEntry>,
}

impl Default for FigureCropper {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl FigureCropper {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();

        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Warn);
        }

        Self {
            session: CropSession::new(CropSettings::default()),
            renderer: HayroRenderer::default(),
            figures: Vec::new(),
        }
    }

    #[wasm_bindgen]
    pub fn load_pdf(&mut self, data: &[u8]) -> Result<usize, JsValue> {
        self.session.load_document(data).map_err(to_js)
    }

    /// Render the current page and return `[width, height, pixels]`.
    ///
    /// Returns `undefined` if another render was still in flight.
    #[wasm_bindgen]
    pub fn render_current_page(&mut self) -> Result<JsValue, JsValue> {
        match self.session.render_current_page(&self.renderer) {
            Ok(Some(RenderOutcome::Applied { .. })) => Ok(self.painted_page()),
            Ok(Some(RenderOutcome::Stale)) | Ok(None) => Ok(JsValue::UNDEFINED),
            Err(e) if e.is_silent() => Ok(JsValue::UNDEFINED),
            Err(e) => Err(to_js(e)),
        }
    }

    /// The current page with the selection drawn over it, or `undefined`
    /// if nothing is on screen.
    #[wasm_bindgen]
    pub fn painted_page(&self) -> JsValue {
        self.session
            .painted_raster()
            .map_or(JsValue::UNDEFINED, |r| raster_to_js(r).into())
    }

    #[wasm_bindgen]
    pub fn set_render_scale(&mut self, scale: f32) {
        self.session.set_render_scale(scale);
    }

    #[wasm_bindgen]
    pub fn next_page(&mut self) -> bool {
        self.session.next_page()
    }

    #[wasm_bindgen]
    pub fn previous_page(&mut self) -> bool {
        self.session.previous_page()
    }

    #[wasm_bindgen]
    pub fn set_page(&mut self, page: usize) -> bool {
        self.session.set_page(page)
    }

    #[wasm_bindgen]
    pub fn get_current_page(&self) -> usize {
        self.session.current_page()
    }

    #[wasm_bindgen]
    pub fn get_total_pages(&self) -> usize {
        self.session.page_count()
    }

    #[wasm_bindgen]
    pub fn go_home(&mut self) {
        self.session.go_home();
        self.figures.clear();
    }

    #[wasm_bindgen]
    pub fn overlay_visible(&self) -> bool {
        self.session.overlay_visible()
    }

    /// Pointer handlers take canvas pixel coordinates and return the CSS
    /// cursor to show, if it should change.
    #[wasm_bindgen]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<String> {
        cursor_name(self.session.pointer_down(x, y))
    }

    #[wasm_bindgen]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<String> {
        cursor_name(self.session.pointer_move(x, y))
    }

    #[wasm_bindgen]
    pub fn pointer_up(&mut self) -> Option<String> {
        cursor_name(self.session.pointer_up())
    }

    /// Returns `[visible, left, top, crop, tighten, rotate]`.
    #[wasm_bindgen]
    pub fn toolbar_layout(&self) -> js_sys::Array {
        use figcrop::ToolbarActions;

        let layout = self.session.toolbar();
        let result = js_sys::Array::new_with_length(6);
        result.set(0, JsValue::from(layout.visible));
        result.set(1, JsValue::from(layout.left));
        result.set(2, JsValue::from(layout.top));
        result.set(3, JsValue::from(layout.actions.contains(ToolbarActions::CROP)));
        result.set(4, JsValue::from(layout.actions.contains(ToolbarActions::TIGHTEN)));
        result.set(5, JsValue::from(layout.actions.contains(ToolbarActions::ROTATE)));
        result
    }

    #[wasm_bindgen]
    pub fn tighten(&mut self) -> bool {
        self.session.tighten_selection()
    }

    /// Returns the accumulated rotation in degrees.
    #[wasm_bindgen]
    pub fn rotate(&mut self) -> i32 {
        let degrees = self.session.rotate();
        i32::try_from(degrees).unwrap_or(i32::MAX)
    }

    /// The cropped page as PDF bytes, or `undefined` if there is nothing to
    /// export.
    #[wasm_bindgen]
    pub fn crop(&self) -> Result<Option<Vec<u8>>, JsValue> {
        match self.session.export_selection() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_silent() => Ok(None),
            Err(e) => {
                log::warn!("export failed: {e}");
                Err(to_js(e))
            }
        }
    }

    #[wasm_bindgen]
    pub fn output_file_name(&self) -> String {
        self.session.settings().output_file_name.clone()
    }

    /// Resolve search-box input. Returns `[pdf_url, source_archive_url]`,
    /// where the second entry is `undefined` for non-arXiv links, or
    /// `undefined` if the input is not understood.
    #[wasm_bindgen]
    pub fn resolve_query(&self, input: &str) -> JsValue {
        let Some(source) = resolve_query(input) else {
            return JsValue::UNDEFINED;
        };

        let result = js_sys::Array::new_with_length(2);
        result.set(0, JsValue::from(source.pdf_url()));
        result.set(
            1,
            source
                .source_archive_url()
                .map_or(JsValue::UNDEFINED, JsValue::from),
        );
        result.into()
    }

    /// Report the HTTP status of a fetch; non-2xx statuses become an error.
    #[wasm_bindgen]
    pub fn check_fetch_status(&self, status: u16) -> Result<(), JsValue> {
        figcrop::check_fetch_status(status).map_err(to_js)
    }

    /// Unpack a source archive and keep its figures. Returns the number of
    /// figures found.
    #[wasm_bindgen]
    pub fn load_source_archive(&mut self, data: &[u8]) -> Result<usize, JsValue> {
        self.figures.clear();

        let entries = unpack_source_archive(data).map_err(|e| {
            log::warn!("{e}");
            to_js(e.into())
        })?;
        self.figures = figure_entries(entries);

        Ok(self.figures.len())
    }

    #[wasm_bindgen]
    pub fn figure_names(&self) -> Vec<String> {
        self.figures.iter().map(|f| f.name.clone()).collect()
    }

    #[wasm_bindgen]
    pub fn figure_bytes(&self, index: usize) -> Option<Vec<u8>> {
        self.figures.get(index).map(|f| f.data.clone())
    }

    #[wasm_bindgen]
    pub fn figure_mime(&self, index: usize) -> Option<String> {
        self.figures
            .get(index)
            .and_then(ArchiveEntry::figure_kind)
            .map(|k| k.mime_type().to_string())
    }
}
