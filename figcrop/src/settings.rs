//! Tunable parameters for selection editing, tightening and export.

/// Settings shared by the selection editor, the tightener and the exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSettings {
    /// Pixels per PDF point used when rendering a page.
    pub render_scale: f32,
    /// Half-width in pixels of the square around a corner that counts as a hit.
    pub corner_tolerance: f64,
    /// Minimum extent in pixels, per axis, of a selection that is kept
    /// after drawing and that may be tightened or exported.
    pub min_selection_size: f64,
    /// Channel value at or above which a color channel is considered
    /// near-white. A pixel is background if all of red, green and blue
    /// reach this value (or if it is fully transparent).
    pub brightness_threshold: u8,
    /// Margin in pixels added back around the content box after tightening.
    pub tighten_margin: f64,
    /// File name offered for the exported document.
    pub output_file_name: String,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            corner_tolerance: 12.0,
            min_selection_size: 20.0,
            brightness_threshold: 235,
            tighten_margin: 2.5,
            output_file_name: "crop-preserved.pdf".to_string(),
        }
    }
}
