/*!
Cropping figures out of PDF pages.

A page is rendered to a raster, the user draws a rectangle over it, and the
rectangle is written back as the `/CropBox` of a new single-page document.
Nothing on the page is rasterized in the output: the exported page keeps all
of its original vector content and only its visible area changes.

The pieces can be used on their own, but [`CropSession`] ties them together
the way an interactive front end needs them: document and page navigation,
rendering with a guard against overlapping renders, the pointer-driven
selection editor, auto-tightening and export.

It also knows how to resolve arXiv identifiers to download URLs and how to
pick figure files out of an arXiv source archive.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod archive;
mod coord;
mod error;
mod export;
mod interaction;
mod paint;
mod raster;
mod rect;
mod render;
mod session;
mod settings;
mod source;
mod tighten;
mod toolbar;

pub use archive::*;
pub use coord::*;
pub use error::*;
pub use export::*;
pub use interaction::*;
pub use paint::*;
pub use raster::*;
pub use rect::*;
pub use render::*;
pub use session::*;
pub use settings::*;
pub use source::*;
pub use tighten::*;
pub use toolbar::*;

pub use hayro_syntax;
pub use kurbo;
