//! Bit-plane rasterization primitives.
//!
//! Every primitive clips analytically against a [`ClipRect`](crate::ClipRect) before touching a
//! plane; the plane writes themselves are unchecked beyond slice indexing.

pub(crate) mod circle;
pub(crate) mod clip;
pub(crate) mod line;
pub(crate) mod plane;
pub(crate) mod polygon;
pub(crate) mod text;

pub use circle::{CircleNature, draw_arc, draw_circle};
pub use clip::{ScreenPoint, clip_box, clip_line, clip_poly};
pub use line::{LineTexture, draw_box, draw_cross, draw_line};
pub use plane::{PatternedRaster, Raster, RasterPlane, SolidRaster};
pub use polygon::draw_polygon;
pub use text::{
    ApproxMetrics, CrossMark, DeferredText, GreekLine, RenderText, ScreenRect, TextMetrics,
    TextRequest, TextSpool, text_corner,
};
