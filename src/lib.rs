//! cellraster renders hierarchical circuit layouts into pixels.
//!
//! Rendering is built on two caches:
//!
//! - a [`GeometryCache`] holding each cell's own shapes per canonical orientation, with child
//!   instances kept as references rather than flattened
//! - a [`BitmapCache`] holding offscreen bit planes of small, repeated expanded instances
//!
//! A [`RenderSession`] owns both, walks the hierarchy into per-layer bit planes on a worker thread
//! and publishes a [`RenderSnapshot`]; painting composites the planes with ordered alpha blending
//! (or the legacy color map) and hands the pixels and deferred text to a [`PaintSink`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod bitmap;
pub(crate) mod design;
pub(crate) mod foundation;
pub(crate) mod geometry;
/// Bit-plane rasterization primitives.
pub mod raster;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::bitmap::cache::{BitmapCache, BitmapKey, OffscreenBitmap, OffscreenExtent, Resolution};
pub use crate::design::context::VarContext;
pub use crate::design::model::{
    ArcRecord, CellRecord, ExportRecord, NodeKind, NodeRecord, ParamDecl, PolyRecord, PolyStyle,
    PortRef, TextContent,
};
pub use crate::design::snapshot::{DesignSnapshot, MemoryDesign};
pub use crate::design::tech::{LayerFunction, LayerInfo, OutlineStyle, Technology};
pub use crate::design::text::{TextAnchor, TextDescriptor, TextSize};
pub use crate::foundation::core::{
    ArcId, CellId, ClipRect, ExportId, GridPoint, GridRect, LayerId, NodeId, Rgb8,
};
pub use crate::foundation::error::{RasterError, RasterResult};
pub use crate::foundation::orient::{Orient, Orientation};
pub use crate::geometry::cache::GeometryCache;
pub use crate::geometry::shape::{
    CellGeometry, PortSet, Shape, ShapeKind, SubcellRef, TextKind, TextShape,
};
pub use crate::raster::{
    ApproxMetrics, CrossMark, DeferredText, GreekLine, RasterPlane, RenderText, TextMetrics,
};
pub use crate::render::compositor::composite;
pub use crate::render::drawing::PassCounters;
pub use crate::render::surface::RenderedPlanes;
pub use crate::render::{FrameRGBA, PaintSink};
pub use crate::session::fingerprint::PlaneFingerprint;
pub use crate::session::opts::{
    CompositeMode, DisplayColors, GridOpts, LabelDisplay, LayerVisibility, RenderOpts,
    TextVisibility,
};
pub use crate::session::render_session::{RenderSession, RenderSnapshot, RenderStats};
pub use crate::session::viewport::{Viewport, ViewportInfo};
