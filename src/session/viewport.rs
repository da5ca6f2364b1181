use crate::design::context::VarContext;
use crate::foundation::core::{ClipRect, GridRect};
use crate::foundation::error::{RasterError, RasterResult};

/// What the rendering core needs to know about the window it draws for.
///
/// Kept narrow so headless callers can drive a pass without a window object.
pub trait ViewportInfo {
    /// Pixels per grid unit.
    fn scale(&self) -> f64;
    /// Global multiplier applied to every text size.
    fn text_scale(&self) -> f64;
    /// Font used when a descriptor names face 0.
    fn default_font(&self) -> &str;
    /// Parameter bindings of the cell being shown.
    fn context(&self) -> &VarContext;
}

/// A pixel surface looking at the design.
#[derive(Clone, Debug)]
pub struct Viewport {
    width: u32,
    height: u32,
    center: (f64, f64),
    scale: f64,
    text_scale: f64,
    default_font: String,
    context: VarContext,
}

impl Viewport {
    /// `width x height` pixels at `scale` pixels per grid unit, centered on the origin.
    pub fn new(width: u32, height: u32, scale: f64) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::validation("viewport must be at least 1x1"));
        }
        if width > i32::MAX as u32 / 2 || height > i32::MAX as u32 / 2 {
            return Err(RasterError::validation("viewport is too large"));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RasterError::validation("viewport scale must be finite and > 0"));
        }
        Ok(Self {
            width,
            height,
            center: (0.0, 0.0),
            scale,
            text_scale: 1.0,
            default_font: "SansSerif".to_owned(),
            context: VarContext::root(),
        })
    }

    /// Viewport that shows `bounds` whole, with a small margin.
    pub fn fit(bounds: GridRect, width: u32, height: u32) -> RasterResult<Self> {
        let w = bounds.width().max(1) as f64;
        let h = bounds.height().max(1) as f64;
        let scale = (f64::from(width) / w).min(f64::from(height) / h) * 0.9;
        let c = bounds.to_kurbo().center();
        Ok(Self::new(width, height, scale)?.with_center(c.x, c.y))
    }

    /// Center the view on a grid position.
    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = (x, y);
        self
    }

    /// Set the global text multiplier.
    pub fn with_text_scale(mut self, text_scale: f64) -> Self {
        self.text_scale = text_scale;
        self
    }

    /// Set the default font name.
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = font.into();
        self
    }

    /// Set the evaluation context of the shown cell.
    pub fn with_context(mut self, context: VarContext) -> Self {
        self.context = context;
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grid position at the middle of the surface.
    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    /// Whole-surface clip rectangle.
    pub fn clip(&self) -> RasterResult<ClipRect> {
        ClipRect::full(self.width, self.height)
    }
}

impl ViewportInfo for Viewport {
    fn scale(&self) -> f64 {
        self.scale
    }

    fn text_scale(&self) -> f64 {
        self.text_scale
    }

    fn default_font(&self) -> &str {
        &self.default_font
    }

    fn context(&self) -> &VarContext {
        &self.context
    }
}
