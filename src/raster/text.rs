use crate::design::text::TextAnchor;
use crate::foundation::core::Rgb8;

/// Screen rectangle of the shape that owns a piece of text (Y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenRect {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl ScreenRect {
    /// Construct from a corner and a size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let span = |a: i32, b: i32| i32::try_from(a.abs_diff(b)).unwrap_or(i32::MAX);
        Self::new(x1.min(x2), y1.min(y2), span(x1, x2), span(y1, y2))
    }

    /// Center, truncated toward zero.
    pub fn center(self) -> (i32, i32) {
        (
            (f64::from(self.x) + f64::from(self.width) / 2.0) as i32,
            (f64::from(self.y) + f64::from(self.height) / 2.0) as i32,
        )
    }
}

/// Measures text for layout. The renderer never draws glyphs itself.
pub trait TextMetrics: Send + Sync {
    /// Width and height in pixels of `text` at `size` pixels.
    fn measure(&self, text: &str, size: i32, italic: bool, bold: bool) -> (i32, i32);
}

/// Fixed-advance approximation used when no font backend is attached.
#[derive(Clone, Copy, Debug)]
pub struct ApproxMetrics {
    /// Glyph advance as a fraction of the point size.
    pub advance: f64,
    /// Line height as a fraction of the point size.
    pub line_height: f64,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMetrics for ApproxMetrics {
    fn measure(&self, text: &str, size: i32, _italic: bool, bold: bool) -> (i32, i32) {
        let chars = text.chars().count() as f64;
        let mut advance = self.advance * f64::from(size);
        if bold {
            advance *= 1.1;
        }
        let width = (chars * advance) as i32;
        let height = (self.line_height * f64::from(size) + 0.5) as i32;
        (width, height)
    }
}

/// Text ready for the paint sink.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderText {
    /// The string.
    pub text: String,
    /// Rotation origin (center of the owning rectangle).
    pub origin: (i32, i32),
    /// Offset of the unrotated top-left corner from `origin`.
    pub offset: (i32, i32),
    /// Unrotated width.
    pub width: i32,
    /// Unrotated height, including the underline row.
    pub height: i32,
    /// Rotated, anchored screen bounds `(x, y, w, h)`.
    pub bounds: (i32, i32, i32, i32),
    /// Point size after clamping and box fitting.
    pub size: i32,
    /// Quarter turns counter-clockwise.
    pub rotation: u8,
    /// Italic flag.
    pub italic: bool,
    /// Bold flag.
    pub bold: bool,
    /// Underline flag.
    pub underline: bool,
    /// Font face index.
    pub face: u8,
    /// Text color.
    pub color: Rgb8,
}

/// Placeholder line for text too small to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GreekLine {
    /// Left column.
    pub lx: i32,
    /// Right column.
    pub hx: i32,
    /// Row.
    pub y: i32,
    /// Line color.
    pub color: Rgb8,
}

/// Small plus marker (export or port location).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrossMark {
    /// Center column.
    pub x: i32,
    /// Center row.
    pub y: i32,
    /// Marker color.
    pub color: Rgb8,
}

/// One deferred text-layer item.
#[derive(Clone, Debug, PartialEq)]
pub enum DeferredText {
    /// Full-quality text.
    Text(RenderText),
    /// Greeked text.
    Greek(GreekLine),
    /// Cross marker.
    Cross(CrossMark),
}

/// A text request from the drawing walk.
#[derive(Clone, Copy, Debug)]
pub struct TextRequest<'a> {
    /// The string.
    pub text: &'a str,
    /// Screen rectangle of the owning shape.
    pub rect: ScreenRect,
    /// Anchor; [`TextAnchor::Boxed`] shrinks text to fit `rect`.
    pub anchor: TextAnchor,
    /// Quarter turns counter-clockwise.
    pub rotation: u8,
    /// Pixel size before clamping.
    pub true_size: f64,
    /// Italic flag.
    pub italic: bool,
    /// Bold flag.
    pub bold: bool,
    /// Underline flag.
    pub underline: bool,
    /// Font face index.
    pub face: u8,
    /// Text color.
    pub color: Rgb8,
}

/// Screen offset of the top-left corner of a `width x height` text block anchored in `rect`.
pub fn text_corner(width: i32, height: i32, anchor: TextAnchor, rect: ScreenRect, rotation: u8) -> (i32, i32) {
    let (ox, oy) = anchor.corner_offset(width, height);
    let (ox, oy) = match rotation % 4 {
        1 => (oy, -ox),
        2 => (-ox, -oy),
        3 => (-oy, ox),
        _ => (ox, oy),
    };
    let (cx, cy) = rect.center();
    (cx.saturating_add(ox), cy.saturating_add(oy))
}

/// Deferred text list built during a render pass and drawn once, last, by the paint sink.
#[derive(Clone, Debug, Default)]
pub struct TextSpool {
    width: i32,
    height: i32,
    min_size: i32,
    max_size: i32,
    items: Vec<DeferredText>,
}

impl TextSpool {
    /// Spool for a `width x height` surface with the given greeking threshold and size clamp.
    pub fn new(width: i32, height: i32, min_size: i32, max_size: i32) -> Self {
        Self {
            width,
            height,
            min_size: min_size.max(1),
            max_size: max_size.max(1),
            items: Vec::new(),
        }
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[DeferredText] {
        &self.items
    }

    /// Consume into the item list.
    pub fn into_items(self) -> Vec<DeferredText> {
        self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return `true` when nothing was spooled.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queue a cross marker.
    pub fn push_cross(&mut self, x: i32, y: i32, color: Rgb8) {
        self.items.push(DeferredText::Cross(CrossMark { x, y, color }));
    }

    /// Lay out one string and queue it as text, a greek line, or nothing.
    ///
    /// Text whose clamped size falls under the threshold is scaled up by powers of two for
    /// measurement and replaced by a line; text under one pixel is dropped.
    pub fn push_text(&mut self, req: TextRequest<'_>, metrics: &dyn TextMetrics) {
        if req.text.is_empty() || req.true_size.is_nan() || req.true_size < 1.0 {
            return;
        }
        let mut size = (req.true_size as i32).min(self.max_size);
        let mut greek = 0i32;
        if size < self.min_size {
            greek = 2;
            loop {
                size = (req.true_size * f64::from(greek)) as i32;
                if size >= self.min_size {
                    break;
                }
                greek *= 2;
            }
        }

        let rect = req.rect;
        if req.anchor == TextAnchor::Boxed
            && (rect.x >= self.width
                || rect.x.saturating_add(rect.width) < 0
                || rect.y >= self.height
                || rect.y.saturating_add(rect.height) < 0)
        {
            return;
        }

        let (mut width, mut height) = metrics.measure(req.text, size, req.italic, req.bold);
        if width <= 0 || height <= 0 {
            return;
        }
        if rect.width > 1 && rect.height > 1 && (width > rect.width || height > rect.height) {
            let fit = (f64::from(rect.width) / f64::from(width))
                .min(f64::from(rect.height) / f64::from(height));
            size = (f64::from(size) * fit) as i32;
            (width, height) = metrics.measure(req.text, size, req.italic, req.bold);
            if width <= 0 || height <= 0 {
                return;
            }
        }
        if req.underline {
            height += 1;
        }
        let rotation = req.rotation % 4;
        let corner = text_corner(width, height, req.anchor, rect, rotation);
        let bounds = if rotation % 2 == 1 {
            (corner.0, corner.1, height, width)
        } else {
            (corner.0, corner.1, width, height)
        };

        if greek != 0 {
            let w = bounds.2 / greek;
            let indent = (size / greek + 1) / 4;
            let pt = text_corner(w, size / greek, req.anchor, rect, rotation);
            let lx = pt.0.max(0);
            let hx = pt.0.saturating_add(w).min(self.width - 1);
            let y = pt.1.saturating_add(indent);
            if lx > hx || y < 0 || y >= self.height {
                return;
            }
            self.items.push(DeferredText::Greek(GreekLine {
                lx,
                hx,
                y,
                color: req.color,
            }));
            return;
        }

        if bounds.0 >= self.width
            || bounds.0.saturating_add(bounds.2) < 0
            || bounds.1 >= self.height
            || bounds.1.saturating_add(bounds.3) < 0
        {
            return;
        }
        self.items.push(DeferredText::Text(RenderText {
            text: req.text.to_owned(),
            origin: rect.center(),
            offset: req.anchor.corner_offset(width, height),
            width,
            height,
            bounds,
            size,
            rotation,
            italic: req.italic,
            bold: req.bold,
            underline: req.underline,
            face: req.face,
            color: req.color,
        }));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/text.rs"]
mod tests;
