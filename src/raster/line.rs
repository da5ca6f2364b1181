use crate::design::tech::OutlineStyle;
use crate::foundation::core::ClipRect;
use crate::raster::clip::{ScreenPoint, clip_box, clip_line};
use crate::raster::plane::Raster;

/// Stroke style of a line primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineTexture {
    /// Every pixel.
    #[default]
    Solid,
    /// Short dots (`0x88`, period 8).
    Dotted,
    /// Long dashes (`0xE7`, period 8).
    Dashed,
    /// Plus-shaped stamp at every pixel.
    Thick,
}

/// Walk a Bresenham segment, calling `plot` for every pixel in order of increasing major axis.
pub(crate) fn bresenham(x1: i32, y1: i32, x2: i32, y2: i32, mut plot: impl FnMut(i32, i32)) {
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    if dx > dy {
        let incr1 = 2 * dy;
        let incr2 = 2 * (dy - dx);
        let mut d = incr2;
        let (mut x, mut y, xend, yend) = if x1 > x2 {
            (x2, y2, x1, y1)
        } else {
            (x1, y1, x2, y2)
        };
        let yincr = if yend < y { -1 } else { 1 };
        plot(x, y);
        while x < xend {
            x += 1;
            if d < 0 {
                d += incr1;
            } else {
                y += yincr;
                d += incr2;
            }
            plot(x, y);
        }
    } else {
        let incr1 = 2 * dx;
        let incr2 = 2 * (dx - dy);
        let mut d = incr2;
        let (mut x, mut y, xend, yend) = if y1 > y2 {
            (x2, y2, x1, y1)
        } else {
            (x1, y1, x2, y2)
        };
        let xincr = if xend < x { -1 } else { 1 };
        plot(x, y);
        while y < yend {
            y += 1;
            if d < 0 {
                d += incr1;
            } else {
                x += xincr;
                d += incr2;
            }
            plot(x, y);
        }
    }
}

/// Dashed Bresenham: the first pixel is always set, later ones only when their dash bit is.
fn pattern_line(
    raster: &mut dyn Raster,
    a: ScreenPoint,
    b: ScreenPoint,
    pattern: u32,
    len: u8,
) {
    let len = u32::from(len.clamp(1, 32));
    let mut i = 0u32;
    let mut first = true;
    bresenham(a.x, a.y, b.x, b.y, |x, y| {
        if first {
            first = false;
            raster.draw_point(x, y);
            return;
        }
        i += 1;
        if i == len {
            i = 0;
        }
        if pattern & (1 << i) != 0 {
            raster.draw_point(x, y);
        }
    });
}

/// Center pixel plus its four neighbors, neighbors clipped.
pub(crate) fn thick_point(raster: &mut dyn Raster, x: i32, y: i32, clip: ClipRect) {
    raster.draw_point(x, y);
    if x > clip.lx {
        raster.draw_point(x - 1, y);
    }
    if x < clip.hx {
        raster.draw_point(x + 1, y);
    }
    if y > clip.ly {
        raster.draw_point(x, y - 1);
    }
    if y < clip.hy {
        raster.draw_point(x, y + 1);
    }
}

/// Clip and draw a line segment.
pub fn draw_line(
    raster: &mut dyn Raster,
    mut a: ScreenPoint,
    mut b: ScreenPoint,
    texture: LineTexture,
    clip: ClipRect,
) {
    if !clip_line(&mut a, &mut b, clip) {
        return;
    }
    match texture {
        LineTexture::Solid => bresenham(a.x, a.y, b.x, b.y, |x, y| raster.draw_point(x, y)),
        LineTexture::Dotted => pattern_line(raster, a, b, 0x88, 8),
        LineTexture::Dashed => pattern_line(raster, a, b, 0xE7, 8),
        LineTexture::Thick => bresenham(a.x, a.y, b.x, b.y, |x, y| thick_point(raster, x, y, clip)),
    }
}

/// Clip and draw one outline edge with a dash pattern.
pub(crate) fn draw_outline_edge(
    raster: &mut dyn Raster,
    mut a: ScreenPoint,
    mut b: ScreenPoint,
    outline: OutlineStyle,
    clip: ClipRect,
) {
    if !clip_line(&mut a, &mut b, clip) {
        return;
    }
    pattern_line(raster, a, b, outline.pattern, outline.len);
}

/// Plus-shaped marker with arms of `size` pixels.
pub fn draw_cross(raster: &mut dyn Raster, cx: i32, cy: i32, size: i32, clip: ClipRect) {
    if clip.ly <= cy && cy <= clip.hy {
        let lx = clip.lx.max(cx.saturating_sub(size));
        let hx = clip.hx.min(cx.saturating_add(size));
        if lx <= hx {
            raster.draw_hline(cy, lx, hx);
        }
    }
    if clip.lx <= cx && cx <= clip.hx {
        let ly = clip.ly.max(cy.saturating_sub(size));
        let hy = clip.hy.min(cy.saturating_add(size));
        if ly <= hy {
            raster.draw_vline(cx, ly, hy);
        }
    }
}

fn dashed_hline(raster: &mut dyn Raster, y: i32, lx: i32, hx: i32, o: OutlineStyle) {
    let len = u32::from(o.len.clamp(1, 32));
    let mut i = 0;
    for x in lx..=hx {
        if o.pattern & (1 << i) != 0 {
            raster.draw_point(x, y);
        }
        i += 1;
        if i == len {
            i = 0;
        }
    }
}

fn dashed_vline(raster: &mut dyn Raster, x: i32, ly: i32, hy: i32, o: OutlineStyle) {
    let len = u32::from(o.len.clamp(1, 32));
    let mut i = 0;
    for y in ly..=hy {
        if o.pattern & (1 << i) != 0 {
            raster.draw_point(x, y);
        }
        i += 1;
        if i == len {
            i = 0;
        }
    }
}

/// Fill an inclusive box, clipped, and stroke the raster's outline around it.
///
/// One-pixel-high or one-pixel-wide boxes degrade to lines; when the raster has an outline they
/// are drawn unpatterned so thin features stay visible.
pub fn draw_box(raster: &mut dyn Raster, lx: i32, hx: i32, ly: i32, hy: i32, clip: ClipRect) {
    let Some((lx, hx, ly, hy)) = clip_box(lx, hx, ly, hy, clip) else {
        return;
    };
    let outline = raster.outline();
    if ly == hy {
        match (lx == hx, outline.is_some()) {
            (true, false) => raster.fill_point(lx, ly),
            (true, true) => raster.draw_point(lx, ly),
            (false, false) => raster.fill_hline(ly, lx, hx),
            (false, true) => raster.draw_hline(ly, lx, hx),
        }
        return;
    }
    if lx == hx {
        if outline.is_some() {
            raster.draw_vline(lx, ly, hy);
        } else {
            raster.fill_vline(lx, ly, hy);
        }
        return;
    }

    raster.fill_box(lx, hx, ly, hy);
    let Some(o) = outline else {
        return;
    };
    let solid = o.is_solid();
    let edges = |raster: &mut dyn Raster,
                 left: Option<i32>,
                 top: Option<i32>,
                 right: Option<i32>,
                 bottom: Option<i32>| {
        if let Some(x) = left {
            if solid {
                raster.draw_vline(x, ly, hy);
            } else {
                dashed_vline(raster, x, ly, hy, o);
            }
        }
        if let Some(y) = top {
            if solid {
                raster.draw_hline(y, lx, hx);
            } else {
                dashed_hline(raster, y, lx, hx, o);
            }
        }
        if let Some(x) = right {
            if solid {
                raster.draw_vline(x, ly, hy);
            } else {
                dashed_vline(raster, x, ly, hy, o);
            }
        }
        if let Some(y) = bottom {
            if solid {
                raster.draw_hline(y, lx, hx);
            } else {
                dashed_hline(raster, y, lx, hx, o);
            }
        }
    };
    edges(&mut *raster, Some(lx), Some(hy), Some(hx), Some(ly));
    for i in 1..i32::from(o.thickness) {
        edges(
            &mut *raster,
            (lx + i <= clip.hx).then_some(lx + i),
            (hy - i >= clip.ly).then_some(hy - i),
            (hx - i >= clip.lx).then_some(hx - i),
            (ly + i <= clip.hy).then_some(ly + i),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/line.rs"]
mod tests;
