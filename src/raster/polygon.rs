use crate::foundation::core::ClipRect;
use crate::foundation::math::{FIX_ONE, FIX_SHIFT, fix_round};
use crate::raster::clip::{ScreenPoint, clip_poly};
use crate::raster::line::draw_outline_edge;
use crate::raster::plane::Raster;

#[derive(Clone, Copy, Debug)]
struct Edge {
    /// Current X in 16.16.
    fx: i64,
    fy: i64,
    ty: i64,
    direction: i8,
    increment: i64,
}

fn build_edges(points: &[ScreenPoint]) -> Vec<Edge> {
    let n = points.len();
    let mut edges = Vec::with_capacity(n);
    for i in 0..n {
        let from = points[if i == 0 { n - 1 } else { i - 1 }];
        let to = points[i];
        let j = i64::from(to.y) - i64::from(from.y);
        let dx = i64::from(to.x) - i64::from(from.x);
        let increment = if j == 0 || dx == 0 {
            0
        } else {
            (dx * FIX_ONE - j + 1) / j
        };
        // start at the upper end
        let top = if from.y > to.y { to } else { from };
        let fy = i64::from(from.y.min(to.y));
        let ty = i64::from(from.y.max(to.y));
        let fx = i64::from(top.x) << FIX_SHIFT;
        edges.push(Edge {
            fx,
            fy,
            ty,
            direction: j.signum() as i8,
            increment,
        });
    }
    // stable, so equal start rows keep polygon order
    edges.sort_by_key(|e| e.fy);
    edges
}

/// Scanline-fill a polygon already clipped to `[clip.lx, clip.hx + 1] x [clip.ly, clip.hy + 1]`.
///
/// Spans are half-open on the right and rows are half-open at the bottom, so an axis-aligned
/// `W x H` rectangle sets exactly `W * H` pixels. Filled regions follow even-odd parity; edges
/// with no vertical extent never toggle it.
fn scan_fill(raster: &mut dyn Raster, points: &[ScreenPoint], clip: ClipRect) {
    let edges = build_edges(points);
    let mut pending = edges.into_iter().peekable();
    let mut active: Vec<Edge> = Vec::new();
    let mut ycur = 0i64;

    while !active.is_empty() || pending.peek().is_some() {
        if active.is_empty() {
            if let Some(e) = pending.next() {
                ycur = e.fy;
                active.push(e);
            }
        }
        while let Some(e) = pending.next_if(|e| e.fy <= ycur) {
            active.push(e);
        }
        active.sort_by(|a, b| a.fx.cmp(&b.fx).then(a.increment.cmp(&b.increment)));

        if ycur >= i64::from(clip.ly) && ycur <= i64::from(clip.hy) {
            let y = ycur as i32;
            let mut left: Option<i64> = None;
            for e in active.iter().filter(|e| e.direction != 0) {
                match left.take() {
                    None => left = Some(e.fx),
                    Some(l) => {
                        let lx = fix_round(l).max(i64::from(clip.lx));
                        let hx = (fix_round(e.fx) - 1).min(i64::from(clip.hx));
                        if lx <= hx {
                            raster.fill_hline(y, lx as i32, hx as i32);
                        }
                    }
                }
            }
        }

        ycur += 1;
        active.retain_mut(|e| {
            if ycur >= e.ty {
                false
            } else {
                e.fx += e.increment;
                true
            }
        });
    }
}

/// Clip, fill and (when the raster carries one) outline a polygon.
pub fn draw_polygon(raster: &mut dyn Raster, points: &[ScreenPoint], clip: ClipRect) {
    let clipped = clip_poly(points, clip.lx, clip.hx + 1, clip.ly, clip.hy + 1);
    if clipped.len() < 3 {
        return;
    }
    scan_fill(raster, &clipped, clip);

    let Some(o) = raster.outline() else {
        return;
    };
    let n = clipped.len();
    for i in 0..n {
        let from = clipped[if i == 0 { n - 1 } else { i - 1 }];
        let to = clipped[i];
        draw_outline_edge(raster, from, to, o, clip);
        if o.thickness > 1 {
            let angle = f64::from(to.y - from.y).atan2(f64::from(to.x - from.x))
                + std::f64::consts::FRAC_PI_2;
            let (sin, cos) = angle.sin_cos();
            for t in 1..i32::from(o.thickness) {
                let dx = (cos * f64::from(t) + 0.5) as i32;
                let dy = (sin * f64::from(t) + 0.5) as i32;
                draw_outline_edge(
                    raster,
                    ScreenPoint::new(from.x + dx, from.y + dy),
                    ScreenPoint::new(to.x + dx, to.y + dy),
                    o,
                    clip,
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/polygon.rs"]
mod tests;
