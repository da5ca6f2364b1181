use crate::foundation::core::ClipRect;

/// Integer screen point (Y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenPoint {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl ScreenPoint {
    /// Construct a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

fn out_code(p: ScreenPoint, lx: i32, hx: i32, ly: i32, hy: i32) -> u8 {
    let mut c = 0;
    if p.x < lx {
        c |= LEFT;
    } else if p.x > hx {
        c |= RIGHT;
    }
    if p.y < ly {
        c |= BOTTOM;
    } else if p.y > hy {
        c |= TOP;
    }
    c
}

/// `a + da * num / den` in 64-bit; `num / den` lies in `[0, 1]` so the result stays between the
/// segment ends.
fn lerp(a: i32, b: i32, num: i64, den: i64) -> i32 {
    let da = i64::from(b) - i64::from(a);
    let t = (i128::from(da) * i128::from(num) / i128::from(den)) as i64;
    (i64::from(a) + t) as i32
}

/// Difference of two screen coordinates without overflow.
fn wide(a: i32, b: i32) -> i64 {
    i64::from(a) - i64::from(b)
}

/// Clip the segment `from`-`to` against an inclusive rectangle, in place.
///
/// Returns `false` when nothing of the segment is visible.
pub fn clip_line(from: &mut ScreenPoint, to: &mut ScreenPoint, clip: ClipRect) -> bool {
    let (lx, hx, ly, hy) = (clip.lx, clip.hx, clip.ly, clip.hy);
    loop {
        let mut fc = out_code(*from, lx, hx, ly, hy);
        let tc = out_code(*to, lx, hx, ly, hy);
        if fc == 0 && tc == 0 {
            return true;
        }
        if fc == tc || fc & tc != 0 {
            return false;
        }
        if fc == 0 {
            std::mem::swap(from, to);
            fc = tc;
        }
        if fc & LEFT != 0 {
            if to.x == from.x {
                return false;
            }
            from.y = lerp(from.y, to.y, wide(lx, from.x), wide(to.x, from.x));
            from.x = lx;
        }
        if fc & RIGHT != 0 {
            if to.x == from.x {
                return false;
            }
            from.y = lerp(from.y, to.y, wide(hx, from.x), wide(to.x, from.x));
            from.x = hx;
        }
        if fc & BOTTOM != 0 {
            if to.y == from.y {
                return false;
            }
            from.x = lerp(from.x, to.x, wide(ly, from.y), wide(to.y, from.y));
            from.y = ly;
        }
        if fc & TOP != 0 {
            if to.y == from.y {
                return false;
            }
            from.x = lerp(from.x, to.x, wide(hy, from.y), wide(to.y, from.y));
            from.y = hy;
        }
    }
}

/// Clip a polygon against the rectangle `[lx, hx] x [ly, hy]` (Sutherland-Hodgman).
///
/// Consecutive duplicate points and wrap-around duplicates are removed from the result.
pub fn clip_poly(points: &[ScreenPoint], lx: i32, hx: i32, ly: i32, hy: i32) -> Vec<ScreenPoint> {
    let pre = points
        .iter()
        .fold(0u8, |acc, p| acc | out_code(*p, lx, hx, ly, hy));
    if pre == 0 {
        return points.to_vec();
    }

    let mut cur = points.to_vec();
    for (edge, value) in [(LEFT, lx), (RIGHT, hx), (TOP, hy), (BOTTOM, ly)] {
        if pre & edge != 0 {
            cur = clip_edge(&cur, edge, value);
        }
    }

    let mut out: Vec<ScreenPoint> = Vec::with_capacity(cur.len());
    for p in cur {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

fn clip_edge(input: &[ScreenPoint], edge: u8, value: i32) -> Vec<ScreenPoint> {
    let mut out: Vec<ScreenPoint> = Vec::with_capacity(input.len() * 2);
    let mut first = None;
    for i in 0..input.len() {
        let prev = if i == 0 { input.len() - 1 } else { i - 1 };
        let Some((a, b)) = clip_segment(input[prev], input[i], edge, value) else {
            continue;
        };
        match out.last() {
            Some(last) => {
                if *last != a {
                    out.push(a);
                }
            }
            None => first = Some(a),
        }
        out.push(b);
    }
    if let (Some(first), Some(&last)) = (first, out.last()) {
        if last != first {
            out.push(first);
        }
    }
    out
}

/// Clip one segment against a single edge; `None` when it lies entirely outside.
fn clip_segment(
    p1: ScreenPoint,
    p2: ScreenPoint,
    edge: u8,
    value: i32,
) -> Option<(ScreenPoint, ScreenPoint)> {
    let outside = |p: ScreenPoint| match edge {
        LEFT => p.x < value,
        RIGHT => p.x > value,
        BOTTOM => p.y < value,
        _ => p.y > value,
    };
    let (c1, c2) = (outside(p1), outside(p2));
    if c1 == c2 {
        return if c1 { None } else { Some((p1, p2)) };
    }
    // `a` is the outside end
    let (a, b, flip) = if c1 { (p1, p2, false) } else { (p2, p1, true) };
    let moved = if edge == LEFT || edge == RIGHT {
        ScreenPoint::new(value, lerp(a.y, b.y, wide(value, a.x), wide(b.x, a.x)))
    } else {
        ScreenPoint::new(lerp(a.x, b.x, wide(value, a.y), wide(b.y, a.y)), value)
    };
    if flip {
        Some((b, moved))
    } else {
        Some((moved, b))
    }
}

/// Intersect an inclusive box with the clip. `None` when nothing remains.
pub fn clip_box(lx: i32, hx: i32, ly: i32, hy: i32, clip: ClipRect) -> Option<(i32, i32, i32, i32)> {
    let lx = lx.max(clip.lx);
    let hx = hx.min(clip.hx);
    let ly = ly.max(clip.ly);
    let hy = hy.min(clip.hy);
    if lx > hx || ly > hy {
        None
    } else {
        Some((lx, hx, ly, hy))
    }
}
