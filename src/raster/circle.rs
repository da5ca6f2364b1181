use crate::foundation::core::ClipRect;
use crate::raster::clip::ScreenPoint;
use crate::raster::line::thick_point;
use crate::raster::plane::Raster;

/// How a circle primitive is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CircleNature {
    /// One-pixel outline.
    Outline,
    /// Outline stamped with a plus-shaped brush.
    Thick,
    /// Filled disc.
    Disc,
}

/// Radii above this are drawn row by row inside the clip instead of walking the whole circle.
const WALK_LIMIT: i64 = 1 << 14;

fn radius(center: ScreenPoint, edge: ScreenPoint) -> i64 {
    let dx = f64::from(edge.x) - f64::from(center.x);
    let dy = f64::from(edge.y) - f64::from(center.y);
    dx.hypot(dy) as i64
}

/// Return `true` when the square around the circle misses the clip.
fn culled(center: ScreenPoint, r: i64, clip: ClipRect) -> bool {
    let (cx, cy) = (i64::from(center.x), i64::from(center.y));
    cx + r < i64::from(clip.lx)
        || cx - r > i64::from(clip.hx)
        || cy + r < i64::from(clip.ly)
        || cy - r > i64::from(clip.hy)
}

/// Half chord of a circle of radius `r` at distance `d` from its center, if it reaches.
fn half_chord(r: i64, d: i64) -> Option<i64> {
    let (r, d) = (r as f64, d as f64);
    (d.abs() <= r).then(|| (r * r - d * d).sqrt().round() as i64)
}

/// Visit the outline of a large circle restricted to the clip: two crossings per clip row and
/// two per clip column, so the visible part stays connected.
fn large_outline(center: ScreenPoint, r: i64, clip: ClipRect, mut plot: impl FnMut(i32, i32)) {
    let (cx, cy) = (i64::from(center.x), i64::from(center.y));
    let mut put = |x: i64, y: i64| {
        if x >= i64::from(clip.lx)
            && x <= i64::from(clip.hx)
            && y >= i64::from(clip.ly)
            && y <= i64::from(clip.hy)
        {
            plot(x as i32, y as i32);
        }
    };
    for y in clip.ly..=clip.hy {
        if let Some(h) = half_chord(r, i64::from(y) - cy) {
            put(cx - h, i64::from(y));
            put(cx + h, i64::from(y));
        }
    }
    for x in clip.lx..=clip.hx {
        if let Some(h) = half_chord(r, i64::from(x) - cx) {
            put(i64::from(x), cy - h);
            put(i64::from(x), cy + h);
        }
    }
}

fn large_disc(raster: &mut dyn Raster, center: ScreenPoint, r: i64, clip: ClipRect) {
    if raster.outline().is_some() {
        large_outline(center, r, clip, |x, y| raster.draw_point(x, y));
    }
    let cx = i64::from(center.x);
    for y in clip.ly..=clip.hy {
        let Some(h) = half_chord(r, i64::from(y) - i64::from(center.y)) else {
            continue;
        };
        let sx = (cx - h).max(i64::from(clip.lx));
        let ex = (cx + h).min(i64::from(clip.hx));
        if sx <= ex {
            raster.fill_hline(y, sx as i32, ex as i32);
        }
    }
}

/// Midpoint circle walk over the first octant; `plot` receives `(x, y)` with `x <= y`.
fn midpoint(radius: i32, mut plot: impl FnMut(i32, i32)) {
    let mut x = 0;
    let mut y = radius;
    let mut d = 3 - 2 * radius;
    while x <= y {
        plot(x, y);
        if d < 0 {
            d += 4 * x + 6;
        } else {
            d += 4 * (x - y) + 10;
            y -= 1;
        }
        x += 1;
    }
}

fn circle_points(
    raster: &mut dyn Raster,
    center: ScreenPoint,
    r: i32,
    clip: ClipRect,
    thick: bool,
) {
    midpoint(r, |x, y| {
        for (px, py) in [
            (center.x + x, center.y + y),
            (center.x - x, center.y + y),
            (center.x + x, center.y - y),
            (center.x - x, center.y - y),
            (center.x + y, center.y + x),
            (center.x - y, center.y + x),
            (center.x + y, center.y - x),
            (center.x - y, center.y - x),
        ] {
            if !clip.contains(px, py) {
                continue;
            }
            if thick {
                thick_point(raster, px, py, clip);
            } else {
                raster.draw_point(px, py);
            }
        }
    });
}

fn disc(raster: &mut dyn Raster, center: ScreenPoint, r: i32, clip: ClipRect) {
    if raster.outline().is_some() {
        circle_points(raster, center, r, clip, false);
    }
    if r == 1 {
        let lx = (center.x - 1).max(clip.lx);
        let hx = (center.x + 1).min(clip.hx);
        for y in center.y - 1..=center.y + 1 {
            if y < clip.ly || y > clip.hy {
                continue;
            }
            for x in lx..=hx {
                raster.draw_point(x, y);
            }
        }
        return;
    }
    let mut row = |y: i32, sx: i32, ex: i32| {
        if y < clip.ly || y > clip.hy {
            return;
        }
        let sx = sx.max(clip.lx);
        let ex = ex.min(clip.hx);
        if sx <= ex {
            raster.fill_hline(y, sx, ex);
        }
    };
    midpoint(r, |x, y| {
        row(center.y + y, center.x - x, center.x + x);
        row(center.y - y, center.x - x, center.x + x);
        row(center.y + x, center.x - y, center.x + y);
        row(center.y - x, center.x - y, center.x + y);
    });
}

/// Draw a circle through `edge` around `center`.
pub fn draw_circle(
    raster: &mut dyn Raster,
    center: ScreenPoint,
    edge: ScreenPoint,
    nature: CircleNature,
    clip: ClipRect,
) {
    let r = radius(center, edge);
    if culled(center, r, clip) {
        return;
    }
    if r > WALK_LIMIT {
        match nature {
            CircleNature::Outline => large_outline(center, r, clip, |x, y| raster.draw_point(x, y)),
            CircleNature::Thick => {
                large_outline(center, r, clip, |x, y| thick_point(&mut *raster, x, y, clip));
            }
            CircleNature::Disc => large_disc(raster, center, r, clip),
        }
        return;
    }
    // the circle touches the clip, so its center is within WALK_LIMIT of it
    let r = r as i32;
    match nature {
        CircleNature::Outline => circle_points(raster, center, r, clip, false),
        CircleNature::Thick => circle_points(raster, center, r, clip, true),
        CircleNature::Disc => disc(raster, center, r, clip),
    }
}

/// Clockwise screen angle of `p` around `c`, in `[0, 2pi)`.
fn screen_angle(c: ScreenPoint, x: i64, y: i64) -> f64 {
    let a = (y as f64 - f64::from(c.y)).atan2(x as f64 - f64::from(c.x));
    a.rem_euclid(std::f64::consts::TAU)
}

fn large_arc(
    raster: &mut dyn Raster,
    center: ScreenPoint,
    p1: ScreenPoint,
    p2: ScreenPoint,
    r: i64,
    thick: bool,
    clip: ClipRect,
) {
    let start = screen_angle(center, i64::from(p1.x), i64::from(p1.y));
    let sweep = (screen_angle(center, i64::from(p2.x), i64::from(p2.y)) - start)
        .rem_euclid(std::f64::consts::TAU);
    large_outline(center, r, clip, |x, y| {
        let a = (screen_angle(center, i64::from(x), i64::from(y)) - start)
            .rem_euclid(std::f64::consts::TAU);
        if a > sweep {
            return;
        }
        if thick {
            thick_point(&mut *raster, x, y, clip);
        } else {
            raster.draw_point(x, y);
        }
    });
}

/// Octant-restricted arc plotter. Octants are numbered 1..=8 clockwise on screen.
struct ArcPen<'a> {
    raster: &'a mut dyn Raster,
    center: ScreenPoint,
    radius: i32,
    octants: [bool; 9],
    thick: bool,
    clip: ClipRect,
}

fn find_octant(x: i32, y: i32) -> usize {
    if x > 0 {
        if y >= 0 {
            return if y >= x { 7 } else { 8 };
        }
        return if x >= -y { 1 } else { 2 };
    }
    if y > 0 {
        return if y > -x { 6 } else { 5 };
    }
    if y > x { 4 } else { 3 }
}

/// Map a point into the first-octant frame of `oct`.
fn into_octant(x: i32, y: i32, oct: usize) -> (i32, i32) {
    match oct {
        1 => (-y, x),
        2 => (x, -y),
        3 => (-x, -y),
        4 => (-y, -x),
        5 => (y, -x),
        6 => (-x, y),
        7 => (x, y),
        _ => (y, x),
    }
}

fn next_oct(o: usize) -> usize {
    if o > 8 { o - 8 } else { o }
}

fn prev_oct(o: usize) -> usize {
    if o < 1 { o + 8 } else { o }
}

impl ArcPen<'_> {
    fn pixel(&mut self, x: i32, y: i32) {
        if !self.clip.contains(x, y) {
            return;
        }
        if self.thick {
            thick_point(&mut *self.raster, x, y, self.clip);
        } else {
            self.raster.draw_point(x, y);
        }
    }

    fn emit(&mut self, x: i32, y: i32) {
        let c = self.center;
        let targets = [
            (y + c.x, -x + c.y),
            (x + c.x, -y + c.y),
            (-x + c.x, -y + c.y),
            (-y + c.x, -x + c.y),
            (-y + c.x, x + c.y),
            (-x + c.x, y + c.y),
            (x + c.x, y + c.y),
            (y + c.x, x + c.y),
        ];
        for (i, (px, py)) in targets.into_iter().enumerate() {
            if self.octants[i + 1] {
                self.pixel(px, py);
            }
        }
    }

    fn bres_cw(&mut self, (mut x, mut y): (i32, i32), (ex, ey): (i32, i32)) {
        let mut d = 3 - 2 * y + 4 * x;
        while x < ex && y > ey {
            self.emit(x, y);
            if d < 0 {
                d += 4 * x + 6;
            } else {
                d += 4 * (x - y) + 10;
                y -= 1;
            }
            x += 1;
        }
        while x < ex {
            self.emit(x, y);
            x += 1;
        }
        while y > ey {
            self.emit(x, y);
            y -= 1;
        }
        self.emit(ex, ey);
    }

    fn bres_mid_cw(&mut self, (mut x, mut y): (i32, i32)) {
        let mut d = 3 - 2 * y + 4 * x;
        while x < y {
            self.emit(x, y);
            if d < 0 {
                d += 4 * x + 6;
            } else {
                d += 4 * (x - y) + 10;
                y -= 1;
            }
            x += 1;
        }
        if x == y {
            self.emit(x, y);
        }
    }

    fn bres_mid_ccw(&mut self, (mut x, mut y): (i32, i32)) {
        let mut d = 3 + 2 * y - 4 * x;
        while x > 0 {
            self.emit(x, y);
            if d > 0 {
                d += 6 - 4 * x;
            } else {
                d += 4 * (y - x) + 10;
                y += 1;
            }
            x -= 1;
        }
        self.emit(0, self.radius);
    }

    fn bres_ccw(&mut self, (mut x, mut y): (i32, i32), (ex, ey): (i32, i32)) {
        let mut d = 3 + 2 * y + 4 * x;
        while x > ex && y < ey {
            self.emit(x, y);
            if d > 0 {
                d += 6 - 4 * x;
            } else {
                d += 4 * (y - x) + 10;
                y += 1;
            }
            x -= 1;
        }
        while x > ex {
            self.emit(x, y);
            x -= 1;
        }
        while y < ey {
            self.emit(x, y);
            y += 1;
        }
        self.emit(ex, ey);
    }

    fn only(&mut self, oct: usize) {
        self.octants = [false; 9];
        self.octants[oct] = true;
    }
}

/// Draw the arc around `center` running clockwise on screen from `p1` to `p2`.
///
/// The radius comes from `p2`; when `p1` lies at a different distance it is slid onto the
/// circle along its octant's major axis.
pub fn draw_arc(
    raster: &mut dyn Raster,
    center: ScreenPoint,
    p1: ScreenPoint,
    p2: ScreenPoint,
    thick: bool,
    clip: ClipRect,
) {
    if p1 == p2 {
        return;
    }
    let r = radius(center, p2);
    if culled(center, r, clip) {
        return;
    }
    if r > WALK_LIMIT {
        large_arc(raster, center, p1, p2, r, thick, clip);
        return;
    }
    let alternate = radius(center, p1);
    let (pa_x, pa_y) = (p2.x - center.x, p2.y - center.y);
    let (mut pb_x, mut pb_y) = (
        i64::from(p1.x) - i64::from(center.x),
        i64::from(p1.y) - i64::from(center.y),
    );
    if alternate > 2 * WALK_LIMIT {
        // far off the circle: keep only the direction
        pb_x = pb_x * r / alternate;
        pb_y = pb_y * r / alternate;
    }
    let (mut pb_x, mut pb_y) = (pb_x as i32, pb_y as i32);
    let r = r as i32;
    let alternate = radius(center, ScreenPoint::new(center.x + pb_x, center.y + pb_y)) as i32;
    let start = find_octant(pa_x, pa_y);
    let end = find_octant(pb_x, pb_y);

    if r != alternate {
        let diff = r - alternate;
        match end {
            6 | 7 => pb_y += diff,
            8 | 1 => pb_x += diff,
            2 | 3 => pb_y -= diff,
            _ => pb_x -= diff,
        }
    }

    let mut pen = ArcPen {
        raster,
        center,
        radius: r,
        octants: [false; 9],
        thick,
        clip,
    };

    if start == end {
        pen.only(start);
        let pa = into_octant(pa_x, pa_y, start);
        let pb = into_octant(pb_x, pb_y, start);
        if start & 1 != 0 {
            pen.bres_cw(pa, pb);
        } else {
            pen.bres_ccw(pa, pb);
        }
        return;
    }

    pen.only(start);
    let pt = into_octant(pa_x, pa_y, start);
    if start & 1 != 0 {
        pen.bres_mid_cw(pt);
    } else {
        pen.bres_mid_ccw(pt);
    }

    pen.only(end);
    let pt = into_octant(pb_x, pb_y, end);
    if end & 1 != 0 {
        pen.bres_mid_ccw(pt);
    } else {
        pen.bres_mid_cw(pt);
    }

    let first_mid = next_oct(start + 1);
    if first_mid != end {
        pen.octants = [false; 9];
        if first_mid == prev_oct(end - 1) {
            pen.octants[first_mid] = true;
        } else {
            let mut i = first_mid;
            while i != end {
                pen.octants[i] = true;
                i = next_oct(i + 1);
            }
        }
        pen.bres_mid_cw((0, r));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/circle.rs"]
mod tests;
