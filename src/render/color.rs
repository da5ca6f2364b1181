use crate::foundation::core::Rgb8;

/// Hue, saturation and value, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hsv {
    pub(crate) h: f64,
    pub(crate) s: f64,
    pub(crate) v: f64,
}

pub(crate) fn to_hsv(c: Rgb8) -> Hsv {
    let r = f64::from(c.r) / 255.0;
    let g = f64::from(c.g) / 255.0;
    let b = f64::from(c.b) / 255.0;
    let v = r.max(g).max(b);
    let x = r.min(g).min(b);
    let s = if v == 0.0 { 0.0 } else { (v - x) / v };
    if s == 0.0 {
        return Hsv { h: 0.0, s, v };
    }
    let rd = (v - r) / (v - x);
    let gd = (v - g) / (v - x);
    let bd = (v - b) / (v - x);
    // sextant of the hue circle, picked by which channels sit at the extremes
    let h = if b == x && r == v {
        (1.0 - gd) / 6.0
    } else if b == x && g == v {
        (1.0 + rd) / 6.0
    } else if r == x && g == v {
        (3.0 - bd) / 6.0
    } else if r == x && b == v {
        (3.0 + gd) / 6.0
    } else if g == x && b == v {
        (5.0 - rd) / 6.0
    } else {
        (5.0 + bd) / 6.0
    };
    Hsv { h, s, v }
}

pub(crate) fn from_hsv(c: Hsv) -> Rgb8 {
    let h = c.h.clamp(0.0, 1.0) * 6.0;
    let (s, v) = (c.s.clamp(0.0, 1.0), c.v.clamp(0.0, 1.0));
    let i = h as i32;
    let f = h - f64::from(i);
    let m = v * (1.0 - s);
    let n = v * (1.0 - s * f);
    let k = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i {
        0 => (v, k, m),
        1 => (n, v, m),
        2 => (m, v, k),
        3 => (m, n, v),
        4 => (k, m, v),
        5 => (v, m, n),
        _ => (v, k, m),
    };
    let q = |x: f64| (x * 255.0 + 0.5) as u8;
    Rgb8::new(q(r), q(g), q(b))
}

/// Wash a color out for a layer that is not highlighted.
pub(crate) fn dim(c: Rgb8) -> Rgb8 {
    let mut hsv = to_hsv(c);
    hsv.s *= 0.2;
    from_hsv(hsv)
}

/// Strengthen a highlighted layer's color.
pub(crate) fn brighten(c: Rgb8) -> Rgb8 {
    let mut hsv = to_hsv(c);
    hsv.s = (hsv.s * 1.5).min(1.0);
    from_hsv(hsv)
}
