/// 16.16 fixed-point shift used by the scanline polygon fill.
pub(crate) const FIX_SHIFT: u32 = 16;
pub(crate) const FIX_ONE: i64 = 1 << FIX_SHIFT;
const FIX_HALF: i64 = 1 << (FIX_SHIFT - 1);

/// Round a 16.16 value to the nearest integer (halves round up).
pub(crate) fn fix_round(v: i64) -> i64 {
    (v + FIX_HALF) >> FIX_SHIFT
}

/// Round half away from zero and saturate into `i32`.
pub(crate) fn round_i32(v: f64) -> i32 {
    let r = v.round();
    if r >= f64::from(i32::MAX) {
        i32::MAX
    } else if r <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        r as i32
    }
}

pub(crate) fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Expand a 16-bit stipple row into a 32-bit word mask.
///
/// Pattern bit 15 is the leftmost pixel; raster words keep pixel `x` in bit `x & 31`, so the
/// row is bit-reversed and repeated.
pub(crate) fn pattern_word(row: u16) -> u32 {
    let r = u32::from(row.reverse_bits());
    r | (r << 16)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
