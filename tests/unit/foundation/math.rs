use super::*;

#[test]
fn fix_round_rounds_halves_up() {
    assert_eq!(fix_round(3 * FIX_ONE), 3);
    assert_eq!(fix_round(3 * FIX_ONE + FIX_ONE / 2), 4);
    assert_eq!(fix_round(3 * FIX_ONE + FIX_ONE / 2 - 1), 3);
    assert_eq!(fix_round(-FIX_ONE / 2), 0);
}

#[test]
fn round_i32_is_half_away_from_zero() {
    assert_eq!(round_i32(2.5), 3);
    assert_eq!(round_i32(-2.5), -3);
    assert_eq!(round_i32(1e20), i32::MAX);
}

#[test]
fn clamp_u8_saturates() {
    assert_eq!(clamp_u8(-4), 0);
    assert_eq!(clamp_u8(128), 128);
    assert_eq!(clamp_u8(300), 255);
}

#[test]
fn pattern_word_puts_msb_at_pixel_zero() {
    let w = pattern_word(0x8000);
    assert_eq!(w, 0x0001_0001);
    assert_eq!(pattern_word(0xFFFF), u32::MAX);
}
