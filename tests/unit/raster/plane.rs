use super::*;

fn ones_in(plane: &RasterPlane, lx: i32, hx: i32, ly: i32, hy: i32) -> u64 {
    let mut n = 0;
    for y in ly..=hy {
        for x in lx..=hx {
            if plane.get(x, y) {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn fill_box_single_word_covers_every_row() {
    let mut p = RasterPlane::new(20, 6);
    SolidRaster::new(&mut p).fill_box(2, 5, 1, 4);
    assert_eq!(p.count_ones(), 4 * 4);
    assert!(p.get(2, 4));
    assert!(p.get(5, 1));
    assert!(!p.get(6, 1));
    assert!(!p.get(2, 5));
}

#[test]
fn fill_box_spans_multiple_words() {
    let mut p = RasterPlane::new(130, 3);
    SolidRaster::new(&mut p).fill_box(30, 100, 0, 2);
    assert_eq!(p.count_ones(), 71 * 3);
    assert!(!p.get(29, 0));
    assert!(p.get(31, 0) && p.get(32, 1) && p.get(100, 2));
    assert!(!p.get(101, 2));
}

#[test]
fn full_word_edges() {
    let mut p = RasterPlane::new(64, 1);
    SolidRaster::new(&mut p).fill_hline(0, 0, 63);
    assert_eq!(p.words(), &[u32::MAX, u32::MAX]);
}

#[test]
fn pattern_masks_fill_but_not_draw() {
    let mut pattern = [0u16; 16];
    // leftmost pixel of every 16
    pattern[0] = 0x8000;
    let mut p = RasterPlane::new(40, 2);
    {
        let mut r = PatternedRaster::new(&mut p, &pattern, None);
        r.fill_box(0, 39, 0, 1);
    }
    assert_eq!(p.count_ones(), 3);
    assert!(p.get(0, 0) && p.get(16, 0) && p.get(32, 0));

    let mut r = PatternedRaster::new(&mut p, &pattern, None);
    r.draw_hline(1, 0, 39);
    assert_eq!(p.count_ones(), 3 + 40);
}

#[test]
fn copy_bits_with_unaligned_offset() {
    let mut src = RasterPlane::new(40, 4);
    SolidRaster::new(&mut src).fill_box(0, 35, 0, 3);
    let mut dst = RasterPlane::new(100, 10);
    dst.copy_bits(&src, 0, 35, 0, 3, 45, 3);
    assert_eq!(dst.count_ones(), 36 * 4);
    assert!(dst.get(45, 3));
    assert!(dst.get(80, 6));
    assert!(!dst.get(44, 3));
    assert!(!dst.get(81, 6));
    assert_eq!(ones_in(&dst, 45, 80, 3, 6), 36 * 4);
}

#[test]
fn copy_bits_sub_rectangle_with_negative_shift() {
    let mut src = RasterPlane::new(64, 2);
    SolidRaster::new(&mut src).fill_hline(0, 0, 63);
    let mut dst = RasterPlane::new(32, 2);
    dst.copy_bits(&src, 40, 50, 0, 0, -33, 1);
    assert_eq!(dst.count_ones(), 11);
    assert!(dst.get(7, 1) && dst.get(17, 1));
    assert!(!dst.get(6, 1) && !dst.get(18, 1));
}

#[test]
fn patterned_copy_uses_destination_phase() {
    let mut src = RasterPlane::new(16, 2);
    SolidRaster::new(&mut src).fill_box(0, 15, 0, 1);
    let mut pattern = [0u16; 16];
    pattern[5] = 0xFFFF;
    let mut dst = RasterPlane::new(16, 8);
    PatternedRaster::new(&mut dst, &pattern, None).copy_bits(&src, 0, 15, 0, 1, 0, 4);
    // rows 4 and 5 receive the copy; only row 5 passes the stipple
    assert_eq!(dst.count_ones(), 16);
    assert!(dst.get(3, 5));
    assert!(!dst.get(3, 4));
}
