use super::*;
use crate::design::tech::OutlineStyle;
use crate::raster::line::draw_box;
use crate::raster::plane::{PatternedRaster, RasterPlane, SolidRaster};

fn rect(lx: i32, ly: i32, hx: i32, hy: i32) -> Vec<ScreenPoint> {
    vec![
        ScreenPoint::new(lx, ly),
        ScreenPoint::new(hx, ly),
        ScreenPoint::new(hx, hy),
        ScreenPoint::new(lx, hy),
    ]
}

#[test]
fn rectangle_polygon_matches_box_fill() {
    let clip = ClipRect::full(64, 48).unwrap();
    for &(lx, ly, w, h) in &[(0, 0, 1, 1), (3, 4, 10, 7), (30, 2, 33, 20), (5, 5, 1, 9)] {
        let mut by_poly = RasterPlane::new(64, 48);
        draw_polygon(
            &mut SolidRaster::new(&mut by_poly),
            &rect(lx, ly, lx + w, ly + h),
            clip,
        );
        let mut by_box = RasterPlane::new(64, 48);
        draw_box(
            &mut SolidRaster::new(&mut by_box),
            lx,
            lx + w - 1,
            ly,
            ly + h - 1,
            clip,
        );
        assert_eq!(by_poly.count_ones(), (w * h) as u64, "{w}x{h}");
        assert_eq!(by_poly, by_box, "{w}x{h} at ({lx},{ly})");
    }
}

#[test]
fn winding_direction_does_not_matter() {
    let clip = ClipRect::full(32, 32).unwrap();
    let mut cw = RasterPlane::new(32, 32);
    let mut ccw = RasterPlane::new(32, 32);
    let pts = rect(4, 4, 20, 12);
    let mut rev = pts.clone();
    rev.reverse();
    draw_polygon(&mut SolidRaster::new(&mut cw), &pts, clip);
    draw_polygon(&mut SolidRaster::new(&mut ccw), &rev, clip);
    assert_eq!(cw, ccw);
    assert_eq!(cw.count_ones(), 16 * 8);
}

#[test]
fn straddling_polygon_stays_in_clip() {
    let clip = ClipRect {
        lx: 0,
        ly: 0,
        hx: 9,
        hy: 9,
    };
    let mut p = RasterPlane::new(16, 16);
    draw_polygon(&mut SolidRaster::new(&mut p), &rect(-5, 5, 5, 20), clip);
    // [0, 5) x [5, 10)
    assert_eq!(p.count_ones(), 25);
    for y in 0..16 {
        for x in 0..16 {
            if p.get(x, y) {
                assert!(clip.contains(x, y));
            }
        }
    }
}

#[test]
fn triangle_fills_half_open_rows() {
    let clip = ClipRect::full(16, 16).unwrap();
    let mut p = RasterPlane::new(16, 16);
    let tri = [
        ScreenPoint::new(0, 0),
        ScreenPoint::new(8, 0),
        ScreenPoint::new(0, 8),
    ];
    draw_polygon(&mut SolidRaster::new(&mut p), &tri, clip);
    assert!(p.get(0, 0) && p.get(7, 0));
    assert!(!p.get(8, 0));
    assert!(p.get(0, 7));
    assert!(!p.get(0, 8));
    // row widths shrink monotonically
    let widths: Vec<i32> = (0..8)
        .map(|y| (0..16).filter(|&x| p.get(x, y)).count() as i32)
        .collect();
    assert!(widths.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn overlapping_loops_use_even_odd() {
    // outer ring traced twice around the inner square leaves a hole
    let clip = ClipRect::full(32, 32).unwrap();
    let mut p = RasterPlane::new(32, 32);
    let pts = [
        ScreenPoint::new(0, 0),
        ScreenPoint::new(20, 0),
        ScreenPoint::new(20, 20),
        ScreenPoint::new(0, 20),
        ScreenPoint::new(0, 5),
        ScreenPoint::new(5, 5),
        ScreenPoint::new(5, 15),
        ScreenPoint::new(15, 15),
        ScreenPoint::new(15, 5),
        ScreenPoint::new(0, 5),
    ];
    draw_polygon(&mut SolidRaster::new(&mut p), &pts, clip);
    assert!(p.get(2, 2));
    assert!(p.get(2, 10));
    assert!(!p.get(10, 10));
    assert!(p.get(17, 10));
}

#[test]
fn degenerate_polygon_draws_nothing() {
    let clip = ClipRect::full(8, 8).unwrap();
    let mut p = RasterPlane::new(8, 8);
    let line = [ScreenPoint::new(1, 1), ScreenPoint::new(5, 5)];
    draw_polygon(&mut SolidRaster::new(&mut p), &line, clip);
    let flat = rect(1, 3, 6, 3);
    draw_polygon(&mut SolidRaster::new(&mut p), &flat, clip);
    assert!(p.is_clear());
}

#[test]
fn patterned_polygon_gets_outline() {
    let clip = ClipRect::full(16, 16).unwrap();
    let mut p = RasterPlane::new(16, 16);
    let pattern = [0u16; 16];
    let mut r = PatternedRaster::new(&mut p, &pattern, Some(OutlineStyle::SOLID));
    draw_polygon(&mut r, &rect(2, 2, 10, 10), clip);
    assert!(p.get(2, 2) && p.get(10, 10) && p.get(2, 6));
    assert!(!p.get(6, 6));
}
