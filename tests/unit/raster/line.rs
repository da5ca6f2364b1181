use super::*;
use crate::raster::plane::{PatternedRaster, RasterPlane, SolidRaster};

/// Records every write so tests can check what reached the plane.
#[derive(Default)]
struct Recorder {
    pixels: std::collections::BTreeSet<(i32, i32)>,
    calls: usize,
}

impl Raster for Recorder {
    fn fill_box(&mut self, lx: i32, hx: i32, ly: i32, hy: i32) {
        self.calls += 1;
        for y in ly..=hy {
            for x in lx..=hx {
                self.pixels.insert((x, y));
            }
        }
    }
    fn fill_hline(&mut self, y: i32, lx: i32, hx: i32) {
        self.fill_box(lx, hx, y, y);
    }
    fn fill_vline(&mut self, x: i32, ly: i32, hy: i32) {
        self.fill_box(x, x, ly, hy);
    }
    fn fill_point(&mut self, x: i32, y: i32) {
        self.fill_box(x, x, y, y);
    }
    fn draw_hline(&mut self, y: i32, lx: i32, hx: i32) {
        self.fill_box(lx, hx, y, y);
    }
    fn draw_vline(&mut self, x: i32, ly: i32, hy: i32) {
        self.fill_box(x, x, ly, hy);
    }
    fn draw_point(&mut self, x: i32, y: i32) {
        self.fill_box(x, x, y, y);
    }
    fn outline(&self) -> Option<OutlineStyle> {
        None
    }
    fn copy_bits(&mut self, _: &RasterPlane, _: i32, _: i32, _: i32, _: i32, _: i32, _: i32) {
        self.calls += 1;
    }
}

fn clip() -> ClipRect {
    ClipRect {
        lx: 10,
        ly: 10,
        hx: 29,
        hy: 19,
    }
}

#[test]
fn box_outside_clip_writes_nothing() {
    let mut r = Recorder::default();
    draw_box(&mut r, 0, 9, 0, 30, clip());
    draw_box(&mut r, 30, 40, 10, 19, clip());
    draw_box(&mut r, 10, 29, 20, 25, clip());
    assert_eq!(r.calls, 0);
}

#[test]
fn straddling_box_writes_exact_intersection() {
    let mut r = Recorder::default();
    draw_box(&mut r, 5, 14, 15, 24, clip());
    // intersection is [10, 14] x [15, 19]
    assert_eq!(r.pixels.len(), 5 * 5);
    assert!(r.pixels.iter().all(|&(x, y)| clip().contains(x, y)));
}

#[test]
fn lines_stay_inside_clip() {
    let mut r = Recorder::default();
    for texture in [
        LineTexture::Solid,
        LineTexture::Dotted,
        LineTexture::Dashed,
        LineTexture::Thick,
    ] {
        draw_line(
            &mut r,
            ScreenPoint::new(-100, -40),
            ScreenPoint::new(200, 90),
            texture,
            clip(),
        );
    }
    assert!(!r.pixels.is_empty());
    assert!(r.pixels.iter().all(|&(x, y)| clip().contains(x, y)));
}

#[test]
fn solid_line_is_connected() {
    let mut p = RasterPlane::new(16, 16);
    let full = ClipRect::full(16, 16).unwrap();
    draw_line(
        &mut SolidRaster::new(&mut p),
        ScreenPoint::new(1, 2),
        ScreenPoint::new(12, 7),
        LineTexture::Solid,
        full,
    );
    // one pixel per column along the major axis
    assert_eq!(p.count_ones(), 12);
    assert!(p.get(1, 2) && p.get(12, 7));
}

#[test]
fn dotted_line_sets_every_fourth_pixel() {
    let mut p = RasterPlane::new(32, 1);
    let full = ClipRect::full(32, 1).unwrap();
    draw_line(
        &mut SolidRaster::new(&mut p),
        ScreenPoint::new(0, 0),
        ScreenPoint::new(15, 0),
        LineTexture::Dotted,
        full,
    );
    // pixel 0 always, then bits 3 and 7 of 0x88 in each period of 8
    let set: Vec<i32> = (0..32).filter(|&x| p.get(x, 0)).collect();
    assert_eq!(set, vec![0, 3, 7, 11, 15]);
}

#[test]
fn cross_arms_are_clipped() {
    let mut r = Recorder::default();
    draw_cross(&mut r, 11, 18, 5, clip());
    assert!(r.pixels.contains(&(10, 18)));
    assert!(r.pixels.contains(&(16, 18)));
    assert!(r.pixels.contains(&(11, 13)));
    assert!(!r.pixels.contains(&(11, 20)));
    assert!(r.pixels.iter().all(|&(x, y)| clip().contains(x, y)));
}

#[test]
fn outlined_box_draws_border_unpatterned() {
    let pattern = [0u16; 16];
    let mut p = RasterPlane::new(10, 10);
    let full = ClipRect::full(10, 10).unwrap();
    let mut r = PatternedRaster::new(&mut p, &pattern, Some(OutlineStyle::SOLID));
    draw_box(&mut r, 1, 6, 2, 5, full);
    // empty stipple: only the 6x4 border survives
    assert_eq!(p.count_ones(), 6 * 2 + 2 * 2);
    assert!(p.get(1, 3) && p.get(6, 3) && p.get(3, 2) && p.get(3, 5));
    assert!(!p.get(3, 3));
}

#[test]
fn thick_outline_grows_inward() {
    let pattern = [0u16; 16];
    let mut p = RasterPlane::new(10, 10);
    let full = ClipRect::full(10, 10).unwrap();
    let thick = OutlineStyle {
        thickness: 2,
        ..OutlineStyle::SOLID
    };
    let mut r = PatternedRaster::new(&mut p, &pattern, Some(thick));
    draw_box(&mut r, 0, 5, 0, 5, full);
    assert!(p.get(1, 3) && p.get(4, 3) && p.get(3, 1) && p.get(3, 4));
    assert!(!p.get(2, 2));
    assert_eq!(p.count_ones(), 36 - 4);
}
