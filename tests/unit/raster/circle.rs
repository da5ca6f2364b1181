use super::*;
use crate::raster::plane::{RasterPlane, SolidRaster};

fn set_pixels(p: &RasterPlane) -> Vec<(i32, i32)> {
    let mut out = Vec::new();
    for y in 0..p.height() {
        for x in 0..p.width() {
            if p.get(x, y) {
                out.push((x, y));
            }
        }
    }
    out
}

fn dist(c: ScreenPoint, (x, y): (i32, i32)) -> f64 {
    f64::from(x - c.x).hypot(f64::from(y - c.y))
}

#[test]
fn circle_pixels_lie_on_radius() {
    let mut p = RasterPlane::new(64, 64);
    let clip = ClipRect::full(64, 64).unwrap();
    let c = ScreenPoint::new(30, 30);
    draw_circle(
        &mut SolidRaster::new(&mut p),
        c,
        ScreenPoint::new(40, 30),
        CircleNature::Outline,
        clip,
    );
    let px = set_pixels(&p);
    assert!(px.len() > 40);
    assert!(px.iter().all(|&q| (dist(c, q) - 10.0).abs() < 1.0));
    assert!(p.get(40, 30) && p.get(20, 30) && p.get(30, 40) && p.get(30, 20));
}

#[test]
fn disc_is_solid_and_symmetric() {
    let mut p = RasterPlane::new(64, 64);
    let clip = ClipRect::full(64, 64).unwrap();
    let c = ScreenPoint::new(32, 32);
    draw_circle(
        &mut SolidRaster::new(&mut p),
        c,
        ScreenPoint::new(32, 20),
        CircleNature::Disc,
        clip,
    );
    let n = p.count_ones() as f64;
    let area = std::f64::consts::PI * 144.0;
    assert!((n - area).abs() < area * 0.15, "{n} vs {area}");
    assert!(p.get(32, 32) && p.get(25, 38));
    for &(x, y) in &set_pixels(&p) {
        assert!(p.get(2 * c.x - x, y));
        assert!(p.get(x, 2 * c.y - y));
    }
}

#[test]
fn tiny_disc_is_three_by_three() {
    let mut p = RasterPlane::new(8, 8);
    let clip = ClipRect::full(8, 8).unwrap();
    draw_circle(
        &mut SolidRaster::new(&mut p),
        ScreenPoint::new(4, 4),
        ScreenPoint::new(5, 4),
        CircleNature::Disc,
        clip,
    );
    assert_eq!(p.count_ones(), 9);
}

#[test]
fn clipped_circle_stays_inside() {
    let mut p = RasterPlane::new(32, 32);
    let clip = ClipRect {
        lx: 4,
        ly: 4,
        hx: 20,
        hy: 20,
    };
    for nature in [CircleNature::Outline, CircleNature::Thick, CircleNature::Disc] {
        draw_circle(
            &mut SolidRaster::new(&mut p),
            ScreenPoint::new(4, 4),
            ScreenPoint::new(14, 4),
            nature,
            clip,
        );
    }
    assert!(!p.is_clear());
    assert!(set_pixels(&p).into_iter().all(|(x, y)| clip.contains(x, y)));
}

#[test]
fn arc_is_partial_circle() {
    let clip = ClipRect::full(64, 64).unwrap();
    let c = ScreenPoint::new(32, 32);

    let mut full = RasterPlane::new(64, 64);
    draw_circle(
        &mut SolidRaster::new(&mut full),
        c,
        ScreenPoint::new(44, 32),
        CircleNature::Outline,
        clip,
    );

    let mut arc = RasterPlane::new(64, 64);
    draw_arc(
        &mut SolidRaster::new(&mut arc),
        c,
        ScreenPoint::new(44, 32),
        ScreenPoint::new(32, 20),
        false,
        clip,
    );
    let px = set_pixels(&arc);
    assert!(!px.is_empty());
    assert!(px.len() < full.count_ones() as usize);
    assert!(px.iter().all(|&q| (dist(c, q) - 12.0).abs() < 1.5));
}

#[test]
fn arc_with_equal_ends_draws_nothing() {
    let clip = ClipRect::full(16, 16).unwrap();
    let mut p = RasterPlane::new(16, 16);
    let e = ScreenPoint::new(12, 8);
    draw_arc(
        &mut SolidRaster::new(&mut p),
        ScreenPoint::new(8, 8),
        e,
        e,
        true,
        clip,
    );
    assert!(p.is_clear());
}

#[test]
fn huge_circle_crossing_the_clip_is_drawn_as_its_visible_edge() {
    let clip = ClipRect::full(64, 64).unwrap();
    let c = ScreenPoint::new(-1_000_000_000, 32);
    let edge = ScreenPoint::new(32, 32);

    let mut ring = RasterPlane::new(64, 64);
    draw_circle(&mut SolidRaster::new(&mut ring), c, edge, CircleNature::Outline, clip);
    assert!((0..64).all(|y| ring.get(32, y)));
    assert!(set_pixels(&ring).iter().all(|&(x, _)| x == 32));

    let mut disc = RasterPlane::new(64, 64);
    draw_circle(&mut SolidRaster::new(&mut disc), c, edge, CircleNature::Disc, clip);
    assert_eq!(disc.count_ones(), 33 * 64);
    assert!(disc.get(0, 0) && disc.get(32, 63) && !disc.get(33, 10));
}

#[test]
fn huge_arc_keeps_its_sweep() {
    let clip = ClipRect::full(64, 64).unwrap();
    let c = ScreenPoint::new(-1_000_000_000, 32);
    let mut p = RasterPlane::new(64, 64);
    // from straight down, clockwise round to the rightmost point
    draw_arc(
        &mut SolidRaster::new(&mut p),
        c,
        ScreenPoint::new(-1_000_000_000, 1_000_000_064),
        ScreenPoint::new(32, 32),
        false,
        clip,
    );
    assert_eq!(set_pixels(&p), (0..=32).map(|y| (32, y)).collect::<Vec<_>>());
}

#[test]
fn circles_far_outside_are_skipped() {
    let clip = ClipRect::full(16, 16).unwrap();
    let mut p = RasterPlane::new(16, 16);
    for nature in [CircleNature::Outline, CircleNature::Thick, CircleNature::Disc] {
        draw_circle(
            &mut SolidRaster::new(&mut p),
            ScreenPoint::new(i32::MAX, i32::MIN),
            ScreenPoint::new(i32::MAX - 5, i32::MIN),
            nature,
            clip,
        );
        draw_circle(
            &mut SolidRaster::new(&mut p),
            ScreenPoint::new(i32::MIN, 8),
            ScreenPoint::new(i32::MIN + 1_000_000, 8),
            nature,
            clip,
        );
    }
    assert!(p.is_clear());
}
