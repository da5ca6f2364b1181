use super::*;

fn sample_point() -> GridPoint {
    GridPoint::new(3, 1)
}

#[test]
fn quarter_turn_is_counter_clockwise() {
    let o = Orient::new(1, false);
    assert_eq!(o.apply(GridPoint::new(1, 0)), GridPoint::new(0, 1));
    assert_eq!(o.apply(GridPoint::new(0, 1)), GridPoint::new(-1, 0));
}

#[test]
fn mirror_applies_before_rotation() {
    let o = Orient::new(1, true);
    // (3,1) -> mirror (-3,1) -> rotate (-1,-3)
    assert_eq!(o.apply(sample_point()), GridPoint::new(-1, -3));
}

#[test]
fn equivalent_raw_orientations_share_canonical_form() {
    let both = Orientation::new(0, true, true).unwrap().canonical();
    let half = Orientation::new(180, false, false).unwrap().canonical();
    assert_eq!(both, half);

    let my = Orientation::new(90, false, true).unwrap().canonical();
    let mx = Orientation::new(270, true, false).unwrap().canonical();
    assert_eq!(my, mx);

    let wrapped = Orientation::new(-90, false, false).unwrap().canonical();
    assert_eq!(wrapped, Orient::new(3, false));
}

#[test]
fn canonical_form_transforms_like_raw_flags() {
    for angle in [0, 90, 180, 270] {
        for mx in [false, true] {
            for my in [false, true] {
                let raw = Orientation::new(angle, mx, my).unwrap();
                let p = sample_point();
                let x = if mx { -p.x } else { p.x };
                let y = if my { -p.y } else { p.y };
                let expected = Orient::new((angle / 90) as u8, false).apply(GridPoint::new(x, y));
                assert_eq!(raw.canonical().apply(p), expected, "{raw:?}");
            }
        }
    }
}

#[test]
fn concat_matches_sequential_application() {
    for a in Orient::ALL {
        for b in Orient::ALL {
            let p = sample_point();
            assert_eq!(a.concat(b).apply(p), a.apply(b.apply(p)), "{a:?} {b:?}");
        }
    }
}

#[test]
fn inverse_round_trips_every_orientation() {
    for o in Orient::ALL {
        assert!(o.concat(o.inverse()).is_ident(), "{o:?}");
    }
}

#[test]
fn dense_index_is_unique() {
    let mut seen = [false; 8];
    for o in Orient::ALL {
        assert!(!seen[o.index()]);
        seen[o.index()] = true;
    }
}

#[test]
fn rejects_non_right_angles() {
    assert!(Orientation::new(45, false, false).is_err());
}
