use super::*;

fn req(text: &str, size: f64) -> TextRequest<'_> {
    TextRequest {
        text,
        rect: ScreenRect::new(50, 50, 0, 0),
        anchor: TextAnchor::Center,
        rotation: 0,
        true_size: size,
        italic: false,
        bold: false,
        underline: false,
        face: 0,
        color: Rgb8::new(1, 2, 3),
    }
}

#[test]
fn readable_text_is_centered_on_anchor() {
    let mut spool = TextSpool::new(200, 200, 5, 200);
    spool.push_text(req("ABCD", 10.0), &ApproxMetrics::default());
    let [DeferredText::Text(t)] = spool.items() else {
        panic!("expected one text item: {:?}", spool.items());
    };
    // 4 glyphs x 6px, 12px line
    assert_eq!((t.width, t.height), (24, 12));
    assert_eq!(t.bounds, (38, 44, 24, 12));
    assert_eq!(t.origin, (50, 50));
    assert_eq!(t.offset, (-12, -6));
}

#[test]
fn small_text_becomes_greek_line() {
    let mut spool = TextSpool::new(200, 200, 5, 200);
    spool.push_text(req("ABCD", 3.0), &ApproxMetrics::default());
    assert_eq!(
        spool.items(),
        &[DeferredText::Greek(GreekLine {
            lx: 47,
            hx: 54,
            y: 50,
            color: Rgb8::new(1, 2, 3),
        })]
    );
}

#[test]
fn sub_pixel_and_offscreen_text_is_dropped() {
    let mut spool = TextSpool::new(100, 100, 5, 200);
    spool.push_text(req("x", 0.5), &ApproxMetrics::default());
    let mut far = req("far away", 12.0);
    far.rect = ScreenRect::new(500, 500, 0, 0);
    spool.push_text(far, &ApproxMetrics::default());
    spool.push_text(req("", 12.0), &ApproxMetrics::default());
    assert!(spool.is_empty());
}

#[test]
fn boxed_text_shrinks_to_fit() {
    let mut spool = TextSpool::new(200, 200, 5, 200);
    let mut r = req("ABCDEFGHIJ", 20.0);
    r.anchor = TextAnchor::Boxed;
    r.rect = ScreenRect::new(40, 40, 20, 5);
    spool.push_text(r, &ApproxMetrics::default());
    let [DeferredText::Text(t)] = spool.items() else {
        panic!("expected one text item");
    };
    assert!(t.size < 20);
    assert!(t.width <= 20 && t.height <= 5);
}

#[test]
fn quarter_turn_swaps_bounds() {
    let mut spool = TextSpool::new(200, 200, 5, 200);
    let mut r = req("ABCD", 10.0);
    r.rotation = 1;
    spool.push_text(r, &ApproxMetrics::default());
    let [DeferredText::Text(t)] = spool.items() else {
        panic!("expected one text item");
    };
    assert_eq!((t.bounds.2, t.bounds.3), (12, 24));
    assert_eq!((t.bounds.0, t.bounds.1), (44, 62));
}

#[test]
fn size_is_clamped() {
    let mut spool = TextSpool::new(2000, 2000, 5, 40);
    spool.push_text(req("A", 500.0), &ApproxMetrics::default());
    let [DeferredText::Text(t)] = spool.items() else {
        panic!("expected one text item");
    };
    assert_eq!(t.size, 40);
}
