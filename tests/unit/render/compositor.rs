use super::*;
use crate::design::tech::{LayerFunction, LayerInfo};
use crate::foundation::core::ClipRect;
use crate::render::surface::{Canvas, PlaneSet, PlaneTarget, ScreenMap};

const RED: Rgb8 = Rgb8::new(255, 0, 0);
const GREEN: Rgb8 = Rgb8::new(0, 200, 0);
const BLUE: Rgb8 = Rgb8::new(0, 0, 255);

fn info(name: &str, color: Rgb8, opacity: f64, transparent_index: u8, function: LayerFunction) -> LayerInfo {
    LayerInfo {
        name: name.to_owned(),
        function,
        color,
        opacity,
        transparent_index,
        pattern: None,
        outline: None,
    }
}

fn opaque_tech(opacity: f64) -> Technology {
    Technology::new(
        "t",
        vec![
            info("A", RED, opacity, 0, LayerFunction::default()),
            info("B", BLUE, opacity, 0, LayerFunction::default()),
        ],
        None,
    )
    .unwrap()
}

/// 8x4 planes with the given boxes `(target, lx, hx, ly, hy)` filled.
fn planes(layer_count: usize, boxes: &[(PlaneTarget, i32, i32, i32, i32)]) -> RenderedPlanes {
    let mut canvas = Canvas::new(
        PlaneSet::new(8, 4, layer_count),
        ScreenMap::centered(8, 4, (0.0, 0.0), 1.0),
        ClipRect { lx: 0, ly: 0, hx: 7, hy: 3 },
        None,
        Vec::new(),
    );
    for &(target, lx, hx, ly, hy) in boxes {
        canvas.raster(target).get().fill_box(lx, hx, ly, hy);
    }
    canvas.into_planes()
}

fn rgb(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 3] {
    let p = frame.pixel(x, y).unwrap();
    assert_eq!(p[3], 255);
    [p[0], p[1], p[2]]
}

fn run(p: &RenderedPlanes, tech: &Technology, opts: &RenderOpts, scale: f64) -> FrameRGBA {
    composite(p, tech, &LayerVisibility::new(), &DisplayColors::default(), opts, scale)
}

#[test]
fn opaque_layer_shows_its_color_over_background() {
    let p = planes(2, &[(PlaneTarget::Layer(LayerId(0)), 0, 3, 0, 3)]);
    let f = run(&p, &opaque_tech(1.0), &RenderOpts::default(), 1.0);
    assert_eq!((f.width, f.height, f.data.len()), (8, 4, 128));
    assert_eq!(rgb(&f, 2, 1), [255, 0, 0]);
    assert_eq!(rgb(&f, 5, 1), [255, 255, 255]);
}

#[test]
fn half_opacity_mixes_with_background() {
    let p = planes(2, &[(PlaneTarget::Layer(LayerId(0)), 0, 7, 0, 3)]);
    let f = run(&p, &opaque_tech(0.5), &RenderOpts::default(), 0.25);
    assert_eq!(rgb(&f, 0, 0), [255, 127, 127]);
}

#[test]
fn overcolor_keeps_single_layers_saturated() {
    let p = planes(2, &[(PlaneTarget::Layer(LayerId(0)), 0, 7, 0, 3)]);
    let f = run(&p, &opaque_tech(0.5), &RenderOpts::default(), 1.0);
    assert_eq!(rgb(&f, 0, 0), [255, 0, 0]);
}

#[test]
fn hidden_and_transparent_overrides_apply() {
    let p = planes(2, &[(PlaneTarget::Layer(LayerId(0)), 0, 7, 0, 3)]);
    let tech = opaque_tech(1.0);
    let opts = RenderOpts::default();
    let colors = DisplayColors::default();
    let hidden = LayerVisibility::new().with_hidden(LayerId(0));
    let f = composite(&p, &tech, &hidden, &colors, &opts, 1.0);
    assert_eq!(rgb(&f, 3, 2), [255, 255, 255]);
    let clear = LayerVisibility::new().with_opacity(LayerId(0), 0.0);
    let f = composite(&p, &tech, &clear, &colors, &opts, 1.0);
    assert_eq!(rgb(&f, 3, 2), [255, 255, 255]);
}

#[test]
fn contacts_stack_above_metals() {
    let contact = LayerFunction {
        height: 1,
        contact: true,
        ..LayerFunction::default()
    };
    let metal = LayerFunction {
        height: 2,
        metal: true,
        ..LayerFunction::default()
    };
    let tech = Technology::new(
        "t",
        vec![info("C", GREEN, 1.0, 0, contact), info("M", BLUE, 1.0, 0, metal)],
        None,
    )
    .unwrap();
    let p = planes(
        2,
        &[
            (PlaneTarget::Layer(LayerId(0)), 0, 7, 0, 3),
            (PlaneTarget::Layer(LayerId(1)), 0, 7, 0, 3),
        ],
    );
    assert_eq!(
        stacking_order(&tech, &LayerVisibility::new(), &p),
        vec![LayerId(1), LayerId(0)]
    );
    let f = run(&p, &tech, &RenderOpts::default(), 1.0);
    assert_eq!(rgb(&f, 4, 2), [0, 200, 0]);
}

#[test]
fn instance_plane_is_drawn_on_top() {
    let p = planes(
        2,
        &[
            (PlaneTarget::Layer(LayerId(0)), 0, 7, 0, 3),
            (PlaneTarget::Instance, 2, 2, 0, 3),
        ],
    );
    let f = run(&p, &opaque_tech(1.0), &RenderOpts::default(), 1.0);
    assert_eq!(rgb(&f, 2, 0), [0, 0, 0]);
    assert_eq!(rgb(&f, 3, 0), [255, 0, 0]);
}

#[test]
fn legacy_mode_indexes_the_color_map() {
    let tech = Technology::new(
        "t",
        vec![
            info("A", RED, 1.0, 1, LayerFunction::default()),
            info("B", BLUE, 1.0, 2, LayerFunction::default()),
            info("O", GREEN, 1.0, 0, LayerFunction::default()),
        ],
        Some(vec![Rgb8::new(0, 0, 0), RED, BLUE, Rgb8::new(128, 0, 128)]),
    )
    .unwrap();
    let p = planes(
        3,
        &[
            (PlaneTarget::Layer(LayerId(0)), 0, 5, 0, 3),
            (PlaneTarget::Layer(LayerId(1)), 2, 5, 0, 3),
            (PlaneTarget::Layer(LayerId(2)), 4, 5, 0, 3),
        ],
    );
    let opts = RenderOpts::default().with_composite(CompositeMode::Legacy);
    let f = run(&p, &tech, &opts, 1.0);
    assert_eq!(rgb(&f, 0, 0), [255, 0, 0]);
    assert_eq!(rgb(&f, 2, 0), [128, 0, 128]);
    assert_eq!(rgb(&f, 4, 0), [0, 200, 0]);
    assert_eq!(rgb(&f, 7, 0), [255, 255, 255]);
}

#[test]
fn parallel_strips_match_serial() {
    let p = planes(
        2,
        &[
            (PlaneTarget::Layer(LayerId(0)), 0, 5, 0, 2),
            (PlaneTarget::Layer(LayerId(1)), 3, 7, 1, 3),
        ],
    );
    let tech = opaque_tech(0.7);
    let serial = run(&p, &tech, &RenderOpts::default(), 1.0);
    let parallel = run(&p, &tech, &RenderOpts::default().with_parallel_composite(true), 1.0);
    assert_eq!(serial, parallel);
}

#[test]
fn empty_surface_composes_to_an_empty_frame() {
    let f = compose_strips(0, 5, true, || (), |_, _, _| {});
    assert_eq!((f.width, f.height), (0, 5));
    assert!(f.data.is_empty());
}

#[test]
fn legacy_rows_read_across_word_boundaries() {
    let tech = Technology::new(
        "t",
        vec![
            info("A", RED, 1.0, 1, LayerFunction::default()),
            info("O", GREEN, 1.0, 0, LayerFunction::default()),
        ],
        Some(vec![Rgb8::new(0, 0, 0), RED]),
    )
    .unwrap();
    let mut canvas = Canvas::new(
        PlaneSet::new(70, 3, 2),
        ScreenMap::centered(70, 3, (0.0, 0.0), 1.0),
        ClipRect { lx: 0, ly: 0, hx: 69, hy: 2 },
        None,
        Vec::new(),
    );
    canvas.raster(PlaneTarget::Layer(LayerId(0))).get().fill_box(30, 40, 0, 2);
    canvas.raster(PlaneTarget::Layer(LayerId(1))).get().fill_box(64, 66, 1, 1);
    let p = canvas.into_planes();

    let legacy = RenderOpts::default().with_composite(CompositeMode::Legacy);
    let f = run(&p, &tech, &legacy, 1.0);
    let white = [255, 255, 255];
    let red = [255, 0, 0];
    for (x, want) in [(29, white), (30, red), (32, red), (40, red), (41, white)] {
        assert_eq!(rgb(&f, x, 2), want, "x = {x}");
    }
    assert_eq!(rgb(&f, 65, 1), [0, 200, 0]);
    assert_eq!(rgb(&f, 65, 0), [255, 255, 255]);
    assert_eq!(f, run(&p, &tech, &legacy.with_parallel_composite(true), 1.0));
}
