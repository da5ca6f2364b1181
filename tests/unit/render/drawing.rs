use super::*;
use crate::design::snapshot::MemoryDesign;
use crate::raster::text::{ApproxMetrics, DeferredText};
use crate::session::opts::TextVisibility;

const DESIGN: &str = r##"{
  "technology": { "name": "demo", "layers": [
    { "name": "M1", "color": "#3050ff" },
    { "name": "M2", "color": "#ff3050" } ] },
  "cells": [
    { "name": "L",
      "nodes": [ { "name": "r", "kind": { "primitive": { "polys": [
        { "layer": "M1", "rect": { "lx": 0, "ly": 0, "hx": 10, "hy": 10 } } ] } } } ],
      "exports": [ { "name": "p", "at": [5, 5], "node": "r" } ] },
    { "name": "Pair", "nodes": [
      { "name": "a", "expanded": true, "kind": { "instance": { "cell": "L" } } },
      { "name": "b", "at": [20, 0], "expanded": true, "kind": { "instance": { "cell": "L" } } } ] },
    { "name": "Flat", "nodes": [ { "name": "r", "kind": { "primitive": { "polys": [
      { "layer": "M1", "rect": { "lx": 0, "ly": 0, "hx": 10, "hy": 10 } },
      { "layer": "M1", "rect": { "lx": 20, "ly": 0, "hx": 30, "hy": 10 } } ] } } } ] },
    { "name": "One", "nodes": [
      { "name": "a", "expanded": true, "kind": { "instance": { "cell": "L" } } } ] },
    { "name": "Closed", "nodes": [
      { "name": "a", "kind": { "instance": { "cell": "L" } } } ] }
  ]
}"##;

fn design() -> MemoryDesign {
    MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap()
}

fn run(
    d: &MemoryDesign,
    top: &str,
    viewport: &Viewport,
    opts: &RenderOpts,
    layers: &LayerVisibility,
    bitmaps: &mut BitmapCache,
) -> (RenderedPlanes, PassCounters) {
    let metrics = ApproxMetrics::default();
    let input = PassInput {
        design: d,
        top: d.cell_by_name(top).unwrap(),
        viewport,
        opts,
        colors: &DisplayColors::default(),
        layers,
        metrics: &metrics,
    };
    render_pass(&input, &mut GeometryCache::new(), bitmaps).unwrap()
}

fn simple(top: &str, viewport: &Viewport, opts: &RenderOpts) -> (RenderedPlanes, PassCounters) {
    run(
        &design(),
        top,
        viewport,
        opts,
        &LayerVisibility::new(),
        &mut BitmapCache::new(),
    )
}

#[test]
fn two_rects_fill_two_ten_pixel_squares() {
    let vp = Viewport::new(40, 20, 1.0).unwrap().with_center(15.0, 5.0);
    let (planes, counters) = simple("Flat", &vp, &RenderOpts::default());
    let m1 = planes.layer(LayerId(0)).unwrap();
    assert_eq!(m1.count_ones(), 200);
    assert!(m1.get(5, 5) && m1.get(14, 14) && m1.get(25, 5) && m1.get(34, 14));
    assert!(!m1.get(15, 5) && !m1.get(24, 5));
    assert_eq!(counters.cells_drawn, 1);
    assert!(planes.text().is_empty());
}

#[test]
fn repeated_instance_renders_once_then_copies() {
    let vp = Viewport::new(400, 400, 1.0).unwrap().with_center(15.0, 5.0);
    let (cached, counters) = simple("Pair", &vp, &RenderOpts::default());
    assert_eq!(counters.bitmaps_created, 1);
    assert_eq!(counters.bitmaps_copied, 1);

    let (flat, _) = simple("Flat", &vp, &RenderOpts::default());
    assert_eq!(cached.layer(LayerId(0)), flat.layer(LayerId(0)));
}

#[test]
fn singleton_uses_the_quota() {
    let vp = Viewport::new(400, 400, 1.0).unwrap().with_center(5.0, 5.0);
    let (_, counters) = simple("One", &vp, &RenderOpts::default());
    assert_eq!(counters.bitmaps_created, 1);

    let (planes, counters) = simple("One", &vp, &RenderOpts::default().with_singleton_quota(0));
    assert_eq!(counters.bitmaps_created, 0);
    assert_eq!(counters.cells_drawn, 2);
    assert_eq!(planes.count_set(LayerId(0)), 100);
}

#[test]
fn second_pass_copies_stored_bitmaps() {
    let d = design();
    let vp = Viewport::new(400, 400, 1.0).unwrap().with_center(15.0, 5.0);
    let opts = RenderOpts::default();
    let layers = LayerVisibility::new();
    let mut bitmaps = BitmapCache::new();
    let (first, _) = run(&d, "Pair", &vp, &opts, &layers, &mut bitmaps);
    let (second, counters) = run(&d, "Pair", &vp, &opts, &layers, &mut bitmaps);
    assert_eq!(counters.bitmaps_created, 0);
    assert_eq!(counters.bitmaps_copied, 2);
    assert_eq!(first, second);
}

#[test]
fn large_instances_are_drawn_directly() {
    // 10 pixels is over a 32nd of a 40 pixel surface
    let vp = Viewport::new(40, 40, 1.0).unwrap().with_center(15.0, 5.0);
    let (planes, counters) = simple("Pair", &vp, &RenderOpts::default());
    assert_eq!(counters.bitmaps_created, 0);
    assert_eq!(counters.bitmaps_copied, 0);
    assert_eq!(counters.cells_drawn, 3);
    assert_eq!(planes.count_set(LayerId(0)), 200);
}

#[test]
fn unexpanded_instance_is_an_outline() {
    let vp = Viewport::new(400, 400, 1.0).unwrap().with_center(5.0, 5.0);
    let (planes, counters) = simple("Closed", &vp, &RenderOpts::default());
    assert_eq!(counters.outlines, 1);
    assert_eq!(planes.count_set(LayerId(0)), 0);
    let outline = planes.instance_plane().unwrap();
    assert_eq!(outline.count_ones(), 40);
    assert!(outline.get(195, 195) && outline.get(205, 205) && !outline.get(200, 200));
    // no text below scale 1
    assert!(planes.text().is_empty());
}

#[test]
fn full_instantiate_expands_everything() {
    let vp = Viewport::new(400, 400, 1.0).unwrap().with_center(5.0, 5.0);
    let opts = RenderOpts::default().with_full_instantiate(true);
    let (planes, counters) = simple("Closed", &vp, &opts);
    assert_eq!(counters.outlines, 0);
    assert_eq!(planes.count_set(LayerId(0)), 100);
}

#[test]
fn port_crosses_follow_visibility() {
    let vp = Viewport::new(400, 400, 4.0).unwrap().with_center(5.0, 5.0);
    let opts = RenderOpts::default().with_port_display(LabelDisplay::Cross);
    let (planes, _) = simple("Closed", &vp, &opts);
    let crosses: Vec<_> = planes
        .text()
        .iter()
        .filter_map(|t| match t {
            DeferredText::Cross(c) => Some((c.x, c.y)),
            _ => None,
        })
        .collect();
    assert_eq!(crosses, vec![(200, 200)]);

    let hidden = opts.with_text_visibility(TextVisibility::default().with(TextKind::Port, false));
    let (planes, _) = simple("Closed", &vp, &hidden);
    assert!(!planes.text().iter().any(|t| matches!(t, DeferredText::Cross(_))));
}

#[test]
fn hidden_layers_are_not_drawn() {
    let vp = Viewport::new(40, 20, 1.0).unwrap().with_center(15.0, 5.0);
    let layers = LayerVisibility::new().with_hidden(LayerId(0));
    let (planes, _) = run(
        &design(),
        "Flat",
        &vp,
        &RenderOpts::default(),
        &layers,
        &mut BitmapCache::new(),
    );
    assert_eq!(planes.count_set(LayerId(0)), 0);
}

#[test]
fn short_names_stop_at_punctuation() {
    assert_eq!(short_name("in[3]"), "in");
    assert_eq!(short_name("clk"), "clk");
    assert_eq!(short_name("[x]"), "[x]");
}
