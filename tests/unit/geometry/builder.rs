use super::*;
use crate::design::snapshot::MemoryDesign;

const DESIGN: &str = r##"{
  "technology": {
    "name": "demo",
    "layers": [
      { "name": "M1", "color": "#3050ff", "function": { "height": 1, "metal": true } },
      { "name": "VIA", "color": "#202020", "function": { "height": 3, "contact": true } },
      { "name": "POLY", "color": "#ff0000", "function": { "height": 2 } }
    ]
  },
  "cells": [
    {
      "name": "leaf",
      "params": { "w": "4" },
      "nodes": [
        { "name": "m", "kind": { "primitive": { "polys": [
          { "layer": "M1", "rect": { "lx": 0, "ly": 0, "hx": 10, "hy": 10 } },
          { "layer": "M1", "rect": { "lx": 20, "ly": 0, "hx": 30, "hy": 10 } },
          { "layer": "M1", "color": "#00ff00", "rect": { "lx": 40, "ly": 0, "hx": 50, "hy": 10 } },
          { "layer": "POLY", "style": "crossed", "rect": { "lx": 0, "ly": 20, "hx": 10, "hy": 30 } }
        ] } } },
        { "name": "v", "kind": { "primitive": { "pure_layer": true, "polys": [
          { "layer": "VIA", "rect": { "lx": 2, "ly": 2, "hx": 4, "hy": 4 } }
        ] } } },
        { "name": "pin", "kind": { "primitive": { "vis_inside": true, "polys": [
          { "style": "text", "points": [[5, 5]], "param": "w" }
        ] } } },
        { "name": "arcs", "kind": { "primitive": { "polys": [
          { "layer": "POLY", "style": "circle_arc", "points": [[0, 0], [10, 0], [0, 10]] },
          { "layer": "POLY", "style": "closed", "points": [[0, 0], [5, 0], [5, 5]] }
        ] } } }
      ],
      "exports": [
        { "name": "p", "at": [5, 5], "node": "m" },
        { "name": "q", "at": [25, 5], "node": "m", "always_drawn": true }
      ]
    },
    {
      "name": "top",
      "nodes": [
        { "name": "a", "at": [0, 0], "kind": { "instance": { "cell": "leaf" } } },
        { "name": "b", "at": [100, 0], "expanded": true,
          "kind": { "instance": { "cell": "leaf", "orient": { "angle": 90 }, "params": { "w": "9" } } } }
      ],
      "arcs": [
        { "name": "w", "ends": [ { "node": "a", "port": "p" }, { "node": "b", "port": "q" } ],
          "polys": [ { "layer": "M1", "rect": { "lx": 5, "ly": 4, "hx": 100, "hy": 6 } } ] }
      ],
      "exports": [ { "name": "out", "at": [0, 5], "node": "b", "port": "p" } ]
    }
  ]
}"##;

fn build(d: &MemoryDesign, name: &str, orient: Orient) -> CellGeometry {
    let id = d.cell_by_name(name).unwrap();
    let rec = d.cell(id).unwrap();
    let bounds = d.cell_bounds(id).unwrap();
    build_cell(d, id, &rec, bounds, orient, &VarContext::root(), &Extras::default())
}

fn boxes_on(g: &CellGeometry, layer: u16) -> Vec<(&[GridRect], bool)> {
    g.shapes()
        .iter()
        .filter(|s| s.layer == Some(LayerId(layer)) && s.color.is_none())
        .filter_map(|s| match &s.kind {
            ShapeKind::Boxes { rects, pure_layer } => Some((rects.as_slice(), *pure_layer)),
            _ => None,
        })
        .collect()
}

#[test]
fn as_box_accepts_both_windings_and_closed_rings() {
    let p = |x, y| GridPoint::new(x, y);
    let want = Some(GridRect { lx: 0, ly: 0, hx: 4, hy: 2 });
    assert_eq!(as_box(&[p(0, 0), p(4, 0), p(4, 2), p(0, 2)]), want);
    assert_eq!(as_box(&[p(0, 0), p(0, 2), p(4, 2), p(4, 0)]), want);
    assert_eq!(as_box(&[p(0, 0), p(4, 0), p(4, 2), p(0, 2), p(0, 0)]), want);
    assert_eq!(as_box(&[p(0, 0), p(4, 1), p(4, 2), p(0, 2)]), None);
    assert_eq!(as_box(&[p(0, 0), p(4, 0), p(4, 2)]), None);
}

#[test]
fn boxes_are_batched_per_layer_and_purity() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "leaf", Orient::IDENT);

    let m1 = boxes_on(&g, 0);
    assert_eq!(m1.len(), 1);
    assert_eq!(m1[0].0.len(), 2);
    assert!(!m1[0].1);

    let via = boxes_on(&g, 1);
    assert_eq!(via.len(), 1);
    assert!(via[0].1);

    // a color override keeps its own shape
    let overridden = g.shapes().iter().filter(|s| s.color.is_some()).count();
    assert_eq!(overridden, 1);
}

#[test]
fn crossed_and_closed_polys_become_lines() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "leaf", Orient::IDENT);
    let lines = g
        .shapes()
        .iter()
        .filter(|s| matches!(s.kind, ShapeKind::Line { .. }))
        .count();
    // 6 for the crossed box, 3 for the closed triangle
    assert_eq!(lines, 9);
}

#[test]
fn shapes_are_sorted_outlines_first_then_by_height() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "leaf", Orient::IDENT);
    let tech = d.technology();
    let keys: Vec<_> = g.shapes().iter().map(|s| s.sort_key(tech)).collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));

    let first_fill = g.shapes().iter().position(Shape::is_filled).unwrap();
    assert!(g.shapes()[..first_fill].iter().all(|s| !s.is_filled()));
    // the contact layer fill comes before the metal one
    assert_eq!(g.shapes()[first_fill].layer, Some(LayerId(1)));
}

#[test]
fn vis_inside_text_goes_to_top_only_with_resolved_default() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "leaf", Orient::IDENT);
    assert!(!g.shapes().iter().any(|s| matches!(s.kind, ShapeKind::Text(_))));

    let texts: Vec<&TextShape> = g
        .top_only_shapes()
        .iter()
        .filter_map(|s| match &s.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        })
        .collect();
    assert!(texts.iter().any(|t| t.text == "4" && t.kind == TextKind::Node));
    let exports: Vec<_> = texts.iter().filter(|t| t.kind == TextKind::Export).collect();
    assert_eq!(exports.len(), 2);
    assert_eq!(exports[0].export, Some(ExportId(0)));
}

#[test]
fn parameter_text_follows_the_context() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let id = d.cell_by_name("leaf").unwrap();
    let rec = d.cell(id).unwrap();
    let ctx = VarContext::root().push(id, &[("w".to_owned(), "9".to_owned())]);
    let g = build_cell(
        &d,
        id,
        &rec,
        d.cell_bounds(id).unwrap(),
        Orient::IDENT,
        &ctx,
        &Extras::default(),
    );
    assert!(g.top_only_shapes().iter().any(|s| matches!(
        &s.kind,
        ShapeKind::Text(t) if t.text == "9"
    )));
    assert!(g.is_parameterized());
}

#[test]
fn subcells_are_referenced_not_flattened() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "top", Orient::new(1, false));
    assert_eq!(g.subcells().len(), 2);

    let b = &g.subcells()[1];
    assert_eq!(b.node, Some(NodeId(1)));
    // (100, 0) rotated a quarter turn
    assert_eq!(b.offset, GridPoint::new(0, 100));
    assert_eq!(b.orient, Orient::new(1, false));
    assert!(b.expanded);
    assert_eq!(b.label, "leaf");
    assert_eq!(b.params, vec![("w".to_owned(), "9".to_owned())]);

    // only the arc's wire box lives in top itself
    let m1 = boxes_on(&g, 0);
    assert_eq!(m1.len(), 1);
    assert_eq!(m1[0].0, &[GridRect { lx: -6, ly: 5, hx: -4, hy: 100 }]);
}

#[test]
fn shown_ports_skip_always_drawn_exports() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "top", Orient::IDENT);
    let a = &g.subcells()[0];
    let b = &g.subcells()[1];
    assert!(a.shown_ports.contains(ExportId(0)));
    // q is always drawn, p is re-exported by top
    assert!(!b.shown_ports.contains(ExportId(1)));
    assert!(b.shown_ports.contains(ExportId(0)));
}

#[test]
fn mirrored_arcs_swap_endpoints() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let g = build(&d, "leaf", Orient::new(0, true));
    let arc = g
        .shapes()
        .iter()
        .find_map(|s| match s.kind {
            ShapeKind::Arc { center, p1, p2, .. } => Some((center, p1, p2)),
            _ => None,
        })
        .unwrap();
    assert_eq!(arc, (GridPoint::new(0, 0), GridPoint::new(0, 10), GridPoint::new(-10, 0)));
}

#[test]
fn extras_are_oriented_with_the_cell() {
    let d = MemoryDesign::from_reader(DESIGN.as_bytes()).unwrap();
    let id = d.cell_by_name("top").unwrap();
    let rec = d.cell(id).unwrap();
    let extras = Extras {
        shapes: vec![Shape {
            layer: Some(LayerId(2)),
            color: None,
            kind: ShapeKind::Boxes {
                rects: vec![GridRect { lx: 1, ly: 0, hx: 3, hy: 1 }],
                pure_layer: false,
            },
        }],
        instances: vec![(CellId(0), GridPoint::new(7, 0), Orient::IDENT)],
    };
    let g = build_cell(
        &d,
        id,
        &rec,
        d.cell_bounds(id).unwrap(),
        Orient::new(2, false),
        &VarContext::root(),
        &extras,
    );
    assert!(boxes_on(&g, 2)
        .iter()
        .any(|(r, _)| *r == [GridRect { lx: -3, ly: -1, hx: -1, hy: 0 }]));
    let injected = g.subcells().last().unwrap();
    assert_eq!(injected.node, None);
    assert_eq!(injected.offset, GridPoint::new(-7, 0));
}
