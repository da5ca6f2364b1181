use super::*;
use crate::foundation::core::LayerId;

const SMALL: &str = r##"{
  "technology": {
    "name": "demo",
    "layers": [
      { "name": "M1", "color": "#3050ff", "opacity": 0.7, "transparent": 1 },
      { "name": "POLY", "color": [255, 0, 0] }
    ]
  },
  "cells": [
    {
      "name": "top",
      "nodes": [
        { "name": "a", "at": [0, 0], "expanded": true,
          "kind": { "instance": { "cell": "leaf" } } },
        { "name": "b", "at": [20, 0],
          "kind": { "instance": { "cell": "leaf", "orient": { "angle": 90 } } } }
      ],
      "arcs": [
        { "name": "w", "ends": [ { "node": "a", "port": "p" }, { "node": "b", "port": "p" } ],
          "polys": [ { "layer": "M1", "rect": { "lx": 5, "ly": 4, "hx": 20, "hy": 6 } } ] }
      ],
      "exports": [ { "name": "out", "at": [0, 5], "node": "a", "port": "p" } ]
    },
    {
      "name": "leaf",
      "nodes": [
        { "name": "r", "kind": { "primitive": {
          "polys": [ { "layer": "M1", "rect": { "lx": 0, "ly": 0, "hx": 10, "hy": 10 } } ] } } }
      ],
      "exports": [ { "name": "p", "at": [5, 5], "node": "r" } ]
    }
  ]
}"##;

#[test]
fn parses_names_into_dense_ids() {
    let d = MemoryDesign::from_reader(SMALL.as_bytes()).unwrap();
    let top = d.cell_by_name("top").unwrap();
    let leaf = d.cell_by_name("leaf").unwrap();
    assert_eq!((top, leaf), (CellId(0), CellId(1)));
    assert_eq!(d.cells_bottom_up(), vec![leaf, top]);
    assert_eq!(d.technology().layer_by_name("POLY"), Some(LayerId(1)));

    let rec = d.cell(top).unwrap();
    assert!(rec.is_expanded(NodeId(0)));
    assert!(!rec.is_expanded(NodeId(1)));
    assert_eq!(
        rec.arcs[0].ends[1],
        PortRef {
            node: NodeId(1),
            port: Some(ExportId(0)),
        }
    );
    assert_eq!(rec.exports[0].original.port, Some(ExportId(0)));
    assert_eq!(d.cell_name(leaf).as_deref(), Some("leaf"));
}

#[test]
fn bounds_are_computed_bottom_up() {
    let d = MemoryDesign::from_reader(SMALL.as_bytes()).unwrap();
    assert_eq!(
        d.cell_bounds(CellId(1)),
        Some(GridRect { lx: 0, ly: 0, hx: 10, hy: 10 })
    );
    // second instance rotated 90 spans x in [10, 20]
    assert_eq!(
        d.cell_bounds(CellId(0)),
        Some(GridRect { lx: 0, ly: 0, hx: 20, hy: 10 })
    );
}

#[test]
fn replace_cell_keeps_other_revisions() {
    let d = MemoryDesign::from_reader(SMALL.as_bytes()).unwrap();
    let mut leaf = (*d.cell(CellId(1)).unwrap()).clone();
    if let NodeKind::Primitive { polys, .. } = &mut leaf.nodes[0].kind {
        polys[0] = PolyRecord::rect(LayerId(0), GridRect { lx: 0, ly: 0, hx: 30, hy: 10 });
    }
    let d2 = d.replace_cell(CellId(1), leaf).unwrap();

    assert!(Arc::ptr_eq(&d.cell(CellId(0)).unwrap(), &d2.cell(CellId(0)).unwrap()));
    assert!(!Arc::ptr_eq(&d.cell(CellId(1)).unwrap(), &d2.cell(CellId(1)).unwrap()));
    assert_eq!(d2.cell_bounds(CellId(1)).unwrap().hx, 30);
    assert!(d2.cell_bounds(CellId(0)).unwrap().hx > 20);
    assert!(d.replace_cell(CellId(9), CellRecord::default()).is_err());
}

#[test]
fn rejects_cycles() {
    let json = r#"{
      "technology": { "name": "t", "layers": [] },
      "cells": [
        { "name": "a", "nodes": [ { "name": "x", "kind": { "instance": { "cell": "b" } } } ] },
        { "name": "b", "nodes": [ { "name": "y", "kind": { "instance": { "cell": "a" } } } ] }
      ]
    }"#;
    let err = MemoryDesign::from_reader(json.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("design error:"), "{err}");
}

#[test]
fn rejects_dangling_names() {
    let unknown_cell = r#"{
      "technology": { "name": "t", "layers": [] },
      "cells": [ { "name": "a", "nodes": [ { "name": "x", "kind": { "instance": { "cell": "zz" } } } ] } ]
    }"#;
    assert!(MemoryDesign::from_reader(unknown_cell.as_bytes()).is_err());

    let unknown_layer = r#"{
      "technology": { "name": "t", "layers": [] },
      "cells": [ { "name": "a", "vars": [ { "style": "text", "points": [[0, 0]], "layer": "M9" } ] } ]
    }"#;
    assert!(MemoryDesign::from_reader(unknown_layer.as_bytes()).is_err());

    let bad_angle = r#"{
      "technology": { "name": "t", "layers": [] },
      "cells": [
        { "name": "a", "nodes": [ { "name": "x", "kind": { "instance": { "cell": "b", "orient": { "angle": 45 } } } } ] },
        { "name": "b" }
      ]
    }"#;
    assert!(MemoryDesign::from_reader(bad_angle.as_bytes()).is_err());
}

#[test]
fn missing_file_is_validation_error() {
    let err = MemoryDesign::from_path("/nonexistent/design.json").unwrap_err();
    assert!(err.to_string().contains("open design JSON"), "{err}");
}
