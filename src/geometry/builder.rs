use crate::design::context::VarContext;
use crate::design::model::{CellRecord, NodeKind, PolyRecord, PolyStyle, PortRef};
use crate::design::snapshot::DesignSnapshot;
use crate::design::text::{TextAnchor, TextDescriptor};
use crate::foundation::core::{CellId, ExportId, GridPoint, GridRect, LayerId, NodeId};
use crate::foundation::orient::Orient;
use crate::geometry::shape::{
    CellGeometry, PortSet, Shape, ShapeKind, SubcellRef, TextKind, TextShape,
};
use crate::raster::circle::CircleNature;
use crate::raster::line::LineTexture;

/// Shapes and instances injected into a cell outside its record, in cell coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Extras {
    pub(crate) shapes: Vec<Shape>,
    pub(crate) instances: Vec<(CellId, GridPoint, Orient)>,
}

/// Per-layer rectangle batches, kept apart for pure-layer nodes.
#[derive(Default)]
struct BoxBatches {
    normal: Vec<Vec<GridRect>>,
    pure: Vec<Vec<GridRect>>,
}

impl BoxBatches {
    fn put(&mut self, layer: LayerId, pure: bool, r: GridRect) {
        let lists = if pure { &mut self.pure } else { &mut self.normal };
        if lists.len() <= layer.index() {
            lists.resize_with(layer.index() + 1, Vec::new);
        }
        lists[layer.index()].push(r);
    }

    fn drain_into(self, out: &mut Vec<Shape>) {
        for (pure, lists) in [(false, self.normal), (true, self.pure)] {
            for (i, rects) in lists.into_iter().enumerate() {
                if rects.is_empty() {
                    continue;
                }
                out.push(Shape {
                    layer: Some(LayerId(i as u16)),
                    color: None,
                    kind: ShapeKind::Boxes {
                        rects,
                        pure_layer: pure,
                    },
                });
            }
        }
    }
}

/// Axis-aligned rectangle described by 4 points (or 5 with the first repeated).
pub(crate) fn as_box(points: &[GridPoint]) -> Option<GridRect> {
    let pts = match points {
        [a, b, c, d, e] if a == e => [*a, *b, *c, *d],
        [a, b, c, d] => [*a, *b, *c, *d],
        _ => return None,
    };
    let [p0, p1, p2, p3] = pts;
    let ccw = p0.x == p1.x && p1.y == p2.y && p2.x == p3.x && p3.y == p0.y;
    let cw = p0.y == p1.y && p1.x == p2.x && p2.y == p3.y && p3.x == p0.x;
    if ccw || cw {
        Some(GridRect::from_corners(p0, p2))
    } else {
        None
    }
}

/// Builds the shapes of one cell in one orientation.
struct ShapeSink<'a> {
    record: &'a CellRecord,
    orient: Orient,
    ctx: &'a VarContext,
    batches: BoxBatches,
    shapes: Vec<Shape>,
    top_only: Vec<Shape>,
}

impl ShapeSink<'_> {
    fn pt(&self, p: GridPoint) -> GridPoint {
        self.orient.apply(p)
    }

    fn line(out: &mut Vec<Shape>, poly: &PolyRecord, from: GridPoint, to: GridPoint, texture: LineTexture) {
        out.push(Shape {
            layer: poly.layer,
            color: poly.color,
            kind: ShapeKind::Line { from, to, texture },
        });
    }

    fn text_shape(&self, poly: &PolyRecord, kind: TextKind) -> Option<TextShape> {
        let content = poly.text.as_ref()?;
        let text = self.ctx.resolve(content, self.record);
        if text.is_empty() {
            return None;
        }
        let pts: Vec<GridPoint> = poly.points.iter().map(|p| self.pt(*p)).collect();
        let rect = GridRect::bounding(&pts)?;
        Some(TextShape {
            rect,
            anchor: poly.descriptor.anchor().transformed(self.orient),
            descriptor: poly.descriptor,
            text,
            kind,
            export: None,
        })
    }

    /// Convert one poly. `top_only` routes it to the top-level list.
    fn poly(&mut self, poly: &PolyRecord, kind: TextKind, pure_layer: bool, top_only: bool) {
        let pts: Vec<GridPoint> = poly.points.iter().map(|p| self.pt(*p)).collect();
        let mut local = Vec::new();
        match poly.style {
            PolyStyle::Filled => match as_box(&pts) {
                Some(r) => match (poly.layer, poly.color, top_only) {
                    (Some(layer), None, false) => self.batches.put(layer, pure_layer, r),
                    _ => local.push(Shape {
                        layer: poly.layer,
                        color: poly.color,
                        kind: ShapeKind::Boxes {
                            rects: vec![r],
                            pure_layer,
                        },
                    }),
                },
                None if pts.len() >= 3 => local.push(Shape {
                    layer: poly.layer,
                    color: poly.color,
                    kind: ShapeKind::Polygon { points: pts },
                }),
                None => tracing::trace!(points = pts.len(), "dropping degenerate filled poly"),
            },
            PolyStyle::Crossed => {
                if let [a, b, c, d, ..] = pts[..] {
                    for (f, t) in [(a, b), (b, c), (c, d), (d, a), (a, c), (b, d)] {
                        Self::line(&mut local, poly, f, t, LineTexture::Solid);
                    }
                }
            }
            PolyStyle::Closed | PolyStyle::Opened(_) => {
                let texture = match poly.style {
                    PolyStyle::Opened(t) => t,
                    _ => LineTexture::Solid,
                };
                for w in pts.windows(2) {
                    Self::line(&mut local, poly, w[0], w[1], texture);
                }
                if poly.style == PolyStyle::Closed
                    && let (Some(first), Some(last)) = (pts.first(), pts.last())
                    && pts.len() > 2
                {
                    Self::line(&mut local, poly, *last, *first, texture);
                }
            }
            PolyStyle::Vectors => {
                for pair in pts.chunks_exact(2) {
                    Self::line(&mut local, poly, pair[0], pair[1], LineTexture::Solid);
                }
            }
            PolyStyle::Circle | PolyStyle::ThickCircle | PolyStyle::Disc => {
                if let [center, edge, ..] = pts[..] {
                    let nature = match poly.style {
                        PolyStyle::Circle => CircleNature::Outline,
                        PolyStyle::ThickCircle => CircleNature::Thick,
                        _ => CircleNature::Disc,
                    };
                    local.push(Shape {
                        layer: poly.layer,
                        color: poly.color,
                        kind: ShapeKind::Circle {
                            center,
                            edge,
                            nature,
                        },
                    });
                }
            }
            PolyStyle::CircleArc | PolyStyle::ThickCircleArc => {
                if let [center, mut p1, mut p2, ..] = pts[..] {
                    // mirroring reverses the sweep
                    if self.orient.mirror() {
                        std::mem::swap(&mut p1, &mut p2);
                    }
                    local.push(Shape {
                        layer: poly.layer,
                        color: poly.color,
                        kind: ShapeKind::Arc {
                            center,
                            p1,
                            p2,
                            thick: poly.style == PolyStyle::ThickCircleArc,
                        },
                    });
                }
            }
            PolyStyle::Cross | PolyStyle::BigCross => {
                if let Some(&at) = pts.first() {
                    local.push(Shape {
                        layer: poly.layer,
                        color: poly.color,
                        kind: ShapeKind::Cross {
                            at,
                            small: poly.style == PolyStyle::Cross,
                        },
                    });
                }
            }
            PolyStyle::Text => {
                if let Some(t) = self.text_shape(poly, kind) {
                    local.push(Shape {
                        layer: poly.layer,
                        color: poly.color,
                        kind: ShapeKind::Text(t),
                    });
                }
            }
        }
        if top_only {
            self.top_only.append(&mut local);
        } else {
            self.shapes.append(&mut local);
        }
    }
}

/// Exports of `child` reached through `node` by an arc or re-exported by the parent.
fn shown_ports(
    record: &CellRecord,
    node: NodeId,
    child: Option<&CellRecord>,
) -> PortSet {
    let mut set = PortSet::default();
    let drawn_anyway = |id: ExportId| {
        child
            .and_then(|c| c.exports.get(id.0 as usize))
            .is_some_and(|e| e.always_drawn)
    };
    let mut mark = |p: &PortRef| {
        if p.node == node
            && let Some(id) = p.port
            && !drawn_anyway(id)
        {
            set.insert(id);
        }
    };
    for arc in &record.arcs {
        arc.ends.iter().for_each(&mut mark);
    }
    for e in &record.exports {
        mark(&e.original);
    }
    set
}

/// Flatten the own geometry of `record` in `orient`: arcs, then primitive nodes, then instances.
pub(crate) fn build_cell(
    design: &dyn DesignSnapshot,
    cell: CellId,
    record: &CellRecord,
    bounds: GridRect,
    orient: Orient,
    ctx: &VarContext,
    extras: &Extras,
) -> CellGeometry {
    let mut sink = ShapeSink {
        record,
        orient,
        ctx,
        batches: BoxBatches::default(),
        shapes: Vec::new(),
        top_only: Vec::new(),
    };

    for arc in &record.arcs {
        for p in &arc.polys {
            sink.poly(p, TextKind::Arc, false, false);
        }
        for v in &arc.vars {
            sink.poly(v, TextKind::Arc, false, false);
        }
    }

    for node in &record.nodes {
        let NodeKind::Primitive {
            polys,
            pure_layer,
            vis_inside,
            annotation,
        } = &node.kind
        else {
            continue;
        };
        let kind = if *annotation {
            TextKind::Annotation
        } else {
            TextKind::Node
        };
        for p in polys {
            sink.poly(p, kind, *pure_layer, *vis_inside);
        }
        if !*pure_layer {
            for v in &node.vars {
                sink.poly(v, kind, false, *vis_inside);
            }
        }
    }

    let mut subcells = Vec::new();
    for node in &record.nodes {
        let NodeKind::Instance {
            cell: child,
            orient: node_orient,
            params,
            proto_text,
        } = &node.kind
        else {
            continue;
        };
        let child_record = design.cell(*child);
        if child_record.is_none() {
            tracing::warn!(cell = ?cell, child = ?child, "instance of missing cell");
        }
        subcells.push(SubcellRef {
            cell: *child,
            node: Some(node.id),
            offset: orient.apply(node.anchor),
            orient: node_orient.canonical(),
            shown_ports: shown_ports(record, node.id, child_record.as_deref()),
            expanded: record.is_expanded(node.id),
            label: child_record
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            label_text: proto_text.with_anchor(TextAnchor::Boxed),
            params: params.clone(),
        });
        for v in &node.vars {
            sink.poly(v, TextKind::Node, false, false);
        }
    }

    for v in &record.vars {
        sink.poly(v, TextKind::Cell, false, true);
    }
    for e in &record.exports {
        let center = orient.apply(e.center);
        sink.top_only.push(Shape {
            layer: None,
            color: None,
            kind: ShapeKind::Text(TextShape {
                rect: GridRect::from_corners(center, center),
                anchor: e.descriptor.anchor().transformed(orient),
                descriptor: e.descriptor,
                text: e.name.clone(),
                kind: TextKind::Export,
                export: Some(e.id),
            }),
        });
    }

    for &(child, at, child_orient) in &extras.instances {
        subcells.push(SubcellRef {
            cell: child,
            node: None,
            offset: orient.apply(at),
            orient: child_orient,
            shown_ports: PortSet::default(),
            expanded: false,
            label: design.cell_name(child).unwrap_or_default(),
            label_text: TextDescriptor::default().with_anchor(TextAnchor::Boxed),
            params: Vec::new(),
        });
    }
    for extra in &extras.shapes {
        sink.shapes.push(transform_shape(extra, orient));
    }

    let ShapeSink {
        batches,
        mut shapes,
        mut top_only,
        ..
    } = sink;
    batches.drain_into(&mut shapes);
    let tech = design.technology();
    shapes.sort_by_key(|s| s.sort_key(tech));
    top_only.sort_by_key(|s| s.sort_key(tech));

    CellGeometry {
        cell,
        orient,
        bounds: orient.apply_rect(bounds),
        shapes,
        top_only,
        subcells,
        parameterized: record.is_parameterized(),
    }
}

/// Apply an orientation to a shape stored in cell coordinates.
pub(crate) fn transform_shape(shape: &Shape, orient: Orient) -> Shape {
    let p = |q: GridPoint| orient.apply(q);
    let kind = match &shape.kind {
        ShapeKind::Boxes { rects, pure_layer } => ShapeKind::Boxes {
            rects: rects.iter().map(|r| orient.apply_rect(*r)).collect(),
            pure_layer: *pure_layer,
        },
        ShapeKind::Polygon { points } => ShapeKind::Polygon {
            points: points.iter().map(|q| p(*q)).collect(),
        },
        ShapeKind::Line { from, to, texture } => ShapeKind::Line {
            from: p(*from),
            to: p(*to),
            texture: *texture,
        },
        ShapeKind::Circle {
            center,
            edge,
            nature,
        } => ShapeKind::Circle {
            center: p(*center),
            edge: p(*edge),
            nature: *nature,
        },
        ShapeKind::Arc {
            center,
            p1,
            p2,
            thick,
        } => {
            let (a, b) = if orient.mirror() { (p2, p1) } else { (p1, p2) };
            ShapeKind::Arc {
                center: p(*center),
                p1: p(*a),
                p2: p(*b),
                thick: *thick,
            }
        }
        ShapeKind::Text(t) => ShapeKind::Text(TextShape {
            rect: orient.apply_rect(t.rect),
            anchor: t.anchor.transformed(orient),
            ..t.clone()
        }),
        ShapeKind::Cross { at, small } => ShapeKind::Cross {
            at: p(*at),
            small: *small,
        },
    };
    Shape {
        layer: shape.layer,
        color: shape.color,
        kind,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/builder.rs"]
mod tests;
