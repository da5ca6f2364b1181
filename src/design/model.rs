use std::collections::BTreeSet;

use crate::design::text::TextDescriptor;
use crate::foundation::core::{CellId, ExportId, GridPoint, GridRect, LayerId, NodeId, Rgb8};
use crate::foundation::orient::Orientation;
use crate::raster::line::LineTexture;

/// Drawing style of a stored polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolyStyle {
    /// Filled polygon (a 4-point axis-aligned one becomes a box).
    Filled,
    /// Closed outline.
    Closed,
    /// Open polyline with the given texture.
    Opened(LineTexture),
    /// Disjoint segments taken pairwise.
    Vectors,
    /// Box outline with both diagonals.
    Crossed,
    /// Circle outline through `points[1]` around `points[0]`.
    Circle,
    /// Thick circle outline.
    ThickCircle,
    /// Filled disc.
    Disc,
    /// Arc around `points[0]` from `points[1]` to `points[2]`.
    CircleArc,
    /// Thick arc.
    ThickCircleArc,
    /// Small cross marker at `points[0]`.
    Cross,
    /// Large cross marker at `points[0]`.
    BigCross,
    /// Text anchored in the bounds of `points`, styled by the poly's descriptor.
    Text,
}

/// Text payload of a text poly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextContent {
    /// Fixed string.
    Literal(String),
    /// Value of an instance parameter, resolved per evaluation context.
    Param(String),
}

/// One poly of a node, arc or cell, in cell coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyRecord {
    /// Drawing style.
    pub style: PolyStyle,
    /// Points in grid units.
    pub points: Vec<GridPoint>,
    /// Owning layer; `None` draws with the color override on the instance plane.
    pub layer: Option<LayerId>,
    /// Direct color override.
    pub color: Option<Rgb8>,
    /// Text payload for [`PolyStyle::Text`].
    pub text: Option<TextContent>,
    /// Text style.
    pub descriptor: TextDescriptor,
}

impl PolyRecord {
    /// Poly with the given style and points and no layer.
    pub fn new(style: PolyStyle, points: Vec<GridPoint>) -> Self {
        Self {
            style,
            points,
            layer: None,
            color: None,
            text: None,
            descriptor: TextDescriptor::default(),
        }
    }

    /// Filled axis-aligned rectangle.
    pub fn rect(layer: LayerId, r: GridRect) -> Self {
        Self::new(
            PolyStyle::Filled,
            vec![
                GridPoint::new(r.lx, r.ly),
                GridPoint::new(r.hx, r.ly),
                GridPoint::new(r.hx, r.hy),
                GridPoint::new(r.lx, r.hy),
            ],
        )
        .with_layer(layer)
    }

    /// Text at a point.
    pub fn text(at: GridPoint, content: TextContent, descriptor: TextDescriptor) -> Self {
        Self {
            text: Some(content),
            descriptor,
            ..Self::new(PolyStyle::Text, vec![at])
        }
    }

    /// Set the layer.
    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Set the color override.
    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = Some(color);
        self
    }

    /// Bounds of the points, if any.
    pub fn bounds(&self) -> Option<GridRect> {
        let b = GridRect::bounding(&self.points)?;
        Some(match self.style {
            PolyStyle::Circle | PolyStyle::ThickCircle | PolyStyle::Disc
                if self.points.len() >= 2 =>
            {
                let c = self.points[0];
                let e = self.points[1];
                let r = ((e.x - c.x) as f64).hypot((e.y - c.y) as f64).ceil() as i64;
                GridRect {
                    lx: c.x - r,
                    ly: c.y - r,
                    hx: c.x + r,
                    hy: c.y + r,
                }
            }
            _ => b,
        })
    }
}

/// A connection point: a node plus, on instance nodes, the child export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    /// Node in the same cell.
    pub node: NodeId,
    /// Export of the instantiated cell; `None` on primitive nodes.
    pub port: Option<ExportId>,
}

/// What a node is.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A primitive node with its own geometry.
    Primitive {
        /// Geometry in cell coordinates.
        polys: Vec<PolyRecord>,
        /// Pure-layer nodes draw only their layer, never text or outlines.
        pure_layer: bool,
        /// Drawn only when the owning cell is the top of the rendered hierarchy.
        vis_inside: bool,
        /// Invisible-pin style carrier of annotation text.
        annotation: bool,
    },
    /// An instance of another cell.
    Instance {
        /// Instantiated cell.
        cell: CellId,
        /// Orientation of the instance.
        orient: Orientation,
        /// Parameter bindings pushed onto the evaluation context.
        params: Vec<(String, String)>,
        /// Style of the instance name shown on unexpanded instances.
        proto_text: TextDescriptor,
    },
}

/// A node instance in a cell.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    /// Identity inside the cell.
    pub id: NodeId,
    /// Node name.
    pub name: String,
    /// Placement point; instances are positioned here.
    pub anchor: GridPoint,
    /// Primitive or instance.
    pub kind: NodeKind,
    /// Displayable text variables.
    pub vars: Vec<PolyRecord>,
    /// Carries embedded-code variables.
    pub has_code: bool,
}

impl NodeRecord {
    /// Instantiated cell, for instance nodes.
    pub fn instance_cell(&self) -> Option<CellId> {
        match self.kind {
            NodeKind::Instance { cell, .. } => Some(cell),
            NodeKind::Primitive { .. } => None,
        }
    }
}

/// An arc instance in a cell.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcRecord {
    /// Arc name.
    pub name: String,
    /// Geometry in cell coordinates.
    pub polys: Vec<PolyRecord>,
    /// Both connected ports.
    pub ends: [PortRef; 2],
    /// Displayable text variables.
    pub vars: Vec<PolyRecord>,
    /// Carries embedded-code variables.
    pub has_code: bool,
}

/// An export of a cell.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRecord {
    /// Chronological index.
    pub id: ExportId,
    /// Export name.
    pub name: String,
    /// Label position.
    pub center: GridPoint,
    /// Label style.
    pub descriptor: TextDescriptor,
    /// Port this export re-exports.
    pub original: PortRef,
    /// Draw the label even inside instances.
    pub always_drawn: bool,
    /// Bus-pin export whose wiring depends on evaluation.
    pub bus_pin: bool,
}

/// A declared cell parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Value used when no instance binds the parameter.
    pub default: String,
}

/// Immutable contents of one cell revision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellRecord {
    /// Cell name.
    pub name: String,
    /// Icon cells are never bitmap-cached and never greeked by feature size.
    pub is_icon: bool,
    /// Declared parameters.
    pub params: Vec<ParamDecl>,
    /// Nodes, indexed by [`NodeId`].
    pub nodes: Vec<NodeRecord>,
    /// Arcs.
    pub arcs: Vec<ArcRecord>,
    /// Exports, indexed by [`ExportId`].
    pub exports: Vec<ExportRecord>,
    /// Cell-level text variables.
    pub vars: Vec<PolyRecord>,
    /// Instance nodes whose contents are drawn.
    pub expanded: BTreeSet<NodeId>,
}

impl CellRecord {
    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        match self.nodes.get(id.0 as usize) {
            Some(n) if n.id == id => Some(n),
            _ => self.nodes.iter().find(|n| n.id == id),
        }
    }

    /// Return `true` when the instance node draws its contents.
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Return `true` when the geometry depends on an evaluation context rather than structure alone.
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
            || self.exports.iter().any(|e| e.bus_pin)
            || self.nodes.iter().any(|n| n.has_code)
            || self.arcs.iter().any(|a| a.has_code)
    }

    /// Declared default of a parameter.
    pub fn param_default(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.default.as_str())
    }

    /// Child cells referenced by instance nodes, in node order.
    pub fn children(&self) -> impl Iterator<Item = CellId> + '_ {
        self.nodes.iter().filter_map(NodeRecord::instance_cell)
    }

    /// Bounds of the cell's own geometry plus its placed children, text excluded.
    ///
    /// `child_bounds` supplies the bounds of instantiated cells; unknown children contribute
    /// nothing. An empty cell has a zero rectangle at the origin.
    pub fn compute_bounds(&self, child_bounds: impl Fn(CellId) -> Option<GridRect>) -> GridRect {
        let mut acc: Option<GridRect> = None;
        let mut add = |r: GridRect| {
            acc = Some(acc.map_or(r, |a| a.union(r)));
        };
        let geometric = |p: &&PolyRecord| p.style != PolyStyle::Text;
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Primitive { polys, .. } => {
                    for b in polys.iter().filter(geometric).filter_map(PolyRecord::bounds) {
                        add(b);
                    }
                }
                NodeKind::Instance { cell, orient, .. } => {
                    if let Some(b) = child_bounds(*cell) {
                        let placed = orient.canonical().apply_rect(b);
                        add(placed.offset(node.anchor.x, node.anchor.y));
                    }
                }
            }
        }
        for arc in &self.arcs {
            for b in arc.polys.iter().filter(geometric).filter_map(PolyRecord::bounds) {
                add(b);
            }
        }
        acc.unwrap_or_default()
    }
}
