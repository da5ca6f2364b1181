use smallvec::SmallVec;

use crate::design::tech::Technology;
use crate::design::text::{TextAnchor, TextDescriptor};
use crate::foundation::core::{CellId, ExportId, GridPoint, GridRect, LayerId, NodeId, Rgb8};
use crate::foundation::orient::Orient;
use crate::raster::circle::CircleNature;
use crate::raster::line::LineTexture;

/// Source category of a piece of text; each category can be hidden separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Cell variables.
    Cell,
    /// Export labels and their variables.
    Export,
    /// Node variables.
    Node,
    /// Arc variables.
    Arc,
    /// Annotation text on invisible pins.
    Annotation,
    /// Names of unexpanded instances.
    Instance,
    /// Port labels of instances.
    Port,
}

/// Cached text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    /// Rectangle the text is anchored in.
    pub rect: GridRect,
    /// Anchor after orientation.
    pub anchor: TextAnchor,
    /// Style.
    pub descriptor: TextDescriptor,
    /// Resolved string.
    pub text: String,
    /// Category.
    pub kind: TextKind,
    /// Export this label belongs to.
    pub export: Option<ExportId>,
}

/// Geometry of one cached shape, in grid units of the owning cell's orientation.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// Batch of axis-aligned rectangles on one layer.
    Boxes {
        /// The rectangles.
        rects: Vec<GridRect>,
        /// From pure-layer nodes.
        pure_layer: bool,
    },
    /// Filled general polygon.
    Polygon {
        /// Vertices.
        points: Vec<GridPoint>,
    },
    /// Line segment.
    Line {
        /// Start.
        from: GridPoint,
        /// End.
        to: GridPoint,
        /// Stroke texture.
        texture: LineTexture,
    },
    /// Circle, thick circle or disc.
    Circle {
        /// Center.
        center: GridPoint,
        /// A point on the circle.
        edge: GridPoint,
        /// Rendering.
        nature: CircleNature,
    },
    /// Circular arc, counter-clockwise from `p1` to `p2`.
    Arc {
        /// Center.
        center: GridPoint,
        /// Start.
        p1: GridPoint,
        /// End.
        p2: GridPoint,
        /// Thick stroke.
        thick: bool,
    },
    /// Text run.
    Text(TextShape),
    /// Cross marker.
    Cross {
        /// Center.
        at: GridPoint,
        /// Small (3 px) or large (5 px).
        small: bool,
    },
}

/// One cached drawable.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    /// Layer plane to draw into; `None` draws on the instance plane.
    pub layer: Option<LayerId>,
    /// Direct color override.
    pub color: Option<Rgb8>,
    /// Geometry.
    pub kind: ShapeKind,
}

impl Shape {
    /// Return `true` for area fills.
    pub fn is_filled(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::Boxes { .. }
                | ShapeKind::Polygon { .. }
                | ShapeKind::Circle {
                    nature: CircleNature::Disc,
                    ..
                }
        )
    }

    /// Ordering key: outlines before fills, contacts before other layers, then by height.
    pub(crate) fn sort_key(&self, tech: &Technology) -> (bool, bool, i32) {
        let (contact, level) = match self.layer.and_then(|l| tech.layer(l)) {
            Some(info) => (info.function.contact, info.function.height),
            None => (false, 1000),
        };
        (self.is_filled(), !contact, level)
    }
}

/// Chronological export indices of a child that are drawn elsewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortSet(SmallVec<[u64; 2]>);

impl PortSet {
    /// Mark an export as shown.
    pub fn insert(&mut self, id: ExportId) {
        let word = (id.0 / 64) as usize;
        if self.0.len() <= word {
            self.0.resize(word + 1, 0);
        }
        self.0[word] |= 1 << (id.0 % 64);
    }

    /// Return `true` when the export is shown elsewhere.
    pub fn contains(&self, id: ExportId) -> bool {
        self.0
            .get((id.0 / 64) as usize)
            .is_some_and(|w| w & (1 << (id.0 % 64)) != 0)
    }

    /// Number of marked exports.
    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Return `true` when nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }
}

/// Reference to a child instance; the child is never flattened into its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct SubcellRef {
    /// Instantiated cell.
    pub cell: CellId,
    /// Instance node in the parent; `None` for injected instances.
    pub node: Option<NodeId>,
    /// Placement, already transformed by the parent's orientation.
    pub offset: GridPoint,
    /// The node's own canonical orientation.
    pub orient: Orient,
    /// Child exports connected or re-exported here.
    pub shown_ports: PortSet,
    /// Draw contents rather than an outline.
    pub expanded: bool,
    /// Label of the unexpanded outline.
    pub label: String,
    /// Style of the label.
    pub label_text: TextDescriptor,
    /// Parameter bindings for the child's evaluation context.
    pub params: Vec<(String, String)>,
}

/// Flattened own geometry of one cell in one canonical orientation.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGeometry {
    pub(crate) cell: CellId,
    pub(crate) orient: Orient,
    pub(crate) bounds: GridRect,
    pub(crate) shapes: Vec<Shape>,
    pub(crate) top_only: Vec<Shape>,
    pub(crate) subcells: Vec<SubcellRef>,
    pub(crate) parameterized: bool,
}

impl CellGeometry {
    /// Geometry of a missing cell.
    pub fn empty(cell: CellId, orient: Orient) -> Self {
        Self {
            cell,
            orient,
            bounds: GridRect::default(),
            shapes: Vec::new(),
            top_only: Vec::new(),
            subcells: Vec::new(),
            parameterized: false,
        }
    }

    /// Cell.
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// Orientation.
    pub fn orient(&self) -> Orient {
        self.orient
    }

    /// Bounds in this orientation.
    pub fn bounds(&self) -> GridRect {
        self.bounds
    }

    /// Shapes drawn at every level, in drawing order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Shapes drawn only when this cell is the top of the hierarchy.
    pub fn top_only_shapes(&self) -> &[Shape] {
        &self.top_only
    }

    /// Child references.
    pub fn subcells(&self) -> &[SubcellRef] {
        &self.subcells
    }

    /// Return `true` when built for one evaluation context only.
    pub fn is_parameterized(&self) -> bool {
        self.parameterized
    }
}
