use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::design::model::{
    ArcRecord, CellRecord, ExportRecord, NodeKind, NodeRecord, ParamDecl, PolyRecord, PolyStyle,
    PortRef, TextContent,
};
use crate::design::tech::{LayerFunction, LayerInfo, OutlineStyle, Technology};
use crate::design::text::TextDescriptorDef;
use crate::foundation::core::{CellId, ExportId, GridPoint, GridRect, NodeId, Rgb8};
use crate::foundation::error::{RasterError, RasterResult};
use crate::foundation::orient::Orientation;
use crate::raster::line::LineTexture;

/// Read-only view of a design revision.
///
/// The hierarchy is assumed acyclic. A cell's revision token is the identity of the
/// `Arc<CellRecord>` returned by [`DesignSnapshot::cell`]: a changed cell comes back as a
/// different allocation.
pub trait DesignSnapshot: Send + Sync {
    /// Layer table.
    fn technology(&self) -> &Technology;

    /// Number of cell ids; ids are dense in `0..cell_count()`.
    fn cell_count(&self) -> usize;

    /// Current record of a cell, `None` when the cell is missing or unlinked.
    fn cell(&self, id: CellId) -> Option<Arc<CellRecord>>;

    /// Bounds of a cell including its placed children.
    fn cell_bounds(&self, id: CellId) -> Option<GridRect>;

    /// All cells, every child before any of its parents.
    fn cells_bottom_up(&self) -> Vec<CellId>;

    /// Look up a cell by name.
    fn cell_by_name(&self, name: &str) -> Option<CellId>;

    /// Name of a cell.
    fn cell_name(&self, id: CellId) -> Option<String> {
        self.cell(id).map(|c| c.name.clone())
    }
}

/// In-memory design snapshot, loadable from JSON.
#[derive(Clone, Debug)]
pub struct MemoryDesign {
    tech: Arc<Technology>,
    cells: Vec<Arc<CellRecord>>,
    bounds: Vec<GridRect>,
    by_name: HashMap<String, CellId>,
    order: Vec<CellId>,
}

impl MemoryDesign {
    /// Build a snapshot; cell ids follow the order of `cells`.
    pub fn new(tech: Technology, cells: Vec<CellRecord>) -> RasterResult<Self> {
        Self::assemble(Arc::new(tech), cells.into_iter().map(Arc::new).collect())
    }

    /// Parse a design from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RasterResult<Self> {
        let def: DesignDef = serde_json::from_reader(r)
            .map_err(|e| RasterError::serde(format!("parse design JSON: {e}")))?;
        def.into_design()
    }

    /// Parse a design from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RasterError::validation(format!("open design JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// New revision with one cell replaced. Unchanged cells keep their revision token.
    pub fn replace_cell(&self, id: CellId, record: CellRecord) -> RasterResult<Self> {
        let mut cells = self.cells.clone();
        let slot = cells
            .get_mut(id.index())
            .ok_or_else(|| RasterError::validation(format!("unknown cell id {}", id.0)))?;
        *slot = Arc::new(record);
        Self::assemble(self.tech.clone(), cells)
    }

    /// Shared technology handle.
    pub fn technology_arc(&self) -> Arc<Technology> {
        self.tech.clone()
    }

    fn assemble(tech: Arc<Technology>, cells: Vec<Arc<CellRecord>>) -> RasterResult<Self> {
        let n = u32::try_from(cells.len())
            .map_err(|_| RasterError::validation("too many cells"))?;
        let mut by_name = HashMap::with_capacity(cells.len());
        for (i, c) in cells.iter().enumerate() {
            if by_name.insert(c.name.clone(), CellId(i as u32)).is_some() {
                return Err(RasterError::design(format!("duplicate cell name '{}'", c.name)));
            }
        }
        for c in &cells {
            check_cell(c, n, &tech)?;
        }

        let order = bottom_up(&cells)?;
        let mut bounds = vec![GridRect::default(); cells.len()];
        for id in &order {
            let b = cells[id.index()].compute_bounds(|child| bounds.get(child.index()).copied());
            bounds[id.index()] = b;
        }

        Ok(Self {
            tech,
            cells,
            bounds,
            by_name,
            order,
        })
    }
}

impl DesignSnapshot for MemoryDesign {
    fn technology(&self) -> &Technology {
        &self.tech
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, id: CellId) -> Option<Arc<CellRecord>> {
        self.cells.get(id.index()).cloned()
    }

    fn cell_bounds(&self, id: CellId) -> Option<GridRect> {
        self.bounds.get(id.index()).copied()
    }

    fn cells_bottom_up(&self) -> Vec<CellId> {
        self.order.clone()
    }

    fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.by_name.get(name).copied()
    }
}

fn check_cell(c: &CellRecord, n: u32, tech: &Technology) -> RasterResult<()> {
    let layers = tech.layer_count();
    let check_polys = |polys: &[PolyRecord]| -> RasterResult<()> {
        for p in polys {
            if let Some(l) = p.layer
                && l.index() >= layers
            {
                return Err(RasterError::design(format!(
                    "cell '{}' references unknown layer {}",
                    c.name, l.0
                )));
            }
        }
        Ok(())
    };
    for node in &c.nodes {
        if let NodeKind::Instance { cell, .. } = node.kind
            && cell.0 >= n
        {
            return Err(RasterError::design(format!(
                "cell '{}' node '{}' instantiates unknown cell id {}",
                c.name, node.name, cell.0
            )));
        }
        if let NodeKind::Primitive { polys, .. } = &node.kind {
            check_polys(polys)?;
        }
        check_polys(&node.vars)?;
    }
    for arc in &c.arcs {
        check_polys(&arc.polys)?;
    }
    check_polys(&c.vars)
}

/// Post-order over the instance graph; rejects cycles.
fn bottom_up(cells: &[Arc<CellRecord>]) -> RasterResult<Vec<CellId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Open,
        Done,
    }

    let kids: Vec<Vec<CellId>> = cells.iter().map(|c| c.children().collect()).collect();
    let mut marks = vec![Mark::New; cells.len()];
    let mut order = Vec::with_capacity(cells.len());
    for root in 0..cells.len() {
        if marks[root] != Mark::New {
            continue;
        }
        // (cell, next child position)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        marks[root] = Mark::Open;
        while let Some(top) = stack.last_mut() {
            let (cur, pos) = *top;
            top.1 += 1;
            match kids[cur].get(pos) {
                Some(child) => match marks[child.index()] {
                    Mark::New => {
                        marks[child.index()] = Mark::Open;
                        stack.push((child.index(), 0));
                    }
                    Mark::Open => {
                        return Err(RasterError::design(format!(
                            "cell '{}' instantiates itself through '{}'",
                            cells[child.index()].name, cells[cur].name
                        )));
                    }
                    Mark::Done => {}
                },
                None => {
                    marks[cur] = Mark::Done;
                    order.push(CellId(cur as u32));
                    stack.pop();
                }
            }
        }
    }
    Ok(order)
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DesignDef {
    technology: TechnologyDef,
    cells: Vec<CellDef>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TechnologyDef {
    name: String,
    layers: Vec<LayerDef>,
    #[serde(default)]
    color_map: Option<Vec<Rgb8>>,
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerDef {
    name: String,
    color: Rgb8,
    #[serde(default = "default_opacity")]
    opacity: f64,
    #[serde(default)]
    transparent: u8,
    #[serde(default)]
    function: LayerFunction,
    #[serde(default)]
    pattern: Option<[u16; 16]>,
    #[serde(default)]
    outline: Option<OutlineStyle>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CellDef {
    name: String,
    #[serde(default)]
    icon: bool,
    #[serde(default)]
    params: BTreeMap<String, String>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    arcs: Vec<ArcDef>,
    #[serde(default)]
    exports: Vec<ExportDef>,
    #[serde(default)]
    vars: Vec<PolyDef>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDef {
    name: String,
    #[serde(default)]
    at: GridPoint,
    kind: NodeKindDef,
    #[serde(default)]
    expanded: bool,
    #[serde(default)]
    vars: Vec<PolyDef>,
    #[serde(default)]
    has_code: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum NodeKindDef {
    Primitive {
        #[serde(default)]
        polys: Vec<PolyDef>,
        #[serde(default)]
        pure_layer: bool,
        #[serde(default)]
        vis_inside: bool,
        #[serde(default)]
        annotation: bool,
    },
    Instance {
        cell: String,
        #[serde(default)]
        orient: Orientation,
        #[serde(default)]
        params: BTreeMap<String, String>,
        #[serde(default)]
        text: TextDescriptorDef,
    },
}

#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum PolyStyleDef {
    #[default]
    Filled,
    Closed,
    Opened,
    OpenedDotted,
    OpenedDashed,
    OpenedThick,
    Vectors,
    Crossed,
    Circle,
    ThickCircle,
    Disc,
    CircleArc,
    ThickCircleArc,
    Cross,
    BigCross,
    Text,
}

impl PolyStyleDef {
    fn to_style(self) -> PolyStyle {
        match self {
            Self::Filled => PolyStyle::Filled,
            Self::Closed => PolyStyle::Closed,
            Self::Opened => PolyStyle::Opened(LineTexture::Solid),
            Self::OpenedDotted => PolyStyle::Opened(LineTexture::Dotted),
            Self::OpenedDashed => PolyStyle::Opened(LineTexture::Dashed),
            Self::OpenedThick => PolyStyle::Opened(LineTexture::Thick),
            Self::Vectors => PolyStyle::Vectors,
            Self::Crossed => PolyStyle::Crossed,
            Self::Circle => PolyStyle::Circle,
            Self::ThickCircle => PolyStyle::ThickCircle,
            Self::Disc => PolyStyle::Disc,
            Self::CircleArc => PolyStyle::CircleArc,
            Self::ThickCircleArc => PolyStyle::ThickCircleArc,
            Self::Cross => PolyStyle::Cross,
            Self::BigCross => PolyStyle::BigCross,
            Self::Text => PolyStyle::Text,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PolyDef {
    #[serde(default)]
    style: PolyStyleDef,
    #[serde(default)]
    points: Vec<GridPoint>,
    /// Shorthand for a 4-point rectangle.
    #[serde(default)]
    rect: Option<GridRect>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    color: Option<Rgb8>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    param: Option<String>,
    #[serde(default)]
    descriptor: TextDescriptorDef,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PortDef {
    node: String,
    #[serde(default)]
    port: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ArcDef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    polys: Vec<PolyDef>,
    ends: [PortDef; 2],
    #[serde(default)]
    vars: Vec<PolyDef>,
    #[serde(default)]
    has_code: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportDef {
    name: String,
    at: GridPoint,
    node: String,
    #[serde(default)]
    port: Option<String>,
    #[serde(default)]
    always_drawn: bool,
    #[serde(default)]
    bus_pin: bool,
    #[serde(default)]
    text: TextDescriptorDef,
}

/// Name tables shared by every cell conversion.
struct Names<'a> {
    tech: &'a Technology,
    cells: HashMap<&'a str, CellId>,
    exports: Vec<HashMap<&'a str, ExportId>>,
}

impl DesignDef {
    fn into_design(self) -> RasterResult<MemoryDesign> {
        let tech = self.technology.to_technology()?;
        let mut cells = HashMap::with_capacity(self.cells.len());
        let mut exports = Vec::with_capacity(self.cells.len());
        for (i, c) in self.cells.iter().enumerate() {
            let id = CellId(
                u32::try_from(i).map_err(|_| RasterError::validation("too many cells"))?,
            );
            if cells.insert(c.name.as_str(), id).is_some() {
                return Err(RasterError::design(format!("duplicate cell name '{}'", c.name)));
            }
            let mut by_name = HashMap::with_capacity(c.exports.len());
            for (j, e) in c.exports.iter().enumerate() {
                if by_name.insert(e.name.as_str(), ExportId(j as u32)).is_some() {
                    return Err(RasterError::design(format!(
                        "cell '{}' has duplicate export '{}'",
                        c.name, e.name
                    )));
                }
            }
            exports.push(by_name);
        }
        let names = Names {
            tech: &tech,
            cells,
            exports,
        };
        let records = self
            .cells
            .iter()
            .map(|c| c.to_record(&names))
            .collect::<RasterResult<Vec<_>>>()?;
        MemoryDesign::new(tech, records)
    }
}

impl TechnologyDef {
    fn to_technology(&self) -> RasterResult<Technology> {
        let layers = self
            .layers
            .iter()
            .map(|l| LayerInfo {
                name: l.name.clone(),
                function: l.function,
                color: l.color,
                opacity: l.opacity,
                transparent_index: l.transparent,
                pattern: l.pattern,
                outline: l.outline,
            })
            .collect();
        Technology::new(self.name.clone(), layers, self.color_map.clone())
    }
}

impl CellDef {
    fn to_record(&self, names: &Names<'_>) -> RasterResult<CellRecord> {
        let mut node_ids: HashMap<&str, NodeId> = HashMap::with_capacity(self.nodes.len());
        for (i, n) in self.nodes.iter().enumerate() {
            if node_ids.insert(n.name.as_str(), NodeId(i as u32)).is_some() {
                return Err(RasterError::design(format!(
                    "cell '{}' has duplicate node '{}'",
                    self.name, n.name
                )));
            }
        }

        let polys = |defs: &[PolyDef]| -> RasterResult<Vec<PolyRecord>> {
            defs.iter().map(|p| p.to_record(names.tech, &self.name)).collect()
        };

        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut expanded = BTreeSet::new();
        for (i, n) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            let kind = match &n.kind {
                NodeKindDef::Primitive {
                    polys: p,
                    pure_layer,
                    vis_inside,
                    annotation,
                } => NodeKind::Primitive {
                    polys: polys(p)?,
                    pure_layer: *pure_layer,
                    vis_inside: *vis_inside,
                    annotation: *annotation,
                },
                NodeKindDef::Instance {
                    cell,
                    orient,
                    params,
                    text,
                } => {
                    let cell = names.cells.get(cell.as_str()).copied().ok_or_else(|| {
                        RasterError::design(format!(
                            "cell '{}' node '{}' instantiates unknown cell '{cell}'",
                            self.name, n.name
                        ))
                    })?;
                    NodeKind::Instance {
                        cell,
                        orient: Orientation::new(orient.angle, orient.mirror_x, orient.mirror_y)?,
                        params: params.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                        proto_text: text.to_descriptor(),
                    }
                }
            };
            if n.expanded {
                expanded.insert(id);
            }
            nodes.push(NodeRecord {
                id,
                name: n.name.clone(),
                anchor: n.at,
                kind,
                vars: polys(&n.vars)?,
                has_code: n.has_code,
            });
        }

        let port = |p: &PortDef| -> RasterResult<PortRef> {
            let node = node_ids.get(p.node.as_str()).copied().ok_or_else(|| {
                RasterError::design(format!(
                    "cell '{}' references unknown node '{}'",
                    self.name, p.node
                ))
            })?;
            let child = nodes[node.0 as usize].instance_cell();
            let port = match (child, &p.port) {
                (Some(child), Some(name)) => Some(
                    names.exports[child.index()]
                        .get(name.as_str())
                        .copied()
                        .ok_or_else(|| {
                            RasterError::design(format!(
                                "cell '{}' node '{}' has no port '{name}'",
                                self.name, p.node
                            ))
                        })?,
                ),
                _ => None,
            };
            Ok(PortRef { node, port })
        };

        let arcs = self
            .arcs
            .iter()
            .map(|a| -> RasterResult<ArcRecord> {
                Ok(ArcRecord {
                    name: a.name.clone(),
                    polys: polys(&a.polys)?,
                    ends: [port(&a.ends[0])?, port(&a.ends[1])?],
                    vars: polys(&a.vars)?,
                    has_code: a.has_code,
                })
            })
            .collect::<RasterResult<Vec<_>>>()?;

        let exports = self
            .exports
            .iter()
            .enumerate()
            .map(|(j, e)| -> RasterResult<ExportRecord> {
                Ok(ExportRecord {
                    id: ExportId(j as u32),
                    name: e.name.clone(),
                    center: e.at,
                    descriptor: e.text.to_descriptor(),
                    original: port(&PortDef {
                        node: e.node.clone(),
                        port: e.port.clone(),
                    })?,
                    always_drawn: e.always_drawn,
                    bus_pin: e.bus_pin,
                })
            })
            .collect::<RasterResult<Vec<_>>>()?;

        Ok(CellRecord {
            name: self.name.clone(),
            is_icon: self.icon,
            params: self
                .params
                .iter()
                .map(|(name, default)| ParamDecl {
                    name: name.clone(),
                    default: default.clone(),
                })
                .collect(),
            nodes,
            arcs,
            exports,
            vars: polys(&self.vars)?,
            expanded,
        })
    }
}

impl PolyDef {
    fn to_record(&self, tech: &Technology, cell: &str) -> RasterResult<PolyRecord> {
        let layer = match &self.layer {
            None => None,
            Some(name) => Some(tech.layer_by_name(name).ok_or_else(|| {
                RasterError::design(format!("cell '{cell}' references unknown layer '{name}'"))
            })?),
        };
        let points = match self.rect {
            Some(r) => vec![
                GridPoint::new(r.lx, r.ly),
                GridPoint::new(r.hx, r.ly),
                GridPoint::new(r.hx, r.hy),
                GridPoint::new(r.lx, r.hy),
            ],
            None => self.points.clone(),
        };
        let text = match (&self.text, &self.param) {
            (Some(s), _) => Some(TextContent::Literal(s.clone())),
            (None, Some(p)) => Some(TextContent::Param(p.clone())),
            (None, None) => None,
        };
        Ok(PolyRecord {
            style: self.style.to_style(),
            points,
            layer,
            color: self.color,
            text,
            descriptor: self.descriptor.to_descriptor(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/design/snapshot.rs"]
mod tests;
