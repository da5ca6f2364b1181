use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

use crate::design::context::VarContext;
use crate::design::model::CellRecord;
use crate::design::snapshot::DesignSnapshot;
use crate::foundation::core::{CellId, GridPoint, GridRect, LayerId};
use crate::foundation::orient::Orient;
use crate::geometry::builder::{Extras, build_cell};
use crate::geometry::shape::{CellGeometry, Shape, ShapeKind};

/// What the cache last saw of one cell, plus its per-orientation entries.
#[derive(Debug)]
struct CellGroup {
    record: Arc<CellRecord>,
    bounds: GridRect,
    exports_sig: u64,
    parameterized: bool,
    entries: [Option<Arc<CellGeometry>>; 8],
    extras: Extras,
}

impl CellGroup {
    fn new(record: Arc<CellRecord>, bounds: GridRect) -> Self {
        Self {
            exports_sig: exports_signature(&record),
            parameterized: record.is_parameterized(),
            record,
            bounds,
            entries: Default::default(),
            extras: Extras::default(),
        }
    }

    /// Adopt a new revision; injected shapes belong to the old one and are dropped.
    fn reset(&mut self, record: Arc<CellRecord>, bounds: GridRect) {
        *self = Self::new(record, bounds);
    }

    fn clear_entries(&mut self) {
        self.entries = Default::default();
    }
}

/// Hash of everything about a cell's exports that its parents depend on.
fn exports_signature(record: &CellRecord) -> u64 {
    let mut h = Xxh3::new();
    for e in &record.exports {
        h.update(&e.id.0.to_le_bytes());
        h.update(e.name.as_bytes());
        h.update(&[0]);
        h.update(&e.center.x.to_le_bytes());
        h.update(&e.center.y.to_le_bytes());
        h.update(&[u8::from(e.always_drawn), u8::from(e.bus_pin)]);
    }
    h.digest()
}

/// Per cell and canonical orientation geometry, built lazily and reused across passes.
///
/// Entries hold only the cell's own shapes and references to its children. A cell whose
/// geometry depends on instance parameters is rebuilt on every request.
#[derive(Debug, Default)]
pub struct GeometryCache {
    groups: HashMap<CellId, CellGroup>,
    recomputes: u64,
}

impl GeometryCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entry builds since creation.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Number of stored (cell, orientation) entries.
    pub fn len(&self) -> usize {
        self.groups
            .values()
            .map(|g| g.entries.iter().flatten().count())
            .sum()
    }

    /// Return `true` when no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Stored entry, or an empty one when the pair was never built.
    pub fn lookup(&self, cell: CellId, orient: Orient) -> Arc<CellGeometry> {
        self.groups
            .get(&cell)
            .and_then(|g| g.entries[orient.index()].clone())
            .unwrap_or_else(|| Arc::new(CellGeometry::empty(cell, orient)))
    }

    /// Current geometry of `cell` in `orient`, rebuilding when the cell's revision moved on.
    ///
    /// Parameterized cells are built against `ctx` and never stored. Missing cells yield an
    /// empty geometry.
    #[tracing::instrument(level = "trace", skip(self, design, ctx))]
    pub fn ensure_current(
        &mut self,
        design: &dyn DesignSnapshot,
        cell: CellId,
        orient: Orient,
        ctx: &VarContext,
    ) -> Arc<CellGeometry> {
        let Some(record) = design.cell(cell) else {
            tracing::warn!(cell = cell.0, "geometry requested for a missing cell");
            return Arc::new(CellGeometry::empty(cell, orient));
        };
        let bounds = design.cell_bounds(cell).unwrap_or_default();

        let group = self
            .groups
            .entry(cell)
            .or_insert_with(|| CellGroup::new(Arc::clone(&record), bounds));
        if !Arc::ptr_eq(&group.record, &record) || group.bounds != bounds {
            tracing::debug!(cell = cell.0, "stale geometry, rebuilding");
            group.reset(Arc::clone(&record), bounds);
        }

        if group.parameterized {
            self.recomputes += 1;
            return Arc::new(build_cell(
                design,
                cell,
                &record,
                bounds,
                orient,
                ctx,
                &group.extras,
            ));
        }

        if let Some(hit) = &group.entries[orient.index()] {
            return Arc::clone(hit);
        }
        let built = Arc::new(build_cell(
            design,
            cell,
            &record,
            bounds,
            orient,
            &VarContext::root(),
            &group.extras,
        ));
        group.entries[orient.index()] = Some(Arc::clone(&built));
        self.recomputes += 1;
        built
    }

    /// Bring the cache in line with `design` and return the cells whose drawing may differ.
    ///
    /// `changed` names cells known to be edited even when their revision token is unchanged.
    /// Cells are visited children first; a parent is reported when one of its expanded children
    /// is, or when an unexpanded child's bounds or exports moved. With `expand_all` every
    /// instance counts as expanded, matching a full-instantiate render.
    #[tracing::instrument(level = "debug", skip(self, design))]
    pub fn propagate_invalidation(
        &mut self,
        design: &dyn DesignSnapshot,
        changed: &[CellId],
        expand_all: bool,
    ) -> BTreeSet<CellId> {
        let forced: BTreeSet<CellId> = changed.iter().copied().collect();
        let mut visible = BTreeSet::new();
        let mut moved_exports = BTreeSet::new();
        let mut moved_bounds = BTreeSet::new();
        let mut moved_params = BTreeSet::new();

        for id in design.cells_bottom_up() {
            let Some(record) = design.cell(id) else {
                self.groups.remove(&id);
                continue;
            };
            let bounds = design.cell_bounds(id).unwrap_or_default();
            let is_forced = forced.contains(&id);

            let Some(group) = self.groups.get_mut(&id) else {
                self.groups.insert(id, CellGroup::new(record, bounds));
                if is_forced {
                    moved_exports.insert(id);
                    moved_bounds.insert(id);
                    moved_params.insert(id);
                    visible.insert(id);
                }
                continue;
            };

            let mut changed_vis = false;
            if is_forced || !Arc::ptr_eq(&group.record, &record) {
                if exports_signature(&record) != group.exports_sig {
                    moved_exports.insert(id);
                }
                if bounds != group.bounds {
                    moved_bounds.insert(id);
                }
                if record.is_parameterized() != group.parameterized || record.is_icon {
                    moved_params.insert(id);
                }
                group.reset(record, bounds);
                changed_vis = true;
            } else if bounds != group.bounds {
                moved_bounds.insert(id);
                group.bounds = bounds;
                group.clear_entries();
                changed_vis = true;
            } else if group
                .record
                .children()
                .any(|c| moved_exports.contains(&c) || moved_params.contains(&c))
            {
                group.clear_entries();
            }

            if !changed_vis {
                let rec = &group.record;
                changed_vis = rec.nodes.iter().any(|n| match n.instance_cell() {
                    Some(c) if expand_all || rec.is_expanded(n.id) => visible.contains(&c),
                    Some(c) => moved_bounds.contains(&c) || moved_exports.contains(&c),
                    None => false,
                });
            }
            if changed_vis {
                tracing::trace!(cell = id.0, "appearance may have changed");
                visible.insert(id);
            }
        }

        let live = design.cell_count();
        self.groups.retain(|id, _| id.index() < live);
        tracing::debug!(changed = changed.len(), visible = visible.len(), "invalidation propagated");
        visible
    }

    /// Inject a rectangle into `cell`; it appears from the next rebuild on.
    pub fn add_box_to_cell(
        &mut self,
        design: &dyn DesignSnapshot,
        cell: CellId,
        layer: LayerId,
        rect: GridRect,
    ) {
        self.inject(design, cell, |extras| {
            extras.shapes.push(Shape {
                layer: Some(layer),
                color: None,
                kind: ShapeKind::Boxes {
                    rects: vec![rect],
                    pure_layer: false,
                },
            });
        });
    }

    /// Inject an unexpanded instance of `child` into `cell`.
    pub fn add_instance_to_cell(
        &mut self,
        design: &dyn DesignSnapshot,
        cell: CellId,
        child: CellId,
        at: GridPoint,
        orient: Orient,
    ) {
        self.inject(design, cell, |extras| extras.instances.push((child, at, orient)));
    }

    fn inject(&mut self, design: &dyn DesignSnapshot, cell: CellId, add: impl FnOnce(&mut Extras)) {
        let Some(record) = design.cell(cell) else {
            tracing::warn!(cell = cell.0, "cannot add geometry to a missing cell");
            return;
        };
        let bounds = design.cell_bounds(cell).unwrap_or_default();
        let group = self
            .groups
            .entry(cell)
            .or_insert_with(|| CellGroup::new(Arc::clone(&record), bounds));
        if !Arc::ptr_eq(&group.record, &record) || group.bounds != bounds {
            group.reset(record, bounds);
        }
        add(&mut group.extras);
        group.clear_entries();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/cache.rs"]
mod tests;
