use std::collections::HashMap;
use std::sync::Arc;

use crate::bitmap::cache::{BitmapCache, OffscreenExtent, Resolution};
use crate::design::context::VarContext;
use crate::design::model::NodeKind;
use crate::design::snapshot::DesignSnapshot;
use crate::design::text::TextAnchor;
use crate::foundation::core::{CellId, ClipRect, GridPoint, GridRect, LayerId, Rgb8};
use crate::foundation::error::{RasterError, RasterResult};
use crate::foundation::orient::Orient;
use crate::geometry::cache::GeometryCache;
use crate::geometry::shape::{Shape, ShapeKind, SubcellRef, TextKind, TextShape};
use crate::raster::clip::ScreenPoint;
use crate::raster::line::{LineTexture, draw_line};
use crate::raster::text::{ScreenRect, TextMetrics, TextRequest, TextSpool};
use crate::render::grid::draw_grid;
use crate::render::surface::{Canvas, PlaneSet, PlaneTarget, RenderedPlanes, ScreenMap, stipples};
use crate::session::opts::{DisplayColors, LabelDisplay, LayerVisibility, RenderOpts};
use crate::session::viewport::{Viewport, ViewportInfo};

/// Relative text at or under this many pixels is skipped when absolute text is not drawn.
const MIN_RELATIVE_TEXT: f64 = 5.0;

/// Everything one pass reads.
pub(crate) struct PassInput<'a> {
    pub(crate) design: &'a dyn DesignSnapshot,
    pub(crate) top: CellId,
    pub(crate) viewport: &'a Viewport,
    pub(crate) opts: &'a RenderOpts,
    pub(crate) colors: &'a DisplayColors,
    pub(crate) layers: &'a LayerVisibility,
    pub(crate) metrics: &'a dyn TextMetrics,
}

/// Work done by one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassCounters {
    /// Cells whose geometry was walked, offscreen renders included.
    pub cells_drawn: u64,
    /// Offscreen bitmaps rendered.
    pub bitmaps_created: u64,
    /// Instances satisfied by copying an already rendered bitmap.
    pub bitmaps_copied: u64,
    /// Unexpanded instances drawn as outlines.
    pub outlines: u64,
}

/// Screen box `(lx, hx, top, bottom)` of a grid rectangle.
fn screen_box(map: &ScreenMap, r: GridRect) -> (i32, i32, i32, i32) {
    (
        map.x(r.lx as f64),
        map.x(r.hx as f64),
        map.y(r.hy as f64),
        map.y(r.ly as f64),
    )
}

fn midpoint(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}

fn outside(clip: ClipRect, (lx, hx, top, bottom): (i32, i32, i32, i32)) -> bool {
    hx < clip.lx || lx > clip.hx || bottom < clip.ly || top > clip.hy
}

/// Name up to its first character that is not alphanumeric.
fn short_name(name: &str) -> &str {
    let end = name
        .find(|c: char| !c.is_alphanumeric())
        .unwrap_or(name.len());
    if end == 0 { name } else { &name[..end] }
}

struct Drawer<'p, 'a> {
    input: &'p PassInput<'a>,
    geometry: &'p mut GeometryCache,
    bitmaps: &'p mut BitmapCache,
    scale: f64,
    text_scale: f64,
    can_draw_text: bool,
    relative_floor: f64,
    min_feature: f64,
    width: i32,
    height: i32,
    parameterized: HashMap<CellId, bool>,
    counters: PassCounters,
}

impl Drawer<'_, '_> {
    /// Whether any cell in the subtree evaluates parameters.
    fn subtree_parameterized(&mut self, cell: CellId) -> bool {
        if let Some(v) = self.parameterized.get(&cell) {
            return *v;
        }
        let v = match self.input.design.cell(cell) {
            Some(rec) => {
                rec.is_parameterized() || {
                    let children: Vec<CellId> = rec.children().collect();
                    children.into_iter().any(|c| self.subtree_parameterized(c))
                }
            }
            None => false,
        };
        self.parameterized.insert(cell, v);
        v
    }

    /// Usage pre-pass: count visible expanded instances small enough to cache.
    fn count_usage(&mut self, map: &ScreenMap, cell: CellId, orient: Orient, offset: GridPoint) {
        let design = self.input.design;
        let Some(rec) = design.cell(cell) else {
            return;
        };
        for node in &rec.nodes {
            let NodeKind::Instance {
                cell: child,
                orient: node_orient,
                ..
            } = &node.kind
            else {
                continue;
            };
            if !(self.input.opts.full_instantiate || rec.is_expanded(node.id)) {
                continue;
            }
            let Some(bounds) = design.cell_bounds(*child) else {
                continue;
            };
            if (bounds.width().max(bounds.height()) as f64) < self.min_feature {
                continue;
            }
            let child_orient = orient.concat(node_orient.canonical());
            let anchor = orient.apply(node.anchor);
            let at = offset.offset(anchor.x, anchor.y);
            let sb = screen_box(map, child_orient.apply_rect(bounds).offset(at.x, at.y));
            let sw = i64::from(sb.1) - i64::from(sb.0);
            let sh = i64::from(sb.3) - i64::from(sb.2);
            if sw <= 0 || sh <= 0 || sb.0 > self.width || sb.1 < 0 || sb.2 > self.height || sb.3 < 0 {
                continue;
            }
            let small = sw < i64::from(self.width / 2) && sh < i64::from(self.height / 2);
            if small && !self.bitmaps.count((*child, child_orient)) {
                continue;
            }
            self.count_usage(map, *child, child_orient, at);
        }
    }

    fn draw_cell(
        &mut self,
        canvas: &mut Canvas,
        cell: CellId,
        orient: Orient,
        offset: GridPoint,
        ctx: &VarContext,
        top_level: bool,
    ) {
        self.counters.cells_drawn += 1;
        let geo = self
            .geometry
            .ensure_current(self.input.design, cell, orient, ctx);
        let design = self.input.design;

        for s in geo.subcells() {
            let child_orient = orient.concat(s.orient);
            let at = offset.offset(s.offset.x, s.offset.y);
            let bounds = design.cell_bounds(s.cell).unwrap_or_default();
            let sb = screen_box(&canvas.map, child_orient.apply_rect(bounds).offset(at.x, at.y));
            if outside(canvas.clip, sb) {
                continue;
            }
            let expanded = s.expanded || self.input.opts.full_instantiate;
            if expanded {
                let child_ctx = ctx.push(s.cell, &s.params);
                if !self.draw_cached(canvas, s.cell, child_orient, at, &child_ctx) {
                    tracing::trace!(cell = s.cell.0, "drawing instance directly");
                    self.draw_cell(canvas, s.cell, child_orient, at, &child_ctx, false);
                }
            } else {
                self.draw_outline(canvas, s, sb);
            }
            if top_level && self.can_draw_text && canvas.text.is_some() {
                self.draw_ports(canvas, s, child_orient, at);
            }
        }

        self.draw_list(canvas, geo.shapes(), offset);
        if top_level {
            self.draw_list(canvas, geo.top_only_shapes(), offset);
        }
    }

    /// Try the bitmap cache; `false` means the caller draws the subtree itself.
    fn draw_cached(
        &mut self,
        canvas: &mut Canvas,
        cell: CellId,
        orient: Orient,
        at: GridPoint,
        ctx: &VarContext,
    ) -> bool {
        let design = self.input.design;
        let Some(rec) = design.cell(cell) else {
            return false;
        };
        if rec.is_icon || self.subtree_parameterized(cell) {
            return false;
        }
        let bounds = orient.apply_rect(design.cell_bounds(cell).unwrap_or_default());
        let extent = OffscreenExtent::of(bounds, self.scale);
        let divisor = self.input.opts.large_instance_divisor.max(1) as i32;
        let too_large = extent.is_some_and(|e| {
            e.hx - e.lx >= self.width / divisor && e.hy - e.ly >= self.height / divisor
        });
        let key = (cell, orient);
        match self.bitmaps.resolve(key, extent, too_large) {
            Resolution::Direct => false,
            Resolution::Copy(bitmap) => {
                self.counters.bitmaps_copied += 1;
                canvas.copy_offscreen(&bitmap, at);
                true
            }
            Resolution::Render(ext) => {
                let layer_count = design.technology().layer_count();
                let mut off = Canvas::offscreen(ext, self.scale, layer_count);
                self.draw_cell(&mut off, cell, orient, GridPoint::default(), ctx, false);
                let bitmap = Arc::new(off.into_bitmap(ext));
                self.counters.bitmaps_created += 1;
                tracing::trace!(cell = cell.0, w = ext.width(), h = ext.height(), "bitmap rendered");
                self.bitmaps.store(key, Arc::clone(&bitmap));
                canvas.copy_offscreen(&bitmap, at);
                true
            }
        }
    }

    fn draw_outline(&mut self, canvas: &mut Canvas, s: &SubcellRef, sb: (i32, i32, i32, i32)) {
        self.counters.outlines += 1;
        let (lx, hx, top, bottom) = sb;
        let clip = canvas.clip;
        {
            let mut raster = canvas.raster(PlaneTarget::Instance);
            let raster = raster.get();
            let corners = [
                ScreenPoint::new(lx, top),
                ScreenPoint::new(hx, top),
                ScreenPoint::new(hx, bottom),
                ScreenPoint::new(lx, bottom),
            ];
            for i in 0..4 {
                draw_line(raster, corners[i], corners[(i + 1) % 4], LineTexture::Solid, clip);
            }
        }
        if !self.can_draw_text || !self.input.opts.text_visibility.shows(TextKind::Instance) {
            return;
        }
        let Some(spool) = canvas.text.as_mut() else {
            return;
        };
        let d = s.label_text;
        spool.push_text(
            TextRequest {
                text: &s.label,
                rect: ScreenRect::from_corners(lx, top, hx, bottom),
                anchor: TextAnchor::Boxed,
                rotation: d.rotation(),
                true_size: d.true_size(self.scale, self.text_scale),
                italic: d.is_italic(),
                bold: d.is_bold(),
                underline: d.is_underline(),
                face: d.face(),
                color: self.input.colors.text,
            },
            self.input.metrics,
        );
    }

    /// Labels of the child's exports that nothing else in the parent shows.
    fn draw_ports(&mut self, canvas: &mut Canvas, s: &SubcellRef, orient: Orient, at: GridPoint) {
        let opts = self.input.opts;
        if !opts.text_visibility.shows(TextKind::Port) {
            return;
        }
        let Some(child) = self.input.design.cell(s.cell) else {
            return;
        };
        let map = canvas.map;
        let Some(spool) = canvas.text.as_mut() else {
            return;
        };
        let color = self.input.colors.text;
        for e in &child.exports {
            if s.shown_ports.contains(e.id) {
                continue;
            }
            let p = map.point(orient.apply(e.center), at);
            let text = match opts.port_display {
                LabelDisplay::Cross => {
                    spool.push_cross(p.x, p.y, color);
                    continue;
                }
                LabelDisplay::Short => short_name(&e.name),
                LabelDisplay::Full => e.name.as_str(),
            };
            let d = e.descriptor;
            spool.push_text(
                TextRequest {
                    text,
                    rect: ScreenRect::new(p.x, p.y, 0, 0),
                    anchor: d.anchor().transformed(orient),
                    rotation: orient.apply_text_rotation(d.rotation()),
                    true_size: d.true_size(self.scale, self.text_scale),
                    italic: d.is_italic(),
                    bold: d.is_bold(),
                    underline: d.is_underline(),
                    face: d.face(),
                    color,
                },
                self.input.metrics,
            );
        }
    }

    fn draw_list(&mut self, canvas: &mut Canvas, shapes: &[Shape], offset: GridPoint) {
        for shape in shapes {
            if let Some(layer) = shape.layer
                && !self.input.layers.is_visible(layer)
            {
                continue;
            }
            match &shape.kind {
                ShapeKind::Text(t) => self.draw_text(canvas, shape.layer, t, offset),
                _ => canvas.draw_shape(shape, offset),
            }
        }
    }

    fn draw_text(&mut self, canvas: &mut Canvas, layer: Option<LayerId>, t: &TextShape, offset: GridPoint) {
        let input = self.input;
        if !input.opts.text_visibility.shows(t.kind) {
            return;
        }
        let d = t.descriptor;
        let true_size = d.true_size(self.scale, self.text_scale);
        if d.is_absolute() {
            if !self.can_draw_text {
                return;
            }
        } else if true_size <= self.relative_floor {
            return;
        }
        let map = canvas.map;
        let Some(spool) = canvas.text.as_mut() else {
            return;
        };
        let r = t.rect.offset(offset.x, offset.y);
        let (lx, hx, top, bottom) = screen_box(&map, r);
        let mut text = t.text.as_str();
        let mut color = layer
            .and_then(|l| input.design.technology().layer(l))
            .map_or(input.colors.text, |info| info.color);
        if t.kind == TextKind::Export && t.export.is_some() {
            color = input.colors.text;
            match input.opts.export_display {
                LabelDisplay::Cross => {
                    spool.push_cross(midpoint(lx, hx), midpoint(top, bottom), color);
                    return;
                }
                LabelDisplay::Short => text = short_name(text),
                LabelDisplay::Full => {}
            }
        }
        push_text_shape(spool, input.metrics, text, ScreenRect::from_corners(lx, top, hx, bottom), t, true_size, color);
    }
}

fn push_text_shape(
    spool: &mut TextSpool,
    metrics: &dyn TextMetrics,
    text: &str,
    rect: ScreenRect,
    t: &TextShape,
    true_size: f64,
    color: Rgb8,
) {
    let d = t.descriptor;
    spool.push_text(
        TextRequest {
            text,
            rect,
            anchor: t.anchor,
            rotation: d.rotation(),
            true_size,
            italic: d.is_italic(),
            bold: d.is_bold(),
            underline: d.is_underline(),
            face: d.face(),
            color,
        },
        metrics,
    );
}

/// Draw `input.top` into fresh planes.
///
/// A usage pre-pass decides which repeated instances get offscreen bitmaps; the walk then draws
/// subcells first, then the cell's own shapes, then top-only shapes at the top level.
#[tracing::instrument(level = "debug", skip_all, fields(top = input.top.0))]
pub(crate) fn render_pass(
    input: &PassInput<'_>,
    geometry: &mut GeometryCache,
    bitmaps: &mut BitmapCache,
) -> RasterResult<(RenderedPlanes, PassCounters)> {
    let vp = input.viewport;
    let width = i32::try_from(vp.width()).map_err(|_| RasterError::validation("viewport too wide"))?;
    let height = i32::try_from(vp.height()).map_err(|_| RasterError::validation("viewport too tall"))?;
    let clip = vp.clip()?;
    let scale = vp.scale();
    let opts = input.opts;
    let tech = input.design.technology();
    if input.design.cell(input.top).is_none() {
        tracing::warn!(cell = input.top.0, "top cell is missing, rendering empty");
    }

    let map = ScreenMap::centered(width, height, vp.center(), scale);
    let patterned = scale > opts.patterned_scale_limit;
    let mut canvas = Canvas::new(
        PlaneSet::new(width, height, tech.layer_count()),
        map,
        clip,
        Some(TextSpool::new(width, height, opts.min_text_size, opts.max_text_size)),
        stipples(tech, patterned),
    );
    if let Some(grid) = &opts.grid {
        draw_grid(&mut canvas, grid);
    }

    bitmaps.begin_pass(scale, opts.singleton_quota);
    let can_draw_text = scale > 1.0;
    let mut drawer = Drawer {
        input,
        geometry,
        bitmaps,
        scale,
        text_scale: vp.text_scale(),
        can_draw_text,
        relative_floor: if can_draw_text { 0.0 } else { MIN_RELATIVE_TEXT },
        min_feature: 2.0 / scale,
        width,
        height,
        parameterized: HashMap::new(),
        counters: PassCounters::default(),
    };
    drawer.count_usage(&map, input.top, Orient::IDENT, GridPoint::default());
    let ctx = vp.context().clone();
    drawer.draw_cell(&mut canvas, input.top, Orient::IDENT, GridPoint::default(), &ctx, true);
    let counters = drawer.counters;
    tracing::debug!(
        cells = counters.cells_drawn,
        created = counters.bitmaps_created,
        copied = counters.bitmaps_copied,
        "render pass done"
    );
    Ok((canvas.into_planes(), counters))
}

#[cfg(test)]
#[path = "../../tests/unit/render/drawing.rs"]
mod tests;
