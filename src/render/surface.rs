use crate::bitmap::cache::{OffscreenBitmap, OffscreenExtent};
use crate::design::tech::{OutlineStyle, Technology};
use crate::foundation::core::{ClipRect, GridPoint, LayerId};
use crate::foundation::math::round_i32;
use crate::geometry::shape::{Shape, ShapeKind};
use crate::raster::circle::{draw_arc, draw_circle};
use crate::raster::clip::ScreenPoint;
use crate::raster::line::{draw_box, draw_cross, draw_line};
use crate::raster::plane::{PatternedRaster, Raster, RasterPlane, SolidRaster};
use crate::raster::polygon::draw_polygon;
use crate::raster::text::{DeferredText, TextSpool};

/// Grid to pixel mapping: `sx = round((gx - base_x) * scale) + org_x`, `sy` flipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScreenMap {
    scale: f64,
    base_x: f64,
    base_y: f64,
    org_x: i32,
    org_y: i32,
}

impl ScreenMap {
    /// Main surface: `center` lands on pixel `(width / 2, height / 2)`.
    pub(crate) fn centered(width: i32, height: i32, center: (f64, f64), scale: f64) -> Self {
        Self {
            scale,
            base_x: center.0,
            base_y: center.1,
            org_x: width / 2,
            org_y: height / 2,
        }
    }

    /// Offscreen surface: the instance origin sits at `(-ext.lx, ext.hy)`.
    pub(crate) fn offscreen(ext: OffscreenExtent, scale: f64) -> Self {
        Self {
            scale,
            base_x: 0.0,
            base_y: 0.0,
            org_x: -ext.lx,
            org_y: ext.hy,
        }
    }

    pub(crate) fn scale(&self) -> f64 {
        self.scale
    }

    pub(crate) fn x(&self, gx: f64) -> i32 {
        round_i32((gx - self.base_x) * self.scale).saturating_add(self.org_x)
    }

    pub(crate) fn y(&self, gy: f64) -> i32 {
        self.org_y.saturating_sub(round_i32((gy - self.base_y) * self.scale))
    }

    /// Screen position of `p` placed at `at`.
    pub(crate) fn point(&self, p: GridPoint, at: GridPoint) -> ScreenPoint {
        ScreenPoint::new(self.x((p.x + at.x) as f64), self.y((p.y + at.y) as f64))
    }

    /// Grid X under a pixel column.
    pub(crate) fn grid_x(&self, sx: i32) -> f64 {
        f64::from(sx - self.org_x) / self.scale + self.base_x
    }

    /// Grid Y under a pixel row.
    pub(crate) fn grid_y(&self, sy: i32) -> f64 {
        f64::from(self.org_y - sy) / self.scale + self.base_y
    }
}

/// Stipple and outline of one layer while patterned display is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stipple {
    pub(crate) pattern: [u16; 16],
    pub(crate) outline: Option<OutlineStyle>,
}

/// Per-layer stipples for a pass; empty when fills are solid.
pub(crate) fn stipples(tech: &Technology, patterned: bool) -> Vec<Option<Stipple>> {
    if !patterned {
        return Vec::new();
    }
    tech.layers()
        .map(|(_, info)| {
            info.pattern.map(|pattern| Stipple {
                pattern,
                outline: info.outline,
            })
        })
        .collect()
}

/// Where a shape lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlaneTarget {
    Layer(LayerId),
    Instance,
    Grid,
}

/// Lazily allocated bit planes of one surface.
#[derive(Clone, Debug)]
pub(crate) struct PlaneSet {
    width: i32,
    height: i32,
    layers: Vec<Option<RasterPlane>>,
    instance: Option<RasterPlane>,
    grid: Option<RasterPlane>,
}

impl PlaneSet {
    pub(crate) fn new(width: i32, height: i32, layer_count: usize) -> Self {
        Self {
            width,
            height,
            layers: vec![None; layer_count],
            instance: None,
            grid: None,
        }
    }

    pub(crate) fn plane_mut(&mut self, target: PlaneTarget) -> &mut RasterPlane {
        let (w, h) = (self.width, self.height);
        let slot = match target {
            PlaneTarget::Layer(l) => {
                if self.layers.len() <= l.index() {
                    self.layers.resize(l.index() + 1, None);
                }
                &mut self.layers[l.index()]
            }
            PlaneTarget::Instance => &mut self.instance,
            PlaneTarget::Grid => &mut self.grid,
        };
        slot.get_or_insert_with(|| RasterPlane::new(w, h))
    }
}

/// Either flavor of raster over one plane.
pub(crate) enum AnyRaster<'a> {
    Solid(SolidRaster<'a>),
    Patterned(PatternedRaster<'a>),
}

impl AnyRaster<'_> {
    pub(crate) fn get(&mut self) -> &mut dyn Raster {
        match self {
            Self::Solid(r) => r,
            Self::Patterned(r) => r,
        }
    }
}

/// A drawing target: planes, mapping, clip and, on the main surface, the text spool.
#[derive(Debug)]
pub(crate) struct Canvas {
    pub(crate) planes: PlaneSet,
    pub(crate) map: ScreenMap,
    pub(crate) clip: ClipRect,
    pub(crate) text: Option<TextSpool>,
    stipples: Vec<Option<Stipple>>,
}

impl Canvas {
    pub(crate) fn new(
        planes: PlaneSet,
        map: ScreenMap,
        clip: ClipRect,
        text: Option<TextSpool>,
        stipples: Vec<Option<Stipple>>,
    ) -> Self {
        Self {
            planes,
            map,
            clip,
            text,
            stipples,
        }
    }

    /// Unpatterned surface without text covering `ext`.
    pub(crate) fn offscreen(ext: OffscreenExtent, scale: f64, layer_count: usize) -> Self {
        let (w, h) = (ext.width(), ext.height());
        Self::new(
            PlaneSet::new(w, h, layer_count),
            ScreenMap::offscreen(ext, scale),
            ClipRect {
                lx: 0,
                ly: 0,
                hx: w - 1,
                hy: h - 1,
            },
            None,
            Vec::new(),
        )
    }

    pub(crate) fn raster(&mut self, target: PlaneTarget) -> AnyRaster<'_> {
        let stipple = match target {
            PlaneTarget::Layer(l) => self.stipples.get(l.index()).copied().flatten(),
            _ => None,
        };
        let plane = self.planes.plane_mut(target);
        match stipple {
            Some(s) => AnyRaster::Patterned(PatternedRaster::new(plane, &s.pattern, s.outline)),
            None => AnyRaster::Solid(SolidRaster::new(plane)),
        }
    }

    /// Rasterize one non-text shape placed at `at`.
    pub(crate) fn draw_shape(&mut self, shape: &Shape, at: GridPoint) {
        let target = shape.layer.map_or(PlaneTarget::Instance, PlaneTarget::Layer);
        let map = self.map;
        let clip = self.clip;
        let mut raster = self.raster(target);
        let raster = raster.get();
        match &shape.kind {
            ShapeKind::Boxes { rects, .. } => {
                for r in rects {
                    let lx = map.x((r.lx + at.x) as f64);
                    let hx = map.x((r.hx + at.x) as f64).saturating_sub(1).max(lx);
                    let top = map.y((r.hy + at.y) as f64);
                    let bottom = map.y((r.ly + at.y) as f64).saturating_sub(1).max(top);
                    draw_box(raster, lx, hx, top, bottom, clip);
                }
            }
            ShapeKind::Polygon { points } => {
                let pts: Vec<ScreenPoint> = points.iter().map(|p| map.point(*p, at)).collect();
                draw_polygon(raster, &pts, clip);
            }
            ShapeKind::Line { from, to, texture } => {
                draw_line(raster, map.point(*from, at), map.point(*to, at), *texture, clip);
            }
            ShapeKind::Circle {
                center,
                edge,
                nature,
            } => draw_circle(raster, map.point(*center, at), map.point(*edge, at), *nature, clip),
            ShapeKind::Arc {
                center,
                p1,
                p2,
                thick,
            } => draw_arc(
                raster,
                map.point(*center, at),
                map.point(*p1, at),
                map.point(*p2, at),
                *thick,
                clip,
            ),
            ShapeKind::Cross { at: c, small } => {
                let p = map.point(*c, at);
                draw_cross(raster, p.x, p.y, if *small { 3 } else { 5 }, clip);
            }
            ShapeKind::Text(_) => {}
        }
    }

    /// OR a cached bitmap into this surface with the instance origin at grid point `at`.
    pub(crate) fn copy_offscreen(&mut self, bitmap: &OffscreenBitmap, at: GridPoint) {
        let ext = bitmap.extent;
        let dx = self.map.x(at.x as f64).saturating_add(ext.lx);
        let dy = self.map.y(at.y as f64).saturating_sub(ext.hy);
        let min_x = self.clip.lx.saturating_sub(dx).max(0);
        let max_x = self.clip.hx.saturating_sub(dx).min(ext.width() - 1);
        let min_y = self.clip.ly.saturating_sub(dy).max(0);
        let max_y = self.clip.hy.saturating_sub(dy).min(ext.height() - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }
        for (i, plane) in bitmap.layers.iter().enumerate() {
            let Some(plane) = plane else { continue };
            let mut raster = self.raster(PlaneTarget::Layer(LayerId(i as u16)));
            raster
                .get()
                .copy_bits(plane, min_x, max_x, min_y, max_y, dx, dy);
        }
        if let Some(plane) = &bitmap.instance {
            self.planes
                .plane_mut(PlaneTarget::Instance)
                .copy_bits(plane, min_x, max_x, min_y, max_y, dx, dy);
        }
    }

    pub(crate) fn into_bitmap(self, extent: OffscreenExtent) -> OffscreenBitmap {
        OffscreenBitmap {
            extent,
            layers: self.planes.layers,
            instance: self.planes.instance,
        }
    }

    pub(crate) fn into_planes(self) -> RenderedPlanes {
        RenderedPlanes {
            width: self.planes.width,
            height: self.planes.height,
            layers: self.planes.layers,
            instance: self.planes.instance,
            grid: self.planes.grid,
            text: self.text.map(TextSpool::into_items).unwrap_or_default(),
        }
    }
}

/// Bit planes and deferred text of one finished pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPlanes {
    width: i32,
    height: i32,
    layers: Vec<Option<RasterPlane>>,
    instance: Option<RasterPlane>,
    grid: Option<RasterPlane>,
    text: Vec<DeferredText>,
}

impl RenderedPlanes {
    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Plane of a layer, when anything was drawn on it.
    pub fn layer(&self, layer: LayerId) -> Option<&RasterPlane> {
        self.layers.get(layer.index()).and_then(Option::as_ref)
    }

    /// Allocated layer planes.
    pub fn layer_planes(&self) -> impl Iterator<Item = (LayerId, &RasterPlane)> {
        self.layers
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (LayerId(i as u16), p)))
    }

    /// Unexpanded instance outlines and layer-less shapes.
    pub fn instance_plane(&self) -> Option<&RasterPlane> {
        self.instance.as_ref()
    }

    /// Grid overlay.
    pub fn grid_plane(&self) -> Option<&RasterPlane> {
        self.grid.as_ref()
    }

    /// Deferred text in drawing order.
    pub fn text(&self) -> &[DeferredText] {
        &self.text
    }

    /// Set pixels of a layer.
    pub fn count_set(&self, layer: LayerId) -> u64 {
        self.layer(layer).map_or(0, RasterPlane::count_ones)
    }
}
