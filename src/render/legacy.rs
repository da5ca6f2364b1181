use crate::design::tech::Technology;
use crate::foundation::core::Rgb8;
use crate::raster::plane::RasterPlane;
use crate::render::color::{brighten, dim};
use crate::render::compositor::stacking_order;
use crate::render::surface::RenderedPlanes;
use crate::session::opts::{DisplayColors, LayerVisibility};

/// Color-map compositor state: transparent bits index the map, opaque layers overwrite.
#[derive(Debug)]
pub(crate) struct LegacyPalette<'a> {
    color_map: Vec<Rgb8>,
    transparent: Vec<(&'a RasterPlane, usize)>,
    opaque: Vec<(&'a RasterPlane, Rgb8)>,
    overlays: Vec<(&'a RasterPlane, Rgb8)>,
    background: Rgb8,
}

/// Technology color map with non-highlighted entries dimmed and the rest brightened.
///
/// Entry 0 (nothing set) is kept. An entry stays bright when any of its bits belongs to a
/// highlighted transparent layer.
pub(crate) fn highlighted_color_map(tech: &Technology, layers: &LayerVisibility) -> Vec<Rgb8> {
    let map = tech.color_map();
    if !layers.any_highlighted() {
        return map.to_vec();
    }
    let dims_any = tech
        .layers()
        .any(|(id, info)| info.is_transparent() && !layers.is_highlighted(id));
    if !dims_any {
        return map.to_vec();
    }
    let mut bright_bits = 0usize;
    for (id, info) in tech.layers() {
        if info.is_transparent() && layers.is_highlighted(id) {
            bright_bits |= 1 << (info.transparent_index - 1);
        }
    }
    map.iter()
        .enumerate()
        .map(|(i, c)| match i {
            0 => *c,
            _ if i & bright_bits != 0 => brighten(*c),
            _ => dim(*c),
        })
        .collect()
}

impl<'a> LegacyPalette<'a> {
    pub(crate) fn new(
        planes: &'a RenderedPlanes,
        tech: &Technology,
        layers: &LayerVisibility,
        colors: &DisplayColors,
    ) -> Self {
        let color_map = highlighted_color_map(tech, layers);
        let index_mask = color_map.len().saturating_sub(1);
        let highlighting = layers.any_highlighted();
        let mut transparent = Vec::new();
        let mut opaque = Vec::new();
        for id in stacking_order(tech, layers, planes) {
            let (Some(info), Some(plane)) = (tech.layer(id), planes.layer(id)) else {
                continue;
            };
            if info.is_transparent() {
                transparent.push((plane, (1usize << (info.transparent_index - 1)) & index_mask));
            } else {
                let color = match (highlighting, layers.is_highlighted(id)) {
                    (false, _) => info.color,
                    (true, true) => brighten(info.color),
                    (true, false) => dim(info.color),
                };
                opaque.push((plane, color));
            }
        }
        let overlays = [
            planes.instance_plane().map(|p| (p, colors.instance)),
            planes.grid_plane().map(|p| (p, colors.grid)),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self {
            color_map,
            transparent,
            opaque,
            overlays,
            background: colors.background,
        }
    }

    /// Scratch for [`Self::compose_row`], sized for every plane it reads.
    pub(crate) fn row_buffer(&self) -> Vec<&'a [u32]> {
        Vec::with_capacity(self.overlays.len() + self.opaque.len() + self.transparent.len())
    }

    /// Color of the pixel at word `wi`, bit `bit` of rows split as overlay, opaque, transparent.
    fn pixel(
        &self,
        wi: usize,
        bit: u32,
        overlays: &[&[u32]],
        opaque: &[&[u32]],
        transparent: &[&[u32]],
    ) -> Rgb8 {
        if let Some(i) = overlays.iter().rposition(|r| r[wi] & bit != 0) {
            return self.overlays[i].1;
        }
        if let Some(i) = opaque.iter().rposition(|r| r[wi] & bit != 0) {
            return self.opaque[i].1;
        }
        let bits = transparent
            .iter()
            .zip(&self.transparent)
            .filter(|(r, _)| r[wi] & bit != 0)
            .fold(0usize, |acc, (_, (_, m))| acc | m);
        if bits == 0 {
            self.background
        } else {
            self.color_map.get(bits).copied().unwrap_or(self.background)
        }
    }

    /// Compose scanline `y`, reading each plane's row words once.
    pub(crate) fn compose_row(&self, rows: &mut Vec<&'a [u32]>, y: i32, out: &mut [u8]) {
        rows.clear();
        rows.extend(self.overlays.iter().map(|(p, _)| p.row(y)));
        rows.extend(self.opaque.iter().map(|(p, _)| p.row(y)));
        rows.extend(self.transparent.iter().map(|(p, _)| p.row(y)));
        let (overlays, rest) = rows.split_at(self.overlays.len());
        let (opaque, transparent) = rest.split_at(self.opaque.len());
        for (x, px) in out.chunks_exact_mut(4).enumerate() {
            let c = self.pixel(x >> 5, 1 << (x & 31), overlays, opaque, transparent);
            px.copy_from_slice(&[c.r, c.g, c.b, 255]);
        }
    }
}
