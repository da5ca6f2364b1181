use rayon::prelude::*;

use crate::design::tech::Technology;
use crate::foundation::core::{LayerId, Rgb8};
use crate::foundation::math::clamp_u8;
use crate::raster::plane::RasterPlane;
use crate::render::FrameRGBA;
use crate::render::legacy::LegacyPalette;
use crate::render::surface::RenderedPlanes;
use crate::session::opts::{CompositeMode, DisplayColors, LayerVisibility, RenderOpts};

/// Rows composed per work unit.
pub(crate) const STRIP_ROWS: usize = 2;

/// Stacking height with contacts lifted above, and metals lowered below, their neighbors.
pub(crate) fn lifted_height(tech: &Technology, layer: LayerId) -> i32 {
    tech.layer(layer).map_or(0, |info| {
        let f = info.function;
        if f.contact {
            f.height + 1
        } else if f.metal {
            f.height - 1
        } else {
            f.height
        }
    })
}

/// Drawn, visible layers bottom to top.
pub(crate) fn stacking_order(
    tech: &Technology,
    layers: &LayerVisibility,
    planes: &RenderedPlanes,
) -> Vec<LayerId> {
    let mut order: Vec<LayerId> = planes
        .layer_planes()
        .map(|(l, _)| l)
        .filter(|l| layers.is_visible(*l) && tech.layer(*l).is_some())
        .collect();
    order.sort_by_key(|l| (lifted_height(tech, *l), l.0));
    order
}

/// One blend step: premultiplied color in 1/256 channel units and inverse alpha out of 256.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlendColor {
    pub(crate) r: i32,
    pub(crate) g: i32,
    pub(crate) b: i32,
    pub(crate) inv_alpha: i32,
}

impl BlendColor {
    pub(crate) fn opaque(c: Rgb8) -> Self {
        Self {
            r: i32::from(c.r) << 8,
            g: i32::from(c.g) << 8,
            b: i32::from(c.b) << 8,
            inv_alpha: 0,
        }
    }

    /// Overcolor subtracts the background share instead of premultiplying, so thin stacks read
    /// closer to the layer color.
    pub(crate) fn layer(c: Rgb8, opacity: f64, background: Rgb8, overcolor: bool) -> Self {
        let inv = 1.0 - opacity;
        let chan = |v: u8, bg: u8| {
            let v = f64::from(v);
            let premul = if overcolor {
                v - f64::from(bg) * inv
            } else {
                v * opacity
            };
            (premul * 256.0).round() as i32
        };
        Self {
            r: chan(c.r, background.r),
            g: chan(c.g, background.g),
            b: chan(c.b, background.b),
            inv_alpha: (inv * 256.0).round() as i32,
        }
    }
}

/// Blend steps of the continuous compositor, bottom to top, with their planes.
pub(crate) fn blending_order<'a>(
    planes: &'a RenderedPlanes,
    tech: &Technology,
    layers: &LayerVisibility,
    colors: &DisplayColors,
    overcolor: bool,
) -> Vec<(&'a RasterPlane, BlendColor)> {
    let mut out = Vec::new();
    for id in stacking_order(tech, layers, planes) {
        let (Some(info), Some(plane)) = (tech.layer(id), planes.layer(id)) else {
            continue;
        };
        let opacity = layers.opacity(id, info.opacity);
        if opacity <= 0.0 {
            continue;
        }
        out.push((
            plane,
            BlendColor::layer(info.color, opacity, colors.background, overcolor),
        ));
    }
    if let Some(p) = planes.instance_plane() {
        out.push((p, BlendColor::opaque(colors.instance)));
    }
    if let Some(p) = planes.grid_plane() {
        out.push((p, BlendColor::opaque(colors.grid)));
    }
    out
}

fn store(px: &mut [u8], r: i32, g: i32, b: i32) {
    px[0] = clamp_u8(r >> 8);
    px[1] = clamp_u8(g >> 8);
    px[2] = clamp_u8(b >> 8);
    px[3] = 255;
}

/// Per-strip buffers of the continuous compositor.
#[derive(Debug, Default)]
struct RowWords<'a> {
    rows: Vec<&'a [u32]>,
    words: Vec<u32>,
}

fn compose_row_continuous<'a>(
    scratch: &mut RowWords<'a>,
    y: i32,
    out: &mut [u8],
    blends: &[(&'a RasterPlane, BlendColor)],
    background: Rgb8,
) {
    let width = out.len() / 4;
    let bg = BlendColor::opaque(background);
    let RowWords { rows, words } = scratch;
    rows.clear();
    rows.extend(blends.iter().map(|(p, _)| p.row(y)));
    words.clear();
    words.resize(rows.len(), 0);
    for wi in 0..width.div_ceil(32) {
        let mut any = 0;
        for (w, row) in words.iter_mut().zip(rows.iter()) {
            *w = row[wi];
            any |= *w;
        }
        let lo = wi * 32;
        let hi = (lo + 32).min(width);
        if any == 0 {
            for x in lo..hi {
                store(&mut out[x * 4..x * 4 + 4], bg.r, bg.g, bg.b);
            }
            continue;
        }
        for x in lo..hi {
            let bit = 1u32 << (x & 31);
            let (mut r, mut g, mut b) = (bg.r, bg.g, bg.b);
            for (w, (_, c)) in words.iter().zip(blends) {
                if w & bit != 0 {
                    r = c.r + ((r * c.inv_alpha) >> 8);
                    g = c.g + ((g * c.inv_alpha) >> 8);
                    b = c.b + ((b * c.inv_alpha) >> 8);
                }
            }
            store(&mut out[x * 4..x * 4 + 4], r, g, b);
        }
    }
}

/// Run `row` over every scanline, `STRIP_ROWS` at a time.
///
/// `init` builds scratch state that `row` reuses across the lines of a work unit.
pub(crate) fn compose_strips<S>(
    width: i32,
    height: i32,
    parallel: bool,
    init: impl Fn() -> S + Sync + Send,
    row: impl Fn(&mut S, i32, &mut [u8]) + Sync + Send,
) -> FrameRGBA {
    let w = width.max(0) as usize;
    let h = height.max(0) as usize;
    let row_bytes = w * 4;
    let mut data = vec![0u8; row_bytes * h];
    if row_bytes == 0 {
        return FrameRGBA {
            width: w as u32,
            height: h as u32,
            data,
        };
    }
    let strip = |scratch: &mut S, (i, chunk): (usize, &mut [u8])| {
        for (k, line) in chunk.chunks_mut(row_bytes).enumerate() {
            row(scratch, (i * STRIP_ROWS + k) as i32, line);
        }
    };
    if parallel {
        data.par_chunks_mut(row_bytes * STRIP_ROWS)
            .enumerate()
            .for_each_init(init, strip);
    } else {
        let mut scratch = init();
        data.chunks_mut(row_bytes * STRIP_ROWS)
            .enumerate()
            .for_each(|item| strip(&mut scratch, item));
    }
    FrameRGBA {
        width: w as u32,
        height: h as u32,
        data,
    }
}

/// Turn a pass's planes into pixels. Text is not drawn; it travels separately to the sink.
#[tracing::instrument(level = "debug", skip_all, fields(width = planes.width(), height = planes.height()))]
pub fn composite(
    planes: &RenderedPlanes,
    tech: &Technology,
    layers: &LayerVisibility,
    colors: &DisplayColors,
    opts: &RenderOpts,
    scale: f64,
) -> FrameRGBA {
    match opts.composite {
        CompositeMode::Continuous => {
            let overcolor = scale > opts.overcolor_scale_limit;
            let blends = blending_order(planes, tech, layers, colors, overcolor);
            compose_strips(
                planes.width(),
                planes.height(),
                opts.parallel_composite,
                RowWords::default,
                |scratch, y, out| {
                    compose_row_continuous(scratch, y, out, &blends, colors.background)
                },
            )
        }
        CompositeMode::Legacy => {
            let palette = LegacyPalette::new(planes, tech, layers, colors);
            compose_strips(
                planes.width(),
                planes.height(),
                opts.parallel_composite,
                || palette.row_buffer(),
                |rows, y, out| palette.compose_row(rows, y, out),
            )
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
