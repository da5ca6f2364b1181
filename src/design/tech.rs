use std::collections::HashMap;

use crate::foundation::core::{LayerId, Rgb8};
use crate::foundation::error::{RasterError, RasterResult};

/// Physical role of a layer; drives stacking order during compositing and sorting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerFunction {
    /// Stacking height; larger values are drawn later.
    #[serde(default)]
    pub height: i32,
    /// Contact / via layers are lifted above the layers they connect.
    #[serde(default)]
    pub contact: bool,
    /// Metal layers.
    #[serde(default)]
    pub metal: bool,
    /// Substrate / well layers.
    #[serde(default)]
    pub substrate: bool,
}

/// Outline drawn around patterned fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutlineStyle {
    /// Dash bits, low bit first.
    #[serde(default = "OutlineStyle::solid_pattern")]
    pub pattern: u32,
    /// Number of significant dash bits (`1..=32`).
    #[serde(default = "OutlineStyle::solid_len")]
    pub len: u8,
    /// Stroke thickness in pixels.
    #[serde(default = "OutlineStyle::one")]
    pub thickness: u8,
}

impl OutlineStyle {
    /// One-pixel solid outline.
    pub const SOLID: Self = Self {
        pattern: u32::MAX,
        len: 32,
        thickness: 1,
    };

    fn solid_pattern() -> u32 {
        u32::MAX
    }

    fn solid_len() -> u8 {
        32
    }

    fn one() -> u8 {
        1
    }

    /// Return `true` when every dash bit is set.
    pub fn is_solid(self) -> bool {
        let len = u32::from(self.len.clamp(1, 32));
        let mask = if len == 32 { u32::MAX } else { (1u32 << len) - 1 };
        self.pattern & mask == mask
    }
}

/// Display attributes of a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerInfo {
    /// Layer name, unique within a technology.
    pub name: String,
    /// Physical role.
    pub function: LayerFunction,
    /// Display color.
    pub color: Rgb8,
    /// Continuous-mode opacity in `[0, 1]`.
    pub opacity: f64,
    /// 1-based transparent slot for the legacy color map; 0 means opaque.
    pub transparent_index: u8,
    /// 16x16 stipple, one row per entry, bit 15 leftmost.
    pub pattern: Option<[u16; 16]>,
    /// Outline drawn around patterned fills.
    pub outline: Option<OutlineStyle>,
}

impl LayerInfo {
    /// Return `true` when the layer takes part in color-map compositing.
    pub fn is_transparent(&self) -> bool {
        self.transparent_index != 0
    }
}

/// Layer table plus the legacy transparent color map.
#[derive(Clone, Debug, Default)]
pub struct Technology {
    name: String,
    layers: Vec<LayerInfo>,
    by_name: HashMap<String, LayerId>,
    num_transparent: u8,
    color_map: Vec<Rgb8>,
}

impl Technology {
    /// Build a technology. When `color_map` is `None`, the map is derived from the colors of the
    /// transparent layers.
    pub fn new(
        name: impl Into<String>,
        layers: Vec<LayerInfo>,
        color_map: Option<Vec<Rgb8>>,
    ) -> RasterResult<Self> {
        if layers.len() > usize::from(u16::MAX) {
            return Err(RasterError::validation("too many layers"));
        }
        let mut by_name = HashMap::with_capacity(layers.len());
        let mut num_transparent = 0u8;
        for (i, l) in layers.iter().enumerate() {
            if by_name.insert(l.name.clone(), LayerId(i as u16)).is_some() {
                return Err(RasterError::validation(format!(
                    "duplicate layer name '{}'",
                    l.name
                )));
            }
            if !(0.0..=1.0).contains(&l.opacity) {
                return Err(RasterError::validation(format!(
                    "layer '{}' opacity must be in [0, 1]",
                    l.name
                )));
            }
            num_transparent = num_transparent.max(l.transparent_index);
        }
        if num_transparent > 16 {
            return Err(RasterError::validation(
                "at most 16 transparent layers are supported",
            ));
        }

        let color_map = match color_map {
            Some(map) => {
                let want = 1usize << num_transparent;
                if map.len() != want {
                    return Err(RasterError::validation(format!(
                        "color map must have {want} entries, got {}",
                        map.len()
                    )));
                }
                map
            }
            None => {
                let mut slots = vec![Rgb8::new(200, 200, 200); usize::from(num_transparent)];
                for l in &layers {
                    if l.transparent_index != 0 {
                        slots[usize::from(l.transparent_index) - 1] = l.color;
                    }
                }
                derive_color_map(&slots)
            }
        };

        Ok(Self {
            name: name.into(),
            layers,
            by_name,
            num_transparent,
            color_map,
        })
    }

    /// Technology name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer attributes.
    pub fn layer(&self, id: LayerId) -> Option<&LayerInfo> {
        self.layers.get(id.index())
    }

    /// Look up a layer by name.
    pub fn layer_by_name(&self, name: &str) -> Option<LayerId> {
        self.by_name.get(name).copied()
    }

    /// Iterate `(id, layer)` pairs in declaration order.
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &LayerInfo)> {
        self.layers
            .iter()
            .enumerate()
            .map(|(i, l)| (LayerId(i as u16), l))
    }

    /// Number of transparent slots.
    pub fn num_transparent_layers(&self) -> u8 {
        self.num_transparent
    }

    /// Legacy color map with `2^num_transparent_layers` entries.
    pub fn color_map(&self) -> &[Rgb8] {
        &self.color_map
    }
}

/// Merge transparent layer colors into a full color map.
///
/// Each entry combines the colors of its set bits by summing unit-length RGB vectors.
pub(crate) fn derive_color_map(slots: &[Rgb8]) -> Vec<Rgb8> {
    let n = slots.len();
    let mut map = Vec::with_capacity(1 << n);
    for i in 0..(1usize << n) {
        let mut cur: Option<[f64; 3]> = None;
        for (j, c) in slots.iter().enumerate() {
            if i & (1 << j) == 0 {
                continue;
            }
            let next = [
                f64::from(c.r) / 255.0,
                f64::from(c.g) / 255.0,
                f64::from(c.b) / 255.0,
            ];
            cur = Some(match cur {
                None => next,
                Some(prev) => {
                    let a = normalize(prev);
                    let b = normalize(next);
                    normalize([a[0] + b[0], a[1] + b[1], a[2] + b[2]])
                }
            });
        }
        map.push(match cur {
            None => Rgb8::new(200, 200, 200),
            Some(c) => Rgb8::new(
                (c[0] * 255.0) as u8,
                (c[1] * 255.0) as u8,
                (c[2] * 255.0) as u8,
            ),
        });
    }
    map
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let mag = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if mag > 1.0e-11 {
        [v[0] / mag, v[1] / mag, v[2] / mag]
    } else {
        v
    }
}
