use crate::foundation::error::{RasterError, RasterResult};

/// Dense cell identity, stable for the lifetime of a design snapshot.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct CellId(pub u32);

impl CellId {
    /// Index into dense per-cell arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node instance identity inside one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Arc instance identity inside one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArcId(pub u32);

/// Layer identity inside a [`crate::Technology`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u16);

impl LayerId {
    /// Index into dense per-layer arrays.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Chronological export index inside one cell; used as the bit index of shown-port sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExportId(pub u32);

/// Point in integer grid units (Y grows upward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct GridPoint {
    /// X coordinate.
    pub x: i64,
    /// Y coordinate.
    pub y: i64,
}

impl GridPoint {
    /// Construct a point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Component-wise translation.
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl<'de> serde::Deserialize<'de> for GridPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([i64; 2]),
            Obj { x: i64, y: i64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y]) => Ok(Self { x, y }),
            Repr::Obj { x, y } => Ok(Self { x, y }),
        }
    }
}

/// Axis-aligned rectangle in grid units, `lx <= hx` and `ly <= hy`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridRect {
    /// Low X.
    pub lx: i64,
    /// Low Y.
    pub ly: i64,
    /// High X.
    pub hx: i64,
    /// High Y.
    pub hy: i64,
}

impl GridRect {
    /// Construct a rectangle from two arbitrary corners.
    pub fn from_corners(a: GridPoint, b: GridPoint) -> Self {
        Self {
            lx: a.x.min(b.x),
            ly: a.y.min(b.y),
            hx: a.x.max(b.x),
            hy: a.y.max(b.y),
        }
    }

    /// Bounding box of a point list. Empty input yields `None`.
    pub fn bounding(points: &[GridPoint]) -> Option<Self> {
        let first = *points.first()?;
        let mut r = Self::from_corners(first, first);
        for p in &points[1..] {
            r.lx = r.lx.min(p.x);
            r.ly = r.ly.min(p.y);
            r.hx = r.hx.max(p.x);
            r.hy = r.hy.max(p.y);
        }
        Some(r)
    }

    /// Width in grid units.
    pub fn width(self) -> i64 {
        self.hx - self.lx
    }

    /// Height in grid units.
    pub fn height(self) -> i64 {
        self.hy - self.ly
    }

    /// Smallest rectangle containing both.
    pub fn union(self, other: Self) -> Self {
        Self {
            lx: self.lx.min(other.lx),
            ly: self.ly.min(other.ly),
            hx: self.hx.max(other.hx),
            hy: self.hy.max(other.hy),
        }
    }

    /// Translate by an integer offset.
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            lx: self.lx + dx,
            ly: self.ly + dy,
            hx: self.hx + dx,
            hy: self.hy + dy,
        }
    }

    /// Center point, rounded toward negative infinity.
    pub fn center(self) -> GridPoint {
        GridPoint::new(
            (self.lx + self.hx).div_euclid(2),
            (self.ly + self.hy).div_euclid(2),
        )
    }

    /// Floating-point view used by screen-space culling.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.lx as f64, self.ly as f64, self.hx as f64, self.hy as f64)
    }
}

/// Inclusive pixel clip rectangle `[lx, hx] x [ly, hy]` in screen space (Y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipRect {
    /// Lowest writable column.
    pub lx: i32,
    /// Lowest writable row.
    pub ly: i32,
    /// Highest writable column.
    pub hx: i32,
    /// Highest writable row.
    pub hy: i32,
}

impl ClipRect {
    /// Clip covering a `width` x `height` surface.
    pub fn full(width: u32, height: u32) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::validation("clip surface must be non-empty"));
        }
        let w = i32::try_from(width).map_err(|_| RasterError::validation("width too large"))?;
        let h = i32::try_from(height).map_err(|_| RasterError::validation("height too large"))?;
        Ok(Self {
            lx: 0,
            ly: 0,
            hx: w - 1,
            hy: h - 1,
        })
    }

    /// Return `true` when the pixel lies inside the clip.
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.lx && x <= self.hx && y >= self.ly && y <= self.hy
    }

    /// Number of writable pixels.
    pub fn area(self) -> u64 {
        let w = i64::from(self.hx) - i64::from(self.lx) + 1;
        let h = i64::from(self.hy) - i64::from(self.ly) + 1;
        if w <= 0 || h <= 0 {
            0
        } else {
            (w * h) as u64
        }
    }
}

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rgb8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb8 {
    /// Construct a color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> RasterResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(RasterError::validation(format!(
                "color '{s}' must be #rrggbb"
            )));
        }
        let chan = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| RasterError::validation(format!("color '{s}' must be #rrggbb")))
        };
        Ok(Self::new(chan(0)?, chan(2)?, chan(4)?))
    }

    /// Pack as `0x00RRGGBB`.
    pub fn to_u32(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// Unpack from `0x00RRGGBB`.
    pub fn from_u32(v: u32) -> Self {
        Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }
}

impl<'de> serde::Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr([u8; 3]),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Self::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr([r, g, b]) => Ok(Self::new(r, g, b)),
        }
    }
}
