use crate::foundation::core::GridPoint;
use crate::foundation::orient::Orient;

/// Where the text sits relative to its anchor point.
///
/// The name tells which part of the text box touches the point: `Top` puts the top edge of the
/// text at the anchor so the text hangs below it on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    /// Centered on the point.
    #[default]
    Center,
    /// Top edge centered on the point.
    Top,
    /// Bottom edge centered on the point.
    Bottom,
    /// Left edge centered on the point.
    Left,
    /// Right edge centered on the point.
    Right,
    /// Top-left corner on the point.
    TopLeft,
    /// Top-right corner on the point.
    TopRight,
    /// Bottom-left corner on the point.
    BottomLeft,
    /// Bottom-right corner on the point.
    BottomRight,
    /// Centered in, and shrunk to fit, the owning box.
    Boxed,
}

impl TextAnchor {
    const ALL: [Self; 10] = [
        Self::Center,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Boxed,
    ];

    fn bits(self) -> u64 {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0) as u64
    }

    fn from_bits(v: u64) -> Self {
        Self::ALL.get(v as usize).copied().unwrap_or(Self::Center)
    }

    /// Anchor after transforming the text's placement by `orient`; the glyphs themselves stay
    /// upright.
    pub fn transformed(self, orient: Orient) -> Self {
        // direction in which the text extends from the point, grid Y up
        let dir = match self {
            Self::Center | Self::Boxed => return self,
            Self::Top => (0, -1),
            Self::Bottom => (0, 1),
            Self::Left => (1, 0),
            Self::Right => (-1, 0),
            Self::TopLeft => (1, -1),
            Self::TopRight => (-1, -1),
            Self::BottomLeft => (1, 1),
            Self::BottomRight => (-1, 1),
        };
        let d = orient.apply(GridPoint::new(dir.0, dir.1));
        match (d.x, d.y) {
            (0, -1) => Self::Top,
            (0, 1) => Self::Bottom,
            (1, 0) => Self::Left,
            (-1, 0) => Self::Right,
            (1, -1) => Self::TopLeft,
            (-1, -1) => Self::TopRight,
            (1, 1) => Self::BottomLeft,
            (-1, 1) => Self::BottomRight,
            _ => Self::Center,
        }
    }

    /// Screen offset of the text's top-left corner from the anchor point, before rotation.
    pub fn corner_offset(self, width: i32, height: i32) -> (i32, i32) {
        match self {
            Self::Center | Self::Boxed => (-width / 2, -height / 2),
            Self::Top => (-width / 2, 0),
            Self::Bottom => (-width / 2, -height),
            Self::Left => (0, -height / 2),
            Self::Right => (-width, -height / 2),
            Self::TopLeft => (0, 0),
            Self::BottomLeft => (0, -height),
            Self::TopRight => (-width, 0),
            Self::BottomRight => (-width, -height),
        }
    }
}

/// Text size as stored in a descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextSize {
    /// Points, independent of zoom.
    Absolute(u32),
    /// Grid units, scaled with zoom.
    Relative(f64),
}

const ANCHOR_SHIFT: u32 = 0;
const ANCHOR_MASK: u64 = 0xF;
const ABSOLUTE_BIT: u64 = 1 << 4;
const SIZE_SHIFT: u32 = 5;
const SIZE_MASK: u64 = 0x7FFF;
const ROT_SHIFT: u32 = 20;
const ROT_MASK: u64 = 0x3;
const ITALIC_BIT: u64 = 1 << 22;
const BOLD_BIT: u64 = 1 << 23;
const UNDERLINE_BIT: u64 = 1 << 24;
const FACE_SHIFT: u32 = 25;
const FACE_MASK: u64 = 0xFF;
const COLOR_SHIFT: u32 = 33;
const COLOR_MASK: u64 = 0xFF;

/// Bit-encoded text style consumed read-only by the renderer.
///
/// Relative sizes are stored in quarter grid units; a stored size of zero means one grid unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextDescriptor(pub u64);

impl TextDescriptor {
    /// Anchor style.
    pub fn anchor(self) -> TextAnchor {
        TextAnchor::from_bits((self.0 >> ANCHOR_SHIFT) & ANCHOR_MASK)
    }

    /// Stored size.
    pub fn size(self) -> TextSize {
        let raw = (self.0 >> SIZE_SHIFT) & SIZE_MASK;
        if self.0 & ABSOLUTE_BIT != 0 {
            TextSize::Absolute(raw as u32)
        } else if raw == 0 {
            TextSize::Relative(1.0)
        } else {
            TextSize::Relative(raw as f64 * 0.25)
        }
    }

    /// Quarter turns counter-clockwise.
    pub fn rotation(self) -> u8 {
        ((self.0 >> ROT_SHIFT) & ROT_MASK) as u8
    }

    /// Italic flag.
    pub fn is_italic(self) -> bool {
        self.0 & ITALIC_BIT != 0
    }

    /// Bold flag.
    pub fn is_bold(self) -> bool {
        self.0 & BOLD_BIT != 0
    }

    /// Underline flag.
    pub fn is_underline(self) -> bool {
        self.0 & UNDERLINE_BIT != 0
    }

    /// Font face index, 0 for the default font.
    pub fn face(self) -> u8 {
        ((self.0 >> FACE_SHIFT) & FACE_MASK) as u8
    }

    /// Color index, 0 for the caller's color.
    pub fn color_index(self) -> u8 {
        ((self.0 >> COLOR_SHIFT) & COLOR_MASK) as u8
    }

    /// Return `true` for absolute (point) sizes.
    pub fn is_absolute(self) -> bool {
        self.0 & ABSOLUTE_BIT != 0
    }

    /// Size in pixels at `scale` pixels per grid unit.
    pub fn true_size(self, scale: f64, global_text_scale: f64) -> f64 {
        let base = match self.size() {
            TextSize::Absolute(points) => f64::from(points),
            TextSize::Relative(units) => units * scale,
        };
        base * global_text_scale
    }

    /// Replace the anchor.
    pub fn with_anchor(self, anchor: TextAnchor) -> Self {
        Self((self.0 & !(ANCHOR_MASK << ANCHOR_SHIFT)) | (anchor.bits() << ANCHOR_SHIFT))
    }

    /// Replace the size with an absolute point size.
    pub fn with_absolute_size(self, points: u32) -> Self {
        let raw = u64::from(points).min(SIZE_MASK);
        Self((self.0 & !(SIZE_MASK << SIZE_SHIFT)) | ABSOLUTE_BIT | (raw << SIZE_SHIFT))
    }

    /// Replace the size with a relative size in grid units (quantized to quarters).
    pub fn with_relative_size(self, units: f64) -> Self {
        let raw = ((units * 4.0).round().max(0.0) as u64).min(SIZE_MASK);
        Self((self.0 & !(SIZE_MASK << SIZE_SHIFT) & !ABSOLUTE_BIT) | (raw << SIZE_SHIFT))
    }

    /// Replace the rotation.
    pub fn with_rotation(self, quarter_turns: u8) -> Self {
        let r = u64::from(quarter_turns % 4);
        Self((self.0 & !(ROT_MASK << ROT_SHIFT)) | (r << ROT_SHIFT))
    }

    /// Replace the style flags.
    pub fn with_style(self, italic: bool, bold: bool, underline: bool) -> Self {
        let mut v = self.0 & !(ITALIC_BIT | BOLD_BIT | UNDERLINE_BIT);
        if italic {
            v |= ITALIC_BIT;
        }
        if bold {
            v |= BOLD_BIT;
        }
        if underline {
            v |= UNDERLINE_BIT;
        }
        Self(v)
    }

    /// Replace the font face index.
    pub fn with_face(self, face: u8) -> Self {
        Self((self.0 & !(FACE_MASK << FACE_SHIFT)) | (u64::from(face) << FACE_SHIFT))
    }

    /// Replace the color index.
    pub fn with_color_index(self, color: u8) -> Self {
        Self((self.0 & !(COLOR_MASK << COLOR_SHIFT)) | (u64::from(color) << COLOR_SHIFT))
    }
}

/// JSON form of a text descriptor.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TextDescriptorDef {
    #[serde(default)]
    pub(crate) anchor: TextAnchor,
    /// Relative size in grid units.
    #[serde(default)]
    pub(crate) size: Option<f64>,
    /// Absolute size in points; wins over `size`.
    #[serde(default)]
    pub(crate) points: Option<u32>,
    #[serde(default)]
    pub(crate) rotation: u8,
    #[serde(default)]
    pub(crate) italic: bool,
    #[serde(default)]
    pub(crate) bold: bool,
    #[serde(default)]
    pub(crate) underline: bool,
    #[serde(default)]
    pub(crate) face: u8,
    #[serde(default)]
    pub(crate) color: u8,
}

impl TextDescriptorDef {
    pub(crate) fn to_descriptor(&self) -> TextDescriptor {
        let mut d = TextDescriptor::default()
            .with_anchor(self.anchor)
            .with_rotation(self.rotation)
            .with_style(self.italic, self.bold, self.underline)
            .with_face(self.face)
            .with_color_index(self.color);
        d = match (self.points, self.size) {
            (Some(p), _) => d.with_absolute_size(p),
            (None, Some(s)) => d.with_relative_size(s),
            (None, None) => d,
        };
        d
    }
}
