use crate::foundation::core::{GridPoint, GridRect};
use crate::foundation::error::{RasterError, RasterResult};

/// Orientation as stored on a node instance.
///
/// Several raw values describe the same transform (`mirror_x + mirror_y` is a 180 degree turn);
/// [`Orientation::canonical`] folds them into one [`Orient`] before any cache lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Orientation {
    /// Counter-clockwise rotation in degrees, a multiple of 90.
    #[serde(default)]
    pub angle: i32,
    /// Negate X before rotating.
    #[serde(default)]
    pub mirror_x: bool,
    /// Negate Y before rotating.
    #[serde(default)]
    pub mirror_y: bool,
}

impl Orientation {
    /// Identity orientation.
    pub const IDENT: Self = Self {
        angle: 0,
        mirror_x: false,
        mirror_y: false,
    };

    /// Construct a validated orientation.
    pub fn new(angle: i32, mirror_x: bool, mirror_y: bool) -> RasterResult<Self> {
        if angle.rem_euclid(90) != 0 {
            return Err(RasterError::validation(format!(
                "orientation angle {angle} must be a multiple of 90"
            )));
        }
        Ok(Self {
            angle,
            mirror_x,
            mirror_y,
        })
    }

    /// Fold into the canonical representative.
    pub fn canonical(self) -> Orient {
        let mut rot = self.angle.div_euclid(90).rem_euclid(4) as u8;
        let mirror = match (self.mirror_x, self.mirror_y) {
            (false, false) => false,
            (true, false) => true,
            (false, true) => {
                rot = (rot + 2) % 4;
                true
            }
            (true, true) => {
                rot = (rot + 2) % 4;
                false
            }
        };
        Orient { rot, mirror }
    }
}

/// Canonical orientation: mirror X (optional) followed by `rot` quarter turns counter-clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Orient {
    rot: u8,
    mirror: bool,
}

impl Orient {
    /// Identity.
    pub const IDENT: Self = Self {
        rot: 0,
        mirror: false,
    };

    /// All eight canonical orientations, ordered by [`Orient::index`].
    pub const ALL: [Self; 8] = [
        Self { rot: 0, mirror: false },
        Self { rot: 1, mirror: false },
        Self { rot: 2, mirror: false },
        Self { rot: 3, mirror: false },
        Self { rot: 0, mirror: true },
        Self { rot: 1, mirror: true },
        Self { rot: 2, mirror: true },
        Self { rot: 3, mirror: true },
    ];

    /// Construct from quarter turns and mirror flag.
    pub fn new(rot: u8, mirror: bool) -> Self {
        Self {
            rot: rot % 4,
            mirror,
        }
    }

    /// Quarter turns counter-clockwise, `0..4`.
    pub fn rot(self) -> u8 {
        self.rot
    }

    /// X mirror applied before rotation.
    pub fn mirror(self) -> bool {
        self.mirror
    }

    /// Dense index `0..8`.
    pub fn index(self) -> usize {
        usize::from(self.rot) + if self.mirror { 4 } else { 0 }
    }

    /// Return `true` for the identity transform.
    pub fn is_ident(self) -> bool {
        self == Self::IDENT
    }

    /// Transform that applies `inner` first, then `self`.
    pub fn concat(self, inner: Self) -> Self {
        if self.mirror {
            Self {
                rot: (self.rot + 4 - inner.rot) % 4,
                mirror: !inner.mirror,
            }
        } else {
            Self {
                rot: (self.rot + inner.rot) % 4,
                mirror: inner.mirror,
            }
        }
    }

    /// Inverse transform.
    pub fn inverse(self) -> Self {
        if self.mirror {
            self
        } else {
            Self {
                rot: (4 - self.rot) % 4,
                mirror: false,
            }
        }
    }

    /// Transform a grid point about the origin.
    pub fn apply(self, p: GridPoint) -> GridPoint {
        let x = if self.mirror { -p.x } else { p.x };
        let y = p.y;
        match self.rot {
            0 => GridPoint::new(x, y),
            1 => GridPoint::new(-y, x),
            2 => GridPoint::new(-x, -y),
            _ => GridPoint::new(y, -x),
        }
    }

    /// Transform a floating-point vector about the origin.
    pub fn apply_f64(self, x: f64, y: f64) -> (f64, f64) {
        let x = if self.mirror { -x } else { x };
        match self.rot {
            0 => (x, y),
            1 => (-y, x),
            2 => (-x, -y),
            _ => (y, -x),
        }
    }

    /// Bounding box of a transformed rectangle.
    pub fn apply_rect(self, r: GridRect) -> GridRect {
        let a = self.apply(GridPoint::new(r.lx, r.ly));
        let b = self.apply(GridPoint::new(r.hx, r.hy));
        GridRect::from_corners(a, b)
    }

    /// Transform a text rotation (quarter turns) by this orientation.
    ///
    /// Mirroring reverses the sense of rotation.
    pub fn apply_text_rotation(self, rot: u8) -> u8 {
        let r = if self.mirror { (4 - rot % 4) % 4 } else { rot % 4 };
        (r + self.rot) % 4
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/orient.rs"]
mod tests;
