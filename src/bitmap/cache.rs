use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::foundation::core::{CellId, GridRect};
use crate::foundation::orient::Orient;
use crate::raster::plane::RasterPlane;

/// Largest offscreen edge offset from the instance origin, in pixels.
const EXTENT_LIMIT: f64 = (1u32 << 30) as f64;

/// Pixel extent of an offscreen rendering relative to the instance origin, Y up, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffscreenExtent {
    /// Lowest column.
    pub lx: i32,
    /// Highest column.
    pub hx: i32,
    /// Lowest row (grid direction).
    pub ly: i32,
    /// Highest row (grid direction).
    pub hy: i32,
}

impl OffscreenExtent {
    /// Extent of oriented cell bounds at `scale`. Zero-area or inverted bounds yield `None`.
    pub fn of(bounds: GridRect, scale: f64) -> Option<Self> {
        if bounds.width() <= 0 || bounds.height() <= 0 || scale.is_nan() || scale <= 0.0 {
            return None;
        }
        let lo = |v: i64| (v as f64 * scale - 0.5).ceil();
        let hi = |v: i64| (v as f64 * scale + 0.5).floor();
        let edges = [lo(bounds.lx), hi(bounds.hx), lo(bounds.ly), hi(bounds.hy)];
        // cell origins far outside the bounds cannot be placed on a pixel grid
        if edges.iter().any(|v| v.abs() > EXTENT_LIMIT) {
            return None;
        }
        let [lx, hx, ly, hy] = edges.map(|v| v as i32);
        let e = Self { lx, hx, ly, hy };
        (e.lx <= e.hx && e.ly <= e.hy).then_some(e)
    }

    /// Width in pixels.
    pub fn width(self) -> i32 {
        self.hx - self.lx + 1
    }

    /// Height in pixels.
    pub fn height(self) -> i32 {
        self.hy - self.ly + 1
    }
}

/// Rendered planes of one (cell, orientation) pair at one scale.
///
/// Pixel `(0, 0)` of every plane corresponds to offset `(lx, hy)` from the instance origin.
#[derive(Clone, Debug)]
pub struct OffscreenBitmap {
    pub(crate) extent: OffscreenExtent,
    pub(crate) layers: Vec<Option<RasterPlane>>,
    pub(crate) instance: Option<RasterPlane>,
}

impl OffscreenBitmap {
    /// Extent.
    pub fn extent(&self) -> OffscreenExtent {
        self.extent
    }

    /// Plane of one layer, when anything was drawn on it.
    pub fn layer(&self, index: usize) -> Option<&RasterPlane> {
        self.layers.get(index).and_then(Option::as_ref)
    }

    /// Instance outline plane, when anything was drawn on it.
    pub fn instance_plane(&self) -> Option<&RasterPlane> {
        self.instance.as_ref()
    }

    /// Number of pixels over all allocated planes.
    pub fn total_pixels(&self) -> u64 {
        let per = u64::from(self.extent.width().unsigned_abs())
            * u64::from(self.extent.height().unsigned_abs());
        let planes = self.layers.iter().flatten().count() + usize::from(self.instance.is_some());
        per * planes as u64
    }
}

/// Cache key: cell and canonical combined orientation.
pub type BitmapKey = (CellId, Orient);

#[derive(Debug)]
struct BitmapEntry {
    bitmap: Option<Arc<OffscreenBitmap>>,
    instance_count: u32,
    singleton: bool,
    too_large: bool,
}

impl BitmapEntry {
    fn counted() -> Self {
        Self {
            bitmap: None,
            instance_count: 1,
            singleton: true,
            too_large: false,
        }
    }
}

/// What the drawing walk should do with one expanded instance.
#[derive(Debug)]
pub enum Resolution {
    /// Draw the subtree directly into the parent.
    Direct,
    /// Copy an existing bitmap.
    Copy(Arc<OffscreenBitmap>),
    /// Render the subtree into a new bitmap of this extent, store it, then copy it.
    Render(OffscreenExtent),
}

/// Offscreen bitmaps of repeated expanded instances, valid for one scale.
#[derive(Debug, Default)]
pub struct BitmapCache {
    entries: HashMap<BitmapKey, BitmapEntry>,
    scale: Option<f64>,
    quota_left: usize,
    created: u64,
    reused: u64,
}

impl BitmapCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bitmaps.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| e.bitmap.is_some()).count()
    }

    /// Return `true` when no bitmap is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bitmaps rendered since creation.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Copies served from an already stored bitmap since creation.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    /// Return `true` when a bitmap is stored for the pair.
    pub fn contains(&self, key: BitmapKey) -> bool {
        self.entries.get(&key).is_some_and(|e| e.bitmap.is_some())
    }

    /// Prepare for a redraw: drop everything on a scale change and forget last pass's counts.
    pub fn begin_pass(&mut self, scale: f64, singleton_quota: usize) {
        if self.scale != Some(scale) {
            if !self.entries.is_empty() {
                tracing::debug!(bitmaps = self.len(), scale, "scale changed, dropping bitmaps");
            }
            self.entries.clear();
            self.scale = Some(scale);
        }
        self.entries.retain(|_, e| e.bitmap.is_some());
        for e in self.entries.values_mut() {
            e.instance_count = 0;
            e.singleton = true;
            e.too_large = false;
        }
        self.quota_left = singleton_quota;
    }

    /// Record one visible use; returns `true` on the first sighting, when the caller should
    /// keep counting inside the instance.
    pub fn count(&mut self, key: BitmapKey) -> bool {
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, BitmapEntry::counted());
                true
            }
            Some(e) => {
                e.instance_count += 1;
                if e.instance_count > 1 {
                    e.singleton = false;
                }
                e.instance_count <= 1
            }
        }
    }

    /// Uses recorded for the pair in the current pass.
    pub fn usage(&self, key: BitmapKey) -> u32 {
        self.entries.get(&key).map_or(0, |e| e.instance_count)
    }

    /// Decide how to draw an expanded instance.
    ///
    /// `extent` is `None` for degenerate bounds. `too_large` reports the size policy for the
    /// current viewport.
    pub fn resolve(
        &mut self,
        key: BitmapKey,
        extent: Option<OffscreenExtent>,
        too_large: bool,
    ) -> Resolution {
        let Some(e) = self.entries.get_mut(&key) else {
            return Resolution::Direct;
        };
        if let Some(b) = &e.bitmap {
            self.reused += 1;
            return Resolution::Copy(Arc::clone(b));
        }
        if e.too_large {
            return Resolution::Direct;
        }
        let Some(extent) = extent else {
            tracing::trace!(cell = key.0.0, "degenerate bounds, drawing directly");
            return Resolution::Direct;
        };
        if too_large {
            tracing::debug!(cell = key.0.0, "instance too large to cache");
            e.too_large = true;
            return Resolution::Direct;
        }
        if e.singleton && e.instance_count < 2 {
            if self.quota_left == 0 {
                return Resolution::Direct;
            }
            self.quota_left -= 1;
            e.singleton = false;
            tracing::debug!(cell = key.0.0, "promoting singleton to a cached bitmap");
        }
        Resolution::Render(extent)
    }

    /// Store a freshly rendered bitmap.
    pub fn store(&mut self, key: BitmapKey, bitmap: Arc<OffscreenBitmap>) {
        self.created += 1;
        self.entries
            .entry(key)
            .or_insert_with(BitmapEntry::counted)
            .bitmap = Some(bitmap);
    }

    /// Drop bitmaps of the given cells.
    pub fn invalidate(&mut self, cells: &BTreeSet<CellId>) {
        let before = self.len();
        self.entries.retain(|(cell, _), _| !cells.contains(cell));
        let dropped = before - self.len();
        if dropped > 0 {
            tracing::debug!(dropped, "bitmaps invalidated");
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.scale = None;
    }
}
