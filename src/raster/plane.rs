use crate::design::tech::OutlineStyle;
use crate::foundation::math::pattern_word;

/// One bit per pixel, rows packed into 32-bit words; pixel `x` lives in bit `x & 31` of word
/// `x >> 5`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterPlane {
    width: i32,
    height: i32,
    words_per_row: usize,
    words: Vec<u32>,
}

/// Mask of bits `lb..=hb` inside one word.
fn span_mask(lb: u32, hb: u32) -> u32 {
    (u32::MAX << lb) & (u32::MAX >> (31 - hb))
}

impl RasterPlane {
    /// Allocate a cleared plane. Negative sizes are treated as zero.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let words_per_row = (width as usize).div_ceil(32);
        Self {
            width,
            height,
            words_per_row,
            words: vec![0; words_per_row * height as usize],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Words per row.
    pub fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    /// Raw packed words, row-major.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Packed words of one row.
    pub fn row(&self, y: i32) -> &[u32] {
        let base = y as usize * self.words_per_row;
        &self.words[base..base + self.words_per_row]
    }

    /// Read a pixel; out-of-range reads return `false`.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        let w = self.words[y as usize * self.words_per_row + (x >> 5) as usize];
        w & (1 << (x & 31)) != 0
    }

    /// Number of set pixels.
    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// Return `true` when no pixel is set.
    pub fn is_clear(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Clear every pixel.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.words_per_row + (x >> 5) as usize
    }

    fn or_point(&mut self, x: i32, y: i32, pat: u32) {
        let i = self.index(x, y);
        self.words[i] |= (1 << (x & 31)) & pat;
    }

    fn or_span(&mut self, y: i32, lx: i32, hx: i32, pat: u32) {
        if pat == 0 {
            return;
        }
        let li = self.index(lx, y);
        let hi = self.index(hx, y);
        let lb = (lx & 31) as u32;
        let hb = (hx & 31) as u32;
        if li == hi {
            self.words[li] |= span_mask(lb, hb) & pat;
            return;
        }
        self.words[li] |= (u32::MAX << lb) & pat;
        for w in &mut self.words[li + 1..hi] {
            *w |= pat;
        }
        self.words[hi] |= (u32::MAX >> (31 - hb)) & pat;
    }

    fn or_column(&mut self, x: i32, ly: i32, hy: i32, pattern: Option<&[u32; 16]>) {
        let bit = 1u32 << (x & 31);
        let mut i = self.index(x, ly);
        for y in ly..=hy {
            let pat = pattern.map_or(u32::MAX, |p| p[(y & 15) as usize]);
            self.words[i] |= bit & pat;
            i += self.words_per_row;
        }
    }

    /// Extract 32 source bits starting at pixel `sx` of `row`; pixels outside the row read as 0.
    fn window(row: &[u32], sx: i32) -> u32 {
        let q = sx.div_euclid(32);
        let r = sx.rem_euclid(32) as u32;
        let word = |i: i32| -> u32 {
            if i < 0 {
                0
            } else {
                row.get(i as usize).copied().unwrap_or(0)
            }
        };
        if r == 0 {
            word(q)
        } else {
            (word(q) >> r) | (word(q + 1) << (32 - r))
        }
    }

    /// OR the source rectangle `[min_src_x, max_src_x] x [min_src_y, max_src_y]` into this plane
    /// shifted by `(dx, dy)`. The destination rectangle must lie inside the plane.
    pub fn copy_bits(
        &mut self,
        src: &RasterPlane,
        min_src_x: i32,
        max_src_x: i32,
        min_src_y: i32,
        max_src_y: i32,
        dx: i32,
        dy: i32,
    ) {
        self.copy_bits_masked(src, min_src_x, max_src_x, min_src_y, max_src_y, dx, dy, None);
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_bits_masked(
        &mut self,
        src: &RasterPlane,
        min_src_x: i32,
        max_src_x: i32,
        min_src_y: i32,
        max_src_y: i32,
        dx: i32,
        dy: i32,
        pattern: Option<&[u32; 16]>,
    ) {
        if min_src_x > max_src_x || min_src_y > max_src_y {
            return;
        }
        let min_dest_x = min_src_x + dx;
        let max_dest_x = max_src_x + dx;
        let lw = min_dest_x >> 5;
        let hw = max_dest_x >> 5;
        for sy in min_src_y..=max_src_y {
            let dest_y = sy + dy;
            let pat = pattern.map_or(u32::MAX, |p| p[(dest_y & 15) as usize]);
            if pat == 0 {
                continue;
            }
            let src_row = src.row(sy);
            let base = dest_y as usize * self.words_per_row;
            for w in lw..=hw {
                let mut mask = u32::MAX;
                if w == lw {
                    mask &= u32::MAX << (min_dest_x & 31);
                }
                if w == hw {
                    mask &= u32::MAX >> (31 - (max_dest_x & 31));
                }
                let v = Self::window(src_row, w * 32 - dx) & mask & pat;
                if v != 0 {
                    self.words[base + w as usize] |= v;
                }
            }
        }
    }
}

/// Write interface shared by plain and patterned layer planes.
///
/// `fill_*` calls honor the layer stipple; `draw_*` calls always set pixels (outlines, lines,
/// text placeholders). Coordinates are inclusive and already clipped by the caller.
pub trait Raster {
    /// Fill `[lx, hx] x [ly, hy]`.
    fn fill_box(&mut self, lx: i32, hx: i32, ly: i32, hy: i32);
    /// Fill one row span.
    fn fill_hline(&mut self, y: i32, lx: i32, hx: i32);
    /// Fill one column span.
    fn fill_vline(&mut self, x: i32, ly: i32, hy: i32);
    /// Fill one pixel.
    fn fill_point(&mut self, x: i32, y: i32);
    /// Set one row span unconditionally.
    fn draw_hline(&mut self, y: i32, lx: i32, hx: i32);
    /// Set one column span unconditionally.
    fn draw_vline(&mut self, x: i32, ly: i32, hy: i32);
    /// Set one pixel unconditionally.
    fn draw_point(&mut self, x: i32, y: i32);
    /// Outline to draw around fills, if any.
    fn outline(&self) -> Option<OutlineStyle>;
    /// OR a rectangle of `src` into this raster at offset `(dx, dy)`.
    #[allow(clippy::too_many_arguments)]
    fn copy_bits(
        &mut self,
        src: &RasterPlane,
        min_src_x: i32,
        max_src_x: i32,
        min_src_y: i32,
        max_src_y: i32,
        dx: i32,
        dy: i32,
    );
}

/// Unpatterned view of a plane: fills and draws are identical.
#[derive(Debug)]
pub struct SolidRaster<'a> {
    plane: &'a mut RasterPlane,
}

impl<'a> SolidRaster<'a> {
    /// Wrap a plane.
    pub fn new(plane: &'a mut RasterPlane) -> Self {
        Self { plane }
    }
}

impl Raster for SolidRaster<'_> {
    fn fill_box(&mut self, lx: i32, hx: i32, ly: i32, hy: i32) {
        for y in ly..=hy {
            self.plane.or_span(y, lx, hx, u32::MAX);
        }
    }

    fn fill_hline(&mut self, y: i32, lx: i32, hx: i32) {
        self.plane.or_span(y, lx, hx, u32::MAX);
    }

    fn fill_vline(&mut self, x: i32, ly: i32, hy: i32) {
        self.plane.or_column(x, ly, hy, None);
    }

    fn fill_point(&mut self, x: i32, y: i32) {
        self.plane.or_point(x, y, u32::MAX);
    }

    fn draw_hline(&mut self, y: i32, lx: i32, hx: i32) {
        self.plane.or_span(y, lx, hx, u32::MAX);
    }

    fn draw_vline(&mut self, x: i32, ly: i32, hy: i32) {
        self.plane.or_column(x, ly, hy, None);
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        self.plane.or_point(x, y, u32::MAX);
    }

    fn outline(&self) -> Option<OutlineStyle> {
        None
    }

    fn copy_bits(
        &mut self,
        src: &RasterPlane,
        min_src_x: i32,
        max_src_x: i32,
        min_src_y: i32,
        max_src_y: i32,
        dx: i32,
        dy: i32,
    ) {
        self.plane
            .copy_bits(src, min_src_x, max_src_x, min_src_y, max_src_y, dx, dy);
    }
}

/// Stippled view of a plane. The stipple phase is the absolute row and column of the plane.
#[derive(Debug)]
pub struct PatternedRaster<'a> {
    plane: &'a mut RasterPlane,
    pattern: [u32; 16],
    outline: Option<OutlineStyle>,
}

impl<'a> PatternedRaster<'a> {
    /// Wrap a plane with a 16x16 stipple (bit 15 of each row is the leftmost pixel).
    pub fn new(
        plane: &'a mut RasterPlane,
        pattern: &[u16; 16],
        outline: Option<OutlineStyle>,
    ) -> Self {
        let mut words = [0u32; 16];
        for (w, row) in words.iter_mut().zip(pattern.iter()) {
            *w = pattern_word(*row);
        }
        Self {
            plane,
            pattern: words,
            outline,
        }
    }

    fn row_pattern(&self, y: i32) -> u32 {
        self.pattern[(y & 15) as usize]
    }
}

impl Raster for PatternedRaster<'_> {
    fn fill_box(&mut self, lx: i32, hx: i32, ly: i32, hy: i32) {
        for y in ly..=hy {
            let pat = self.row_pattern(y);
            self.plane.or_span(y, lx, hx, pat);
        }
    }

    fn fill_hline(&mut self, y: i32, lx: i32, hx: i32) {
        let pat = self.row_pattern(y);
        self.plane.or_span(y, lx, hx, pat);
    }

    fn fill_vline(&mut self, x: i32, ly: i32, hy: i32) {
        let pattern = self.pattern;
        self.plane.or_column(x, ly, hy, Some(&pattern));
    }

    fn fill_point(&mut self, x: i32, y: i32) {
        let pat = self.row_pattern(y);
        self.plane.or_point(x, y, pat);
    }

    fn draw_hline(&mut self, y: i32, lx: i32, hx: i32) {
        self.plane.or_span(y, lx, hx, u32::MAX);
    }

    fn draw_vline(&mut self, x: i32, ly: i32, hy: i32) {
        self.plane.or_column(x, ly, hy, None);
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        self.plane.or_point(x, y, u32::MAX);
    }

    fn outline(&self) -> Option<OutlineStyle> {
        self.outline
    }

    /// Re-applies the destination stipple to every copied pixel, so cached bitmaps stay aligned
    /// with the global pattern phase.
    fn copy_bits(
        &mut self,
        src: &RasterPlane,
        min_src_x: i32,
        max_src_x: i32,
        min_src_y: i32,
        max_src_y: i32,
        dx: i32,
        dy: i32,
    ) {
        let pattern = self.pattern;
        self.plane.copy_bits_masked(
            src,
            min_src_x,
            max_src_x,
            min_src_y,
            max_src_y,
            dx,
            dy,
            Some(&pattern),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/plane.rs"]
mod tests;
