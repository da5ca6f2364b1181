use xxhash_rust::xxh3::Xxh3;

use crate::raster::plane::RasterPlane;
use crate::raster::text::DeferredText;
use crate::render::surface::RenderedPlanes;

const XXH3_SEED: u64 = 0x3c6e_f372_fe94_f82b;

/// Stable 128-bit digest of a pass's planes and deferred text.
///
/// Equal fingerprints mean bit-identical output; the session uses them to count redraws that
/// changed nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneFingerprint {
    /// High half.
    pub hi: u64,
    /// Low half.
    pub lo: u64,
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_u8(&mut self, v: u8) {
        self.inner.update(&[v]);
    }

    fn write_i32(&mut self, v: i32) {
        self.inner.update(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.inner.update(&v.to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.inner.update(s.as_bytes());
    }

    fn write_plane(&mut self, plane: Option<&RasterPlane>) {
        let Some(p) = plane else {
            self.write_u8(0);
            return;
        };
        self.write_u8(1);
        for w in p.words() {
            self.inner.update(&w.to_le_bytes());
        }
    }

    fn finish(self) -> PlaneFingerprint {
        let v = self.inner.digest128();
        PlaneFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

pub(crate) fn fingerprint_planes(planes: &RenderedPlanes) -> PlaneFingerprint {
    let mut h = StableHasher::new();
    h.write_i32(planes.width());
    h.write_i32(planes.height());
    let layers: Vec<_> = planes.layer_planes().collect();
    h.write_u64(layers.len() as u64);
    for (id, p) in layers {
        h.write_u64(u64::from(id.0));
        h.write_plane(Some(p));
    }
    h.write_plane(planes.instance_plane());
    h.write_plane(planes.grid_plane());

    h.write_u64(planes.text().len() as u64);
    for t in planes.text() {
        match t {
            DeferredText::Text(t) => {
                h.write_u8(1);
                h.write_str(&t.text);
                for v in [t.origin.0, t.origin.1, t.size] {
                    h.write_i32(v);
                }
                h.write_u8(t.rotation);
                h.write_u64(u64::from(t.color.to_u32()));
            }
            DeferredText::Greek(g) => {
                h.write_u8(2);
                for v in [g.lx, g.hx, g.y] {
                    h.write_i32(v);
                }
                h.write_u64(u64::from(g.color.to_u32()));
            }
            DeferredText::Cross(c) => {
                h.write_u8(3);
                h.write_i32(c.x);
                h.write_i32(c.y);
                h.write_u64(u64::from(c.color.to_u32()));
            }
        }
    }
    h.finish()
}
