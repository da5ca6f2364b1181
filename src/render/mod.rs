//! Hierarchy walk, drawing surfaces and compositors.

pub(crate) mod color;
pub(crate) mod compositor;
pub(crate) mod drawing;
pub(crate) mod grid;
pub(crate) mod legacy;
pub(crate) mod surface;

use crate::foundation::error::RasterResult;
use crate::raster::text::DeferredText;

/// Opaque RGBA8 pixels, row-major, 4 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`; `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Receiver of finished frames.
///
/// Text is handed over unrasterized so the sink can draw it with its own text facility, last,
/// on top of the composited planes.
pub trait PaintSink {
    /// Show one frame and its deferred text.
    fn paint(&mut self, frame: &FrameRGBA, text: &[DeferredText]) -> RasterResult<()>;
}
