use crate::error::{GlitchError, GlitchResult};

/// Straight (non-premultiplied) RGBA8 pixel grid.
///
/// `data` is row-major, 4 bytes per pixel, `data.len() == width * height * 4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    /// Fully transparent raster of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; byte_len(width, height)],
        }
    }

    /// The zero-size raster.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> GlitchResult<Self> {
        if data.len() != byte_len(width, height) {
            return Err(GlitchError::validation(format!(
                "pixel buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                byte_len(width, height),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raster filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut r = Self::new(width, height);
        for px in r.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        r
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Clamp a float channel into [0,255], round to nearest, store as u8.
pub(crate) fn clamp_channel(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}
