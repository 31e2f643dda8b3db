use std::{
    io::Cursor,
    sync::{Arc, Mutex},
};

use crate::{
    error::{GlitchError, GlitchResult},
    raster::Raster,
};

pub const STILL_JPEG_QUALITY: u8 = 90;

/// One frozen animation frame: an encoded JPEG still plus its capture order.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub jpeg: Arc<[u8]>,
}

impl CapturedFrame {
    /// Decode the still back to raw RGBA pixels.
    pub fn decode(&self) -> GlitchResult<image::RgbaImage> {
        let img = image::load_from_memory(&self.jpeg)
            .map_err(|e| GlitchError::encode(format!("decode still #{}: {e}", self.index)))?;
        Ok(img.to_rgba8())
    }
}

/// Append-only gallery of captured stills.
///
/// Appends are serialized on a lock, so rapid concurrent captures each get
/// a distinct, strictly increasing index. Frames are immutable once
/// appended; `snapshot` hands out a frozen view for export while renders
/// and further captures continue.
#[derive(Debug, Default)]
pub struct CaptureList {
    frames: Mutex<Vec<CapturedFrame>>,
}

impl CaptureList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the presented raster into a still and append it.
    ///
    /// The raster is read, never mutated, and the list grows by exactly
    /// one. Encoding happens outside the lock; only the index assignment
    /// and append are serialized.
    pub fn capture(&self, raster: &Raster) -> GlitchResult<CapturedFrame> {
        let jpeg: Arc<[u8]> = encode_jpeg_still(raster)?.into();
        let mut frames = self.frames.lock().expect("capture list mutex poisoned");
        let frame = CapturedFrame {
            index: frames.len() as u64,
            width: raster.width,
            height: raster.height,
            jpeg,
        };
        frames.push(frame.clone());
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.frames.lock().expect("capture list mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frozen copy of the list in capture order.
    pub fn snapshot(&self) -> Vec<CapturedFrame> {
        self.frames
            .lock()
            .expect("capture list mutex poisoned")
            .clone()
    }

    /// Drop every captured frame; indices restart from zero.
    pub fn clear(&self) {
        self.frames
            .lock()
            .expect("capture list mutex poisoned")
            .clear();
    }
}

/// Encode a raster as an opaque JPEG still, alpha flattened over black.
pub fn encode_jpeg_still(raster: &Raster) -> GlitchResult<Vec<u8>> {
    if raster.is_empty() {
        return Err(GlitchError::capture("raster has zero size"));
    }

    let rgb = flatten_over_black(&raster.data);
    let mut buf = Vec::new();
    let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(
        Cursor::new(&mut buf),
        STILL_JPEG_QUALITY,
    );
    enc.encode(
        &rgb,
        raster.width,
        raster.height,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|e| GlitchError::capture(format!("jpeg encode failed: {e}")))?;
    Ok(buf)
}

fn flatten_over_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u16::from(px[3]);
        for ch in 0..3 {
            rgb.push(mul_div255(u16::from(px[ch]), a));
        }
    }
    rgb
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
