use std::io::Cursor;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use crate::{
    capture::CapturedFrame,
    error::{GlitchError, GlitchResult},
    export::FrameEncoder,
};

/// GIF export backend built on the `image` crate's GIF encoder.
///
/// Frames loop forever at a fixed per-frame delay. Palette quantization
/// makes the output deliberately lossy; alpha nuance beyond the palette is
/// dropped.
#[derive(Debug, Default)]
pub struct GifBackend;

impl GifBackend {
    pub fn new() -> Self {
        Self
    }
}

impl FrameEncoder for GifBackend {
    fn name(&self) -> &'static str {
        "gif"
    }

    fn encode(&mut self, stills: &[CapturedFrame], frame_delay_ms: u32) -> GlitchResult<Vec<u8>> {
        let Some(first) = stills.first() else {
            return Err(GlitchError::validation(
                "gif export requires at least one still",
            ));
        };

        let mut buf = Vec::new();
        {
            let mut enc = GifEncoder::new(Cursor::new(&mut buf));
            enc.set_repeat(Repeat::Infinite)
                .map_err(|e| GlitchError::encode(format!("gif repeat header: {e}")))?;

            for still in stills {
                let rgba = still.decode()?;
                if (rgba.width(), rgba.height()) != (first.width, first.height) {
                    return Err(GlitchError::validation(format!(
                        "still #{} is {}x{}, expected {}x{}",
                        still.index,
                        rgba.width(),
                        rgba.height(),
                        first.width,
                        first.height
                    )));
                }
                let frame =
                    Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(frame_delay_ms, 1));
                enc.encode_frame(frame)
                    .map_err(|e| GlitchError::encode(format!("gif frame #{}: {e}", still.index)))?;
            }
        }
        Ok(buf)
    }
}
