use std::thread;

use crate::{
    capture::{CaptureList, CapturedFrame},
    error::GlitchResult,
};

/// Default inter-frame delay for GIF export.
pub const GIF_FRAME_DELAY_MS: u32 = 100;
/// Default frame rate for video export.
pub const VIDEO_FPS: u32 = 10;

pub const GIF_FILENAME: &str = "glitch-art.gif";
pub const VIDEO_FILENAME: &str = "glitch-art.mp4";

/// Suggested filename for a downloaded still.
pub fn still_filename(timestamp_ms: u128) -> String {
    format!("glitch-art-{timestamp_ms}.jpg")
}

/// Boundary toward the multi-frame encoder backends.
///
/// An implementation accepts the ordered capture list and produces one
/// encoded artifact. `frame_delay_ms` is the display duration of each
/// still; the video backend derives its frame rate from it.
pub trait FrameEncoder {
    fn name(&self) -> &'static str;

    fn encode(&mut self, stills: &[CapturedFrame], frame_delay_ms: u32) -> GlitchResult<Vec<u8>>;
}

/// Export the captured gallery through `backend`.
///
/// Works on a frozen snapshot, so renders and further captures proceed
/// undisturbed. An empty capture list is a no-op: the backend is not
/// invoked and `None` is returned. Backend failures surface as export
/// errors; the capture list itself is never modified, so retrying is safe.
#[tracing::instrument(skip(backend, list))]
pub fn export(
    backend: &mut dyn FrameEncoder,
    list: &CaptureList,
    frame_delay_ms: u32,
) -> GlitchResult<Option<Vec<u8>>> {
    encode_snapshot(backend, &list.snapshot(), frame_delay_ms)
}

/// Run an export on its own thread so the render loop is never blocked.
///
/// The snapshot is taken up front; dropping the returned handle discards
/// the result without affecting the capture list.
pub fn export_in_background(
    mut backend: Box<dyn FrameEncoder + Send>,
    list: &CaptureList,
    frame_delay_ms: u32,
) -> thread::JoinHandle<GlitchResult<Option<Vec<u8>>>> {
    let stills = list.snapshot();
    thread::spawn(move || encode_snapshot(backend.as_mut(), &stills, frame_delay_ms))
}

fn encode_snapshot(
    backend: &mut dyn FrameEncoder,
    stills: &[CapturedFrame],
    frame_delay_ms: u32,
) -> GlitchResult<Option<Vec<u8>>> {
    if stills.is_empty() {
        tracing::debug!(backend = backend.name(), "capture list empty, nothing to encode");
        return Ok(None);
    }
    tracing::debug!(
        backend = backend.name(),
        stills = stills.len(),
        frame_delay_ms,
        "exporting capture list"
    );
    backend.encode(stills, frame_delay_ms).map(Some)
}
