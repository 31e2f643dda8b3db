use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    capture::CapturedFrame,
    error::{GlitchError, GlitchResult},
    export::FrameEncoder,
};

/// MP4 export backend driving the system `ffmpeg` binary.
///
/// Stills are decoded back to raw RGBA and piped to ffmpeg's stdin; the
/// encoded container is staged in a temp file that is removed on success
/// and failure alike. ffmpeg being missing is an init failure, distinct
/// from a mid-encode failure.
#[derive(Debug, Default)]
pub struct Mp4Backend;

impl Mp4Backend {
    pub fn new() -> Self {
        Self
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Frame rate for a per-frame display duration; 100 ms maps to 10 fps.
fn fps_for_delay(frame_delay_ms: u32) -> u32 {
    if frame_delay_ms == 0 {
        return crate::export::VIDEO_FPS;
    }
    ((1000.0 / f64::from(frame_delay_ms)).round() as u32).max(1)
}

impl FrameEncoder for Mp4Backend {
    fn name(&self) -> &'static str {
        "mp4"
    }

    fn encode(&mut self, stills: &[CapturedFrame], frame_delay_ms: u32) -> GlitchResult<Vec<u8>> {
        let Some(first) = stills.first() else {
            return Err(GlitchError::validation(
                "mp4 export requires at least one still",
            ));
        };
        if first.width == 0 || first.height == 0 {
            return Err(GlitchError::validation("mp4 export frame size must be non-zero"));
        }
        if !first.width.is_multiple_of(2) || !first.height.is_multiple_of(2) {
            // We target yuv420p output for maximum player compatibility.
            return Err(GlitchError::validation(
                "mp4 export requires even frame dimensions (yuv420p)",
            ));
        }

        if !is_ffmpeg_on_path() {
            return Err(GlitchError::export_init(
                "ffmpeg is required for MP4 export, but was not found on PATH",
            ));
        }

        let out_path = temp_out_path();
        let _guard = TempFileGuard(Some(out_path.clone()));

        let mut enc = FfmpegStillEncoder::spawn(
            first.width,
            first.height,
            fps_for_delay(frame_delay_ms),
            &out_path,
        )?;
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
            enc.write_frame(&rgba)?;
        }
        enc.finish()?;

        std::fs::read(&out_path)
            .map_err(|e| GlitchError::encode(format!("read encoded mp4: {e}")))
    }
}

struct FfmpegStillEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_len: usize,
}

impl FfmpegStillEncoder {
    fn spawn(width: u32, height: u32, fps: u32, out_path: &Path) -> GlitchResult<Self> {
        // System `ffmpeg` rather than native bindings, to avoid FFmpeg dev
        // header/lib requirements.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out_path);

        let mut child = cmd.spawn().map_err(|e| {
            GlitchError::export_init(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            GlitchError::export_init("failed to open ffmpeg stdin (unexpected)")
        })?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            frame_len: (width * height * 4) as usize,
        })
    }

    fn write_frame(&mut self, rgba: &image::RgbaImage) -> GlitchResult<()> {
        if rgba.as_raw().len() != self.frame_len {
            return Err(GlitchError::validation(
                "frame buffer size mismatch with width*height*4",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GlitchError::encode("ffmpeg encoder is already finalized"));
        };

        stdin.write_all(rgba.as_raw()).map_err(|e| {
            GlitchError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn finish(mut self) -> GlitchResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            GlitchError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GlitchError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn temp_out_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "glitchlab_export_{}_{}.mp4",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
