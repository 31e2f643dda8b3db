#![forbid(unsafe_code)]

pub mod capture;
pub mod encode_ffmpeg;
pub mod encode_gif;
pub mod error;
pub mod export;
pub mod noise;
pub mod pipeline;
pub mod raster;
pub mod scheduler;
pub mod settings;

pub use capture::{CaptureList, CapturedFrame, encode_jpeg_still};
pub use encode_ffmpeg::{Mp4Backend, is_ffmpeg_on_path};
pub use encode_gif::GifBackend;
pub use error::{GlitchError, GlitchResult};
pub use export::{
    FrameEncoder, GIF_FRAME_DELAY_MS, VIDEO_FPS, export, export_in_background, still_filename,
};
pub use noise::{NoiseSource, SeededNoise};
pub use pipeline::render;
pub use raster::Raster;
pub use scheduler::{FixedStepTicker, PlayState, Scheduler, Ticker, drive};
pub use settings::{EffectSettings, SettingField};
