use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use glitchlab::{
    CaptureList, EffectSettings, FixedStepTicker, FrameEncoder, GifBackend, Mp4Backend, Raster,
    Scheduler, SeededNoise, Ticker as _,
};

#[derive(Parser, Debug)]
#[command(name = "glitchlab", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single distorted frame to an image file.
    Frame(FrameArgs),
    /// Animate, capture every frame, and export a GIF or MP4.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Animation time in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output path (.png or .jpg).
    #[arg(long)]
    out: PathBuf,

    /// Effect settings JSON; defaults when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Noise seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output artifact path (.gif, or .mp4 with ffmpeg on PATH).
    #[arg(long)]
    out: PathBuf,

    /// Number of frames to capture.
    #[arg(long, default_value_t = 30)]
    frames: u64,

    /// Virtual time step between refresh ticks, in milliseconds.
    #[arg(long, default_value_t = 100.0)]
    interval_ms: f64,

    /// Display duration of each exported frame, in milliseconds.
    #[arg(long, default_value_t = glitchlab::GIF_FRAME_DELAY_MS)]
    delay_ms: u32,

    /// Effect settings JSON; defaults when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Noise seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_raster(path: &Path) -> anyhow::Result<Raster> {
    let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
    let rgba = img.to_rgba8();
    Ok(Raster::from_vec(rgba.width(), rgba.height(), rgba.into_raw())?)
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<EffectSettings> {
    let Some(path) = path else {
        return Ok(EffectSettings::default());
    };
    let f = File::open(path).with_context(|| format!("open settings '{}'", path.display()))?;
    let settings: EffectSettings =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse settings JSON")?;
    settings.validate()?;
    Ok(settings)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let source = load_raster(&args.in_path)?;
    let settings = load_settings(args.settings.as_deref())?;
    let mut noise = SeededNoise::new(args.seed);

    let frame = glitchlab::render(&source, args.time, &settings, &mut noise);

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    match extension(&args.out).as_deref() {
        Some("png") => image::save_buffer_with_format(
            &args.out,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write '{}'", args.out.display()))?,
        Some("jpg") | Some("jpeg") => {
            let jpeg = glitchlab::encode_jpeg_still(&frame)?;
            std::fs::write(&args.out, jpeg)
                .with_context(|| format!("write '{}'", args.out.display()))?;
        }
        _ => anyhow::bail!(
            "unsupported frame output '{}' (use .png or .jpg)",
            args.out.display()
        ),
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.frames > 0, "--frames must be > 0");

    let source = load_raster(&args.in_path)?;
    let settings = load_settings(args.settings.as_deref())?;

    let mut backend: Box<dyn FrameEncoder> = match extension(&args.out).as_deref() {
        Some("gif") => Box::new(GifBackend::new()),
        Some("mp4") => Box::new(Mp4Backend::new()),
        _ => anyhow::bail!(
            "unsupported export output '{}' (use .gif or .mp4)",
            args.out.display()
        ),
    };

    let mut sched = Scheduler::with_seed(source, args.seed);
    sched.set_settings(settings);

    let list = CaptureList::new();
    let mut ticker = FixedStepTicker::new(args.interval_ms, args.frames);
    while let Some(ts) = ticker.next_frame() {
        if let Some(frame) = sched.on_tick(ts) {
            list.capture(frame)?;
        }
    }

    let artifact = glitchlab::export(backend.as_mut(), &list, args.delay_ms)?
        .ok_or_else(|| anyhow::anyhow!("no frames captured, nothing to export"))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, artifact)
        .with_context(|| format!("write '{}'", args.out.display()))?;

    eprintln!("wrote {} ({} frames)", args.out.display(), list.len());
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}
