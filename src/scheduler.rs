use crate::{
    noise::SeededNoise,
    pipeline,
    raster::Raster,
    settings::{EffectSettings, SettingField},
};

const DEFAULT_SEED: u64 = 0;

/// Play state of the animation loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
}

/// Source of display-refresh timestamps, in milliseconds.
///
/// Production embedders wrap their vsync primitive; offline rendering and
/// tests use [`FixedStepTicker`]. Returning `None` tears the loop down and
/// cancels any pending tick.
pub trait Ticker {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Yields `count` timestamps `0, step, 2*step, ...` then shuts down.
#[derive(Clone, Debug)]
pub struct FixedStepTicker {
    next: f64,
    step_ms: f64,
    remaining: u64,
}

impl FixedStepTicker {
    pub fn new(step_ms: f64, count: u64) -> Self {
        Self {
            next: 0.0,
            step_ms,
            remaining: count,
        }
    }
}

impl Ticker for FixedStepTicker {
    fn next_frame(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let ts = self.next;
        self.next += self.step_ms;
        Some(ts)
    }
}

/// Drives the effect pipeline once per refresh tick while playing.
///
/// The scheduler exclusively owns the source raster, the presented output
/// raster, and the noise stream; settings are held as a snapshot updated
/// one field per interaction and borrowed by each render.
pub struct Scheduler {
    source: Raster,
    frame: Raster,
    settings: EffectSettings,
    state: PlayState,
    time_ms: f64,
    seed: u64,
    noise: SeededNoise,
}

impl Scheduler {
    /// Starts Playing, presenting the unmodified source at time zero.
    pub fn new(source: Raster) -> Self {
        Self::with_seed(source, DEFAULT_SEED)
    }

    pub fn with_seed(source: Raster, seed: u64) -> Self {
        let frame = source.clone();
        Self {
            source,
            frame,
            settings: EffectSettings::default(),
            state: PlayState::Playing,
            time_ms: 0.0,
            seed,
            noise: SeededNoise::new(seed),
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Current value of the time cursor, in milliseconds.
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// The raster currently presented.
    pub fn frame(&self) -> &Raster {
        &self.frame
    }

    /// Handle one display-refresh tick.
    ///
    /// While playing, advances the time cursor to the refresh timestamp
    /// (the cursor never rewinds), renders, and returns the new frame. A
    /// tick arriving while paused is ignored.
    pub fn on_tick(&mut self, timestamp_ms: f64) -> Option<&Raster> {
        if self.state != PlayState::Playing {
            return None;
        }
        self.time_ms = self.time_ms.max(timestamp_ms);
        self.render_current();
        Some(&self.frame)
    }

    /// Freeze the time cursor; pending ticks are ignored until `play`.
    pub fn pause(&mut self) {
        self.state = PlayState::Paused;
    }

    /// Resume; the next refresh tick renders again.
    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    /// Update a single settings field.
    ///
    /// While paused this re-renders exactly once at the frozen cursor and
    /// returns the refreshed frame, so the displayed still reflects the new
    /// parameters without resuming playback. While playing the next tick
    /// picks the change up and `None` is returned.
    pub fn set_field(&mut self, field: SettingField, value: f64) -> Option<&Raster> {
        self.settings.set(field, value);
        self.rerender_if_paused()
    }

    /// Replace the whole settings vector, with `set_field` semantics.
    pub fn set_settings(&mut self, settings: EffectSettings) -> Option<&Raster> {
        self.settings = settings;
        self.rerender_if_paused()
    }

    /// Restore the default settings vector and present the unmodified
    /// source again, independent of play state. The time cursor and the
    /// noise stream rewind, so subsequent renders reproduce a fresh
    /// session's output exactly.
    pub fn reset(&mut self) -> &Raster {
        self.settings = EffectSettings::default();
        self.time_ms = 0.0;
        self.noise = SeededNoise::new(self.seed);
        self.frame = self.source.clone();
        &self.frame
    }

    /// Replace the source image. The time cursor rewinds and the new source
    /// is presented unmodified; captured frames are unaffected.
    pub fn set_source(&mut self, source: Raster) {
        self.frame = source.clone();
        self.source = source;
        self.time_ms = 0.0;
    }

    fn rerender_if_paused(&mut self) -> Option<&Raster> {
        match self.state {
            PlayState::Paused => {
                self.render_current();
                Some(&self.frame)
            }
            PlayState::Playing => None,
        }
    }

    fn render_current(&mut self) {
        // Always from a fresh copy of the source, never from the previous
        // frame's output, so one bad tick cannot feed back into the next.
        self.frame = pipeline::render(&self.source, self.time_ms, &self.settings, &mut self.noise);
    }
}

/// Drive the scheduler until the ticker shuts down, presenting each
/// rendered frame.
pub fn drive(scheduler: &mut Scheduler, ticker: &mut dyn Ticker, mut present: impl FnMut(&Raster)) {
    while let Some(ts) = ticker.next_frame() {
        if let Some(frame) = scheduler.on_tick(ts) {
            present(frame);
        }
    }
}
