use crate::{
    noise::NoiseSource,
    raster::{Raster, clamp_channel},
    settings::EffectSettings,
};

/// Maximum horizontal displacement of the red/blue samples at `rgb_split = 1`.
const SPLIT_RANGE_PX: f64 = 20.0;
const INTERFERENCE_GAIN: f64 = 50.0;
const TRACKING_GAIN: f64 = 30.0;
const NOISE_SPAN: f64 = 25.0;
const WAVE_GAIN: f64 = 30.0;
const SCANLINE_MAX_ALPHA: f64 = 0.3;

/// Render one distorted frame.
///
/// Stage order is a contract: channel split, per-channel tone mapping, wave
/// distortion, scanline overlay. Reordering changes the visual semantics.
///
/// The output has the same dimensions as `source`; a zero-size source yields
/// an empty raster. All channel math is floating point and clamped into
/// [0,255] per channel, so no parameter value can overflow a pixel.
pub fn render(
    source: &Raster,
    time_ms: f64,
    settings: &EffectSettings,
    noise: &mut dyn NoiseSource,
) -> Raster {
    if source.is_empty() {
        return Raster::empty();
    }

    let mut work = split_channels(source, settings);
    tone_map(&mut work, time_ms, settings, noise);
    let out = wave_distort(&work, source.width, source.height, time_ms, settings);

    let mut frame = Raster {
        width: source.width,
        height: source.height,
        data: out,
    };
    overlay_scanlines(&mut frame, settings);
    frame
}

/// Stage 1: pull the red sample from `x + offset` and the blue sample from
/// `x - offset`; green is untouched. An out-of-range neighbor keeps the
/// pixel's own value, so `rgb_split = 0` is a true no-op.
fn split_channels(source: &Raster, settings: &EffectSettings) -> Vec<u8> {
    let src = &source.data;
    let mut out = src.clone();

    let offset = (settings.rgb_split * SPLIT_RANGE_PX).floor() as i64;
    if offset == 0 {
        return out;
    }

    let w = i64::from(source.width);
    for y in 0..i64::from(source.height) {
        for x in 0..w {
            let p = ((y * w + x) * 4) as usize;
            let red_x = x + offset;
            if (0..w).contains(&red_x) {
                out[p] = src[((y * w + red_x) * 4) as usize];
            }
            let blue_x = x - offset;
            if (0..w).contains(&blue_x) {
                out[p + 2] = src[((y * w + blue_x) * 4) as usize + 2];
            }
        }
    }
    out
}

/// Stage 2: per-channel contrast, saturation, stochastic noise, and the
/// additive interference/tracking signal terms, clamped per channel.
///
/// Interference keys off the pixel's flat byte offset while tracking keys
/// off the pixel index; the asymmetry is part of the effect's look.
fn tone_map(work: &mut [u8], time_ms: f64, settings: &EffectSettings, noise: &mut dyn NoiseSource) {
    let contrast_factor = 1.0 + settings.contrast * 2.0;
    let saturation_factor = 1.0 + settings.saturation;

    for (p, px) in work.chunks_exact_mut(4).enumerate() {
        let interference = (time_ms * 0.001 + (p as f64 * 4.0) * settings.signal_interference)
            .sin()
            * INTERFERENCE_GAIN;
        let tracking = (time_ms * 0.002 + p as f64 * settings.vhs_tracking).sin() * TRACKING_GAIN;
        let avg = (f64::from(px[0]) + f64::from(px[1]) + f64::from(px[2])) / 3.0;

        for ch in 0..3 {
            let mut v = f64::from(px[ch]);
            v = ((v / 255.0 - 0.5) * contrast_factor + 0.5) * 255.0;
            v = avg + (v - avg) * saturation_factor;
            if noise.chance(settings.noise) {
                v += noise.uniform(-NOISE_SPAN, NOISE_SPAN);
            }
            v += interference + tracking;
            px[ch] = clamp_channel(v);
        }
    }
}

/// Stage 3: copy horizontal slices into a cleared buffer at a per-slice
/// sinusoidal offset. Columns pushed off-canvas are clipped; columns no
/// slice covers stay transparent.
fn wave_distort(
    work: &[u8],
    width: u32,
    height: u32,
    time_ms: f64,
    settings: &EffectSettings,
) -> Vec<u8> {
    let mut out = vec![0u8; work.len()];
    let slice_h = slice_height(height, settings.pixelation);
    let row_bytes = width as usize * 4;

    let mut k = 0u64;
    let mut y0 = 0usize;
    while y0 < height as usize {
        let dx = ((time_ms * 0.001 * settings.wave_frequency + k as f64 * 0.1).sin()
            * settings.wave_amplitude
            * WAVE_GAIN)
            .round() as i64;
        let y1 = (y0 + slice_h).min(height as usize);
        for y in y0..y1 {
            let row = y * row_bytes;
            copy_row_shifted(
                &mut out[row..row + row_bytes],
                &work[row..row + row_bytes],
                width as usize,
                dx,
            );
        }
        k += 1;
        y0 = y1;
    }
    out
}

/// Slice height in rows. The divisor stays >= 10 for `pixelation` in [0,1],
/// and the floor at 1 keeps `pixelation = 1` from degenerating.
fn slice_height(height: u32, pixelation: f64) -> usize {
    let denom = 100.0 - pixelation * 90.0;
    ((f64::from(height) / denom).floor() as usize).max(1)
}

fn copy_row_shifted(dst: &mut [u8], src: &[u8], width: usize, dx: i64) {
    let shift = dx.unsigned_abs() as usize;
    if shift >= width {
        return;
    }
    let n = (width - shift) * 4;
    if dx >= 0 {
        dst[shift * 4..shift * 4 + n].copy_from_slice(&src[..n]);
    } else {
        dst[..n].copy_from_slice(&src[shift * 4..shift * 4 + n]);
    }
}

/// Stage 4: composite black at alpha `scanlines * 0.3` over every even row.
fn overlay_scanlines(frame: &mut Raster, settings: &EffectSettings) {
    if settings.scanlines <= 0.0 {
        return;
    }
    let a = settings.scanlines * SCANLINE_MAX_ALPHA;
    let keep = 1.0 - a;
    let row_bytes = frame.width as usize * 4;

    for y in (0..frame.height as usize).step_by(2) {
        let row = &mut frame.data[y * row_bytes..(y + 1) * row_bytes];
        for px in row.chunks_exact_mut(4) {
            for ch in 0..3 {
                px[ch] = clamp_channel(f64::from(px[ch]) * keep);
            }
            px[3] = clamp_channel(a * 255.0 + f64::from(px[3]) * keep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::SeededNoise;

    /// Scripted noise source: `chance` always answers `hit`, `uniform`
    /// always answers `value`.
    struct ConstNoise {
        hit: bool,
        value: f64,
    }

    impl NoiseSource for ConstNoise {
        fn chance(&mut self, _probability: f64) -> bool {
            self.hit
        }

        fn uniform(&mut self, _lo: f64, _hi: f64) -> f64 {
            self.value
        }
    }

    fn gradient(width: u32, height: u32) -> Raster {
        let mut r = Raster::new(width, height);
        for (i, px) in r.data.chunks_exact_mut(4).enumerate() {
            px[0] = (i * 7 % 256) as u8;
            px[1] = (i * 13 % 256) as u8;
            px[2] = (i * 29 % 256) as u8;
            px[3] = 255;
        }
        r
    }

    #[test]
    fn empty_source_is_a_noop() {
        let mut noise = SeededNoise::new(0);
        let out = render(
            &Raster::empty(),
            123.0,
            &EffectSettings::default(),
            &mut noise,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn split_zero_offset_is_identity() {
        let src = gradient(5, 3);
        let mut s = EffectSettings::zeroed();
        s.rgb_split = 0.0;
        assert_eq!(split_channels(&src, &s), src.data);
        // Anything below one pixel of displacement floors to zero too.
        s.rgb_split = 0.04;
        assert_eq!(split_channels(&src, &s), src.data);
    }

    #[test]
    fn split_pulls_red_forward_and_blue_backward() {
        let src = gradient(8, 1);
        let mut s = EffectSettings::zeroed();
        s.rgb_split = 0.1; // floor(0.1 * 20) = 2 pixels
        let out = split_channels(&src, &s);

        for x in 0..8usize {
            let p = x * 4;
            let expect_r = if x + 2 < 8 {
                src.data[(x + 2) * 4]
            } else {
                src.data[p]
            };
            let expect_b = if x >= 2 {
                src.data[(x - 2) * 4 + 2]
            } else {
                src.data[p + 2]
            };
            assert_eq!(out[p], expect_r, "red at x={x}");
            assert_eq!(out[p + 1], src.data[p + 1], "green at x={x}");
            assert_eq!(out[p + 2], expect_b, "blue at x={x}");
        }
    }

    #[test]
    fn tone_map_identity_at_zero_settings() {
        let src = gradient(6, 4);
        let mut work = src.data.clone();
        let mut noise = ConstNoise {
            hit: false,
            value: 0.0,
        };
        // The signal terms are not gated on their parameters; they only
        // vanish when the time argument does.
        tone_map(&mut work, 0.0, &EffectSettings::zeroed(), &mut noise);
        assert_eq!(work, src.data);
    }

    #[test]
    fn tone_map_applies_contrast_and_saturation() {
        // One gray pixel, contrast factor 2, saturation factor 1.5.
        let mut work = vec![128u8, 128, 128, 255];
        let mut s = EffectSettings::zeroed();
        s.contrast = 0.5;
        s.saturation = 0.5;
        let mut noise = ConstNoise {
            hit: false,
            value: 0.0,
        };
        tone_map(&mut work, 0.0, &s, &mut noise);
        // contrast(128) = 128.5, then 128 + 0.5 * 1.5 = 128.75 -> 129.
        assert_eq!(work, vec![129, 129, 129, 255]);
    }

    #[test]
    fn tone_map_noise_perturbs_every_hit() {
        let mut work = vec![100u8, 100, 100, 255];
        let mut s = EffectSettings::zeroed();
        s.noise = 1.0;
        let mut noise = ConstNoise {
            hit: true,
            value: 25.0,
        };
        tone_map(&mut work, 0.0, &s, &mut noise);
        assert_eq!(work, vec![125, 125, 125, 255]);
    }

    #[test]
    fn tone_map_alpha_is_untouched() {
        let mut work = vec![10u8, 20, 30, 77, 200, 210, 220, 0];
        let mut s = EffectSettings::default();
        s.noise = 0.0;
        let mut noise = ConstNoise {
            hit: false,
            value: 0.0,
        };
        tone_map(&mut work, 333.0, &s, &mut noise);
        assert_eq!(work[3], 77);
        assert_eq!(work[7], 0);
    }

    #[test]
    fn slice_height_bounds() {
        assert_eq!(slice_height(100, 0.0), 1);
        assert_eq!(slice_height(100, 1.0), 10);
        assert_eq!(slice_height(2, 0.5), 1);
        assert_eq!(slice_height(1080, 1.0), 108);
    }

    #[test]
    fn copy_row_shifted_clips() {
        let src: Vec<u8> = (0..16).collect(); // 4 pixels
        let mut dst = vec![0u8; 16];
        copy_row_shifted(&mut dst, &src, 4, 1);
        assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
        assert_eq!(&dst[4..16], &src[0..12]);

        let mut dst = vec![0u8; 16];
        copy_row_shifted(&mut dst, &src, 4, -2);
        assert_eq!(&dst[0..8], &src[8..16]);
        assert_eq!(&dst[8..16], &[0; 8]);

        let mut dst = vec![0u8; 16];
        copy_row_shifted(&mut dst, &src, 4, 4);
        assert_eq!(dst, vec![0u8; 16]);
    }

    #[test]
    fn wave_zero_amplitude_keeps_rows_in_place() {
        let src = gradient(7, 5);
        let mut s = EffectSettings::zeroed();
        s.wave_frequency = 1.0;
        s.pixelation = 1.0;
        let out = wave_distort(&src.data, 7, 5, 12_345.0, &s);
        assert_eq!(out, src.data);
    }

    #[test]
    fn scanlines_darken_even_rows_only() {
        let mut frame = Raster::solid(2, 4, [200, 200, 200, 255]);
        let mut s = EffectSettings::zeroed();
        s.scanlines = 1.0;
        overlay_scanlines(&mut frame, &s);

        let row_bytes = 2 * 4;
        for y in 0..4usize {
            let px = &frame.data[y * row_bytes..y * row_bytes + 4];
            if y % 2 == 0 {
                assert_eq!(px, &[140, 140, 140, 255]); // 200 * 0.7
            } else {
                assert_eq!(px, &[200, 200, 200, 255]);
            }
        }
    }

    #[test]
    fn scanlines_zero_is_a_noop() {
        let mut frame = gradient(3, 3);
        let before = frame.data.clone();
        overlay_scanlines(&mut frame, &EffectSettings::zeroed());
        assert_eq!(frame.data, before);
    }
}
