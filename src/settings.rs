use crate::error::{GlitchError, GlitchResult};

/// The 13-field parameter vector driving the transform stages.
///
/// Every field is a float normalized to [0,1] except `hue_rotate`
/// (degrees). `intensity`, `color_shift` and `hue_rotate` are carried for
/// the control-surface contract but are not read by any render stage.
///
/// Serialized field names are camelCase (`waveAmplitude`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectSettings {
    pub intensity: f64,
    pub color_shift: f64,
    pub pixelation: f64,
    pub noise: f64,
    pub wave_amplitude: f64,
    pub wave_frequency: f64,
    pub rgb_split: f64,
    pub hue_rotate: f64,
    pub scanlines: f64,
    pub vhs_tracking: f64,
    pub signal_interference: f64,
    pub saturation: f64,
    pub contrast: f64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            color_shift: 0.3,
            pixelation: 0.5,
            noise: 0.2,
            wave_amplitude: 0.3,
            wave_frequency: 0.5,
            rgb_split: 0.3,
            hue_rotate: 0.0,
            scanlines: 0.3,
            vhs_tracking: 0.2,
            signal_interference: 0.3,
            saturation: 0.5,
            contrast: 0.5,
        }
    }
}

impl EffectSettings {
    /// All fields at zero; renders as a near-identity transform.
    pub fn zeroed() -> Self {
        Self {
            intensity: 0.0,
            color_shift: 0.0,
            pixelation: 0.0,
            noise: 0.0,
            wave_amplitude: 0.0,
            wave_frequency: 0.0,
            rgb_split: 0.0,
            hue_rotate: 0.0,
            scanlines: 0.0,
            vhs_tracking: 0.0,
            signal_interference: 0.0,
            saturation: 0.0,
            contrast: 0.0,
        }
    }

    pub fn validate(&self) -> GlitchResult<()> {
        for field in SettingField::ALL {
            let value = self.get(field);
            if field == SettingField::HueRotate {
                if !value.is_finite() {
                    return Err(GlitchError::validation("hueRotate must be finite"));
                }
                continue;
            }
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(GlitchError::validation(format!(
                    "{} must be in [0,1], got {value}",
                    field.name()
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, field: SettingField) -> f64 {
        match field {
            SettingField::Intensity => self.intensity,
            SettingField::ColorShift => self.color_shift,
            SettingField::Pixelation => self.pixelation,
            SettingField::Noise => self.noise,
            SettingField::WaveAmplitude => self.wave_amplitude,
            SettingField::WaveFrequency => self.wave_frequency,
            SettingField::RgbSplit => self.rgb_split,
            SettingField::HueRotate => self.hue_rotate,
            SettingField::Scanlines => self.scanlines,
            SettingField::VhsTracking => self.vhs_tracking,
            SettingField::SignalInterference => self.signal_interference,
            SettingField::Saturation => self.saturation,
            SettingField::Contrast => self.contrast,
        }
    }

    pub fn set(&mut self, field: SettingField, value: f64) {
        match field {
            SettingField::Intensity => self.intensity = value,
            SettingField::ColorShift => self.color_shift = value,
            SettingField::Pixelation => self.pixelation = value,
            SettingField::Noise => self.noise = value,
            SettingField::WaveAmplitude => self.wave_amplitude = value,
            SettingField::WaveFrequency => self.wave_frequency = value,
            SettingField::RgbSplit => self.rgb_split = value,
            SettingField::HueRotate => self.hue_rotate = value,
            SettingField::Scanlines => self.scanlines = value,
            SettingField::VhsTracking => self.vhs_tracking = value,
            SettingField::SignalInterference => self.signal_interference = value,
            SettingField::Saturation => self.saturation = value,
            SettingField::Contrast => self.contrast = value,
        }
    }
}

/// Identity of a single settings field; the control surface edits one per
/// interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingField {
    Intensity,
    ColorShift,
    Pixelation,
    Noise,
    WaveAmplitude,
    WaveFrequency,
    RgbSplit,
    HueRotate,
    Scanlines,
    VhsTracking,
    SignalInterference,
    Saturation,
    Contrast,
}

impl SettingField {
    pub const ALL: [SettingField; 13] = [
        SettingField::Intensity,
        SettingField::ColorShift,
        SettingField::Pixelation,
        SettingField::Noise,
        SettingField::WaveAmplitude,
        SettingField::WaveFrequency,
        SettingField::RgbSplit,
        SettingField::HueRotate,
        SettingField::Scanlines,
        SettingField::VhsTracking,
        SettingField::SignalInterference,
        SettingField::Saturation,
        SettingField::Contrast,
    ];

    /// The serialized (camelCase) field name.
    pub fn name(self) -> &'static str {
        match self {
            SettingField::Intensity => "intensity",
            SettingField::ColorShift => "colorShift",
            SettingField::Pixelation => "pixelation",
            SettingField::Noise => "noise",
            SettingField::WaveAmplitude => "waveAmplitude",
            SettingField::WaveFrequency => "waveFrequency",
            SettingField::RgbSplit => "rgbSplit",
            SettingField::HueRotate => "hueRotate",
            SettingField::Scanlines => "scanlines",
            SettingField::VhsTracking => "vhsTracking",
            SettingField::SignalInterference => "signalInterference",
            SettingField::Saturation => "saturation",
            SettingField::Contrast => "contrast",
        }
    }
}
