//! Multi-band peaking equalizer
//!
//! One peaking biquad per band, cascaded. Each band boosts or cuts around its
//! center frequency by its gain in dB with `Q = center / bandwidth`, so band
//! responses add up in dB. Bands at 0 dB are skipped.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::effect::{ensure_range, param_error, Effect};
use crate::engine::SampleBuffer;
use crate::error::Result;

/// Largest boost/cut per band in dB
pub const MAX_GAIN_DB: f32 = 24.0;

/// Default band layout (Hz): centers and bandwidths
const DEFAULT_BANDS: [f32; 10] = [
    50.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0, 12800.0, 16000.0,
];

/// Gain for every band, or one gain per band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BandGain {
    Uniform(f32),
    PerBand(Vec<f32>),
}

impl Default for BandGain {
    fn default() -> Self {
        BandGain::Uniform(0.0)
    }
}

/// Equalizer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Equalizer {
    /// Band center frequencies in Hz
    pub center_freqs: Vec<f32>,
    /// Band widths in Hz, one per center
    pub bandwidths: Vec<f32>,
    /// Gain in dB
    pub gain_db: BandGain,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self {
            center_freqs: DEFAULT_BANDS.to_vec(),
            bandwidths: DEFAULT_BANDS.to_vec(),
            gain_db: BandGain::default(),
        }
    }
}

/// Biquad filter coefficients
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Peaking EQ from the Audio EQ Cookbook
    fn peak(sample_rate: f64, frequency: f64, gain_db: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a = 10.0_f64.powf(gain_db / 40.0);

        let a0 = 1.0 + alpha / a;
        Self {
            b0: (1.0 + alpha * a) / a0,
            b1: (-2.0 * cos_w0) / a0,
            b2: (1.0 - alpha * a) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha / a) / a0,
        }
    }

    /// Run the filter over a whole signal (Direct Form I)
    fn filter(&self, signal: &mut [f64]) {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        for sample in signal.iter_mut() {
            let x0 = *sample;
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
            *sample = y0;
        }
    }
}

impl Equalizer {
    /// Create a validated equalizer
    pub fn new(center_freqs: Vec<f32>, bandwidths: Vec<f32>, gain_db: BandGain) -> Result<Self> {
        let eq = Self {
            center_freqs,
            bandwidths,
            gain_db,
        };
        eq.validate()?;
        Ok(eq)
    }

    /// Gain of band `index` in dB
    pub fn band_gain(&self, index: usize) -> f32 {
        match &self.gain_db {
            BandGain::Uniform(gain) => *gain,
            BandGain::PerBand(gains) => gains.get(index).copied().unwrap_or(0.0),
        }
    }

    /// Bands that actually filter: non-zero gain
    fn active_bands(&self) -> impl Iterator<Item = (f32, f32, f32)> + '_ {
        self.center_freqs
            .iter()
            .zip(&self.bandwidths)
            .enumerate()
            .map(|(index, (&center, &width))| (center, width, self.band_gain(index)))
            .filter(|&(_, _, gain)| gain != 0.0)
    }

    /// Active bands must sit below Nyquist; bypassed ones are never built
    fn check_nyquist(&self, sample_rate: u32) -> Result<()> {
        let nyquist = sample_rate as f32 / 2.0;
        if let Some((freq, _, _)) = self.active_bands().find(|&(f, _, _)| f >= nyquist) {
            return Err(param_error(
                "eq",
                "center_freqs",
                freq,
                format!("below Nyquist ({} Hz)", nyquist),
            ));
        }
        Ok(())
    }
}

impl Effect for Equalizer {
    fn effect_type(&self) -> &'static str {
        "eq"
    }

    fn validate(&self) -> Result<()> {
        if self.center_freqs.is_empty() {
            return Err(param_error("eq", "center_freqs", "[]", "at least one band"));
        }
        if self.bandwidths.len() != self.center_freqs.len() {
            return Err(param_error(
                "eq",
                "bandwidths",
                format!("{} values", self.bandwidths.len()),
                format!("{} values, one per center frequency", self.center_freqs.len()),
            ));
        }
        if let Some(&freq) = self
            .center_freqs
            .iter()
            .find(|f| !(f.is_finite() && **f > 0.0))
        {
            return Err(param_error("eq", "center_freqs", freq, "> 0 Hz"));
        }
        if let Some(&width) = self
            .bandwidths
            .iter()
            .find(|w| !(w.is_finite() && **w > 0.0))
        {
            return Err(param_error("eq", "bandwidths", width, "> 0 Hz"));
        }
        match &self.gain_db {
            BandGain::Uniform(gain) => {
                ensure_range("eq", "gain_db", *gain, -MAX_GAIN_DB, MAX_GAIN_DB)?;
            }
            BandGain::PerBand(gains) => {
                if gains.len() != self.center_freqs.len() {
                    return Err(param_error(
                        "eq",
                        "gain_db",
                        format!("{} values", gains.len()),
                        format!("one value or {}", self.center_freqs.len()),
                    ));
                }
                for &gain in gains {
                    ensure_range("eq", "gain_db", gain, -MAX_GAIN_DB, MAX_GAIN_DB)?;
                }
            }
        }
        Ok(())
    }

    fn render(&self, input: &SampleBuffer) -> Result<Vec<f32>> {
        self.check_nyquist(input.sample_rate())?;

        let sample_rate = input.sample_rate() as f64;
        let mut signal: Vec<f64> = input.samples().iter().map(|&s| s as f64).collect();

        for (center, width, gain) in self.active_bands() {
            let q = center as f64 / width as f64;
            BiquadCoeffs::peak(sample_rate, center as f64, gain as f64, q).filter(&mut signal);
        }

        Ok(signal.into_iter().map(|s| s as f32).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
