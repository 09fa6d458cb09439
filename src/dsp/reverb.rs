//! Convolution reverb
//!
//! Convolves the dry signal with a synthesized impulse response:
//! - exponentially decaying noise whose T60 grows with `room_size`
//! - a one-pole low-pass that closes over the tail as `damping` rises
//! - unit-energy normalization, so `wet_gain` sets the wet level directly
//!
//! Output is `dry + wet_gain * wet`, cut to the input length.

use serde::{Deserialize, Serialize};

use super::effect::{ensure_range, param_error, Effect};
use super::spectral::convolve;
use crate::engine::SampleBuffer;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Decay time (T60) at room_size = 0
pub const MIN_DECAY_SECS: f32 = 0.1;

/// Decay time (T60) at room_size = 1
pub const MAX_DECAY_SECS: f32 = 3.0;

/// ln(1000): amplitude falls by 60 dB over one T60
const LN_60_DB: f32 = 6.907_755;

/// Low-pass coefficient span swept over the tail at full damping
const DAMP_START: f32 = 0.7;
const DAMP_SWEEP: f32 = 0.25;

/// Fixed seed so the same parameters always give the same tail
const NOISE_SEED: u32 = 0x9E37_79B9;

/// Reverb effect parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Reverb {
    /// Room size: 0 (small) to 1 (huge hall)
    pub room_size: f32,
    /// Damping: 0 (bright) to 1 (dark)
    pub damping: f32,
    /// Wet signal gain, >= 0
    pub wet_gain: f32,
}

impl Default for Reverb {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_gain: 1.0,
        }
    }
}

/// Xorshift noise in [-1, 1)
struct NoiseSource(u32);

impl NoiseSource {
    fn next_sample(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
    }
}

impl Reverb {
    /// Create a validated reverb
    pub fn new(room_size: f32, damping: f32, wet_gain: f32) -> Result<Self> {
        let reverb = Self {
            room_size,
            damping,
            wet_gain,
        };
        reverb.validate()?;
        Ok(reverb)
    }

    /// Decay time (T60) in seconds
    pub fn decay_secs(&self) -> f32 {
        MIN_DECAY_SECS + self.room_size * (MAX_DECAY_SECS - MIN_DECAY_SECS)
    }

    /// Synthesize the impulse response at `sample_rate`
    pub fn impulse_response(&self, sample_rate: u32) -> Vec<f32> {
        let decay = self.decay_secs();
        let len = ((decay * sample_rate as f32).ceil() as usize).max(2);

        let mut noise = NoiseSource(NOISE_SEED);
        let mut lowpass = 0.0_f32;
        let mut ir = vec![0.0_f32; len];

        // ir[0] stays silent: the direct sound is the dry path
        for (n, tap) in ir.iter_mut().enumerate().skip(1) {
            let progress = n as f32 / len as f32;
            let coeff = 1.0 - self.damping * (DAMP_START + DAMP_SWEEP * progress);
            lowpass += coeff * (noise.next_sample() - lowpass);

            let t = n as f32 / sample_rate as f32;
            *tap = lowpass * (-LN_60_DB * t / decay).exp();
        }

        let energy: f64 = ir.iter().map(|&s| (s as f64) * (s as f64)).sum();
        if energy > 0.0 {
            let norm = (1.0 / energy.sqrt()) as f32;
            ir.iter_mut().for_each(|s| *s *= norm);
        }
        ir
    }
}

impl Effect for Reverb {
    fn effect_type(&self) -> &'static str {
        "reverb"
    }

    fn validate(&self) -> Result<()> {
        ensure_range("reverb", "room_size", self.room_size, 0.0, 1.0)?;
        ensure_range("reverb", "damping", self.damping, 0.0, 1.0)?;
        if !(self.wet_gain.is_finite() && self.wet_gain >= 0.0) {
            return Err(param_error("reverb", "wet_gain", self.wet_gain, ">= 0.0"));
        }
        Ok(())
    }

    fn render(&self, input: &SampleBuffer) -> Result<Vec<f32>> {
        let dry = input.samples();
        if self.wet_gain == 0.0 {
            return Ok(dry.to_vec());
        }

        let ir = self.impulse_response(input.sample_rate());
        let wet = convolve(dry, &ir);

        Ok(dry
            .iter()
            .zip(&wet)
            .map(|(&d, &w)| d + self.wet_gain * w)
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
