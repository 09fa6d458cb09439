//! Sample Buffer Management
//!
//! Provides the mono sample buffer passed between pipeline stages, the mix
//! ratio type and level helpers.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StemmixError};

// ============================================================================
// Constants
// ============================================================================

/// Canonical sample rate streams are decoded to (44.1kHz)
pub const CANONICAL_SAMPLE_RATE: u32 = 44100;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// Mono audio buffer with its sample rate
///
/// A buffer always holds at least one sample and a positive sample rate;
/// both are checked on construction. Stages never mutate a buffer they are
/// handed, they build a new one.
///
/// # Example
/// ```
/// use stemmix::engine::SampleBuffer;
///
/// let buffer = SampleBuffer::new(vec![0.0, 0.5, -0.5], 44100).unwrap();
/// assert_eq!(buffer.len(), 3);
/// assert_eq!(buffer.sample_rate(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a buffer from mono samples
    ///
    /// # Errors
    /// * `InvalidBuffer` - If `samples` is empty or `sample_rate` is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(StemmixError::InvalidBuffer {
                reason: "buffer contains no samples".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(StemmixError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer of `len` zero samples
    pub fn silence(len: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Generate a sine test tone
    pub fn sine(frequency: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Result<Self> {
        let num_samples = (duration_secs * sample_rate as f32).round() as usize;
        let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
        let samples = (0..num_samples)
            .map(|i| amplitude * (angular_freq * i as f64).sin() as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Get the samples
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer and return its samples
    #[inline]
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Root-mean-square level (linear)
    pub fn rms(&self) -> f32 {
        let sum_squares: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_squares / self.len() as f64).sqrt() as f32
    }

    /// RMS level in dB
    pub fn rms_db(&self) -> f32 {
        linear_to_db(self.rms())
    }

    /// Absolute peak level (linear)
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }
}

// ============================================================================
// Mix Ratio
// ============================================================================

/// Blend weight for folding the next stream into a running mix
///
/// 0.0 leaves the mix untouched, 1.0 replaces it with the new stream.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct MixRatio(f32);

impl MixRatio {
    /// Create a ratio, rejecting values outside [0.0, 1.0]
    pub fn new(value: f32) -> Result<Self> {
        Self::at(0, value)
    }

    /// Create the ratio at position `index` of a ratio list
    pub(crate) fn at(index: usize, value: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(StemmixError::RatioOutOfRange { index, value });
        }
        Ok(Self(value))
    }

    /// Validate a whole list of raw ratios, reporting the first bad index
    pub fn from_slice(values: &[f32]) -> Result<Vec<Self>> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| Self::at(index, value))
            .collect()
    }

    /// The blend weight
    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for MixRatio {
    type Error = StemmixError;

    fn try_from(value: f32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MixRatio> for f32 {
    fn from(ratio: MixRatio) -> f32 {
        ratio.0
    }
}

// ============================================================================
// Tests
// ============================================================================
