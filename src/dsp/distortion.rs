//! Soft-clipping distortion
//!
//! Blends the dry signal with a normalized tanh waveshaper:
//! `y = (1 - a) * x + a * tanh(d * x) / tanh(d)` where `d = 1 + 19a`.
//! At `a = 0` the effect is transparent; higher amounts drive harder into
//! saturation. Full-scale input stays within full scale.

use serde::{Deserialize, Serialize};

use super::effect::{ensure_range, Effect};
use crate::engine::SampleBuffer;
use crate::error::Result;

/// Drive added at amount = 1
const MAX_EXTRA_DRIVE: f32 = 19.0;

/// Distortion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Distortion {
    /// Saturation amount: 0 (clean) to 1 (heavy)
    pub amount: f32,
    /// Process channels independently; mono buffers have only one
    pub per_channel: bool,
}

impl Default for Distortion {
    fn default() -> Self {
        Self {
            amount: 0.5,
            per_channel: true,
        }
    }
}

impl Distortion {
    /// Create a validated distortion
    pub fn new(amount: f32) -> Result<Self> {
        let distortion = Self {
            amount,
            ..Self::default()
        };
        distortion.validate()?;
        Ok(distortion)
    }

    /// Shape one sample
    #[inline]
    pub fn shape(&self, x: f32) -> f32 {
        let a = self.amount;
        if a == 0.0 {
            return x;
        }
        let drive = 1.0 + MAX_EXTRA_DRIVE * a;
        (1.0 - a) * x + a * (drive * x).tanh() / drive.tanh()
    }
}

impl Effect for Distortion {
    fn effect_type(&self) -> &'static str {
        "distortion"
    }

    fn validate(&self) -> Result<()> {
        ensure_range("distortion", "amount", self.amount, 0.0, 1.0)
    }

    fn render(&self, input: &SampleBuffer) -> Result<Vec<f32>> {
        Ok(input.samples().iter().map(|&x| self.shape(x)).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StemmixError;

    fn crest_factor(buffer: &SampleBuffer) -> f32 {
        buffer.peak() / buffer.rms()
    }

    #[test]
    fn test_amount_domain() {
        assert!(Distortion::new(0.0).is_ok());
        assert!(Distortion::new(1.0).is_ok());
        assert!(matches!(
            Distortion::new(1.2),
            Err(StemmixError::EffectParam { .. })
        ));
    }

    #[test]
    fn test_zero_amount_is_transparent() {
        let input = SampleBuffer::sine(220.0, 0.7, 0.1, 44100).unwrap();
        let output = Distortion::new(0.0).unwrap().process(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_more_amount_more_saturation() {
        let input = SampleBuffer::sine(220.0, 0.5, 0.5, 44100).unwrap();
        let light = Distortion::new(0.2).unwrap().process(&input).unwrap();
        let heavy = Distortion::new(0.9).unwrap().process(&input).unwrap();

        // A saturated sine flattens toward a square wave (crest factor 1)
        let clean = crest_factor(&input);
        let light_cf = crest_factor(&light);
        let heavy_cf = crest_factor(&heavy);
        assert!(light_cf < clean, "{} vs {}", light_cf, clean);
        assert!(heavy_cf < light_cf, "{} vs {}", heavy_cf, light_cf);
    }

    #[test]
    fn test_output_bounded_for_full_scale_input() {
        let d = Distortion::new(1.0).unwrap();
        for x in [-1.0_f32, -0.5, 0.0, 0.5, 1.0] {
            assert!(d.shape(x).abs() <= 1.0 + 1e-6);
        }
        assert!((d.shape(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shape_is_odd_symmetric() {
        let d = Distortion::new(0.6).unwrap();
        assert!((d.shape(0.3) + d.shape(-0.3)).abs() < 1e-7);
    }
}
