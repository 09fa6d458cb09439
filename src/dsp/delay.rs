//! Feedback delay
//!
//! Recursive echo: `y[t] = x[t] + decay_ratio * y[t - d]`, with `d` the delay
//! in samples. Echoes falling past the end of the buffer are dropped.

use serde::{Deserialize, Serialize};

use super::effect::{ensure_range, param_error, Effect};
use crate::engine::SampleBuffer;
use crate::error::Result;

/// Longest supported delay in milliseconds
pub const MAX_DELAY_MS: f32 = 1000.0;

/// Feedback delay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Delay {
    /// Delay time in milliseconds, (0, 1000]
    pub delay_time_ms: f32,
    /// Feedback amount, [0, 1)
    pub decay_ratio: f32,
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            delay_time_ms: 500.0,
            decay_ratio: 0.5,
        }
    }
}

impl Delay {
    /// Create a validated delay
    pub fn new(delay_time_ms: f32, decay_ratio: f32) -> Result<Self> {
        let delay = Self {
            delay_time_ms,
            decay_ratio,
        };
        delay.validate()?;
        Ok(delay)
    }

    /// Delay length in samples at `sample_rate`, never below one
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        ((self.delay_time_ms as f64 * sample_rate as f64 / 1000.0).round() as usize).max(1)
    }
}

impl Effect for Delay {
    fn effect_type(&self) -> &'static str {
        "delay"
    }

    fn validate(&self) -> Result<()> {
        // Zero delay would feed the output straight back into itself
        if !(self.delay_time_ms > 0.0 && self.delay_time_ms <= MAX_DELAY_MS) {
            return Err(param_error(
                "delay",
                "delay_time_ms",
                self.delay_time_ms,
                format!("greater than 0 and at most {} ms", MAX_DELAY_MS),
            ));
        }
        ensure_range("delay", "decay_ratio", self.decay_ratio, 0.0, 1.0)?;
        if self.decay_ratio >= 1.0 {
            return Err(param_error(
                "delay",
                "decay_ratio",
                self.decay_ratio,
                "0.0 to below 1.0",
            ));
        }
        Ok(())
    }

    fn render(&self, input: &SampleBuffer) -> Result<Vec<f32>> {
        let delay = self.delay_samples(input.sample_rate());
        let mut output = input.samples().to_vec();

        for t in delay..output.len() {
            output[t] += self.decay_ratio * output[t - delay];
        }

        Ok(output)
    }
}

// ============================================================================
// Tests
// ============================================================================
