//! Effect trait and effect selection
//!
//! Every effect is a validated parameter record implementing [`Effect`].
//! [`EffectSpec`] is the tagged union a caller picks from; it carries only
//! the record of the chosen effect.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::delay::Delay;
use super::distortion::Distortion;
use super::eq::Equalizer;
use super::reverb::Reverb;
use crate::engine::SampleBuffer;
use crate::error::{Result, StemmixError};

/// Base trait for all DSP effects
///
/// Effects never touch their input; `process` returns a new buffer at the
/// same sample rate and length.
pub trait Effect {
    /// Effect type identifier
    fn effect_type(&self) -> &'static str;

    /// Check every parameter against its domain
    fn validate(&self) -> Result<()>;

    /// Produce the processed samples. Parameters are already validated.
    fn render(&self, input: &SampleBuffer) -> Result<Vec<f32>>;

    /// Validate, render and guard against NaN/Inf output
    fn process(&self, input: &SampleBuffer) -> Result<SampleBuffer> {
        self.validate()?;
        let samples = self.render(input)?;
        let output = SampleBuffer::new(samples, input.sample_rate())?;
        if !output.is_finite() {
            return Err(StemmixError::DspOverflow {
                effect: self.effect_type(),
            });
        }
        Ok(output)
    }
}

/// Reject a value outside `[min, max]` (NaN is always rejected)
pub(crate) fn ensure_range(
    effect: &'static str,
    field: &str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(param_error(effect, field, value, format!("{} to {}", min, max)));
    }
    Ok(())
}

pub(crate) fn param_error(
    effect: &'static str,
    field: &str,
    value: impl ToString,
    expected: impl Into<String>,
) -> StemmixError {
    StemmixError::EffectParam {
        effect,
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.into(),
    }
}

/// The effect applied to a mix, with its parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectSpec {
    /// Identity passthrough
    #[default]
    None,
    Reverb(Reverb),
    Delay(Delay),
    Distortion(Distortion),
    Eq(Equalizer),
}

impl EffectSpec {
    /// Build an effect from a name and a parameter mapping
    ///
    /// Names are case-insensitive. An unrecognized name selects
    /// [`EffectSpec::None`]. Missing parameters take their defaults; unknown
    /// or out-of-range ones fail with `EffectParam`.
    pub fn from_name(name: &str, params: &Value) -> Result<Self> {
        let spec = match name.trim().to_ascii_lowercase().as_str() {
            "none" | "" => EffectSpec::None,
            "reverb" => EffectSpec::Reverb(parse_params("reverb", params)?),
            "delay" => EffectSpec::Delay(parse_params("delay", params)?),
            "distortion" => EffectSpec::Distortion(parse_params("distortion", params)?),
            "eq" => EffectSpec::Eq(parse_params("eq", params)?),
            other => {
                warn!("Unknown effect '{}', passing audio through", other);
                EffectSpec::None
            }
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Effect type identifier
    pub fn name(&self) -> &'static str {
        match self {
            EffectSpec::None => "none",
            EffectSpec::Reverb(e) => e.effect_type(),
            EffectSpec::Delay(e) => e.effect_type(),
            EffectSpec::Distortion(e) => e.effect_type(),
            EffectSpec::Eq(e) => e.effect_type(),
        }
    }

    fn as_effect(&self) -> Option<&dyn Effect> {
        match self {
            EffectSpec::None => None,
            EffectSpec::Reverb(e) => Some(e),
            EffectSpec::Delay(e) => Some(e),
            EffectSpec::Distortion(e) => Some(e),
            EffectSpec::Eq(e) => Some(e),
        }
    }

    /// Check the carried parameters
    pub fn validate(&self) -> Result<()> {
        self.as_effect().map_or(Ok(()), |effect| effect.validate())
    }

    /// Apply the effect, returning a new buffer at the same sample rate
    pub fn apply(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        match self.as_effect() {
            None => Ok(buffer.clone()),
            Some(effect) => {
                debug!(
                    "Applying {} to {} samples @ {} Hz",
                    effect.effect_type(),
                    buffer.len(),
                    buffer.sample_rate()
                );
                effect.process(buffer)
            }
        }
    }

    /// Parameter domains of every effect
    pub fn catalog() -> Vec<EffectInfo> {
        vec![
            EffectInfo {
                name: "none",
                params: vec![],
            },
            EffectInfo {
                name: "reverb",
                params: vec![
                    ParamInfo::new("room_size", "0.0 to 1.0"),
                    ParamInfo::new("damping", "0.0 to 1.0"),
                    ParamInfo::new("wet_gain", ">= 0.0"),
                ],
            },
            EffectInfo {
                name: "delay",
                params: vec![
                    ParamInfo::new("delay_time_ms", "greater than 0 up to 1000"),
                    ParamInfo::new("decay_ratio", "0.0 to below 1.0"),
                ],
            },
            EffectInfo {
                name: "distortion",
                params: vec![
                    ParamInfo::new("amount", "0.0 to 1.0"),
                    ParamInfo::new("per_channel", "true/false (no effect on mono)"),
                ],
            },
            EffectInfo {
                name: "eq",
                params: vec![
                    ParamInfo::new("center_freqs", "Hz, each > 0 and below Nyquist"),
                    ParamInfo::new("bandwidths", "Hz, one per band, each > 0"),
                    ParamInfo::new("gain_db", "-24 to 24, one value or one per band"),
                ],
            },
        ]
    }
}

fn parse_params<T>(effect: &'static str, params: &Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match params {
        Value::Null => Ok(T::default()),
        Value::Object(_) => serde_json::from_value(params.clone())
            .map_err(|e| param_error(effect, "params", e, "a known parameter mapping")),
        other => Err(param_error(effect, "params", other, "a JSON object")),
    }
}

/// One effect and its parameters, for listings
#[derive(Debug, Clone, Serialize)]
pub struct EffectInfo {
    pub name: &'static str,
    pub params: Vec<ParamInfo>,
}

/// A parameter and its allowed domain
#[derive(Debug, Clone, Serialize)]
pub struct ParamInfo {
    pub name: &'static str,
    pub domain: &'static str,
}

impl ParamInfo {
    fn new(name: &'static str, domain: &'static str) -> Self {
        Self { name, domain }
    }
}

// ============================================================================
// Tests
// ============================================================================
