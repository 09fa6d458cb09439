//! DSP Effects Library
//!
//! Offline, whole-buffer effects. Each effect is a parameter record
//! implementing the `Effect` trait; `EffectSpec` selects one of them.

mod delay;
mod distortion;
mod effect;
mod eq;
mod reverb;
pub mod spectral;

pub use delay::{Delay, MAX_DELAY_MS};
pub use distortion::Distortion;
pub use effect::{Effect, EffectInfo, EffectSpec, ParamInfo};
pub use eq::{BandGain, Equalizer, MAX_GAIN_DB};
pub use reverb::{Reverb, MAX_DECAY_SECS, MIN_DECAY_SECS};
