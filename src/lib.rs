//! Stemmix - Offline Audio Mixing and Effects Engine
//!
//! Combines several audio files into one and applies a single effect:
//!
//! Decode -> Resample -> Mix -> Effect -> Encode
//!
//! Every stage is a plain function from values to a new value. Nothing is
//! shared between runs, so independent mixes can run on separate threads.
//!
//! ```no_run
//! use stemmix::config::EngineConfig;
//! use stemmix::dsp::{EffectSpec, Reverb};
//! use stemmix::engine::{AudioSource, ExportFormat, MixSession};
//!
//! # fn main() -> stemmix::Result<()> {
//! let config = EngineConfig::default();
//! let sources = vec![
//!     AudioSource::Path("drums.wav".into()),
//!     AudioSource::Path("vocals.mp3".into()),
//! ];
//! let mut session = MixSession::from_sources(&sources, &[0.5], &config)?;
//! session.mix()?;
//! session.apply_effect(EffectSpec::Reverb(Reverb::new(0.4, 0.5, 0.3)?))?;
//! let report = session.export("mixed_audio", ExportFormat::Wav, &config)?;
//! println!("wrote {}", report.path.display());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use error::{PipelineStage, Result, StemmixError};
