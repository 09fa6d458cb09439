//! Audio Engine Module
//!
//! The mixing pipeline stages:
//! - Sample buffers and mix ratios
//! - Decoding and encoding audio files
//! - Sample rate conversion
//! - Cascading mixer
//! - Mix sessions tying the stages together

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod mixer;
pub mod resampler;
pub mod session;

pub use buffer::{db_to_linear, linear_to_db, MixRatio, SampleBuffer, CANONICAL_SAMPLE_RATE};
pub use decoder::{decode, decode_file, AudioSource, DecodeOptions};
pub use encoder::{encode, EncodeOptions, ExportFormat, ExportReport};
pub use mixer::{mix, mix_with_ratios};
pub use resampler::{resample, resampled_len};
pub use session::MixSession;
