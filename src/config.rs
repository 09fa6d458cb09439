//! Engine configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{DecodeOptions, EncodeOptions, CANONICAL_SAMPLE_RATE};
use crate::error::{Result, StemmixError};

/// Settings shared by every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Rate every stream is decoded and mixed at
    pub sample_rate: u32,
    /// WAV export bit depth: 16, 24 or 32 (float)
    pub wav_bit_depth: u16,
    /// LAME VBR quality for MP3 export, 0 (best) to 9
    pub mp3_quality: u8,
    /// ffmpeg executable used for MP3 export
    pub ffmpeg_binary: PathBuf,
    /// Ratio the CLI uses when none is given
    pub default_mix_ratio: f32,
    /// Directory exported files are written to
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: CANONICAL_SAMPLE_RATE,
            wav_bit_depth: 32,
            mp3_quality: 2,
            ffmpeg_binary: PathBuf::from("ffmpeg"),
            default_mix_ratio: 0.5,
            output_dir: PathBuf::from("."),
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| StemmixError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON configuration string
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| StemmixError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(StemmixError::Config {
                reason: "sample_rate must be positive".to_string(),
            });
        }
        if ![16, 24, 32].contains(&self.wav_bit_depth) {
            return Err(StemmixError::Config {
                reason: format!(
                    "wav_bit_depth must be 16, 24 or 32, got {}",
                    self.wav_bit_depth
                ),
            });
        }
        if self.mp3_quality > 9 {
            return Err(StemmixError::Config {
                reason: format!("mp3_quality must be 0 to 9, got {}", self.mp3_quality),
            });
        }
        if !(0.0..=1.0).contains(&self.default_mix_ratio) {
            return Err(StemmixError::Config {
                reason: format!(
                    "default_mix_ratio must be 0.0 to 1.0, got {}",
                    self.default_mix_ratio
                ),
            });
        }
        Ok(())
    }

    /// Decoder settings derived from this configuration
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            target_sample_rate: Some(self.sample_rate),
        }
    }

    /// Encoder settings derived from this configuration
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            wav_bit_depth: self.wav_bit_depth,
            mp3_quality: self.mp3_quality,
            ffmpeg_binary: self.ffmpeg_binary.clone(),
        }
    }
}
