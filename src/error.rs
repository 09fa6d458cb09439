//! Error handling for Stemmix
//!
//! Every failure is scoped to one pipeline stage. Callers can ask an error
//! which stage produced it and get recovery suggestions for the user.

use std::fmt;

use thiserror::Error;

/// Result type alias for Stemmix operations
pub type Result<T> = std::result::Result<T, StemmixError>;

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Decode,
    Resample,
    Mix,
    Effect,
    Encode,
    /// Buffer construction, configuration and other plumbing
    Setup,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Decode => "decode",
            PipelineStage::Resample => "resample",
            PipelineStage::Mix => "mix",
            PipelineStage::Effect => "effect",
            PipelineStage::Encode => "encode",
            PipelineStage::Setup => "setup",
        };
        f.write_str(name)
    }
}

/// Main error type for Stemmix operations
#[derive(Error, Debug)]
pub enum StemmixError {
    // Decode Errors
    #[error("Cannot decode '{source_name}': {reason}")]
    Decode {
        source_name: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported codec in '{source_name}': {codec}")]
    UnsupportedCodec { source_name: String, codec: String },

    #[error("Audio source '{source_name}' contains no samples")]
    EmptySource { source_name: String },

    // Resample Errors
    #[error("Invalid target sample rate: {rate} Hz")]
    InvalidTargetRate { rate: u32 },

    #[error("Resampling {len} samples from {from} Hz to {to} Hz leaves no samples")]
    ResampleTooShort { len: usize, from: u32, to: u32 },

    // Mix Errors
    #[error("Mixing needs at least 2 streams, got {count}")]
    TooFewStreams { count: usize },

    #[error("Mixing {buffers} streams needs {expected} ratios, got {ratios}", expected = .buffers.saturating_sub(1))]
    MixArity { buffers: usize, ratios: usize },

    #[error("Stream {index} is at {found} Hz but the mix runs at {expected} Hz")]
    SampleRateMismatch {
        index: usize,
        expected: u32,
        found: u32,
    },

    #[error("Mix ratio {index} is {value}, expected 0.0 to 1.0")]
    RatioOutOfRange { index: usize, value: f32 },

    // Effect Errors
    #[error("Invalid {effect} parameter '{field}': {value} (expected {expected})")]
    EffectParam {
        effect: &'static str,
        field: String,
        value: String,
        expected: String,
    },

    #[error("DSP overflow: {effect} produced invalid audio (NaN/Inf)")]
    DspOverflow { effect: &'static str },

    // Encode Errors
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Cannot write '{path}': {reason}")]
    Encode {
        path: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Setup Errors
    #[error("Invalid sample buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StemmixError {
    /// Build a decode error wrapping an underlying library error
    pub(crate) fn decode<E>(source_name: &str, reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StemmixError::Decode {
            source_name: source_name.to_string(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an encode error wrapping an underlying library error
    pub(crate) fn encode<E>(path: &std::path::Path, reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StemmixError::Encode {
            path: path.display().to_string(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Stage of the pipeline that failed
    pub fn stage(&self) -> PipelineStage {
        match self {
            StemmixError::Decode { .. }
            | StemmixError::UnsupportedCodec { .. }
            | StemmixError::EmptySource { .. } => PipelineStage::Decode,
            StemmixError::InvalidTargetRate { .. } | StemmixError::ResampleTooShort { .. } => {
                PipelineStage::Resample
            }
            StemmixError::TooFewStreams { .. }
            | StemmixError::MixArity { .. }
            | StemmixError::SampleRateMismatch { .. }
            | StemmixError::RatioOutOfRange { .. } => PipelineStage::Mix,
            StemmixError::EffectParam { .. } | StemmixError::DspOverflow { .. } => {
                PipelineStage::Effect
            }
            StemmixError::UnsupportedFormat { .. } | StemmixError::Encode { .. } => {
                PipelineStage::Encode
            }
            StemmixError::InvalidBuffer { .. }
            | StemmixError::Config { .. }
            | StemmixError::Io(_)
            | StemmixError::Serialization(_) => PipelineStage::Setup,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StemmixError::Decode { .. } => "DECODE_ERROR",
            StemmixError::UnsupportedCodec { .. } => "UNSUPPORTED_CODEC",
            StemmixError::EmptySource { .. } => "EMPTY_SOURCE",
            StemmixError::InvalidTargetRate { .. } => "INVALID_TARGET_RATE",
            StemmixError::ResampleTooShort { .. } => "RESAMPLE_TOO_SHORT",
            StemmixError::TooFewStreams { .. } => "TOO_FEW_STREAMS",
            StemmixError::MixArity { .. } => "MIX_ARITY",
            StemmixError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            StemmixError::RatioOutOfRange { .. } => "RATIO_OUT_OF_RANGE",
            StemmixError::EffectParam { .. } => "EFFECT_PARAM",
            StemmixError::DspOverflow { .. } => "DSP_OVERFLOW",
            StemmixError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            StemmixError::Encode { .. } => "ENCODE_ERROR",
            StemmixError::InvalidBuffer { .. } => "INVALID_BUFFER",
            StemmixError::Config { .. } => "CONFIG_ERROR",
            StemmixError::Io(_) => "IO_ERROR",
            StemmixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can fix this error by changing inputs
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            StemmixError::Io(_) | StemmixError::Serialization(_) | StemmixError::DspOverflow { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StemmixError::Decode { .. } => vec![
                "Check the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            StemmixError::UnsupportedCodec { .. } => vec![
                "Convert the file to WAV or MP3 first",
                "Supported inputs: WAV, MP3, FLAC, OGG Vorbis, AAC",
            ],
            StemmixError::EmptySource { .. } => vec!["Upload a file that contains audio"],
            StemmixError::MixArity { .. } => {
                vec!["Provide exactly one mix ratio per adjacent pair of files"]
            }
            StemmixError::TooFewStreams { .. } => vec!["Upload at least two audio files"],
            StemmixError::RatioOutOfRange { .. } => vec!["Mix ratios must be between 0.0 and 1.0"],
            StemmixError::SampleRateMismatch { .. } => {
                vec!["Resample every stream to a common rate before mixing"]
            }
            StemmixError::EffectParam { .. } => vec![
                "Adjust the effect parameter into its allowed range",
                "Run 'stemmix-cli effects' to list parameter ranges",
            ],
            StemmixError::UnsupportedFormat { .. } => vec!["Supported export formats: wav, mp3"],
            StemmixError::Encode { .. } => vec![
                "Check the destination directory exists and is writable",
                "MP3 export needs ffmpeg with libmp3lame on the PATH",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StemmixError::MixArity {
            buffers: 3,
            ratios: 1,
        };
        assert_eq!(err.error_code(), "MIX_ARITY");
        assert_eq!(err.stage(), PipelineStage::Mix);
        assert_eq!(err.to_string(), "Mixing 3 streams needs 2 ratios, got 1");
    }

    #[test]
    fn test_effect_param_message_names_field() {
        let err = StemmixError::EffectParam {
            effect: "reverb",
            field: "room_size".to_string(),
            value: "1.5".to_string(),
            expected: "0.0 to 1.0".to_string(),
        };
        assert!(err.to_string().contains("room_size"));
        assert_eq!(err.stage(), PipelineStage::Effect);
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Encode.to_string(), "encode");
        let err = StemmixError::InvalidTargetRate { rate: 0 };
        assert_eq!(err.stage(), PipelineStage::Resample);
    }
}
