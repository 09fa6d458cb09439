//! Audio file encoding
//!
//! Writes a mono [`SampleBuffer`] to disk. WAV is written with hound; 32-bit
//! float WAV decodes back bit-exact. MP3 is produced by handing a scratch WAV
//! to ffmpeg's libmp3lame encoder.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::buffer::SampleBuffer;
use crate::error::{Result, StemmixError};

/// Container/codec written by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Wav,
    Mp3,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = StemmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" => Ok(ExportFormat::Wav),
            "mp3" => Ok(ExportFormat::Mp3),
            other => Err(StemmixError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// WAV bit depth: 16, 24 or 32 (float)
    pub wav_bit_depth: u16,
    /// LAME VBR quality, 0 (best) to 9
    pub mp3_quality: u8,
    /// ffmpeg executable used for MP3
    pub ffmpeg_binary: PathBuf,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            wav_bit_depth: 32,
            mp3_quality: 2,
            ffmpeg_binary: PathBuf::from("ffmpeg"),
        }
    }
}

/// Description of a written file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub sample_rate: u32,
    pub num_samples: usize,
    /// Hex SHA-256 of the written file
    pub sha256: String,
}

/// Encode `buffer` to `path`, creating or overwriting the file
///
/// The file is staged next to `path` and renamed into place once complete,
/// so a failed export leaves any existing file untouched.
///
/// # Errors
/// * `UnsupportedFormat` - If the WAV bit depth is not 16, 24 or 32
/// * `Encode` - If the destination cannot be written or ffmpeg fails
pub fn encode(
    buffer: &SampleBuffer,
    path: &Path,
    format: ExportFormat,
    options: &EncodeOptions,
) -> Result<ExportReport> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .map_err(|e| StemmixError::encode(path, "cannot create output directory", e))?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };

    let staged = tempfile::Builder::new()
        .prefix(".stemmix-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(&parent)
        .map_err(|e| StemmixError::encode(path, "cannot create staging file", e))?;

    match format {
        ExportFormat::Wav => write_wav(buffer, staged.path(), options.wav_bit_depth)?,
        ExportFormat::Mp3 => write_mp3(buffer, staged.path(), options)?,
    }

    let sha256 = file_sha256(staged.path())?;
    staged
        .persist(path)
        .map_err(|e| StemmixError::encode(path, "cannot move export into place", e.error))?;

    // Staging files are created owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))
            .map_err(|e| StemmixError::encode(path, "cannot set file permissions", e))?;
    }

    info!(
        "Exported {} samples @ {} Hz to {} ({})",
        buffer.len(),
        buffer.sample_rate(),
        path.display(),
        format
    );

    Ok(ExportReport {
        path: path.to_path_buf(),
        format,
        sample_rate: buffer.sample_rate(),
        num_samples: buffer.len(),
        sha256,
    })
}

/// Write a mono WAV file at the buffer's sample rate
fn write_wav(buffer: &SampleBuffer, path: &Path, bit_depth: u16) -> Result<()> {
    let sample_format = match bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        _ => {
            return Err(StemmixError::UnsupportedFormat {
                format: format!("{}-bit WAV (only 16, 24, 32 supported)", bit_depth),
            });
        }
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bit_depth,
        sample_format,
    };

    let write_err = |e: hound::Error| StemmixError::encode(path, "failed to write WAV", e);

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;

    match bit_depth {
        16 => {
            for &sample in buffer.samples() {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_err)?;
            }
        }
        24 => {
            for &sample in buffer.samples() {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(write_err)?;
            }
        }
        _ => {
            for &sample in buffer.samples() {
                writer.write_sample(sample).map_err(write_err)?;
            }
        }
    }

    writer.finalize().map_err(write_err)
}

/// Encode MP3 through ffmpeg from a scratch 32-bit WAV
fn write_mp3(buffer: &SampleBuffer, path: &Path, options: &EncodeOptions) -> Result<()> {
    if options.mp3_quality > 9 {
        return Err(StemmixError::UnsupportedFormat {
            format: format!("mp3 quality {} (expected 0 to 9)", options.mp3_quality),
        });
    }

    let temp_dir = tempfile::tempdir()
        .map_err(|e| StemmixError::encode(path, "cannot create scratch directory", e))?;
    let temp_wav = temp_dir.path().join("stemmix_export.wav");
    write_wav(buffer, &temp_wav, 32)?;

    debug!(
        "Running {} to encode {}",
        options.ffmpeg_binary.display(),
        path.display()
    );

    let output = Command::new(&options.ffmpeg_binary)
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(&temp_wav)
        .args(["-ac", "1", "-ar"])
        .arg(buffer.sample_rate().to_string())
        .args(["-codec:a", "libmp3lame", "-qscale:a"])
        .arg(options.mp3_quality.to_string())
        .arg(path)
        .output()
        .map_err(|e| {
            StemmixError::encode(
                path,
                format!("failed to spawn {}", options.ffmpeg_binary.display()),
                e,
            )
        })?;

    if !output.status.success() {
        return Err(StemmixError::Encode {
            path: path.display().to_string(),
            reason: format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            source: None,
        });
    }

    Ok(())
}

fn file_sha256(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).map_err(|e| StemmixError::encode(path, "cannot reopen output", e))?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = file
            .read(&mut chunk)
            .map_err(|e| StemmixError::encode(path, "cannot reopen output", e))?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Tests
// ============================================================================
