//! Audio file decoding
//!
//! Loads an encoded audio source into a mono [`SampleBuffer`]. WAV files are
//! read with hound; MP3, FLAC, OGG Vorbis and AAC go through symphonia.
//! Multi-channel audio is downmixed by averaging each frame, then the result
//! is resampled to the target rate.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};
use log::{debug, warn};
use symphonia::core::audio::SampleBuffer as DecodedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::{SampleBuffer, CANONICAL_SAMPLE_RATE};
use crate::engine::resampler::resample;
use crate::error::{Result, StemmixError};

/// A readable audio input: a file on disk or uploaded bytes
#[derive(Debug, Clone)]
pub enum AudioSource {
    Path(PathBuf),
    Bytes { name: String, data: Vec<u8> },
}

impl AudioSource {
    /// Name used in logs and error messages
    pub fn name(&self) -> String {
        match self {
            AudioSource::Path(path) => path.display().to_string(),
            AudioSource::Bytes { name, .. } => name.clone(),
        }
    }

    /// File extension hint, lowercased
    fn extension(&self) -> Option<String> {
        let path = match self {
            AudioSource::Path(path) => path.as_path(),
            AudioSource::Bytes { name, .. } => Path::new(name),
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        AudioSource::Path(path)
    }
}

impl From<&Path> for AudioSource {
    fn from(path: &Path) -> Self {
        AudioSource::Path(path.to_path_buf())
    }
}

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Rate the decoded buffer is resampled to; `None` keeps the native rate
    pub target_sample_rate: Option<u32>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            target_sample_rate: Some(CANONICAL_SAMPLE_RATE),
        }
    }
}

impl DecodeOptions {
    /// Keep the file's own sample rate
    pub fn native() -> Self {
        Self {
            target_sample_rate: None,
        }
    }
}

/// Decoded interleaved PCM before downmixing
struct RawAudio {
    interleaved: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

/// Decode an audio source into a mono buffer
///
/// # Errors
/// * `Decode` - If the source cannot be opened or read
/// * `UnsupportedCodec` - If no decoder handles the container/codec
/// * `EmptySource` - If the source decodes to zero samples
/// * `InvalidTargetRate` - If the requested target rate is zero
pub fn decode(source: &AudioSource, options: &DecodeOptions) -> Result<SampleBuffer> {
    let name = source.name();
    let extension = source.extension();

    let raw = match source {
        AudioSource::Path(path) => {
            let file = File::open(path).map_err(|e| StemmixError::decode(&name, "cannot open file", e))?;
            read_any(file, &name, extension.as_deref())?
        }
        AudioSource::Bytes { data, .. } => {
            read_any(Cursor::new(data.clone()), &name, extension.as_deref())?
        }
    };

    debug!(
        "Decoded '{}': {} Hz, {} channel(s), {} frames",
        name,
        raw.sample_rate,
        raw.channels,
        raw.interleaved.len() / raw.channels.max(1)
    );

    let mono = downmix(&raw.interleaved, raw.channels);
    if mono.is_empty() {
        return Err(StemmixError::EmptySource { source_name: name });
    }
    if raw.sample_rate == 0 {
        return Err(StemmixError::Decode {
            source_name: name,
            reason: "stream reports a sample rate of 0 Hz".to_string(),
            source: None,
        });
    }

    let buffer = SampleBuffer::new(mono, raw.sample_rate)?;
    match options.target_sample_rate {
        Some(rate) => resample(buffer, rate),
        None => Ok(buffer),
    }
}

/// Decode a file path with the given options
pub fn decode_file(path: &Path, options: &DecodeOptions) -> Result<SampleBuffer> {
    decode(&AudioSource::from(path), options)
}

/// Pick a reader: hound for RIFF/WAVE, symphonia for everything else
fn read_any<R>(mut reader: R, name: &str, extension: Option<&str>) -> Result<RawAudio>
where
    R: MediaSource + 'static,
{
    let mut magic = [0u8; 12];
    let filled = read_up_to(&mut reader, &mut magic)
        .map_err(|e| StemmixError::decode(name, "cannot read header", e))?;
    reader
        .rewind()
        .map_err(|e| StemmixError::decode(name, "cannot rewind source", e))?;

    if filled == 0 {
        return Err(StemmixError::EmptySource {
            source_name: name.to_string(),
        });
    }

    if filled == magic.len() && &magic[0..4] == b"RIFF" && &magic[8..12] == b"WAVE" {
        read_wav(reader, name)
    } else {
        read_compressed(Box::new(reader), name, extension)
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Read WAV samples and convert to f32
fn read_wav<R: Read>(reader: R, name: &str) -> Result<RawAudio> {
    let reader = WavReader::new(reader)
        .map_err(|e| StemmixError::decode(name, "failed to open WAV data", e))?;

    let spec = reader.spec();
    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format, name)?;

    Ok(RawAudio {
        interleaved,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}

fn read_samples_as_f32<R: Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
    name: &str,
) -> Result<Vec<f32>> {
    let corrupt = |e: hound::Error| StemmixError::decode(name, "failed to read WAV samples", e);
    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(corrupt),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(corrupt),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(corrupt),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(corrupt),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(corrupt),
        (format, bits) => Err(StemmixError::UnsupportedCodec {
            source_name: name.to_string(),
            codec: format!("{}-bit {:?} WAV", bits, format),
        }),
    }
}

/// Decode a compressed stream with symphonia
fn read_compressed(
    source: Box<dyn MediaSource>,
    name: &str,
    extension: Option<&str>,
) -> Result<RawAudio> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| StemmixError::UnsupportedCodec {
            source_name: name.to_string(),
            codec: e.to_string(),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| StemmixError::UnsupportedCodec {
            source_name: name.to_string(),
            codec: "no audio track found".to_string(),
        })?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| StemmixError::UnsupportedCodec {
            source_name: name.to_string(),
            codec: e.to_string(),
        })?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<DecodedBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(StemmixError::decode(name, "failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!("Skipping corrupt packet in '{}': {}", name, reason);
                continue;
            }
            Err(e) => return Err(StemmixError::decode(name, "failed to decode packet", e)),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let needed = decoded.capacity() * channels;
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(DecodedBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    Ok(RawAudio {
        interleaved,
        channels: channels.max(1),
        sample_rate,
    })
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => interleaved.to_vec(),
        n => interleaved
            .chunks_exact(n)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================
