//! Integration Tests
//!
//! End-to-end tests for the stemmix pipeline: decode, resample, mix, apply an
//! effect and encode, going through real files on disk.

use std::fs;
use std::path::Path;
use std::process::Command;

use approx::assert_relative_eq;
use serde_json::json;
use tempfile::tempdir;

use stemmix::config::EngineConfig;
use stemmix::dsp::{Delay, EffectSpec, Reverb};
use stemmix::engine::{
    decode, decode_file, encode, mix_with_ratios, resample, AudioSource, DecodeOptions,
    EncodeOptions, ExportFormat, MixSession, SampleBuffer,
};
use stemmix::{PipelineStage, StemmixError};

/// Helper to create a test sine wave buffer
fn sine(frequency: f32, duration_secs: f32, sample_rate: u32) -> SampleBuffer {
    SampleBuffer::sine(frequency, 0.5, duration_secs, sample_rate).unwrap()
}

// === Full Pipeline Tests ===

#[test]
fn test_full_pipeline_through_files() {
    let dir = tempdir().unwrap();
    let options = EncodeOptions::default();

    let drums = dir.path().join("drums.wav");
    let bass = dir.path().join("bass.wav");
    encode(&sine(110.0, 2.0, 44100), &drums, ExportFormat::Wav, &options).unwrap();
    encode(&sine(55.0, 3.0, 22050), &bass, ExportFormat::Wav, &options).unwrap();

    let config = EngineConfig {
        output_dir: dir.path().join("out"),
        ..EngineConfig::default()
    };
    let sources = vec![AudioSource::Path(drums), AudioSource::Path(bass)];
    let mut session = MixSession::from_sources(&sources, &[0.5], &config).unwrap();

    let dry_len = session.mix().unwrap().len();
    assert_eq!(dry_len, 132300);

    let wet = session
        .apply_effect(EffectSpec::Reverb(Reverb::new(0.3, 0.5, 0.4).unwrap()))
        .unwrap()
        .clone();
    assert_eq!(wet.len(), dry_len);

    let report = session.export("mixed_audio", ExportFormat::Wav, &config).unwrap();
    assert_eq!(report.path, dir.path().join("out").join("mixed_audio.wav"));
    assert_eq!(report.sample_rate, 44100);
    assert_eq!(report.num_samples, 132300);
    assert_eq!(report.sha256.len(), 64);

    let written = decode_file(&report.path, &DecodeOptions::native()).unwrap();
    assert_eq!(written, wet);
}

#[test]
fn test_decode_from_bytes_matches_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    encode(&sine(440.0, 0.5, 48000), &path, ExportFormat::Wav, &EncodeOptions::default())
        .unwrap();

    let from_path = decode_file(&path, &DecodeOptions::default()).unwrap();
    let from_bytes = decode(
        &AudioSource::Bytes {
            name: "tone.wav".to_string(),
            data: fs::read(&path).unwrap(),
        },
        &DecodeOptions::default(),
    )
    .unwrap();

    assert_eq!(from_path, from_bytes);
    assert_eq!(from_path.sample_rate(), 44100);
    assert_eq!(from_path.len(), 22050);
}

#[test]
fn test_wav_round_trip_is_bit_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("exact.wav");
    let original = SampleBuffer::new(vec![0.123_456_79, -0.5, 1.0, -1.0, 1e-7], 44100).unwrap();

    encode(&original, &path, ExportFormat::Wav, &EncodeOptions::default()).unwrap();
    let decoded = decode_file(&path, &DecodeOptions::native()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_single_sample_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("one.wav");
    let original = SampleBuffer::new(vec![0.25], 44100).unwrap();

    encode(&original, &path, ExportFormat::Wav, &EncodeOptions::default()).unwrap();
    assert_eq!(decode_file(&path, &DecodeOptions::native()).unwrap(), original);
}

// === Compressed Input Tests ===

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn test_mp3_fixture_mixes_with_wav() {
    let dir = tempdir().unwrap();
    let wav = dir.path().join("pad.wav");
    encode(&sine(220.0, 0.5, 44100), &wav, ExportFormat::Wav, &EncodeOptions::default()).unwrap();

    let sources = vec![
        AudioSource::Path(fixture("tone_22050_mono.mp3")),
        AudioSource::Path(wav),
    ];
    let mut session = MixSession::from_sources(&sources, &[0.5], &EngineConfig::default()).unwrap();
    let mixed = session.mix().unwrap();

    // About 1.04 s of MP3 at 22050 Hz, resampled to 44100 Hz, outlasts the pad
    assert_eq!(mixed.sample_rate(), 44100);
    assert!(mixed.len().abs_diff(46080) <= 1152, "{} samples", mixed.len());
    assert!(mixed.rms() > 0.0);
}

#[test]
fn test_mp3_round_trip_is_perceptually_close() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not found, skipping MP3 round trip");
        return;
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.mp3");
    let original = sine(440.0, 1.0, 44100);
    let report = encode(&original, &path, ExportFormat::Mp3, &EncodeOptions::default()).unwrap();
    assert_eq!(report.format, ExportFormat::Mp3);

    let decoded = decode_file(&path, &DecodeOptions::native()).unwrap();
    assert_eq!(decoded.sample_rate(), 44100);
    // Encoder delay and frame padding add at most a few frames
    assert!(decoded.len() >= original.len());
    assert!(decoded.len() - original.len() <= 4 * 1152, "{} samples", decoded.len());
    assert!(
        (decoded.rms_db() - original.rms_db()).abs() < 1.0,
        "{:.2} dB vs {:.2} dB",
        decoded.rms_db(),
        original.rms_db()
    );
}

// === Error Propagation Tests ===

#[test]
fn test_corrupt_source_fails_in_decode_stage() {
    let source = AudioSource::Bytes {
        name: "broken.mp3".to_string(),
        data: b"definitely not audio".to_vec(),
    };
    let err = decode(&source, &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.stage(), PipelineStage::Decode);
}

#[test]
fn test_missing_file_fails_in_decode_stage() {
    let err = decode_file(
        Path::new("/nonexistent/input.wav"),
        &DecodeOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StemmixError::Decode { .. }));
}

#[test]
fn test_native_rates_mismatch_in_mixer() {
    let a = sine(440.0, 0.1, 44100);
    let b = sine(440.0, 0.1, 48000);
    let err = mix_with_ratios(&[a, b], &[0.5]).unwrap_err();
    assert!(matches!(
        err,
        StemmixError::SampleRateMismatch {
            index: 1,
            expected: 44100,
            found: 48000
        }
    ));
    assert_eq!(err.stage(), PipelineStage::Mix);
}

#[test]
fn test_effect_errors_are_effect_stage() {
    let err = EffectSpec::from_name("delay", &json!({"delay_time_ms": 0.0})).unwrap_err();
    assert_eq!(err.stage(), PipelineStage::Effect);
    assert_eq!(err.error_code(), "EFFECT_PARAM");
}

#[test]
fn test_unsupported_format_string() {
    let err = "flac".parse::<ExportFormat>().unwrap_err();
    assert!(matches!(err, StemmixError::UnsupportedFormat { .. }));
    assert_eq!(err.stage(), PipelineStage::Encode);
}

// === Signal Tests ===

#[test]
fn test_resample_round_trip_preserves_energy() {
    let original = sine(300.0, 1.0, 44100);
    let down = resample(original.clone(), 16000).unwrap();
    let back = resample(down, 44100).unwrap();

    assert!((back.len() as i64 - original.len() as i64).abs() <= 1);
    assert_relative_eq!(back.rms(), original.rms(), max_relative = 0.02);
}

#[test]
fn test_delay_echo_survives_export() {
    let dir = tempdir().unwrap();
    let mut samples = vec![0.0; 4410];
    samples[0] = 0.8;
    let impulse = SampleBuffer::new(samples, 44100).unwrap();

    let echoed = EffectSpec::Delay(Delay::new(50.0, 0.5).unwrap())
        .apply(&impulse)
        .unwrap();
    let path = dir.path().join("echo.wav");
    encode(&echoed, &path, ExportFormat::Wav, &EncodeOptions::default()).unwrap();

    let decoded = decode_file(&path, &DecodeOptions::native()).unwrap();
    assert_relative_eq!(decoded.samples()[2205], 0.4);
}
