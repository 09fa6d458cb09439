//! Pipeline Scenarios
//!
//! Behavioral checks of the mixer and effect selection over in-memory buffers.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

use stemmix::dsp::{Distortion, EffectSpec, Equalizer};
use stemmix::engine::{mix_with_ratios, resample, MixSession, SampleBuffer};
use stemmix::StemmixError;

fn tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> SampleBuffer {
    SampleBuffer::sine(frequency, 0.5, duration_secs, sample_rate).unwrap()
}

fn constant(value: f32, len: usize) -> SampleBuffer {
    SampleBuffer::new(vec![value; len], 44100).unwrap()
}

#[test]
fn test_mixed_rates_pad_to_longest() {
    let a = tone(440.0, 2.0, 44100);
    let b = resample(tone(220.0, 3.0, 22050), 44100).unwrap();
    assert_eq!(b.len(), 132300);

    let mixed = mix_with_ratios(&[a.clone(), b.clone()], &[0.5]).unwrap();
    assert_eq!(mixed.len(), 132300);
    assert_eq!(mixed.sample_rate(), 44100);

    // Past the end of A only half of B remains
    let tail = 100_000;
    assert!((mixed.samples()[tail] - 0.5 * b.samples()[tail]).abs() < 1e-6);
    assert!((mixed.samples()[10] - 0.5 * (a.samples()[10] + b.samples()[10])).abs() < 1e-6);
}

#[test]
fn test_session_resamples_before_mixing() {
    let mut session = MixSession::new(
        vec![tone(440.0, 2.0, 44100), tone(220.0, 3.0, 22050)],
        &[0.5],
        44100,
    )
    .unwrap();
    let mixed = session.mix().unwrap();
    assert_eq!(mixed.len(), 132300);
    assert_eq!(mixed.sample_rate(), 44100);
}

#[test]
fn test_three_buffers_one_ratio_is_arity_error() {
    let buffers = vec![constant(0.1, 10), constant(0.2, 10), constant(0.3, 10)];
    match mix_with_ratios(&buffers, &[0.5]).unwrap_err() {
        StemmixError::MixArity { buffers, ratios } => {
            assert_eq!(buffers, 3);
            assert_eq!(ratios, 1);
        }
        other => panic!("Expected MixArity, got {:?}", other),
    }
}

#[test]
fn test_zero_ratio_leaves_accumulator() {
    let mixed = mix_with_ratios(&[constant(0.2, 8), constant(0.9, 8)], &[0.0]).unwrap();
    assert_eq!(mixed.samples(), constant(0.2, 8).samples());
}

#[test]
fn test_unit_ratio_replaces_accumulator() {
    let mixed = mix_with_ratios(&[constant(0.2, 8), constant(0.9, 8)], &[1.0]).unwrap();
    assert_eq!(mixed.samples(), constant(0.9, 8).samples());
}

#[test]
fn test_cascade_order_matters() {
    let a = constant(1.0, 4);
    let b = constant(0.0, 4);
    let ab = mix_with_ratios(&[a.clone(), b.clone()], &[0.3]).unwrap();
    let ba = mix_with_ratios(&[b, a], &[0.3]).unwrap();
    assert_ne!(ab, ba);
    assert!((ab.samples()[0] - 0.7).abs() < 1e-6);
    assert!((ba.samples()[0] - 0.3).abs() < 1e-6);
}

#[test]
fn test_cascade_folds_left() {
    // ((0.0 * 0.5 + 1.0 * 0.5) * 0.75 + 0.0 * 0.25) = 0.375
    let buffers = [constant(0.0, 2), constant(1.0, 2), constant(0.0, 2)];
    let mixed = mix_with_ratios(&buffers, &[0.5, 0.25]).unwrap();
    assert!((mixed.samples()[0] - 0.375).abs() < 1e-6);
}

#[test_case("delay", json!({"delay_time_ms": 0.0}), "delay_time_ms" ; "delay of zero")]
#[test_case("reverb", json!({"room_size": 1.5}), "room_size" ; "oversized room")]
#[test_case("distortion", json!({"amount": -0.1}), "amount" ; "negative drive")]
#[test_case("eq", json!({"center_freqs": [100.0], "bandwidths": [50.0], "gain_db": 40.0}), "gain_db" ; "excessive eq gain")]
fn test_out_of_domain_params(name: &str, params: Value, field: &str) {
    match EffectSpec::from_name(name, &params).unwrap_err() {
        StemmixError::EffectParam { field: f, .. } => assert_eq!(f, field),
        other => panic!("Expected EffectParam, got {:?}", other),
    }
}

#[test_case(tone(440.0, 0.2, 44100) ; "tone")]
#[test_case(constant(0.0, 1) ; "single silent sample")]
#[test_case(constant(-1.0, 300) ; "full scale dc")]
fn test_none_is_identity(buffer: SampleBuffer) {
    assert_eq!(EffectSpec::None.apply(&buffer).unwrap(), buffer);
}

#[test]
fn test_effects_keep_rate_and_length_after_mix() {
    let mixed = mix_with_ratios(&[tone(300.0, 0.5, 44100), tone(500.0, 0.25, 44100)], &[0.4])
        .unwrap();
    for spec in [
        EffectSpec::Distortion(Distortion::default()),
        EffectSpec::Eq(Equalizer::default()),
        EffectSpec::from_name("reverb", &Value::Null).unwrap(),
        EffectSpec::from_name("delay", &json!({"delay_time_ms": 120})).unwrap(),
    ] {
        let out = spec.apply(&mixed).unwrap();
        assert_eq!(out.len(), mixed.len(), "{}", spec.name());
        assert_eq!(out.sample_rate(), 44100);
        assert!(out.is_finite());
    }
}
