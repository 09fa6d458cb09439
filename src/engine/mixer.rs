//! Cascading weighted mixer
//!
//! Folds an ordered list of streams into one buffer. Starting from the first
//! stream, each following stream `i` is blended into the running mix with
//! `mix = mix * (1 - r) + stream * r`, where `r` is the ratio paired with it.
//! Order matters: the fold is not commutative.
//!
//! Streams of different lengths are aligned by padding the shorter side
//! with silence, so no audio is dropped. No clipping is applied here.

use log::debug;

use crate::engine::buffer::{MixRatio, SampleBuffer};
use crate::error::{Result, StemmixError};

/// Check stream/ratio arity and a common sample rate
fn validate_inputs(buffers: &[SampleBuffer], ratios: &[MixRatio]) -> Result<u32> {
    if buffers.len() < 2 {
        return Err(StemmixError::TooFewStreams {
            count: buffers.len(),
        });
    }
    if ratios.len() != buffers.len() - 1 {
        return Err(StemmixError::MixArity {
            buffers: buffers.len(),
            ratios: ratios.len(),
        });
    }

    let expected = buffers[0].sample_rate();
    if let Some((index, found)) = buffers
        .iter()
        .map(SampleBuffer::sample_rate)
        .enumerate()
        .find(|&(_, rate)| rate != expected)
    {
        return Err(StemmixError::SampleRateMismatch {
            index,
            expected,
            found,
        });
    }

    Ok(expected)
}

/// Blend one stream into the running mix in place
fn fold_stream(mix: &mut Vec<f32>, stream: &[f32], ratio: MixRatio) {
    if stream.len() > mix.len() {
        mix.resize(stream.len(), 0.0);
    }

    let weight = ratio.value();
    let keep = 1.0 - weight;
    for (i, acc) in mix.iter_mut().enumerate() {
        let incoming = stream.get(i).copied().unwrap_or(0.0);
        *acc = *acc * keep + incoming * weight;
    }
}

/// Mix N >= 2 buffers with N - 1 ratios
///
/// # Errors
/// * `TooFewStreams` - Fewer than two buffers
/// * `MixArity` - Ratio count is not `buffers.len() - 1`
/// * `SampleRateMismatch` - Buffers are not all at the same rate
pub fn mix(buffers: &[SampleBuffer], ratios: &[MixRatio]) -> Result<SampleBuffer> {
    let sample_rate = validate_inputs(buffers, ratios)?;

    let mixed = buffers[1..].iter().zip(ratios).fold(
        buffers[0].samples().to_vec(),
        |mut acc, (stream, &ratio)| {
            fold_stream(&mut acc, stream.samples(), ratio);
            acc
        },
    );

    debug!(
        "Mixed {} streams @ {} Hz into {} samples",
        buffers.len(),
        sample_rate,
        mixed.len()
    );

    SampleBuffer::new(mixed, sample_rate)
}

/// Mix with raw `f32` ratios, validating each into [0.0, 1.0]
pub fn mix_with_ratios(buffers: &[SampleBuffer], ratios: &[f32]) -> Result<SampleBuffer> {
    let ratios = MixRatio::from_slice(ratios)?;
    mix(buffers, &ratios)
}

// ============================================================================
// Tests
// ============================================================================
