//! Sample rate conversion
//!
//! Converts whole buffers between sample rates with an FFT-based,
//! band-limited resampler. Output length is `round(len * to / from)`.

use log::debug;

use crate::dsp::spectral::resample_fourier;
use crate::engine::buffer::SampleBuffer;
use crate::error::{Result, StemmixError};

/// Number of samples a buffer of `len` samples has after conversion
pub fn resampled_len(len: usize, from: u32, to: u32) -> usize {
    ((len as f64) * to as f64 / from as f64).round() as usize
}

/// Resample a buffer to `target_rate`
///
/// A buffer already at `target_rate` is handed back untouched.
///
/// # Errors
/// * `InvalidTargetRate` - If `target_rate` is zero
/// * `ResampleTooShort` - If the converted buffer would have no samples
pub fn resample(buffer: SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if target_rate == 0 {
        return Err(StemmixError::InvalidTargetRate { rate: target_rate });
    }

    let source_rate = buffer.sample_rate();
    if source_rate == target_rate {
        return Ok(buffer);
    }

    let out_len = resampled_len(buffer.len(), source_rate, target_rate);
    if out_len == 0 {
        return Err(StemmixError::ResampleTooShort {
            len: buffer.len(),
            from: source_rate,
            to: target_rate,
        });
    }

    debug!(
        "Resampling {} samples {} Hz -> {} Hz ({} samples)",
        buffer.len(),
        source_rate,
        target_rate,
        out_len
    );

    let samples = resample_fourier(buffer.samples(), out_len);
    SampleBuffer::new(samples, target_rate)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rate_returns_input() {
        let tone = SampleBuffer::sine(440.0, 0.5, 0.1, 44100).unwrap();
        let out = resample(tone.clone(), 44100).unwrap();
        assert_eq!(out, tone);
    }

    #[test]
    fn test_zero_target_rate_rejected() {
        let tone = SampleBuffer::sine(440.0, 0.5, 0.1, 44100).unwrap();
        assert!(matches!(
            resample(tone, 0),
            Err(StemmixError::InvalidTargetRate { rate: 0 })
        ));
    }

    #[test]
    fn test_too_short_rejected() {
        let single = SampleBuffer::new(vec![0.5], 44100).unwrap();
        assert!(matches!(
            resample(single, 8000),
            Err(StemmixError::ResampleTooShort { .. })
        ));
    }

    #[test]
    fn test_output_length_and_rate() {
        let tone = SampleBuffer::sine(440.0, 0.5, 3.0, 22050).unwrap();
        let out = resample(tone, 44100).unwrap();
        assert_eq!(out.len(), 132300);
        assert_eq!(out.sample_rate(), 44100);
    }

    #[test]
    fn test_round_trip_preserves_length_and_energy() {
        let tone = SampleBuffer::sine(1000.0, 0.8, 0.5, 44100).unwrap();
        let original_len = tone.len();
        let original_rms = tone.rms();

        let down = resample(tone, 32000).unwrap();
        let back = resample(down, 44100).unwrap();

        assert!((back.len() as i64 - original_len as i64).abs() <= 1);
        let ratio_db = 20.0 * (back.rms() / original_rms).log10();
        assert!(ratio_db.abs() < 0.1, "RMS drifted by {:.3} dB", ratio_db);
    }

    #[test]
    fn test_resampled_len_rounds() {
        assert_eq!(resampled_len(66150, 22050, 44100), 132300);
        assert_eq!(resampled_len(3, 44100, 22050), 2);
        assert_eq!(resampled_len(100, 48000, 44100), 92);
    }
}
