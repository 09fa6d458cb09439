//! FFT helpers
//!
//! Whole-buffer spectral operations used by the resampler (band-limited
//! length change) and the reverb (fast convolution).

use rustfft::{num_complex::Complex, FftPlanner};

/// Change the length of a real signal by truncating or zero-extending its
/// spectrum.
///
/// The output is the band-limited reconstruction of `input` on a grid of
/// `out_len` points covering the same time span. Content above the new
/// Nyquist frequency is discarded, so downsampling does not alias.
pub fn resample_fourier(input: &[f32], out_len: usize) -> Vec<f32> {
    let in_len = input.len();
    if in_len == 0 || out_len == 0 {
        return vec![0.0; out_len];
    }
    if in_len == out_len {
        return input.to_vec();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(in_len);
    let inverse = planner.plan_fft_inverse(out_len);

    let mut spectrum: Vec<Complex<f64>> = input
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    forward.process(&mut spectrum);

    let shared = in_len.min(out_len);
    let positive = shared / 2 + 1;
    let negative = shared - positive;

    let mut resized = vec![Complex::new(0.0, 0.0); out_len];
    resized[..positive].copy_from_slice(&spectrum[..positive]);
    for j in 1..=negative {
        resized[out_len - j] = spectrum[in_len - j];
    }

    // Even shared length: the Nyquist bin needs folding or splitting
    if shared % 2 == 0 {
        let nyquist = shared / 2;
        if out_len < in_len {
            resized[nyquist] += spectrum[in_len - nyquist];
        } else {
            resized[nyquist] *= 0.5;
            resized[out_len - nyquist] = resized[nyquist];
        }
    }

    inverse.process(&mut resized);

    let scale = 1.0 / in_len as f64;
    resized.iter().map(|c| (c.re * scale) as f32).collect()
}

/// Full linear convolution of two real signals via FFT
///
/// Overlap-add: the signal is cut into blocks and each block is convolved
/// with the kernel spectrum, so the FFT size depends on the kernel only.
/// Output length is `signal.len() + kernel.len() - 1`.
pub fn convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = (2 * kernel.len()).next_power_of_two();
    let block_len = fft_len - kernel.len() + 1;

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut kernel_spectrum = vec![Complex::new(0.0, 0.0); fft_len];
    for (slot, &k) in kernel_spectrum.iter_mut().zip(kernel) {
        slot.re = k as f64;
    }
    forward.process(&mut kernel_spectrum);

    let scale = 1.0 / fft_len as f64;
    let mut output = vec![0.0_f32; out_len];
    let mut block = vec![Complex::new(0.0, 0.0); fft_len];

    for (index, chunk) in signal.chunks(block_len).enumerate() {
        block.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
        for (slot, &s) in block.iter_mut().zip(chunk) {
            slot.re = s as f64;
        }

        forward.process(&mut block);
        for (x, k) in block.iter_mut().zip(&kernel_spectrum) {
            *x *= *k;
        }
        inverse.process(&mut block);

        // Only chunk + kernel - 1 points of each block carry signal
        let start = index * block_len;
        let span = chunk.len() + kernel.len() - 1;
        for (acc, c) in output[start..start + span].iter_mut().zip(&block) {
            *acc += (c.re * scale) as f32;
        }
    }

    output
}
