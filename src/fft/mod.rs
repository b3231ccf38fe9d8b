//! # Spectral Transform
//!
//! Iterative radix-2 decimation-in-time FFT over double-precision complex
//! samples. Both directions scale every butterfly stage by `1/√2`, so the
//! forward transform is the DFT divided by `√N` and the inverse is its exact
//! adjoint: a forward/inverse round trip returns the input unchanged.
//!
//! Inputs are zero-padded to a power of two. Signals of any
//! [`NumericOps`](crate::NumericOps) element type are accepted; results for
//! integral element types are rounded to the nearest integer.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use anyhow::bail;
use log::trace;
use num_complex::{Complex, Complex64};
use rayon::prelude::*;

use crate::dense::as_f64;
use crate::error::LinalgError;
use crate::NumericOps;

/// Smallest power of two `>= n`; `ceilpw2(0)` is 1.
pub fn ceilpw2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Reorders `data` in place so element `i` moves to the bit-reversed index.
///
/// # Errors
/// [`LinalgError::NotPowerOfTwo`] unless the length is a power of two.
/// Sequences shorter than two are returned as-is.
pub fn bit_reversal_swap<S>(data: &mut [S]) -> anyhow::Result<()> {
    let n = data.len();
    if n < 2 {
        return Ok(());
    }
    if !n.is_power_of_two() {
        bail!(LinalgError::NotPowerOfTwo { len: n });
    }

    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }
    Ok(())
}

/// `e^{-2πik/n}` for `k` in `0..n`.
pub fn twiddle_factors(n: usize) -> Vec<Complex64> {
    (0..n)
        .map(|k| Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64))
        .collect()
}

fn resolve_size(len: usize, size: Option<usize>) -> anyhow::Result<usize> {
    match size {
        None => Ok(ceilpw2(len)),
        Some(n) if n < len => bail!(LinalgError::InvalidTransformSize { size: n, len }),
        Some(n) => Ok(ceilpw2(n)),
    }
}

fn widen<T: NumericOps>(value: &Complex<T>) -> Complex64 {
    Complex64::new(as_f64(value.re), as_f64(value.im))
}

fn narrow<T: NumericOps>(value: Complex64) -> anyhow::Result<Complex<T>> {
    match (T::from_f64_rounded(value.re), T::from_f64_rounded(value.im)) {
        (Some(re), Some(im)) => Ok(Complex::new(re, im)),
        _ => bail!(LinalgError::NumericConversion {
            value: value.to_string(),
        }),
    }
}

/// Butterfly network over bit-reversed `data`; `twiddles` has `data.len()` entries.
fn butterfly(data: &mut [Complex64], twiddles: &[Complex64]) {
    let n = data.len();
    let mut step = n >> 1;
    while step > 0 {
        let block = n / step;
        let half = block / 2;
        for start in (0..n).step_by(block) {
            for i in 0..half {
                let even = data[start + i];
                let odd = data[start + i + half] * twiddles[i * step];
                data[start + i] = (even + odd) * FRAC_1_SQRT_2;
                data[start + i + half] = (even - odd) * FRAC_1_SQRT_2;
            }
        }
        step >>= 1;
    }
}

fn run(mut buffer: Vec<Complex64>, inverse: bool) -> anyhow::Result<Vec<Complex64>> {
    let n = buffer.len();
    let mut twiddles = twiddle_factors(n);
    if inverse {
        twiddles.iter_mut().for_each(|w| *w = w.conj());
    }
    bit_reversal_swap(&mut buffer)?;
    butterfly(&mut buffer, &twiddles);
    Ok(buffer)
}

fn padded<T: NumericOps>(signal: &[Complex<T>], n: usize) -> Vec<Complex64> {
    if n > signal.len() {
        trace!("zero-padding {} samples to {}", signal.len(), n);
    }
    let mut buffer: Vec<Complex64> = signal.iter().map(widen).collect();
    buffer.resize(n, Complex64::new(0.0, 0.0));
    buffer
}

/// Forward transform of a complex signal.
///
/// `size` of `None` pads to the next power of two of the signal length;
/// `Some(n)` pads to the next power of two of `n`.
///
/// # Errors
/// [`LinalgError::InvalidTransformSize`] if `n` is shorter than the signal,
/// [`LinalgError::NumericConversion`] if a result does not fit `T`.
pub fn transform<T: NumericOps>(
    signal: &[Complex<T>],
    size: Option<usize>,
) -> anyhow::Result<Vec<Complex<T>>> {
    let n = resolve_size(signal.len(), size)?;
    run(padded(signal, n), false)?
        .into_iter()
        .map(narrow)
        .collect()
}

/// Forward transform of a real signal; see [`transform`].
pub fn transform_real<T: NumericOps>(
    signal: &[T],
    size: Option<usize>,
) -> anyhow::Result<Vec<Complex<T>>> {
    let complex: Vec<Complex<T>> = signal
        .iter()
        .map(|&re| Complex::new(re, T::zero()))
        .collect();
    transform(&complex, size)
}

/// Inverse transform, the adjoint of [`transform`]. Pads to the next power of two.
pub fn inverse_transform<T: NumericOps>(
    spectrum: &[Complex<T>],
) -> anyhow::Result<Vec<Complex<T>>> {
    let n = ceilpw2(spectrum.len());
    run(padded(spectrum, n), true)?
        .into_iter()
        .map(narrow)
        .collect()
}

/// Magnitude spectrum `|X_k|` of a real signal, one value per bin.
pub fn transform_abs<T: NumericOps>(signal: &[T]) -> anyhow::Result<Vec<f64>> {
    let buffer: Vec<Complex64> = signal
        .iter()
        .map(|&x| Complex64::new(as_f64(x), 0.0))
        .collect();
    let n = ceilpw2(buffer.len());
    let spectrum = run(padded(&buffer, n), false)?;
    Ok(spectrum.iter().map(|bin| bin.norm()).collect())
}

/// [`transform_abs`] over independent frames, in parallel.
pub fn transform_abs_batch<T: NumericOps>(frames: &[Vec<T>]) -> anyhow::Result<Vec<Vec<f64>>> {
    frames
        .par_iter()
        .map(|frame| transform_abs(frame))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_complex_eq(actual: &[Complex64], expected: &[Complex64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(a.re, e.re, epsilon = tol);
            assert_abs_diff_eq!(a.im, e.im, epsilon = tol);
        }
    }

    fn test_signal() -> Vec<Complex64> {
        (0..16)
            .map(|k| {
                let t = k as f64;
                Complex64::new((0.3 * t).sin() + 0.5, (1.7 * t).cos() * 0.25)
            })
            .collect()
    }

    #[test]
    fn test_ceilpw2() {
        assert_eq!(ceilpw2(0), 1);
        assert_eq!(ceilpw2(1), 1);
        assert_eq!(ceilpw2(5), 8);
        assert_eq!(ceilpw2(8), 8);
        assert_eq!(ceilpw2(1000), 1024);
    }

    #[test]
    fn test_bit_reversal_order() {
        let mut data: Vec<usize> = (0..8).collect();
        bit_reversal_swap(&mut data).unwrap();
        assert_eq!(data, vec![0, 4, 2, 6, 1, 5, 3, 7]);

        let mut single = vec![42];
        bit_reversal_swap(&mut single).unwrap();
        assert_eq!(single, vec![42]);
    }

    #[test]
    fn test_bit_reversal_rejects_non_power_of_two() {
        let mut data = vec![0; 6];
        let err = bit_reversal_swap(&mut data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LinalgError>(),
            Some(&LinalgError::NotPowerOfTwo { len: 6 })
        );
    }

    #[test]
    fn test_twiddles_on_unit_circle() {
        let w = twiddle_factors(4);
        let expected = [
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(0.0, 1.0),
        ];
        assert_complex_eq(&w, &expected, 1e-15);
    }

    #[test]
    fn test_impulse_spreads_evenly() {
        let spectrum = transform_real(&[1.0, 0.0, 0.0, 0.0], None).unwrap();
        for bin in &spectrum {
            assert_abs_diff_eq!(bin.re, 0.5, epsilon = 1e-15);
            assert_abs_diff_eq!(bin.im, 0.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_constant_signal_lands_in_dc() {
        let spectrum = transform_real(&[1.0, 1.0, 1.0, 1.0], None).unwrap();
        let expected = [
            Complex64::new(2.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
        ];
        assert_complex_eq(&spectrum, &expected, 1e-15);
    }

    #[test]
    fn test_cosine_bin_magnitude() {
        let signal: Vec<f64> = (0..8).map(|k| (2.0 * PI * k as f64 / 8.0).cos()).collect();
        let magnitudes = transform_abs(&signal).unwrap();

        assert_eq!(magnitudes.len(), 8);
        assert_abs_diff_eq!(magnitudes[1], 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(magnitudes[7], 2f64.sqrt(), epsilon = 1e-12);
        for k in [0, 2, 3, 4, 5, 6] {
            assert_abs_diff_eq!(magnitudes[k], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_round_trip_is_identity() {
        let signal = test_signal();
        let spectrum = transform(&signal, None).unwrap();
        let recovered = inverse_transform(&spectrum).unwrap();
        assert_complex_eq(&recovered, &signal, 1e-12);
    }

    #[test]
    fn test_energy_is_preserved() {
        let signal = test_signal();
        let spectrum = transform(&signal, None).unwrap();
        let time: f64 = signal.iter().map(|x| x.norm_sqr()).sum();
        let freq: f64 = spectrum.iter().map(|x| x.norm_sqr()).sum();
        assert_abs_diff_eq!(time, freq, epsilon = 1e-10);
    }

    #[test]
    fn test_matches_rustfft_up_to_scale() {
        let signal = test_signal();
        let ours = transform(&signal, None).unwrap();

        let mut planner = rustfft::FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(signal.len());
        let mut theirs: Vec<Complex64> = signal.clone();
        fft.process(&mut theirs);
        let scale = 1.0 / (signal.len() as f64).sqrt();
        let theirs: Vec<Complex64> = theirs.iter().map(|x| *x * scale).collect();

        assert_complex_eq(&ours, &theirs, 1e-12);
    }

    #[test]
    fn test_integral_output_is_rounded() {
        let spectrum = transform_real(&[2i32, 2, 2, 2], None).unwrap();
        assert_eq!(
            spectrum,
            vec![
                Complex::new(4, 0),
                Complex::new(0, 0),
                Complex::new(0, 0),
                Complex::new(0, 0)
            ]
        );
    }

    #[test]
    fn test_unsigned_output_rejects_negative_bins() {
        let err = transform_real(&[0u8, 1], None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinalgError>(),
            Some(LinalgError::NumericConversion { .. })
        ));
    }

    #[test]
    fn test_transform_size_policy() {
        let signal = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(transform_real(&signal, None).unwrap().len(), 8);
        assert_eq!(transform_real(&signal, Some(6)).unwrap().len(), 8);
        assert_eq!(transform_real(&signal, Some(16)).unwrap().len(), 16);

        let err = transform_real(&signal, Some(4)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LinalgError>(),
            Some(&LinalgError::InvalidTransformSize { size: 4, len: 5 })
        );
    }

    #[test]
    fn test_padding_keeps_dc_sum() {
        // Zero-padding does not change the sum, so DC is sum / √N.
        let spectrum = transform_real(&[1.0, 2.0, 3.0], None).unwrap();
        assert_eq!(spectrum.len(), 4);
        assert_abs_diff_eq!(spectrum[0].re, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_batch_matches_single_frames() {
        let frames: Vec<Vec<f64>> = (0..4)
            .map(|f| (0..32).map(|k| ((f + 1) as f64 * 0.2 * k as f64).sin()).collect())
            .collect();
        let batch = transform_abs_batch(&frames).unwrap();

        assert_eq!(batch.len(), frames.len());
        for (frame, spectrum) in frames.iter().zip(&batch) {
            assert_eq!(spectrum, &transform_abs(frame).unwrap());
        }
    }
}
