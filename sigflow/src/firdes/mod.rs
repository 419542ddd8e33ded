//! Windowed-sinc FIR frequency design.
//!
//! These routines produce linear-phase tap sets for the decimating filter
//! stage. Tap count follows from the window's worst-case attenuation and the
//! requested transition width; the ideal impulse response is windowed and
//! normalized so that the response at the band's reference frequency (DC,
//! Nyquist, or band center) equals the requested gain.

use crate::kernel::ConfigError;
use crate::special::Bessel;
use crate::windows::Window;

use num_traits::{Float, FromPrimitive};

fn check_rates<F>(samp_rate: F, transition_width: F) -> Result<(), ConfigError>
where
    F: Float,
{
    if !samp_rate.is_finite() || samp_rate <= F::zero() {
        return Err(ConfigError::InvalidArgument {
            arg: "samp_rate",
            reason: "sampling rate must be positive",
        });
    }
    if !transition_width.is_finite() || transition_width <= F::zero() {
        return Err(ConfigError::InvalidArgument {
            arg: "transition_width",
            reason: "transition width must be positive",
        });
    }
    Ok(())
}

fn check_cutoff<F>(samp_rate: F, cutoff: F) -> Result<(), ConfigError>
where
    F: Float,
{
    let two = F::one() + F::one();
    if !cutoff.is_finite() || cutoff <= F::zero() || cutoff >= samp_rate / two {
        return Err(ConfigError::InvalidArgument {
            arg: "cutoff",
            reason: "cutoff must lie strictly between 0 and the Nyquist frequency",
        });
    }
    Ok(())
}

/// Odd tap count needed to meet `transition_width` with `window`.
fn compute_ntaps<F>(
    samp_rate: F,
    transition_width: F,
    window: &Window<F>,
) -> Result<usize, ConfigError>
where
    F: Float + FromPrimitive + Bessel,
{
    let attenuation = window.max_attenuation();
    let raw = attenuation * samp_rate / (F::from(22.0).unwrap() * transition_width);
    let mut ntaps = raw
        .to_usize()
        .ok_or(ConfigError::InvalidArgument {
            arg: "transition_width",
            reason: "requested transition width overflows the tap count",
        })?;
    if ntaps % 2 == 0 {
        ntaps += 1;
    }
    Ok(ntaps)
}

/// Design a low-pass filter with unity-normalized DC response times `gain`.
pub fn low_pass<F>(
    gain: F,
    samp_rate: F,
    cutoff: F,
    transition_width: F,
    window: &Window<F>,
) -> Result<Vec<F>, ConfigError>
where
    F: Float + FromPrimitive + Bessel,
{
    check_rates(samp_rate, transition_width)?;
    check_cutoff(samp_rate, cutoff)?;
    window.validate()?;

    let ntaps = compute_ntaps(samp_rate, transition_width, window)?;
    let w = window.build(ntaps);
    let mid = (ntaps - 1) / 2;

    let pi = F::from(core::f64::consts::PI).unwrap();
    let two = F::one() + F::one();
    let fw_t0 = two * pi * cutoff / samp_rate;

    let mut taps = vec![F::zero(); ntaps];
    for (idx, tap) in taps.iter_mut().enumerate() {
        let n = F::from_isize(idx as isize - mid as isize).unwrap();
        *tap = if idx == mid {
            fw_t0 / pi * w[idx]
        } else {
            (n * fw_t0).sin() / (n * pi) * w[idx]
        };
    }

    // Unity gain at DC.
    let mut fmax = taps[mid];
    for n in 1..=mid {
        fmax = fmax + two * taps[mid + n];
    }
    let scale = gain / fmax;
    for tap in taps.iter_mut() {
        *tap = *tap * scale;
    }
    Ok(taps)
}

/// Design a high-pass filter with unity-normalized Nyquist response times `gain`.
pub fn high_pass<F>(
    gain: F,
    samp_rate: F,
    cutoff: F,
    transition_width: F,
    window: &Window<F>,
) -> Result<Vec<F>, ConfigError>
where
    F: Float + FromPrimitive + Bessel,
{
    check_rates(samp_rate, transition_width)?;
    check_cutoff(samp_rate, cutoff)?;
    window.validate()?;

    let ntaps = compute_ntaps(samp_rate, transition_width, window)?;
    let w = window.build(ntaps);
    let mid = (ntaps - 1) / 2;

    let pi = F::from(core::f64::consts::PI).unwrap();
    let two = F::one() + F::one();
    let fw_t0 = two * pi * cutoff / samp_rate;

    let mut taps = vec![F::zero(); ntaps];
    for (idx, tap) in taps.iter_mut().enumerate() {
        let n = F::from_isize(idx as isize - mid as isize).unwrap();
        *tap = if idx == mid {
            (F::one() - fw_t0 / pi) * w[idx]
        } else {
            -(n * fw_t0).sin() / (n * pi) * w[idx]
        };
    }

    // Unity gain at the Nyquist frequency.
    let mut fmax = taps[mid];
    for n in 1..=mid {
        let sign = if n % 2 == 0 { F::one() } else { -F::one() };
        fmax = fmax + two * taps[mid + n] * sign;
    }
    let scale = gain / fmax;
    for tap in taps.iter_mut() {
        *tap = *tap * scale;
    }
    Ok(taps)
}

/// Design a band-pass filter with unity-normalized band-center response times `gain`.
pub fn band_pass<F>(
    gain: F,
    samp_rate: F,
    low_cutoff: F,
    high_cutoff: F,
    transition_width: F,
    window: &Window<F>,
) -> Result<Vec<F>, ConfigError>
where
    F: Float + FromPrimitive + Bessel,
{
    check_rates(samp_rate, transition_width)?;
    let two = F::one() + F::one();
    if !low_cutoff.is_finite() || low_cutoff <= F::zero() {
        return Err(ConfigError::InvalidArgument {
            arg: "low_cutoff",
            reason: "low cutoff must be positive",
        });
    }
    if !high_cutoff.is_finite() || high_cutoff <= low_cutoff || high_cutoff > samp_rate / two {
        return Err(ConfigError::InvalidArgument {
            arg: "high_cutoff",
            reason: "high cutoff must lie above the low cutoff and at or below Nyquist",
        });
    }
    window.validate()?;

    let ntaps = compute_ntaps(samp_rate, transition_width, window)?;
    let w = window.build(ntaps);
    let mid = (ntaps - 1) / 2;

    let pi = F::from(core::f64::consts::PI).unwrap();
    let fw_t0 = two * pi * low_cutoff / samp_rate;
    let fw_t1 = two * pi * high_cutoff / samp_rate;

    let mut taps = vec![F::zero(); ntaps];
    for (idx, tap) in taps.iter_mut().enumerate() {
        let n = F::from_isize(idx as isize - mid as isize).unwrap();
        *tap = if idx == mid {
            (fw_t1 - fw_t0) / pi * w[idx]
        } else {
            ((n * fw_t1).sin() - (n * fw_t0).sin()) / (n * pi) * w[idx]
        };
    }

    // Unity gain at the band center.
    let center = (fw_t0 + fw_t1) / two;
    let mut fmax = taps[mid];
    for n in 1..=mid {
        fmax = fmax + two * taps[mid + n] * (F::from_usize(n).unwrap() * center).cos();
    }
    let scale = gain / fmax;
    for tap in taps.iter_mut() {
        *tap = *tap * scale;
    }
    Ok(taps)
}

#[cfg(test)]
mod tests {
    use super::{band_pass, high_pass, low_pass};
    use crate::kernel::ConfigError;
    use crate::windows::Window;
    use approx::assert_abs_diff_eq;

    /// Response magnitude of `taps` at `freq` for a `samp_rate` design.
    fn response_at(taps: &[f64], freq: f64, samp_rate: f64) -> f64 {
        let omega = 2.0 * core::f64::consts::PI * freq / samp_rate;
        let (mut re, mut im) = (0.0, 0.0);
        for (k, tap) in taps.iter().enumerate() {
            re += tap * (omega * k as f64).cos();
            im -= tap * (omega * k as f64).sin();
        }
        (re * re + im * im).sqrt()
    }

    #[test]
    fn low_pass_tap_count_follows_window_attenuation() {
        let taps = low_pass(1.0f64, 48_000.0, 4_000.0, 1_000.0, &Window::Hamming)
            .expect("valid low-pass design");
        // 53 dB * 48000 / (22 * 1000), truncated and forced odd.
        assert_eq!(taps.len(), 115);

        let kaiser = low_pass(
            1.0f64,
            48_000.0,
            4_000.0,
            1_000.0,
            &Window::Kaiser { beta: 6.76 },
        )
        .expect("valid kaiser design");
        assert_eq!(kaiser.len(), 153);
    }

    #[test]
    fn low_pass_is_symmetric_with_requested_dc_gain() {
        let gain = 2.5f64;
        let taps =
            low_pass(gain, 32_000.0, 3_000.0, 500.0, &Window::Hamming).expect("valid design");
        assert_eq!(taps.len() % 2, 1);
        for i in 0..taps.len() {
            assert_abs_diff_eq!(taps[i], taps[taps.len() - 1 - i], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(taps.iter().sum::<f64>(), gain, epsilon = 1e-9);
        assert!(response_at(&taps, 8_000.0, 32_000.0) < 1e-2);
    }

    #[test]
    fn high_pass_passes_nyquist_and_blocks_dc() {
        let taps =
            high_pass(1.0f64, 48_000.0, 8_000.0, 1_000.0, &Window::Hamming).expect("valid design");
        assert_abs_diff_eq!(response_at(&taps, 24_000.0, 48_000.0), 1.0, epsilon = 1e-9);
        assert!(response_at(&taps, 0.0, 48_000.0) < 1e-2);
        assert!(response_at(&taps, 16_000.0, 48_000.0) > 0.9);
    }

    #[test]
    fn band_pass_passes_center_and_blocks_band_edges() {
        let taps = band_pass(
            1.0f64,
            48_000.0,
            6_000.0,
            10_000.0,
            1_000.0,
            &Window::Blackman,
        )
        .expect("valid design");
        assert_abs_diff_eq!(response_at(&taps, 8_000.0, 48_000.0), 1.0, epsilon = 1e-9);
        assert!(response_at(&taps, 1_000.0, 48_000.0) < 1e-3);
        assert!(response_at(&taps, 20_000.0, 48_000.0) < 1e-3);
    }

    #[test]
    fn designs_reject_invalid_parameters() {
        let window = Window::<f64>::Hamming;
        assert_eq!(
            low_pass(1.0, 0.0, 4_000.0, 1_000.0, &window).expect_err("zero rate"),
            ConfigError::InvalidArgument {
                arg: "samp_rate",
                reason: "sampling rate must be positive",
            }
        );
        assert_eq!(
            low_pass(1.0, 48_000.0, 4_000.0, 0.0, &window).expect_err("zero transition"),
            ConfigError::InvalidArgument {
                arg: "transition_width",
                reason: "transition width must be positive",
            }
        );
        assert_eq!(
            low_pass(1.0, 48_000.0, 24_000.0, 1_000.0, &window).expect_err("cutoff at nyquist"),
            ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff must lie strictly between 0 and the Nyquist frequency",
            }
        );
        assert_eq!(
            high_pass(1.0, 48_000.0, -1.0, 1_000.0, &window).expect_err("negative cutoff"),
            ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff must lie strictly between 0 and the Nyquist frequency",
            }
        );
        assert_eq!(
            band_pass(1.0, 48_000.0, 9_000.0, 6_000.0, 1_000.0, &window).expect_err("inverted"),
            ConfigError::InvalidArgument {
                arg: "high_cutoff",
                reason: "high cutoff must lie above the low cutoff and at or below Nyquist",
            }
        );
        assert_eq!(
            low_pass(
                1.0,
                48_000.0,
                4_000.0,
                1_000.0,
                &Window::Kaiser { beta: f64::NAN },
            )
            .expect_err("nan beta"),
            ConfigError::InvalidArgument {
                arg: "window",
                reason: "kaiser beta must be finite and non-negative",
            }
        );
    }
}
