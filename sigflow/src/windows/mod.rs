//! Window functions applied to ideal FIR impulse responses.

use crate::kernel::ConfigError;
use crate::special::Bessel;

use num_traits::{Float, FromPrimitive};

/// Symmetric window selectable by the frequency-design routines.
///
/// Kaiser carries its shape parameter, so one enum value fully describes a
/// window. The set matches the designs accepted by the decimating filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window<F> {
    /// Rectangular (boxcar) window.
    Rectangular,
    /// Hamming window.
    Hamming,
    /// Hann window.
    Hann,
    /// Blackman window.
    Blackman,
    /// Kaiser window.
    Kaiser {
        /// Shape parameter trading main-lobe width against sidelobe level.
        beta: F,
    },
}

impl<F> Window<F>
where
    F: Float + FromPrimitive + Bessel,
{
    /// Reject unusable shape parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Window::Kaiser { beta } = self {
            if !beta.is_finite() || *beta < F::zero() {
                return Err(ConfigError::InvalidArgument {
                    arg: "window",
                    reason: "kaiser beta must be finite and non-negative",
                });
            }
        }
        Ok(())
    }

    /// Worst-case achievable stopband attenuation in dB.
    ///
    /// Drives the tap-count rule in the frequency-design routines.
    pub fn max_attenuation(&self) -> F {
        match self {
            Window::Rectangular => F::from(21.0).unwrap(),
            Window::Hann => F::from(44.0).unwrap(),
            Window::Hamming => F::from(53.0).unwrap(),
            Window::Blackman => F::from(74.0).unwrap(),
            Window::Kaiser { beta } => *beta / F::from(0.1102).unwrap() + F::from(8.7).unwrap(),
        }
    }

    /// Generate the symmetric `ntaps`-point window.
    pub fn build(&self, ntaps: usize) -> Vec<F> {
        if ntaps == 0 {
            return Vec::new();
        }
        if ntaps == 1 {
            return vec![F::one()];
        }

        let m = F::from_usize(ntaps - 1).unwrap();
        let two_pi = F::from(2.0 * core::f64::consts::PI).unwrap();
        (0..ntaps)
            .map(|i| {
                let n = F::from_usize(i).unwrap();
                match self {
                    Window::Rectangular => F::one(),
                    Window::Hamming => {
                        F::from(0.54).unwrap()
                            - F::from(0.46).unwrap() * (two_pi * n / m).cos()
                    }
                    Window::Hann => {
                        F::from(0.5).unwrap() - F::from(0.5).unwrap() * (two_pi * n / m).cos()
                    }
                    Window::Blackman => {
                        F::from(0.42).unwrap()
                            - F::from(0.5).unwrap() * (two_pi * n / m).cos()
                            + F::from(0.08).unwrap()
                                * (F::from(2.0).unwrap() * two_pi * n / m).cos()
                    }
                    Window::Kaiser { beta } => {
                        let x = F::from(2.0).unwrap() * n / m - F::one();
                        // Clamp guards roundoff at the window edges.
                        let arg = (F::one() - x * x).max(F::zero()).sqrt();
                        (*beta * arg).i0() / beta.i0()
                    }
                }
            })
            .collect()
    }
}
