use core::fmt::Debug;
use core::ops::{AddAssign, Mul};

use nalgebra::Complex;
use num_traits::Zero;

/// Single-precision complex sample.
pub type Complex32 = Complex<f32>;

/// Stream element accepted by the filtering stages.
///
/// Real and complex samples share one convolution code path through the
/// {zero, add, multiply-by-real-coefficient} surface required here.
pub trait Sample:
    Copy + Zero + AddAssign<Self> + Mul<f32, Output = Self> + PartialEq + Debug + Send + 'static
{
}

impl Sample for f32 {}
impl Sample for Complex32 {}

/// Conversion from a convolution accumulator into an output element.
///
/// The complex-to-real instantiation takes the real part, which is the
/// contract of the complex-in float-out filter variants.
pub trait FromSample<T> {
    /// Convert one accumulated sample.
    fn from_sample(value: T) -> Self;
}

impl FromSample<f32> for f32 {
    fn from_sample(value: f32) -> Self {
        value
    }
}

impl FromSample<Complex32> for Complex32 {
    fn from_sample(value: Complex32) -> Self {
        value
    }
}

impl FromSample<Complex32> for f32 {
    fn from_sample(value: Complex32) -> Self {
        value.re
    }
}

#[cfg(test)]
mod tests {
    use super::{Complex32, FromSample};

    #[test]
    fn complex_scales_by_real_coefficient() {
        let x = Complex32::new(1.0, -2.0) * 0.5f32;
        assert_eq!(x, Complex32::new(0.5, -1.0));
    }

    #[test]
    fn complex_to_real_takes_real_part() {
        let y: f32 = FromSample::from_sample(Complex32::new(3.0, 7.0));
        assert_eq!(y, 3.0);
    }
}
