//! Direct-form FIR evaluation shared by the filtering stages.
//!
//! One generic code path serves the real and complex instantiations: the
//! element type only needs zero, addition, and multiplication by a real
//! coefficient. Output conversion (for the complex-in real-out variants)
//! happens through [`FromSample`] at the write.

use crate::kernel::{FromSample, Sample, StreamError};

/// Accumulate `taps` against the window ending at `buf[end]`, with the
/// newest sample weighted by `taps[0]`.
///
/// Callers guarantee `end + 1 >= taps.len()`.
#[inline]
pub(crate) fn dot_at<T: Sample>(taps: &[f32], buf: &[T], end: usize) -> T {
    let mut acc = T::zero();
    for (k, tap) in taps.iter().enumerate() {
        acc += buf[end - k] * *tap;
    }
    acc
}

/// Streaming direct-form FIR core.
///
/// Owns the coefficient vector and the history of the last `taps.len() - 1`
/// input samples, so callers feed only new samples and outputs stay aligned
/// across arbitrary chunk boundaries.
#[derive(Debug, Clone)]
pub struct FirCore<T> {
    taps: Vec<f32>,
    hist: Vec<T>,
    buf: Vec<T>,
}

impl<T> FirCore<T>
where
    T: Sample,
{
    /// Core over `taps` with zeroed history.
    pub fn new(taps: Vec<f32>) -> Self {
        let hist = vec![T::zero(); taps.len().saturating_sub(1)];
        Self {
            taps,
            hist,
            buf: Vec::new(),
        }
    }

    /// Replace the design. History resizes to the new lookback and zeroes.
    pub fn retap(&mut self, taps: Vec<f32>) {
        self.hist.clear();
        self.hist.resize(taps.len().saturating_sub(1), T::zero());
        self.taps = taps;
    }

    /// Current coefficient vector.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Samples of history carried between calls.
    pub fn lookback(&self) -> usize {
        self.hist.len()
    }

    /// Filter `input` one-for-one into `out`.
    ///
    /// `out[i]` is the convolution ending at `input[i]`; earlier samples come
    /// from the carried history. An empty tap set is a degenerate pass that
    /// zero-fills the output.
    pub fn filter_into<O>(&mut self, input: &[T], out: &mut [O]) -> Result<(), StreamError>
    where
        O: FromSample<T>,
    {
        if out.len() != input.len() {
            return Err(StreamError::LengthMismatch {
                arg: "out",
                expected: input.len(),
                got: out.len(),
            });
        }
        if self.taps.is_empty() {
            for o in out.iter_mut() {
                *o = O::from_sample(T::zero());
            }
            return Ok(());
        }

        let lookback = self.taps.len() - 1;
        self.buf.clear();
        self.buf.extend_from_slice(&self.hist);
        self.buf.extend_from_slice(input);

        for (i, o) in out.iter_mut().enumerate() {
            *o = O::from_sample(dot_at(&self.taps, &self.buf, lookback + i));
        }

        // The tail of the processed span is the next call's history.
        self.hist.clear();
        self.hist
            .extend_from_slice(&self.buf[input.len()..input.len() + lookback]);
        Ok(())
    }
}
