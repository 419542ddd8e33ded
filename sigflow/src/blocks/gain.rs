use std::marker::PhantomData;

use crate::kernel::{
    Complex32, ConfigError, KernelLifecycle, Read1D, RelativeRate, Sample, StreamError,
    StreamKernel, WorkProgress, Write1D,
};

/// Configuration of the scalar gain stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainConfig {
    /// Multiplier applied to every sample.
    pub gain: f32,
}

impl GainConfig {
    /// Config with the given multiplier.
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gain.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "gain",
                reason: "gain must be finite",
            });
        }
        Ok(())
    }
}

/// Point-wise gain stage, `out = in * gain`.
///
/// The gain is owned by the processing thread; changing it mid-stream goes
/// through `set_gain` on the kernel itself rather than a shared control
/// handle, and never perturbs the one-for-one rate contract.
#[derive(Debug)]
pub struct GainKernel<T>
where
    T: Sample,
{
    gain: f32,
    _sample: PhantomData<T>,
}

/// Real-stream gain.
pub type GainFf = GainKernel<f32>;
/// Complex-stream gain.
pub type GainCc = GainKernel<Complex32>;

impl<T> GainKernel<T>
where
    T: Sample,
{
    /// Current multiplier.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Replace the multiplier; takes effect on the next processed sample.
    pub fn set_gain(&mut self, gain: f32) -> Result<(), ConfigError> {
        GainConfig::new(gain).validate()?;
        self.gain = gain;
        Ok(())
    }
}

impl<T> KernelLifecycle for GainKernel<T>
where
    T: Sample,
{
    type Config = GainConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gain: config.gain,
            _sample: PhantomData,
        })
    }
}

impl<T> StreamKernel<T> for GainKernel<T>
where
    T: Sample,
{
    fn required_lookback(&self) -> usize {
        0
    }

    fn relative_rate(&self) -> RelativeRate {
        RelativeRate::ONE
    }

    fn process_into<Iw, Ow>(
        &mut self,
        input: &Iw,
        out: &mut Ow,
    ) -> Result<WorkProgress, StreamError>
    where
        Iw: Read1D<T> + ?Sized,
        Ow: Write1D<T> + ?Sized,
    {
        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        let n = input.len().min(out.len());
        for (o, x) in out.iter_mut().zip(&input[..n]) {
            *o = *x * self.gain;
        }
        Ok(WorkProgress::new(n, n))
    }
}
