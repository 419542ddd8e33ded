use std::marker::PhantomData;

use crate::kernel::{
    Complex32, ConfigError, KernelLifecycle, Read1D, RelativeRate, Sample, StreamError,
    StreamKernel, WorkProgress, Write1D,
};

/// Configuration of the fixed pick-every-Nth decimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownsampleConfig {
    /// Input samples per output sample.
    pub decimation: usize,
}

impl DownsampleConfig {
    /// Config decimating by `decimation`.
    pub fn new(decimation: usize) -> Self {
        Self { decimation }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimation < 2 {
            return Err(ConfigError::InvalidArgument {
                arg: "decimation",
                reason: "decimation factor must be at least 2",
            });
        }
        Ok(())
    }
}

/// Fixed-rate decimator with no filtering and no lookback.
///
/// Emits the first sample of every group of `decimation` inputs. The factor
/// is set once at construction; there is nothing to reconfigure and the
/// rate contract never changes.
#[derive(Debug)]
pub struct Downsample<T>
where
    T: Sample,
{
    decimation: usize,
    _sample: PhantomData<T>,
}

/// Complex-stream fixed decimator.
pub type DownsampleCc = Downsample<Complex32>;
/// Real-stream fixed decimator.
pub type DownsampleFf = Downsample<f32>;

impl<T> Downsample<T>
where
    T: Sample,
{
    /// Configured decimation factor.
    pub fn decimation(&self) -> usize {
        self.decimation
    }
}

impl<T> KernelLifecycle for Downsample<T>
where
    T: Sample,
{
    type Config = DownsampleConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            decimation: config.decimation,
            _sample: PhantomData,
        })
    }
}

impl<T> StreamKernel<T> for Downsample<T>
where
    T: Sample,
{
    fn required_lookback(&self) -> usize {
        0
    }

    fn relative_rate(&self) -> RelativeRate {
        RelativeRate::decimating(self.decimation)
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

        let produced = out.len().min(input.len() / self.decimation);
        for (i, o) in out.iter_mut().take(produced).enumerate() {
            *o = input[i * self.decimation];
        }
        Ok(WorkProgress::new(produced * self.decimation, produced))
    }
}
