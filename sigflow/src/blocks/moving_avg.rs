use std::sync::{Arc, Mutex};

use super::lock_shared;
use crate::kernel::{
    ConfigError, KernelLifecycle, Read1D, RelativeRate, StreamError, StreamKernel, WorkProgress,
    Write1D,
};

/// Configuration shared by both moving-average stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverageConfig {
    /// Averaging window length in samples.
    pub length: usize,
    /// Multiplier applied to every mean.
    pub scale: f32,
}

impl MovingAverageConfig {
    /// Config averaging over `length` samples with the given scale.
    pub fn new(length: usize, scale: f32) -> Self {
        Self { length, scale }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length < 1 {
            return Err(ConfigError::InvalidArgument {
                arg: "length",
                reason: "window length must be at least 1",
            });
        }
        if !self.scale.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "scale",
                reason: "scale must be finite",
            });
        }
        Ok(())
    }
}

/// Self-priming moving average over an internal circular buffer.
///
/// Emits zero until `length` samples have been seen, then the scaled mean of
/// the trailing window. Changing the length resets the window; no lookback
/// is asked of the host.
#[derive(Debug)]
pub struct MovingAverage {
    length: usize,
    scale: f32,
    buf: Vec<f32>,
    head: usize,
    filled: usize,
    sum: f32,
}

impl MovingAverage {
    /// Current window length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Current output scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Replace the window length, discarding accumulated window state.
    pub fn set_length(&mut self, length: usize) -> Result<(), ConfigError> {
        MovingAverageConfig::new(length, self.scale).validate()?;
        self.length = length;
        self.buf = vec![0.0; length];
        self.head = 0;
        self.filled = 0;
        self.sum = 0.0;
        Ok(())
    }

    /// Replace the output scale; takes effect on the next sample.
    pub fn set_scale(&mut self, scale: f32) -> Result<(), ConfigError> {
        MovingAverageConfig::new(self.length, scale).validate()?;
        self.scale = scale;
        Ok(())
    }
}

impl KernelLifecycle for MovingAverage {
    type Config = MovingAverageConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            length: config.length,
            scale: config.scale,
            buf: vec![0.0; config.length],
            head: 0,
            filled: 0,
            sum: 0.0,
        })
    }
}

impl StreamKernel<f32> for MovingAverage {
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
        Iw: Read1D<f32> + ?Sized,
        Ow: Write1D<f32> + ?Sized,
    {
        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        let n = input.len().min(out.len());
        for (o, x) in out.iter_mut().zip(&input[..n]) {
            self.sum -= self.buf[self.head];
            self.buf[self.head] = *x;
            self.sum += *x;
            self.head += 1;
            if self.head == self.length {
                self.head = 0;
            }
            if self.filled < self.length {
                self.filled += 1;
            }
            *o = if self.filled == self.length {
                self.sum * self.scale / self.length as f32
            } else {
                0.0
            };
        }
        Ok(WorkProgress::new(n, n))
    }
}

#[derive(Debug)]
struct HistoryShared {
    cfg: MovingAverageConfig,
}

/// Moving average over a host-maintained lookback window.
///
/// Declares `required_lookback() == length - 1` and computes each output as
/// an O(1) sliding sum over the aligned window, so there is no warm-up: the
/// first output already spans a full window. A runtime length change is
/// applied by the next `process_into` call, which re-declares the lookback
/// and reports zero progress so the host realigns.
#[derive(Debug)]
pub struct MovingAverageHistory {
    shared: Arc<Mutex<HistoryShared>>,
    applied_length: usize,
}

/// Cloneable control surface of a [`MovingAverageHistory`].
#[derive(Debug, Clone)]
pub struct MovingAverageHistoryControl {
    shared: Arc<Mutex<HistoryShared>>,
}

impl MovingAverageHistoryControl {
    fn update(&self, candidate: MovingAverageConfig) -> Result<(), ConfigError> {
        candidate.validate()?;
        lock_shared(&self.shared).cfg = candidate;
        Ok(())
    }

    /// Set the window length.
    pub fn set_length(&self, length: usize) -> Result<(), ConfigError> {
        let scale = self.scale();
        self.update(MovingAverageConfig::new(length, scale))
    }

    /// Set the output scale; applies without realignment.
    pub fn set_scale(&self, scale: f32) -> Result<(), ConfigError> {
        let length = self.length();
        self.update(MovingAverageConfig::new(length, scale))
    }

    /// Current window length.
    pub fn length(&self) -> usize {
        lock_shared(&self.shared).cfg.length
    }

    /// Current output scale.
    pub fn scale(&self) -> f32 {
        lock_shared(&self.shared).cfg.scale
    }
}

impl MovingAverageHistory {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> MovingAverageHistoryControl {
        MovingAverageHistoryControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl KernelLifecycle for MovingAverageHistory {
    type Config = MovingAverageConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let applied_length = config.length;
        Ok(Self {
            shared: Arc::new(Mutex::new(HistoryShared { cfg: config })),
            applied_length,
        })
    }
}

impl StreamKernel<f32> for MovingAverageHistory {
    fn required_lookback(&self) -> usize {
        self.applied_length - 1
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
        Iw: Read1D<f32> + ?Sized,
        Ow: Write1D<f32> + ?Sized,
    {
        let (n, scale) = {
            let shared = lock_shared(&self.shared);
            (shared.cfg.length, shared.cfg.scale)
        };

        if n != self.applied_length {
            self.applied_length = n;
            return Ok(WorkProgress::NONE);
        }

        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        if n == 1 {
            let m = input.len().min(out.len());
            for (o, x) in out.iter_mut().zip(&input[..m]) {
                *o = *x * scale;
            }
            return Ok(WorkProgress::new(m, m));
        }

        if input.len() < n {
            return Ok(WorkProgress::NONE);
        }
        let produced = out.len().min(input.len() - (n - 1));
        if produced == 0 {
            return Ok(WorkProgress::NONE);
        }

        // Window for output i is input[i .. i + n]; slide the sum in O(1).
        let mut sum: f32 = input[..n].iter().sum();
        out[0] = sum * scale / n as f32;
        for i in 1..produced {
            sum += input[i + (n - 1)] - input[i - 1];
            out[i] = sum * scale / n as f32;
        }
        Ok(WorkProgress::new(produced, produced))
    }
}
