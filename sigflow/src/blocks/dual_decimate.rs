use std::sync::{Arc, Mutex};

use super::lock_shared;
use crate::kernel::{ConfigError, KernelLifecycle, StreamError, WorkProgress};

/// Configuration of the dual-port averaging decimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualDecimateConfig {
    /// Decimation factor of port 0.
    pub decimation0: usize,
    /// Decimation factor of port 1.
    pub decimation1: usize,
}

impl DualDecimateConfig {
    /// Config with the given per-port factors.
    pub fn new(decimation0: usize, decimation1: usize) -> Self {
        Self {
            decimation0,
            decimation1,
        }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimation0 < 1 {
            return Err(ConfigError::InvalidArgument {
                arg: "decimation0",
                reason: "decimation factor must be at least 1",
            });
        }
        if self.decimation1 < 1 {
            return Err(ConfigError::InvalidArgument {
                arg: "decimation1",
                reason: "decimation factor must be at least 1",
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct DualShared {
    cfg: DualDecimateConfig,
    realign: bool,
}

/// Two independent averaging decimators sharing one stage.
///
/// Each port emits the mean of every full group of `decimation` inputs; the
/// factors may differ, so the ports progress independently and each call
/// reports per-port progress. Changing either factor makes the next call
/// report zero progress on both ports so the host re-derives its windowing
/// from [`required_input`](Self::required_input).
#[derive(Debug)]
pub struct DualDecimate {
    shared: Arc<Mutex<DualShared>>,
}

/// Cloneable control surface of a [`DualDecimate`].
#[derive(Debug, Clone)]
pub struct DualDecimateControl {
    shared: Arc<Mutex<DualShared>>,
}

impl DualDecimateControl {
    fn update(&self, candidate: DualDecimateConfig) -> Result<(), ConfigError> {
        candidate.validate()?;
        let mut shared = lock_shared(&self.shared);
        if candidate != shared.cfg {
            shared.cfg = candidate;
            shared.realign = true;
        }
        Ok(())
    }

    /// Set the decimation factor of port 0.
    pub fn set_decimation0(&self, decimation: usize) -> Result<(), ConfigError> {
        let cfg = lock_shared(&self.shared).cfg;
        self.update(DualDecimateConfig::new(decimation, cfg.decimation1))
    }

    /// Set the decimation factor of port 1.
    pub fn set_decimation1(&self, decimation: usize) -> Result<(), ConfigError> {
        let cfg = lock_shared(&self.shared).cfg;
        self.update(DualDecimateConfig::new(cfg.decimation0, decimation))
    }

    /// Current factor of port 0.
    pub fn decimation0(&self) -> usize {
        lock_shared(&self.shared).cfg.decimation0
    }

    /// Current factor of port 1.
    pub fn decimation1(&self) -> usize {
        lock_shared(&self.shared).cfg.decimation1
    }
}

fn mean_window(window: &[f32]) -> f32 {
    window.iter().sum::<f32>() / window.len() as f32
}

impl DualDecimate {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> DualDecimateControl {
        DualDecimateControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Input samples each port needs to emit `outputs` samples.
    pub fn required_input(&self, outputs: usize) -> [usize; 2] {
        let cfg = lock_shared(&self.shared).cfg;
        [outputs * cfg.decimation0, outputs * cfg.decimation1]
    }

    /// Process both ports, returning per-port progress.
    pub fn process(
        &mut self,
        input0: &[f32],
        input1: &[f32],
        out0: &mut [f32],
        out1: &mut [f32],
    ) -> Result<[WorkProgress; 2], StreamError> {
        let cfg = {
            let mut shared = lock_shared(&self.shared);
            if shared.realign {
                shared.realign = false;
                return Ok([WorkProgress::NONE, WorkProgress::NONE]);
            }
            shared.cfg
        };

        let d0 = cfg.decimation0;
        let d1 = cfg.decimation1;
        let n0 = out0.len().min(input0.len() / d0);
        let n1 = out1.len().min(input1.len() / d1);

        for (o, window) in out0.iter_mut().zip(input0.chunks_exact(d0)).take(n0) {
            *o = mean_window(window);
        }
        for (o, window) in out1.iter_mut().zip(input1.chunks_exact(d1)).take(n1) {
            *o = mean_window(window);
        }

        Ok([
            WorkProgress::new(n0 * d0, n0),
            WorkProgress::new(n1 * d1, n1),
        ])
    }
}

impl KernelLifecycle for DualDecimate {
    type Config = DualDecimateConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Mutex::new(DualShared {
                cfg: config,
                realign: false,
            })),
        })
    }
}
