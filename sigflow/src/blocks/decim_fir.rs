use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use super::lock_shared;
use crate::fir::dot_at;
use crate::firdes;
use crate::kernel::{
    ConfigError, Complex32, KernelLifecycle, Read1D, RelativeRate, Sample, StreamError,
    StreamKernel, WorkProgress, Write1D,
};
use crate::windows::Window;

/// Configuration of the reconfigurable decimating FIR stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimFirConfig {
    /// Input samples per output sample.
    pub decimation: usize,
    /// Input sampling rate in Hz.
    pub samp_rate: f64,
    /// Low-pass cutoff frequency in Hz.
    pub cutoff: f64,
    /// Transition width in Hz.
    pub transition_width: f64,
    /// Window applied to the ideal response.
    pub window: Window<f64>,
    /// Passband gain.
    pub gain: f64,
}

impl DecimFirConfig {
    /// Config with a Hamming window and unity gain.
    pub fn new(decimation: usize, samp_rate: f64, cutoff: f64, transition_width: f64) -> Self {
        Self {
            decimation,
            samp_rate,
            cutoff,
            transition_width,
            window: Window::Hamming,
            gain: 1.0,
        }
    }

    /// Full cross-field validation of the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimation < 2 {
            return Err(ConfigError::InvalidArgument {
                arg: "decimation",
                reason: "decimation factor must be at least 2",
            });
        }
        if !self.samp_rate.is_finite() || self.samp_rate <= 0.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "samp_rate",
                reason: "sampling rate must be positive",
            });
        }
        if !self.cutoff.is_finite() || self.cutoff <= 0.0 || self.cutoff >= self.samp_rate / 2.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff must lie strictly between 0 and the Nyquist frequency",
            });
        }
        if !self.transition_width.is_finite() || self.transition_width <= 0.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "transition_width",
                reason: "transition width must be positive",
            });
        }
        if !self.gain.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "gain",
                reason: "gain must be finite",
            });
        }
        self.window.validate()
    }

    /// Run the frequency design for this configuration.
    fn design(&self) -> Result<Vec<f32>, ConfigError> {
        let taps = firdes::low_pass(
            self.gain,
            self.samp_rate,
            self.cutoff,
            self.transition_width,
            &self.window,
        )?;
        Ok(taps.into_iter().map(|t| t as f32).collect())
    }
}

#[derive(Debug)]
struct Shared {
    cfg: DecimFirConfig,
    dirty: bool,
}

/// Reconfigurable decimating FIR filter stage.
///
/// The host presents input windows starting with `required_lookback()`
/// retained samples; output `j` is the convolution ending at window
/// position `lookback + j * decimation`, so `consumed == produced *
/// decimation` on every productive call. After any reconfiguration the next
/// `process_into` call applies the new design and reports zero progress,
/// requesting host realignment against the re-declared contract.
#[derive(Debug)]
pub struct DecimFirKernel<T>
where
    T: Sample,
{
    shared: Arc<Mutex<Shared>>,
    // Applied copies owned by the processing thread; the hot loop never locks.
    taps: Vec<f32>,
    decimation: usize,
    _sample: PhantomData<T>,
}

/// Complex-stream decimating FIR.
pub type DecimFirCc = DecimFirKernel<Complex32>;
/// Real-stream decimating FIR.
pub type DecimFirFf = DecimFirKernel<f32>;

/// Cloneable control surface of a [`DecimFirKernel`], usable from any
/// thread concurrently with processing.
///
/// Setters validate synchronously against the full candidate configuration
/// and reject invalid values without touching stored state; a stored change
/// marks the design dirty only when the value actually changed.
#[derive(Debug, Clone)]
pub struct DecimFirControl {
    shared: Arc<Mutex<Shared>>,
}

impl DecimFirControl {
    fn update<F>(&self, apply: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut DecimFirConfig),
    {
        let mut shared = lock_shared(&self.shared);
        let mut candidate = shared.cfg.clone();
        apply(&mut candidate);
        candidate.validate()?;
        if candidate != shared.cfg {
            shared.cfg = candidate;
            shared.dirty = true;
        }
        Ok(())
    }

    /// Set the decimation factor.
    pub fn set_decimation(&self, decimation: usize) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.decimation = decimation)
    }

    /// Set the input sampling rate in Hz.
    pub fn set_samp_rate(&self, samp_rate: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.samp_rate = samp_rate)
    }

    /// Set the low-pass cutoff frequency in Hz.
    pub fn set_cutoff(&self, cutoff: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.cutoff = cutoff)
    }

    /// Set the transition width in Hz.
    pub fn set_transition_width(&self, transition_width: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.transition_width = transition_width)
    }

    /// Set the design window.
    pub fn set_window(&self, window: Window<f64>) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.window = window)
    }

    /// Set the passband gain.
    pub fn set_gain(&self, gain: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.gain = gain)
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> DecimFirConfig {
        lock_shared(&self.shared).cfg.clone()
    }

    /// Current decimation factor.
    pub fn decimation(&self) -> usize {
        lock_shared(&self.shared).cfg.decimation
    }

    /// Current sampling rate in Hz.
    pub fn samp_rate(&self) -> f64 {
        lock_shared(&self.shared).cfg.samp_rate
    }

    /// Current cutoff frequency in Hz.
    pub fn cutoff(&self) -> f64 {
        lock_shared(&self.shared).cfg.cutoff
    }

    /// Current transition width in Hz.
    pub fn transition_width(&self) -> f64 {
        lock_shared(&self.shared).cfg.transition_width
    }

    /// Current design window.
    pub fn window(&self) -> Window<f64> {
        lock_shared(&self.shared).cfg.window
    }

    /// Current passband gain.
    pub fn gain(&self) -> f64 {
        lock_shared(&self.shared).cfg.gain
    }
}

impl<T> KernelLifecycle for DecimFirKernel<T>
where
    T: Sample,
{
    type Config = DecimFirConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let taps = config.design()?;
        let decimation = config.decimation;
        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                cfg: config,
                dirty: false,
            })),
            taps,
            decimation,
            _sample: PhantomData,
        })
    }
}

impl<T> DecimFirKernel<T>
where
    T: Sample,
{
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> DecimFirControl {
        DecimFirControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Currently applied coefficient vector.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}

impl<T> StreamKernel<T> for DecimFirKernel<T>
where
    T: Sample,
{
    fn required_lookback(&self) -> usize {
        self.taps.len().saturating_sub(1)
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
        {
            let mut shared = lock_shared(&self.shared);
            if shared.dirty {
                let taps = shared.cfg.design()?;
                if taps.is_empty() {
                    return Err(StreamError::DesignFailure {
                        reason: "low-pass design produced no taps",
                    });
                }
                self.taps = taps;
                self.decimation = shared.cfg.decimation;
                shared.dirty = false;
                return Ok(WorkProgress::NONE);
            }
        }

        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        let lookback = self.taps.len().saturating_sub(1);
        if input.len() <= lookback {
            return Ok(WorkProgress::NONE);
        }
        let avail = input.len() - lookback;
        let produced = out.len().min(avail / self.decimation);
        if produced == 0 {
            return Ok(WorkProgress::NONE);
        }

        for (j, o) in out.iter_mut().take(produced).enumerate() {
            *o = dot_at(&self.taps, input, lookback + j * self.decimation);
        }
        Ok(WorkProgress::new(produced * self.decimation, produced))
    }
}
