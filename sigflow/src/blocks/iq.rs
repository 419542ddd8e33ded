use std::sync::{Arc, Mutex};

use super::lock_shared;
use crate::kernel::{
    Complex32, ConfigError, KernelLifecycle, Read1D, RelativeRate, StreamError, StreamKernel,
    WorkProgress, Write1D,
};

/// Configuration of the complex-to-real magnitude stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqMagnitudeConfig {
    /// Multiplier applied to every magnitude.
    pub scale: f32,
}

impl IqMagnitudeConfig {
    /// Config with the given scale.
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "scale",
                reason: "scale must be finite",
            });
        }
        Ok(())
    }
}

/// Complex-to-real magnitude stage, `out = scale * |x|`.
#[derive(Debug)]
pub struct IqMagnitude {
    shared: Arc<Mutex<f32>>,
}

/// Cloneable control surface of an [`IqMagnitude`].
#[derive(Debug, Clone)]
pub struct IqMagnitudeControl {
    shared: Arc<Mutex<f32>>,
}

impl IqMagnitudeControl {
    /// Set the magnitude scale.
    pub fn set_scale(&self, scale: f32) -> Result<(), ConfigError> {
        IqMagnitudeConfig::new(scale).validate()?;
        *lock_shared(&self.shared) = scale;
        Ok(())
    }

    /// Current magnitude scale.
    pub fn scale(&self) -> f32 {
        *lock_shared(&self.shared)
    }
}

impl IqMagnitude {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> IqMagnitudeControl {
        IqMagnitudeControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl KernelLifecycle for IqMagnitude {
    type Config = IqMagnitudeConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Mutex::new(config.scale)),
        })
    }
}

impl StreamKernel<Complex32, f32> for IqMagnitude {
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
        Iw: Read1D<Complex32> + ?Sized,
        Ow: Write1D<f32> + ?Sized,
    {
        let scale = *lock_shared(&self.shared);
        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        let n = input.len().min(out.len());
        for (o, x) in out.iter_mut().zip(&input[..n]) {
            *o = scale * (x.re * x.re + x.im * x.im).sqrt();
        }
        Ok(WorkProgress::new(n, n))
    }
}

/// Component extracted by [`IqSelect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqMode {
    /// `|x|`
    Magnitude,
    /// `|x|^2`
    MagnitudeSquared,
    /// `arg(x)`
    Phase,
    /// `Re(x)`
    Real,
    /// `Im(x)`
    Imaginary,
    /// `|arg(x)|`
    PhaseAbs,
}

/// Configuration of the complex component selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqSelectConfig {
    /// Multiplier applied to the selected component.
    pub scale: f32,
    /// Component to emit.
    pub mode: IqMode,
}

impl IqSelectConfig {
    /// Config selecting `mode` with the given scale.
    pub fn new(scale: f32, mode: IqMode) -> Self {
        Self { scale, mode }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "scale",
                reason: "scale must be finite",
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SelectShared {
    cfg: IqSelectConfig,
}

/// Complex-to-real component selector.
///
/// Emits one scalar per complex input according to the configured
/// [`IqMode`]; both scale and mode are runtime switchable and snapshotted
/// once per call, so a switch never lands mid-window.
#[derive(Debug)]
pub struct IqSelect {
    shared: Arc<Mutex<SelectShared>>,
}

/// Cloneable control surface of an [`IqSelect`].
#[derive(Debug, Clone)]
pub struct IqSelectControl {
    shared: Arc<Mutex<SelectShared>>,
}

impl IqSelectControl {
    /// Set the output scale.
    pub fn set_scale(&self, scale: f32) -> Result<(), ConfigError> {
        let mut shared = lock_shared(&self.shared);
        let candidate = IqSelectConfig::new(scale, shared.cfg.mode);
        candidate.validate()?;
        shared.cfg = candidate;
        Ok(())
    }

    /// Set the emitted component.
    pub fn set_mode(&self, mode: IqMode) -> Result<(), ConfigError> {
        lock_shared(&self.shared).cfg.mode = mode;
        Ok(())
    }

    /// Current output scale.
    pub fn scale(&self) -> f32 {
        lock_shared(&self.shared).cfg.scale
    }

    /// Currently emitted component.
    pub fn mode(&self) -> IqMode {
        lock_shared(&self.shared).cfg.mode
    }
}

impl IqSelect {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> IqSelectControl {
        IqSelectControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl KernelLifecycle for IqSelect {
    type Config = IqSelectConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Mutex::new(SelectShared { cfg: config })),
        })
    }
}

impl StreamKernel<Complex32, f32> for IqSelect {
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
        Iw: Read1D<Complex32> + ?Sized,
        Ow: Write1D<f32> + ?Sized,
    {
        let IqSelectConfig { scale, mode } = lock_shared(&self.shared).cfg;
        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        let n = input.len().min(out.len());
        match mode {
            IqMode::Magnitude => {
                for (o, x) in out.iter_mut().zip(&input[..n]) {
                    *o = scale * (x.re * x.re + x.im * x.im).sqrt();
                }
            }
            IqMode::MagnitudeSquared => {
                for (o, x) in out.iter_mut().zip(&input[..n]) {
                    *o = scale * (x.re * x.re + x.im * x.im);
                }
            }
            IqMode::Phase => {
                for (o, x) in out.iter_mut().zip(&input[..n]) {
                    *o = scale * x.im.atan2(x.re);
                }
            }
            IqMode::Real => {
                for (o, x) in out.iter_mut().zip(&input[..n]) {
                    *o = scale * x.re;
                }
            }
            IqMode::Imaginary => {
                for (o, x) in out.iter_mut().zip(&input[..n]) {
                    *o = scale * x.im;
                }
            }
            IqMode::PhaseAbs => {
                for (o, x) in out.iter_mut().zip(&input[..n]) {
                    *o = scale * x.im.atan2(x.re).abs();
                }
            }
        }
        Ok(WorkProgress::new(n, n))
    }
}

#[cfg(test)]
mod tests {
    use super::{IqMagnitude, IqMagnitudeConfig, IqMode, IqSelect, IqSelectConfig};
    use crate::kernel::{Complex32, KernelLifecycle, StreamKernel};
    use approx::assert_abs_diff_eq;

    fn probe() -> Vec<Complex32> {
        vec![
            Complex32::new(3.0, 4.0),
            Complex32::new(-1.0, 0.0),
            Complex32::new(0.0, -2.0),
        ]
    }

    fn select_one(mode: IqMode, scale: f32, x: Complex32) -> f32 {
        let mut kernel = IqSelect::try_new(IqSelectConfig::new(scale, mode)).expect("valid");
        let mut out = [0.0f32];
        kernel.process_into(&[x][..], &mut out[..]).expect("run");
        out[0]
    }

    #[test]
    fn magnitude_applies_scale() {
        let mut kernel =
            IqMagnitude::try_new(IqMagnitudeConfig::new(0.5)).expect("valid config");
        let input = probe();
        let mut out = vec![0.0f32; input.len()];
        kernel.process_into(&input[..], &mut out[..]).expect("run");

        assert_abs_diff_eq!(out[0], 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 1.0, epsilon = 1e-6);

        let control = kernel.control();
        control.set_scale(2.0).expect("finite scale");
        kernel.process_into(&input[..], &mut out[..]).expect("run");
        assert_abs_diff_eq!(out[0], 10.0, epsilon = 1e-6);
        assert!(control.set_scale(f32::INFINITY).is_err());
        assert_eq!(control.scale(), 2.0);
    }

    #[test]
    fn select_component_identities() {
        let x = Complex32::new(3.0, 4.0);
        assert_abs_diff_eq!(select_one(IqMode::Magnitude, 1.0, x), 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            select_one(IqMode::MagnitudeSquared, 1.0, x),
            25.0,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            select_one(IqMode::Phase, 1.0, x),
            4.0f32.atan2(3.0),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(select_one(IqMode::Real, 2.0, x), 6.0, epsilon = 1e-6);
        assert_abs_diff_eq!(select_one(IqMode::Imaginary, 1.0, x), 4.0, epsilon = 1e-6);

        let down = Complex32::new(1.0, -1.0);
        assert_abs_diff_eq!(
            select_one(IqMode::PhaseAbs, 1.0, down),
            core::f32::consts::FRAC_PI_4,
            epsilon = 1e-6
        );
    }

    #[test]
    fn mode_switch_applies_on_next_call() {
        let mut kernel =
            IqSelect::try_new(IqSelectConfig::new(1.0, IqMode::Real)).expect("valid config");
        let control = kernel.control();
        let input = [Complex32::new(3.0, 4.0)];
        let mut out = [0.0f32];

        kernel.process_into(&input[..], &mut out[..]).expect("run");
        assert_abs_diff_eq!(out[0], 3.0, epsilon = 1e-6);

        control.set_mode(IqMode::Imaginary).expect("mode switch");
        assert_eq!(control.mode(), IqMode::Imaginary);
        kernel.process_into(&input[..], &mut out[..]).expect("run");
        assert_abs_diff_eq!(out[0], 4.0, epsilon = 1e-6);
    }
}
