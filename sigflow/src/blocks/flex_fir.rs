use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use super::lock_shared;
use crate::fir::FirCore;
use crate::kernel::{
    Complex32, ConfigError, FromSample, KernelLifecycle, Read1D, RelativeRate, Sample,
    StreamError, StreamKernel, WorkProgress, Write1D,
};
use crate::windows::Window;

/// Band shape of the flexible filter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Pass below `freq1`.
    Lowpass,
    /// Pass above `freq1`.
    Highpass,
    /// Pass between the ordered pair of `freq1` and `freq2`.
    Bandpass,
}

/// Fraction of the sampling rate used to separate degenerate band edges
/// when no explicit separation is configured.
pub const DEFAULT_BAND_SEPARATION_FRACTION: f64 = 0.01;

/// Configuration of the flexible FIR stage.
///
/// The design is a Hamming-windowed ideal response with an odd tap count of
/// `ceil(4 * samp_rate / transition_width)`, scaled by `gain`. A band-pass
/// whose ordered edges coincide is auto-separated: the upper edge moves to
/// `min(nyquist, lower + max(transition_width, separation))` where the
/// separation defaults to [`DEFAULT_BAND_SEPARATION_FRACTION`] of the
/// sampling rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexFirConfig {
    /// Band shape.
    pub mode: FilterMode,
    /// Input sampling rate in Hz.
    pub samp_rate: f64,
    /// Primary band edge in Hz: the cutoff for low/high-pass, one band-pass edge.
    pub freq1: f64,
    /// Second band-pass edge in Hz; ignored by low/high-pass.
    pub freq2: f64,
    /// Transition width in Hz (floored to 1 Hz at design time).
    pub transition_width: f64,
    /// Output scale applied to every tap.
    pub gain: f64,
    /// Explicit degenerate-band separation in Hz; `None` uses the default fraction.
    pub band_separation: Option<f64>,
}

impl FlexFirConfig {
    /// Low-pass config with cutoff `freq1`.
    pub fn lowpass(samp_rate: f64, freq1: f64, transition_width: f64, gain: f64) -> Self {
        Self {
            mode: FilterMode::Lowpass,
            samp_rate,
            freq1,
            freq2: 0.0,
            transition_width,
            gain,
            band_separation: None,
        }
    }

    /// High-pass config with cutoff `freq1`.
    pub fn highpass(samp_rate: f64, freq1: f64, transition_width: f64, gain: f64) -> Self {
        Self {
            mode: FilterMode::Highpass,
            ..Self::lowpass(samp_rate, freq1, transition_width, gain)
        }
    }

    /// Band-pass config over the ordered pair of `freq1` and `freq2`.
    pub fn bandpass(
        samp_rate: f64,
        freq1: f64,
        freq2: f64,
        transition_width: f64,
        gain: f64,
    ) -> Self {
        Self {
            mode: FilterMode::Bandpass,
            freq2,
            ..Self::lowpass(samp_rate, freq1, transition_width, gain)
        }
    }

    /// Full cross-field validation of the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.samp_rate.is_finite() || self.samp_rate <= 0.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "samp_rate",
                reason: "sampling rate must be positive",
            });
        }
        let nyquist = self.samp_rate / 2.0;
        if !self.freq1.is_finite() || self.freq1 <= 0.0 || self.freq1 >= nyquist {
            return Err(ConfigError::InvalidArgument {
                arg: "freq1",
                reason: "band edge must lie strictly between 0 and the Nyquist frequency",
            });
        }
        if self.mode == FilterMode::Bandpass
            && (!self.freq2.is_finite() || self.freq2 <= 0.0 || self.freq2 >= nyquist)
        {
            return Err(ConfigError::InvalidArgument {
                arg: "freq2",
                reason: "band edge must lie strictly between 0 and the Nyquist frequency",
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
        if let Some(separation) = self.band_separation {
            if !separation.is_finite() || separation <= 0.0 {
                return Err(ConfigError::InvalidArgument {
                    arg: "band_separation",
                    reason: "band separation must be positive",
                });
            }
        }
        Ok(())
    }

    /// Hamming-windowed ideal response for the current mode.
    fn design(&self) -> Vec<f32> {
        let tw = self.transition_width.max(1.0);
        let ntaps = (4.0 * self.samp_rate / tw).ceil() as usize | 1;
        let half = ((ntaps - 1) / 2) as isize;
        let window = Window::<f64>::Hamming.build(ntaps);

        // Normalized band edges; band-pass orders and auto-separates first.
        let (fc1, fc2) = match self.mode {
            FilterMode::Lowpass | FilterMode::Highpass => (self.freq1 / self.samp_rate, 0.0),
            FilterMode::Bandpass => {
                let lo = self.freq1.min(self.freq2);
                let mut hi = self.freq1.max(self.freq2);
                if hi <= lo {
                    let separation = self
                        .band_separation
                        .unwrap_or(self.samp_rate * DEFAULT_BAND_SEPARATION_FRACTION);
                    hi = (lo + tw.max(separation)).min(self.samp_rate / 2.0);
                }
                (lo / self.samp_rate, hi / self.samp_rate)
            }
        };

        (-half..=half)
            .map(|n| {
                let x = n as f64;
                let ideal = match self.mode {
                    FilterMode::Lowpass => 2.0 * fc1 * sinc(2.0 * fc1 * x),
                    FilterMode::Highpass => {
                        if n == 0 {
                            1.0 - 2.0 * fc1
                        } else {
                            -2.0 * fc1 * sinc(2.0 * fc1 * x)
                        }
                    }
                    FilterMode::Bandpass => {
                        2.0 * fc2 * sinc(2.0 * fc2 * x) - 2.0 * fc1 * sinc(2.0 * fc1 * x)
                    }
                };
                (ideal * window[(n + half) as usize] * self.gain) as f32
            })
            .collect()
    }
}

/// Normalized sinc, `sin(pi x) / (pi x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = core::f64::consts::PI * x;
        px.sin() / px
    }
}

#[derive(Debug)]
struct Shared {
    cfg: FlexFirConfig,
    dirty: bool,
}

/// Mode-switchable streaming FIR filter.
///
/// Non-decimating: consumed equals produced, and the lookback the design
/// needs is carried internally, so `required_lookback()` is zero. A pending
/// reconfiguration is applied lazily by the next `process_into` call, which
/// reports zero progress once while the history re-zeroes for the new
/// design.
#[derive(Debug)]
pub struct FlexFirKernel<Tin, Tout = Tin>
where
    Tin: Sample,
    Tout: FromSample<Tin>,
{
    shared: Arc<Mutex<Shared>>,
    core: FirCore<Tin>,
    _out: PhantomData<Tout>,
}

/// Real-stream flexible FIR.
pub type FlexFirFf = FlexFirKernel<f32>;
/// Complex-stream flexible FIR.
pub type FlexFirCc = FlexFirKernel<Complex32>;
/// Complex-in real-out flexible FIR, emitting the real part.
pub type FlexFirCf = FlexFirKernel<Complex32, f32>;

/// Cloneable control surface of a [`FlexFirKernel`].
#[derive(Debug, Clone)]
pub struct FlexFirControl {
    shared: Arc<Mutex<Shared>>,
}

impl FlexFirControl {
    fn update<F>(&self, apply: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut FlexFirConfig),
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

    /// Set the band shape.
    pub fn set_mode(&self, mode: FilterMode) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.mode = mode)
    }

    /// Set the input sampling rate in Hz.
    pub fn set_samp_rate(&self, samp_rate: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.samp_rate = samp_rate)
    }

    /// Set the primary band edge in Hz.
    pub fn set_freq1(&self, freq1: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.freq1 = freq1)
    }

    /// Set the second band-pass edge in Hz.
    pub fn set_freq2(&self, freq2: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.freq2 = freq2)
    }

    /// Set the transition width in Hz.
    pub fn set_transition_width(&self, transition_width: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.transition_width = transition_width)
    }

    /// Set the output gain.
    pub fn set_gain(&self, gain: f64) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.gain = gain)
    }

    /// Set or clear the explicit degenerate-band separation in Hz.
    pub fn set_band_separation(&self, separation: Option<f64>) -> Result<(), ConfigError> {
        self.update(|cfg| cfg.band_separation = separation)
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> FlexFirConfig {
        lock_shared(&self.shared).cfg.clone()
    }

    /// Current band shape.
    pub fn mode(&self) -> FilterMode {
        lock_shared(&self.shared).cfg.mode
    }

    /// Current sampling rate in Hz.
    pub fn samp_rate(&self) -> f64 {
        lock_shared(&self.shared).cfg.samp_rate
    }

    /// Current primary band edge in Hz.
    pub fn freq1(&self) -> f64 {
        lock_shared(&self.shared).cfg.freq1
    }

    /// Current second band-pass edge in Hz.
    pub fn freq2(&self) -> f64 {
        lock_shared(&self.shared).cfg.freq2
    }

    /// Current transition width in Hz.
    pub fn transition_width(&self) -> f64 {
        lock_shared(&self.shared).cfg.transition_width
    }

    /// Current output gain.
    pub fn gain(&self) -> f64 {
        lock_shared(&self.shared).cfg.gain
    }
}

impl<Tin, Tout> KernelLifecycle for FlexFirKernel<Tin, Tout>
where
    Tin: Sample,
    Tout: FromSample<Tin>,
{
    type Config = FlexFirConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let core = FirCore::new(config.design());
        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                cfg: config,
                dirty: false,
            })),
            core,
            _out: PhantomData,
        })
    }
}

impl<Tin, Tout> FlexFirKernel<Tin, Tout>
where
    Tin: Sample,
    Tout: FromSample<Tin>,
{
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> FlexFirControl {
        FlexFirControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Currently applied coefficient vector.
    pub fn taps(&self) -> &[f32] {
        self.core.taps()
    }
}

impl<Tin, Tout> StreamKernel<Tin, Tout> for FlexFirKernel<Tin, Tout>
where
    Tin: Sample,
    Tout: FromSample<Tin>,
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
        Iw: Read1D<Tin> + ?Sized,
        Ow: Write1D<Tout> + ?Sized,
    {
        {
            let mut shared = lock_shared(&self.shared);
            if shared.dirty {
                let taps = shared.cfg.design();
                if taps.is_empty() {
                    return Err(StreamError::DesignFailure {
                        reason: "flexible design produced no taps",
                    });
                }
                self.core.retap(taps);
                shared.dirty = false;
                return Ok(WorkProgress::NONE);
            }
        }

        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;
        let n = input.len().min(out.len());
        self.core.filter_into(&input[..n], &mut out[..n])?;
        Ok(WorkProgress::new(n, n))
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterMode, FlexFirCc, FlexFirCf, FlexFirConfig, FlexFirFf};
    use crate::kernel::{Complex32, ConfigError, KernelLifecycle, StreamKernel, WorkProgress};
    use approx::assert_abs_diff_eq;

    /// Response magnitude of `taps` at `freq` for a `samp_rate` design.
    fn response_at(taps: &[f32], freq: f64, samp_rate: f64) -> f64 {
        let omega = 2.0 * core::f64::consts::PI * freq / samp_rate;
        let (mut re, mut im) = (0.0f64, 0.0f64);
        for (k, tap) in taps.iter().enumerate() {
            re += *tap as f64 * (omega * k as f64).cos();
            im -= *tap as f64 * (omega * k as f64).sin();
        }
        (re * re + im * im).sqrt()
    }

    #[test]
    fn lowpass_impulse_reproduces_taps() {
        let cfg = FlexFirConfig::lowpass(48_000.0, 4_000.0, 1_000.0, 1.0);
        let mut kernel = FlexFirFf::try_new(cfg).expect("valid config");

        // ceil(4 * 48000 / 1000) = 192, forced odd.
        assert_eq!(kernel.taps().len(), 193);
        let taps = kernel.taps().to_vec();

        let mut input = vec![0.0f32; taps.len() + 8];
        input[0] = 1.0;
        let mut out = vec![0.0f32; input.len()];
        let progress = kernel
            .process_into(&input[..], &mut out[..])
            .expect("stable kernel");
        assert_eq!(progress.consumed, input.len());
        assert_eq!(progress.produced, input.len());

        for (i, tap) in taps.iter().enumerate() {
            assert_abs_diff_eq!(out[i], *tap, epsilon = 1e-5);
        }
        for y in &out[taps.len()..] {
            assert_abs_diff_eq!(*y, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn lowpass_design_scales_with_gain() {
        let unit = FlexFirConfig::lowpass(32_000.0, 3_000.0, 400.0, 1.0);
        let scaled = FlexFirConfig::lowpass(32_000.0, 3_000.0, 400.0, 2.5);
        let unit_kernel = FlexFirFf::try_new(unit).expect("valid config");
        let scaled_kernel = FlexFirFf::try_new(scaled).expect("valid config");
        for (a, b) in unit_kernel.taps().iter().zip(scaled_kernel.taps()) {
            assert_abs_diff_eq!(a * 2.5, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn highpass_design_blocks_dc_and_passes_high_band() {
        let cfg = FlexFirConfig::highpass(48_000.0, 6_000.0, 500.0, 1.0);
        let kernel = FlexFirFf::try_new(cfg).expect("valid config");
        let taps = kernel.taps();
        assert!(response_at(taps, 0.0, 48_000.0) < 0.01);
        assert!((response_at(taps, 20_000.0, 48_000.0) - 1.0).abs() < 0.02);
        assert!(response_at(taps, 1_000.0, 48_000.0) < 0.01);
    }

    #[test]
    fn bandpass_passes_band_and_blocks_outside() {
        let cfg = FlexFirConfig::bandpass(48_000.0, 5_000.0, 9_000.0, 500.0, 1.0);
        let kernel = FlexFirFf::try_new(cfg).expect("valid config");
        let taps = kernel.taps();
        assert!((response_at(taps, 7_000.0, 48_000.0) - 1.0).abs() < 0.02);
        assert!(response_at(taps, 1_000.0, 48_000.0) < 0.01);
        assert!(response_at(taps, 15_000.0, 48_000.0) < 0.01);
    }

    #[test]
    fn degenerate_bandpass_auto_widens() {
        let cfg = FlexFirConfig::bandpass(48_000.0, 3_000.0, 3_000.0, 200.0, 1.0);
        let kernel = FlexFirFf::try_new(cfg).expect("valid config");
        let taps = kernel.taps();
        assert!(taps.iter().any(|t| t.abs() > 1e-6));
        // Default separation is 1% of the rate: passband center near 3240 Hz.
        assert!(response_at(taps, 3_240.0, 48_000.0) > 0.5);
        assert!(response_at(taps, 100.0, 48_000.0) < 0.05);
        assert!(response_at(taps, 10_000.0, 48_000.0) < 0.05);

        // An explicit separation widens further.
        let mut cfg = FlexFirConfig::bandpass(48_000.0, 3_000.0, 3_000.0, 200.0, 1.0);
        cfg.band_separation = Some(4_000.0);
        let wide = FlexFirFf::try_new(cfg).expect("valid config");
        assert!(response_at(wide.taps(), 5_000.0, 48_000.0) > 0.5);
    }

    #[test]
    fn inverted_band_edges_are_reordered() {
        let forward = FlexFirConfig::bandpass(48_000.0, 5_000.0, 9_000.0, 500.0, 1.0);
        let reversed = FlexFirConfig::bandpass(48_000.0, 9_000.0, 5_000.0, 500.0, 1.0);
        let a = FlexFirFf::try_new(forward).expect("valid config");
        let b = FlexFirFf::try_new(reversed).expect("valid config");
        assert_eq!(a.taps(), b.taps());
    }

    #[test]
    fn mode_switch_realigns_then_switches_response() {
        let cfg = FlexFirConfig::lowpass(48_000.0, 4_000.0, 1_000.0, 1.0);
        let mut kernel = FlexFirFf::try_new(cfg).expect("valid config");
        let control = kernel.control();

        let input = vec![1.0f32; 32];
        let mut out = vec![0.0f32; 32];
        let progress = kernel
            .process_into(&input[..], &mut out[..])
            .expect("stable");
        assert_eq!(progress, WorkProgress::new(32, 32));

        control.set_mode(FilterMode::Highpass).expect("valid mode");
        let progress = kernel
            .process_into(&input[..], &mut out[..])
            .expect("realignment call");
        assert_eq!(progress, WorkProgress::NONE);

        assert!(response_at(kernel.taps(), 0.0, 48_000.0) < 0.01);
        let progress = kernel
            .process_into(&input[..], &mut out[..])
            .expect("stable again");
        assert_eq!(progress, WorkProgress::new(32, 32));
    }

    #[test]
    fn complex_to_real_variant_tracks_complex_filter() {
        let cfg = FlexFirConfig::lowpass(32_000.0, 2_000.0, 800.0, 1.0);
        let mut cc = FlexFirCc::try_new(cfg.clone()).expect("valid config");
        let mut cf = FlexFirCf::try_new(cfg).expect("valid config");

        let input: Vec<Complex32> = (0..128)
            .map(|i| {
                let t = i as f32 * 0.02;
                Complex32::new(t.sin(), (1.7 * t).cos())
            })
            .collect();

        let mut cc_out = vec![Complex32::new(0.0, 0.0); input.len()];
        let mut cf_out = vec![0.0f32; input.len()];
        cc.process_into(&input[..], &mut cc_out[..]).expect("cc");
        cf.process_into(&input[..], &mut cf_out[..]).expect("cf");

        for (a, b) in cf_out.iter().zip(cc_out.iter()) {
            assert_abs_diff_eq!(*a, b.re, epsilon = 1e-6);
        }
    }

    #[test]
    fn chunked_processing_matches_batch() {
        let cfg = FlexFirConfig::lowpass(8_000.0, 1_000.0, 250.0, 1.0);
        let signal: Vec<f32> = (0..512).map(|i| (i as f32 * 0.11).sin()).collect();

        let mut batch_kernel = FlexFirFf::try_new(cfg.clone()).expect("valid config");
        let mut batch = vec![0.0f32; signal.len()];
        batch_kernel
            .process_into(&signal[..], &mut batch[..])
            .expect("batch");

        let mut kernel = FlexFirFf::try_new(cfg).expect("valid config");
        let mut streamed = Vec::with_capacity(signal.len());
        for chunk in signal.chunks(37) {
            let mut out = vec![0.0f32; chunk.len()];
            let progress = kernel.process_into(chunk, &mut out[..]).expect("chunk");
            streamed.extend_from_slice(&out[..progress.produced]);
        }

        for (a, b) in streamed.iter().zip(batch.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn constructor_and_setters_reject_invalid_values() {
        let err = FlexFirFf::try_new(FlexFirConfig::lowpass(48_000.0, 0.0, 1_000.0, 1.0))
            .expect_err("zero cutoff");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "freq1",
                reason: "band edge must lie strictly between 0 and the Nyquist frequency",
            }
        );

        let kernel = FlexFirFf::try_new(FlexFirConfig::lowpass(48_000.0, 4_000.0, 1_000.0, 1.0))
            .expect("valid config");
        let control = kernel.control();

        // freq2 is ignored by low-pass but gates the switch to band-pass.
        let err = control
            .set_mode(FilterMode::Bandpass)
            .expect_err("freq2 unset");
        assert!(matches!(
            err,
            ConfigError::InvalidArgument { arg: "freq2", .. }
        ));
        assert_eq!(control.mode(), FilterMode::Lowpass);

        control.set_freq2(6_000.0).expect("valid freq2");
        control.set_mode(FilterMode::Bandpass).expect("valid mode");

        let err = control
            .set_band_separation(Some(-1.0))
            .expect_err("negative separation");
        assert!(matches!(
            err,
            ConfigError::InvalidArgument {
                arg: "band_separation",
                ..
            }
        ));
    }
}
