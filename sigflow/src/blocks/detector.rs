use std::sync::{Arc, Mutex};

use super::lock_shared;
use crate::kernel::{
    ConfigError, KernelLifecycle, Read1D, RelativeRate, StreamError, StreamEvent, StreamKernel,
    WorkProgress, Write1D,
};

/// Detection event emitted by the hysteresis detectors.
///
/// `offset` is the absolute index of the sample that triggered the
/// transition, counted from the first sample the detector ever processed;
/// `level` is the detection statistic at that sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionEvent {
    /// Absolute sample offset of the transition.
    pub offset: u64,
    /// Start on a rising detection, Stop on a falling one.
    pub event: StreamEvent,
    /// Detection statistic value at the transition.
    pub level: f64,
}

/// Configuration of the rolling-mean energy detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDetectorConfig {
    /// Rising threshold; a Start fires when the window mean exceeds it.
    pub threshold_high: f32,
    /// Falling threshold; a Stop fires when the window mean drops below it.
    pub threshold_low: f32,
    /// Rolling window length in samples.
    pub window: usize,
}

impl EnergyDetectorConfig {
    /// Config with the given thresholds and window length.
    pub fn new(threshold_high: f32, threshold_low: f32, window: usize) -> Self {
        Self {
            threshold_high,
            threshold_low,
            window,
        }
    }

    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold_high.is_finite() || !self.threshold_low.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "thresholds",
                reason: "thresholds must be finite",
            });
        }
        if self.window < 2 {
            return Err(ConfigError::InvalidArgument {
                arg: "window",
                reason: "window length must be at least 2",
            });
        }
        Ok(())
    }

    fn ordered(mut self) -> Self {
        let (high, low) = (
            self.threshold_high.max(self.threshold_low),
            self.threshold_high.min(self.threshold_low),
        );
        self.threshold_high = high;
        self.threshold_low = low;
        self
    }
}

#[derive(Debug)]
struct EnergyShared {
    cfg: EnergyDetectorConfig,
}

/// Pass-through energy detector with hysteresis.
///
/// Maintains a rolling mean over the trailing `window` samples; once the
/// window has filled, a mean rising above the high threshold emits a Start
/// and a mean falling below the low threshold emits a Stop. Thresholds are
/// reordered so high >= low always holds. Samples pass through unchanged,
/// so downstream tags and offsets stay valid. A window change re-primes the
/// rolling state inside the next call without disturbing the rate contract.
#[derive(Debug)]
pub struct EnergyDetector {
    shared: Arc<Mutex<EnergyShared>>,
    buf: Vec<f32>,
    head: usize,
    primed: bool,
    sum: f64,
    count: u64,
    active: bool,
    events: Vec<DetectionEvent>,
}

/// Cloneable control surface of an [`EnergyDetector`].
#[derive(Debug, Clone)]
pub struct EnergyDetectorControl {
    shared: Arc<Mutex<EnergyShared>>,
}

impl EnergyDetectorControl {
    /// Set both thresholds; they are reordered so high >= low.
    pub fn set_thresholds(&self, high: f32, low: f32) -> Result<(), ConfigError> {
        let mut shared = lock_shared(&self.shared);
        let candidate = EnergyDetectorConfig::new(high, low, shared.cfg.window);
        candidate.validate()?;
        shared.cfg = candidate.ordered();
        Ok(())
    }

    /// Set the rolling window length; the detector re-primes on next use.
    pub fn set_window(&self, window: usize) -> Result<(), ConfigError> {
        let mut shared = lock_shared(&self.shared);
        let candidate = EnergyDetectorConfig::new(
            shared.cfg.threshold_high,
            shared.cfg.threshold_low,
            window,
        );
        candidate.validate()?;
        shared.cfg = candidate;
        Ok(())
    }

    /// Current rising threshold.
    pub fn threshold_high(&self) -> f32 {
        lock_shared(&self.shared).cfg.threshold_high
    }

    /// Current falling threshold.
    pub fn threshold_low(&self) -> f32 {
        lock_shared(&self.shared).cfg.threshold_low
    }

    /// Current window length.
    pub fn window(&self) -> usize {
        lock_shared(&self.shared).cfg.window
    }
}

impl EnergyDetector {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> EnergyDetectorControl {
        EnergyDetectorControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Drain the events emitted since the previous drain.
    pub fn take_events(&mut self) -> Vec<DetectionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl KernelLifecycle for EnergyDetector {
    type Config = EnergyDetectorConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let cfg = config.ordered();
        let window = cfg.window;
        Ok(Self {
            shared: Arc::new(Mutex::new(EnergyShared { cfg })),
            buf: vec![0.0; window],
            head: 0,
            primed: false,
            sum: 0.0,
            count: 0,
            active: false,
            events: Vec::new(),
        })
    }
}

impl StreamKernel<f32> for EnergyDetector {
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
        let (thr_high, thr_low, window) = {
            let shared = lock_shared(&self.shared);
            (
                shared.cfg.threshold_high,
                shared.cfg.threshold_low,
                shared.cfg.window,
            )
        };

        // Re-prime the rolling state when the window length changed.
        if self.buf.len() != window {
            self.buf = vec![0.0; window];
            self.head = 0;
            self.sum = 0.0;
            self.primed = false;
        }

        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;

        let n = input.len().min(out.len());
        for (o, x) in out.iter_mut().zip(&input[..n]) {
            *o = *x;

            let old = self.buf[self.head];
            self.sum += *x as f64 - old as f64;
            self.buf[self.head] = *x;
            self.head = (self.head + 1) % window;

            if !self.primed {
                if self.count + 1 >= window as u64 {
                    self.primed = true;
                }
                self.count += 1;
                continue;
            }

            let mean = self.sum / window as f64;
            if !self.active && mean > thr_high as f64 {
                self.active = true;
                self.events.push(DetectionEvent {
                    offset: self.count,
                    event: StreamEvent::Start,
                    level: mean,
                });
            } else if self.active && mean < thr_low as f64 {
                self.active = false;
                self.events.push(DetectionEvent {
                    offset: self.count,
                    event: StreamEvent::Stop,
                    level: mean,
                });
            }
            self.count += 1;
        }
        Ok(WorkProgress::new(n, n))
    }
}

/// Configuration of the exponential envelope detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeDetectorConfig {
    /// Envelope smoothing factor in (0, 1); larger is slower.
    pub alpha: f32,
    /// Rising threshold on the envelope.
    pub threshold_on: f32,
    /// Falling threshold on the envelope.
    pub threshold_off: f32,
}

impl Default for EnvelopeDetectorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.95,
            threshold_on: 0.20,
            threshold_off: 0.10,
        }
    }
}

impl EnvelopeDetectorConfig {
    /// Validate the candidate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "alpha",
                reason: "smoothing factor must lie strictly between 0 and 1",
            });
        }
        if !self.threshold_on.is_finite() || !self.threshold_off.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "thresholds",
                reason: "thresholds must be finite",
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct EnvelopeShared {
    cfg: EnvelopeDetectorConfig,
}

/// Exponential energy-envelope detector with hysteresis.
///
/// Tracks `env = alpha * env + (1 - alpha) * x^2` per sample and emits a
/// Start when the envelope reaches the on threshold, a Stop when it falls
/// to the off threshold. Produces two aligned outputs per input sample: the
/// unchanged signal and the envelope. Input offsets survive unchanged, so
/// upstream tags remain valid downstream.
#[derive(Debug)]
pub struct EnvelopeDetector {
    shared: Arc<Mutex<EnvelopeShared>>,
    env: f32,
    active: bool,
    position: u64,
    events: Vec<DetectionEvent>,
}

/// Cloneable control surface of an [`EnvelopeDetector`].
#[derive(Debug, Clone)]
pub struct EnvelopeDetectorControl {
    shared: Arc<Mutex<EnvelopeShared>>,
}

impl EnvelopeDetectorControl {
    fn update(&self, candidate: EnvelopeDetectorConfig) -> Result<(), ConfigError> {
        candidate.validate()?;
        lock_shared(&self.shared).cfg = candidate;
        Ok(())
    }

    /// Set the envelope smoothing factor.
    pub fn set_alpha(&self, alpha: f32) -> Result<(), ConfigError> {
        let mut cfg = lock_shared(&self.shared).cfg;
        cfg.alpha = alpha;
        self.update(cfg)
    }

    /// Set the rising threshold.
    pub fn set_threshold_on(&self, threshold: f32) -> Result<(), ConfigError> {
        let mut cfg = lock_shared(&self.shared).cfg;
        cfg.threshold_on = threshold;
        self.update(cfg)
    }

    /// Set the falling threshold.
    pub fn set_threshold_off(&self, threshold: f32) -> Result<(), ConfigError> {
        let mut cfg = lock_shared(&self.shared).cfg;
        cfg.threshold_off = threshold;
        self.update(cfg)
    }

    /// Current smoothing factor.
    pub fn alpha(&self) -> f32 {
        lock_shared(&self.shared).cfg.alpha
    }

    /// Current rising threshold.
    pub fn threshold_on(&self) -> f32 {
        lock_shared(&self.shared).cfg.threshold_on
    }

    /// Current falling threshold.
    pub fn threshold_off(&self) -> f32 {
        lock_shared(&self.shared).cfg.threshold_off
    }
}

impl EnvelopeDetector {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> EnvelopeDetectorControl {
        EnvelopeDetectorControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Drain the events emitted since the previous drain.
    pub fn take_events(&mut self) -> Vec<DetectionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Process one window, writing the pass-through signal and the envelope.
    ///
    /// Both outputs advance in lockstep with the input; the number of
    /// samples handled is bounded by the shortest of the three buffers.
    pub fn process(
        &mut self,
        input: &[f32],
        out: &mut [f32],
        envelope: &mut [f32],
    ) -> Result<WorkProgress, StreamError> {
        let (alpha, t_on, t_off) = {
            let shared = lock_shared(&self.shared);
            (
                shared.cfg.alpha,
                shared.cfg.threshold_on,
                shared.cfg.threshold_off,
            )
        };

        let n = input.len().min(out.len()).min(envelope.len());
        for i in 0..n {
            let x = input[i];
            out[i] = x;

            self.env = alpha * self.env + (1.0 - alpha) * x * x;
            envelope[i] = self.env;

            let offset = self.position + i as u64;
            if !self.active && self.env >= t_on {
                self.active = true;
                self.events.push(DetectionEvent {
                    offset,
                    event: StreamEvent::Start,
                    level: self.env as f64,
                });
            } else if self.active && self.env <= t_off {
                self.active = false;
                self.events.push(DetectionEvent {
                    offset,
                    event: StreamEvent::Stop,
                    level: self.env as f64,
                });
            }
        }
        self.position += n as u64;
        Ok(WorkProgress::new(n, n))
    }
}

impl KernelLifecycle for EnvelopeDetector {
    type Config = EnvelopeDetectorConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Mutex::new(EnvelopeShared { cfg: config })),
            env: 0.0,
            active: false,
            position: 0,
            events: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EnergyDetector, EnergyDetectorConfig, EnvelopeDetector, EnvelopeDetectorConfig,
    };
    use crate::kernel::{KernelLifecycle, StreamEvent, StreamKernel};
    use approx::assert_abs_diff_eq;

    #[test]
    fn rejects_degenerate_window_and_orders_thresholds() {
        assert!(EnergyDetector::try_new(EnergyDetectorConfig::new(1.0, 0.5, 1)).is_err());

        // Swapped thresholds are reordered rather than rejected.
        let detector =
            EnergyDetector::try_new(EnergyDetectorConfig::new(0.2, 0.8, 4)).expect("valid config");
        let control = detector.control();
        assert_eq!(control.threshold_high(), 0.8);
        assert_eq!(control.threshold_low(), 0.2);

        control.set_thresholds(0.1, 0.9).expect("finite thresholds");
        assert_eq!(control.threshold_high(), 0.9);
        assert_eq!(control.threshold_low(), 0.1);
    }

    #[test]
    fn burst_emits_start_then_stop_at_exact_offsets() {
        let window = 4usize;
        let mut detector = EnergyDetector::try_new(EnergyDetectorConfig::new(0.5, 0.25, window))
            .expect("valid config");

        // Quiet lead-in, a burst of ones, then quiet again.
        let mut signal = vec![0.0f32; 8];
        signal.extend(std::iter::repeat(1.0).take(8));
        signal.extend(std::iter::repeat(0.0).take(12));

        let mut out = vec![0.0f32; signal.len()];
        detector
            .process_into(&signal[..], &mut out[..])
            .expect("run");
        assert_eq!(out, signal);

        let events = detector.take_events();
        assert_eq!(events.len(), 2);

        // Window means: first mean > 0.5 at sample 10 (two ones in window of
        // four), first mean < 0.25 after the burst at sample 19.
        assert_eq!(events[0].event, StreamEvent::Start);
        assert_eq!(events[0].offset, 10);
        assert_abs_diff_eq!(events[0].level, 0.75, epsilon = 1e-9);

        assert_eq!(events[1].event, StreamEvent::Stop);
        assert_eq!(events[1].offset, 19);
        assert_eq!(events[1].level, 0.0);

        assert!(detector.take_events().is_empty());
    }

    #[test]
    fn no_event_until_window_is_primed() {
        let mut detector = EnergyDetector::try_new(EnergyDetectorConfig::new(0.5, 0.25, 8))
            .expect("valid config");

        // Loud from the very first sample; priming still holds events back.
        let signal = vec![1.0f32; 8];
        let mut out = vec![0.0f32; 8];
        detector
            .process_into(&signal[..], &mut out[..])
            .expect("run");
        assert!(detector.take_events().is_empty());

        // One more sample past the priming point fires Start.
        detector
            .process_into(&[1.0f32][..], &mut [0.0f32][..])
            .expect("run");
        let events = detector.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, StreamEvent::Start);
        assert_eq!(events[0].offset, 8);
    }

    #[test]
    fn burst_in_noise_triggers_one_event_pair() {
        use rand::Rng;

        let window = 32usize;
        let mut detector = EnergyDetector::try_new(EnergyDetectorConfig::new(0.5, 0.1, window))
            .expect("valid config");

        // Noise floor well inside the hysteresis band, burst well above it.
        let mut rng = rand::rng();
        let signal: Vec<f32> = (0..512)
            .map(|i| {
                let noise: f32 = rng.random_range(-0.05..0.05);
                if (128..256).contains(&i) {
                    1.0 + noise
                } else {
                    noise
                }
            })
            .collect();

        let mut out = vec![0.0f32; signal.len()];
        detector
            .process_into(&signal[..], &mut out[..])
            .expect("run");

        let events = detector.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, StreamEvent::Start);
        // The mean crosses up about half a window into the burst and back
        // down about a window after it ends, whatever the noise draw.
        assert!((140u64..=148).contains(&events[0].offset));
        assert_eq!(events[1].event, StreamEvent::Stop);
        assert!((280u64..=290).contains(&events[1].offset));
    }

    #[test]
    fn window_change_reprimes_without_spurious_events() {
        let mut detector = EnergyDetector::try_new(EnergyDetectorConfig::new(0.5, 0.25, 4))
            .expect("valid config");
        let control = detector.control();

        let loud = vec![1.0f32; 16];
        let mut out = vec![0.0f32; 16];
        detector.process_into(&loud[..], &mut out[..]).expect("run");
        assert_eq!(detector.take_events().len(), 1);

        control.set_window(6).expect("valid window");
        detector.process_into(&loud[..], &mut out[..]).expect("run");

        // Still active from before; re-priming emits no second Start.
        assert!(detector.take_events().is_empty());
    }

    #[test]
    fn envelope_tracks_and_reports_hysteresis_events() {
        let cfg = EnvelopeDetectorConfig {
            alpha: 0.5,
            threshold_on: 0.2,
            threshold_off: 0.1,
        };
        let mut detector = EnvelopeDetector::try_new(cfg).expect("valid config");

        let mut signal = vec![1.0f32; 4];
        signal.extend(std::iter::repeat(0.0).take(6));
        let mut out = vec![0.0f32; signal.len()];
        let mut env = vec![0.0f32; signal.len()];
        let progress = detector
            .process(&signal, &mut out, &mut env)
            .expect("run");
        assert_eq!(progress.produced, signal.len());
        assert_eq!(out, signal);

        // env after x=1: 0.5, 0.75, 0.875, 0.9375; then halves each zero.
        assert_abs_diff_eq!(env[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(env[3], 0.9375, epsilon = 1e-6);
        assert_abs_diff_eq!(env[7], 0.9375 / 16.0, epsilon = 1e-6);

        let events = detector.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, StreamEvent::Start);
        assert_eq!(events[0].offset, 0);
        assert_eq!(events[1].event, StreamEvent::Stop);
        // 0.9375 halves below 0.1 four zeros in: offsets 4..7 → first <= 0.1
        // is 0.0586 at offset 7.
        assert_eq!(events[1].offset, 7);
    }

    #[test]
    fn envelope_state_and_offsets_span_calls() {
        let mut detector =
            EnvelopeDetector::try_new(EnvelopeDetectorConfig::default()).expect("valid config");
        let control = detector.control();
        control.set_alpha(0.5).expect("valid alpha");

        let mut out = [0.0f32; 2];
        let mut env = [0.0f32; 2];
        detector
            .process(&[1.0, 1.0], &mut out, &mut env)
            .expect("first call");
        detector
            .process(&[1.0, 1.0], &mut out, &mut env)
            .expect("second call");

        // Envelope continued from 0.75, not from zero.
        assert_abs_diff_eq!(env[1], 0.9375, epsilon = 1e-6);

        let events = detector.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].offset, 0);

        let err = control.set_alpha(1.0).expect_err("alpha must be < 1");
        assert!(matches!(
            err,
            crate::kernel::ConfigError::InvalidArgument { arg: "alpha", .. }
        ));
    }
}
