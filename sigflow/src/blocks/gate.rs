use std::sync::{Arc, Mutex};

use itertools::Itertools;

use super::lock_shared;
use crate::kernel::{
    ConfigError, EventTag, KernelLifecycle, Read1D, RelativeRate, StreamError, StreamEvent,
    StreamKernel, WorkProgress, Write1D,
};

/// Configuration of the event-controlled gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Whether the gate starts in the passing state.
    pub initially_open: bool,
}

impl GateConfig {
    /// Config with the given initial state.
    pub fn new(initially_open: bool) -> Self {
        Self { initially_open }
    }
}

#[derive(Debug)]
struct GateShared {
    open: bool,
}

/// Pass/zero gate switched by Start/Stop events.
///
/// When open, samples pass unchanged; when closed, zeros are emitted in
/// their place, so the output stays sample-aligned with the input. Event
/// tags carried inside a window switch the state exactly at their offsets;
/// direct control (`set_open`, `apply_event`) switches it between windows.
/// The state left by the last tag persists into following calls.
#[derive(Debug)]
pub struct Gate {
    shared: Arc<Mutex<GateShared>>,
    position: u64,
}

/// Cloneable control surface of a [`Gate`].
#[derive(Debug, Clone)]
pub struct GateControl {
    shared: Arc<Mutex<GateShared>>,
}

impl GateControl {
    /// Force the gate state directly.
    pub fn set_open(&self, open: bool) {
        lock_shared(&self.shared).open = open;
    }

    /// Apply a control event: Start opens the gate, Stop closes it.
    pub fn apply_event(&self, event: StreamEvent) {
        let open = matches!(event, StreamEvent::Start);
        lock_shared(&self.shared).open = open;
    }

    /// Current gate state.
    pub fn is_open(&self) -> bool {
        lock_shared(&self.shared).open
    }
}

impl Gate {
    /// Control handle shared with configuration threads.
    pub fn control(&self) -> GateControl {
        GateControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Absolute offset of the next sample this gate will see.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Process one window, switching state at each tag offset.
    ///
    /// Tag offsets are absolute sample indices; tags at or before the start
    /// of the window flip the state without emitting, tags beyond its end
    /// are ignored until their window arrives. Tags may be given in any
    /// order.
    pub fn process_tagged(
        &mut self,
        input: &[f32],
        tags: &[EventTag],
        out: &mut [f32],
    ) -> Result<WorkProgress, StreamError> {
        let mut open = lock_shared(&self.shared).open;
        let base = self.position;
        let n = input.len().min(out.len());

        let apply_run = |out: &mut [f32], begin: usize, end: usize, open: bool| {
            if open {
                out[begin..end].copy_from_slice(&input[begin..end]);
            } else {
                out[begin..end].fill(0.0);
            }
        };

        let mut cursor = 0usize;
        for tag in tags.iter().sorted_by_key(|tag| tag.offset) {
            let rel = tag.offset.saturating_sub(base) as usize;
            if rel <= cursor {
                open = matches!(tag.event, StreamEvent::Start);
                continue;
            }
            if rel >= n {
                break;
            }
            apply_run(out, cursor, rel, open);
            cursor = rel;
            open = matches!(tag.event, StreamEvent::Start);
        }
        apply_run(out, cursor, n, open);

        lock_shared(&self.shared).open = open;
        self.position += n as u64;
        Ok(WorkProgress::new(n, n))
    }
}

impl KernelLifecycle for Gate {
    type Config = GateConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            shared: Arc::new(Mutex::new(GateShared {
                open: config.initially_open,
            })),
            position: 0,
        })
    }
}

impl StreamKernel<f32> for Gate {
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
        self.process_tagged(input, &[], out)
    }
}
