use super::{Read1D, StreamError, Write1D};

use num_traits::Zero;

/// Progress reported by one `process_into` call.
///
/// Zero progress is the realignment protocol signal: the stage either just
/// applied a pending reconfiguration or needs a larger input window. Either
/// way the host must re-query [`StreamKernel::required_lookback`] and
/// [`StreamKernel::relative_rate`] before scheduling the next window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkProgress {
    /// Samples the host read pointer advances past.
    pub consumed: usize,
    /// Samples written to the output.
    pub produced: usize,
}

impl WorkProgress {
    /// Zero progress, requesting host realignment or more input.
    pub const NONE: WorkProgress = WorkProgress {
        consumed: 0,
        produced: 0,
    };

    /// Progress over `consumed` input and `produced` output samples.
    pub fn new(consumed: usize, produced: usize) -> Self {
        Self { consumed, produced }
    }

    /// True when the call made no forward progress.
    pub fn is_none(&self) -> bool {
        self.consumed == 0 && self.produced == 0
    }
}

/// Output-to-input sample rate contract of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeRate {
    /// Output samples per `denom` input samples.
    pub numer: usize,
    /// Input samples per `numer` output samples.
    pub denom: usize,
}

impl RelativeRate {
    /// Rate of a one-for-one stage.
    pub const ONE: RelativeRate = RelativeRate { numer: 1, denom: 1 };

    /// Rate of a stage producing one output per `decimation` inputs.
    pub fn decimating(decimation: usize) -> Self {
        Self {
            numer: 1,
            denom: decimation,
        }
    }

    /// Rate as a float for host buffer sizing heuristics.
    pub fn as_f64(&self) -> f64 {
        self.numer as f64 / self.denom as f64
    }
}

/// Scheduling capability shared by one-in one-out streaming stages.
///
/// Host contract: each input window begins with `required_lookback()`
/// retained samples followed by new samples; output capacity is sized from
/// `relative_rate()`; after a call the host advances its read pointer by
/// `consumed` (keeping the declared lookback available ahead of the next
/// window) and re-queries the contract after any zero-progress call.
pub trait StreamKernel<I, O = I> {
    /// Prior samples the host must retain at the head of each window.
    fn required_lookback(&self) -> usize;

    /// Output-to-input rate for host buffer sizing.
    fn relative_rate(&self) -> RelativeRate;

    /// Run over one aligned window, returning scheduling progress.
    fn process_into<Iw, Ow>(&mut self, input: &Iw, out: &mut Ow) -> Result<WorkProgress, StreamError>
    where
        Iw: Read1D<I> + ?Sized,
        Ow: Write1D<O> + ?Sized;

    /// Run over one aligned window into a freshly allocated output.
    fn process_alloc<Iw>(&mut self, input: &Iw) -> Result<(usize, Vec<O>), StreamError>
    where
        Iw: Read1D<I> + ?Sized,
        O: Zero + Clone,
    {
        let window = input.read_slice()?.len();
        let avail = window.saturating_sub(self.required_lookback());
        let rate = self.relative_rate();
        let capacity = (avail * rate.numer).div_ceil(rate.denom);
        let mut out = vec![O::zero(); capacity];
        let progress = self.process_into(input, &mut out)?;
        out.truncate(progress.produced);
        Ok((progress.consumed, out))
    }
}

/// Control edge carried between stages as tagged stream annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// Rising edge: downstream consumers open.
    Start,
    /// Falling edge: downstream consumers close.
    Stop,
}

/// A stream event bound to an absolute sample offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTag {
    /// Absolute offset of the sample the event applies to.
    pub offset: u64,
    /// The event kind.
    pub event: StreamEvent,
}
