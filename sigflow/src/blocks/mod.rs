//! Streaming processing stages.
//!
//! Every stage here implements [`StreamKernel`](crate::kernel::StreamKernel)
//! or exposes an inherent `process` with the same progress contract, so a
//! host scheduler can drive any of them with the lookback and realignment
//! rules described in [`crate::kernel`].

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks shared stage state, recovering the guard from a poisoned mutex.
///
/// Shared state is a validated configuration snapshot plus a dirty flag, so
/// a panic on another thread cannot leave it torn.
pub(crate) fn lock_shared<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

mod decim_fir;
mod detector;
mod downsample;
mod dual_decimate;
mod flex_fir;
mod gain;
mod gate;
mod iq;
mod moving_avg;

pub use decim_fir::*;
pub use detector::*;
pub use downsample::*;
pub use dual_decimate::*;
pub use flex_fir::*;
pub use gain::*;
pub use gate::*;
pub use iq::*;
pub use moving_avg::*;
