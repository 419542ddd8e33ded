//! Streaming DSP stages for a sample-flow host scheduler.
//!
//! The centerpiece is a reconfigurable FIR engine: windowed-sinc tap design
//! ([`firdes`], [`windows`]), a shared direct-form convolution core
//! ([`fir`]), and streaming stages ([`blocks`]) that can be re-tuned at
//! runtime without pausing the data path. Stages speak the scheduling
//! contract defined in [`kernel`]: a host presents aligned input windows,
//! reads back per-call progress, and realigns whenever a stage reports zero
//! progress after a reconfiguration.
//!
//! Construction is validation-first: every stage is built through
//! [`kernel::KernelLifecycle::try_new`] and rejects invalid parameters
//! before any state exists. Runtime control surfaces are cloneable handles
//! that validate against the full candidate configuration, so concurrent
//! tuning can never corrupt a running stage.

#![warn(missing_docs)]

pub mod blocks;
pub mod fir;
pub mod firdes;
pub mod kernel;
pub mod special;
pub mod windows;
