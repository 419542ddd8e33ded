//! Shared trait-first stage substrate.
//!
//! This module defines the constructor validation lifecycle, the 1D
//! buffer adapters, the sample element traits, and the host scheduling
//! contract implemented by every streaming stage in the crate.

mod errors;
mod io;
mod lifecycle;
mod sample;
mod stream;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
pub use sample::*;
pub use stream::*;
