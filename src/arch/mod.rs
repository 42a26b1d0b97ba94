//! # CPU-Core Port
//!
//! Stack bring-up, first-task launch, and context switching for one
//! Cortex-M class core. Exactly one port is compiled in, selected by a
//! cargo feature (`cortex-m3` / `cortex-m0`); both expose the same
//! `init_stack` / `start_first` / `yield_to` / `halt` surface, so the
//! kernel core never branches on which core it's targeting.

#[cfg(feature = "cortex-m3")]
mod cortex_m3;
#[cfg(feature = "cortex-m0")]
mod cortex_m0;

#[cfg(feature = "cortex-m3")]
pub use cortex_m3::{halt, init_stack, start_first, yield_to};
#[cfg(feature = "cortex-m0")]
pub use cortex_m0::{halt, init_stack, start_first, yield_to};
