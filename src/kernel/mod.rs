//! # Kernel Core
//!
//! Owns the task pool, constructs TCBs from the static descriptor array,
//! constructs the idle TCB, wires the scheduler's `on_switch` callback to
//! the CPU port, and starts the first task. Exactly one of the two variants
//! below is compiled in, matched to the scheduler selected by cargo
//! feature: the non-preemptive scheduler has no stack-switching story and
//! is never paired with the CPU port's context switcher (see
//! `scheduler::non_preemptive`'s doc comment).

#[cfg(any(feature = "sched-cooperative", feature = "sched-adaptive"))]
mod preemptive;
#[cfg(feature = "sched-non-preemptive")]
mod non_preemptive;

#[cfg(any(feature = "sched-cooperative", feature = "sched-adaptive"))]
pub use preemptive::{create_task, start, yield_task};
#[cfg(feature = "sched-non-preemptive")]
pub use non_preemptive::{create_task, start, Handle};
