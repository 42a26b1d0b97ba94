//! # Scheduler Policies
//!
//! Three interchangeable scheduler policies share one interface:
//! `init(pool, idle, on_switch)`, `yield_task()`, `get_next()`. Exactly
//! one is compiled in, selected by a cargo feature
//! (`sched-cooperative` / `sched-non-preemptive` / `sched-adaptive`).

use crate::task::Tcb;

#[cfg(feature = "sched-cooperative")]
pub mod cooperative;
#[cfg(feature = "sched-non-preemptive")]
pub mod non_preemptive;
#[cfg(feature = "sched-adaptive")]
pub mod adaptive;

/// Context-switch callback a scheduler invokes once it has decided the
/// next task to run. Bound by the kernel to the CPU port's `yield_to`.
pub type OnSwitch = fn(*mut Tcb);

/// Common scheduler interface. `pool` and `idle` outlive the scheduler
/// (they are owned by the kernel for the life of the system), so this
/// trait borrows them for `'static`.
pub trait Scheduler {
    /// One-time initialization: bind the task pool, the idle TCB, and the
    /// context-switch callback.
    fn init(&mut self, pool: &'static mut [Tcb], idle: &'static mut Tcb, on_switch: OnSwitch);

    /// Voluntary or preemption-timer-triggered yield: pick the next task
    /// and invoke the context-switch callback with it.
    fn yield_task(&mut self);

    /// Pick the next task without invoking the callback. Used by the
    /// non-preemptive super-loop and by tests that want to observe the
    /// scheduling decision directly.
    fn get_next(&mut self) -> *mut Tcb;
}

#[cfg(feature = "sched-cooperative")]
pub use cooperative::CooperativeScheduler as ActiveScheduler;
#[cfg(feature = "sched-adaptive")]
pub use adaptive::AdaptiveScheduler as ActiveScheduler;
