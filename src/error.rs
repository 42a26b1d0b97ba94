//! # Kernel Errors
//!
//! Configuration errors detectable at init time. Per the design philosophy
//! of this kernel — fail fast at init, halt on catastrophic runtime
//! violation — these never propagate to a running task; there is no
//! error return on `yield()`.

/// Configuration error surfaced by init-time kernel or driver calls.
///
/// In debug builds (`debug-assert` feature) these are reported loudly via
/// [`crate::log::error!`] before the caller decides what to do; in release
/// builds without that feature, callers that can tolerate the condition
/// are free to ignore the `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// A `create_task` call was made after the task pool reached
    /// [`crate::config::MAX_TASKS`].
    TaskPoolFull,
    /// A preemption-timer callback argument was null.
    NullCallback,
    /// `timer::create` was called twice for the same hardware timer
    /// number without an intervening release.
    DuplicateTimerReservation,
    /// A priority band outside {High, Normal, Low} was requested.
    InvalidPriorityBand,
    /// A timer number outside `0..NUM_KERNEL_TIMERS` was requested.
    UnsupportedTimerNumber,
}

/// Result alias used throughout the init path.
pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(feature = "debug-assert")]
macro_rules! debug_assert_ok {
    ($result:expr, $msg:expr) => {
        if $result.is_err() {
            crate::log::error!("{}: {:?}", $msg, $result);
        }
    };
}

#[cfg(feature = "debug-assert")]
pub(crate) use debug_assert_ok;
