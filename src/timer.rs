//! # Preemption Timer
//!
//! A one-shot, microsecond-resolution countdown used by the adaptive
//! scheduler (and available to any scheduler) to preempt the running task
//! at the end of its assigned burst. `create` reserves a hardware timer;
//! `start` arms it; `elapsed_us` is a cheap read used to measure how long
//! the outgoing task actually ran.
//!
//! The concrete implementation here rides the Cortex-M SysTick timer,
//! reprogrammed per call as a one-shot down-counter rather than the
//! periodic tick a traditional RTOS uses it for.

use crate::config::{NUM_KERNEL_TIMERS, SYSTEM_CLOCK_HZ};
use crate::error::KernelError;

/// Interrupt priority band for a preemption timer. Maps to NVIC priority
/// values on a 32-level (5-bit) priority scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvicPriority {
    /// Time-critical. Used by the kernel's own preemption timer.
    High,
    Normal,
    Low,
}

impl NvicPriority {
    pub const fn raw(self) -> u8 {
        match self {
            NvicPriority::High => 3,
            NvicPriority::Normal => 9,
            NvicPriority::Low => 15,
        }
    }
}

/// Opaque handle to a reserved hardware timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u32);

#[cfg(test)]
impl TimerHandle {
    /// A handle value for tests that exercise a `PreemptionTimer` fake
    /// without going through `create`.
    pub fn default_for_test() -> Self {
        Self(0)
    }
}

/// Callback invoked from ISR context on timer expiry. Must be short and
/// non-blocking; the expected body is a call to `kernel::yield_task()`.
pub type PreemptionCallback = fn();

/// One-shot microsecond timer, abstracted over the underlying hardware
/// timer peripheral.
pub trait PreemptionTimer {
    /// Reserve hardware timer `timer_no` at the given priority, registering
    /// `callback` to run on every expiry. Fails if the timer number is out
    /// of range, already reserved, or `callback` cannot be represented.
    fn create(
        &mut self,
        timer_no: u32,
        priority: NvicPriority,
        callback: PreemptionCallback,
    ) -> Result<TimerHandle, KernelError>;

    /// Arm the timer to fire once after `timeout_us` microseconds. Resets
    /// the counter and clears any in-flight pending interrupt first.
    fn start(&mut self, handle: TimerHandle, timeout_us: u32);

    /// Microseconds elapsed since the last `start` call.
    fn elapsed_us(&self, handle: TimerHandle) -> u32;
}

/// SysTick-backed one-shot timer. There is exactly one SysTick peripheral
/// per core, so this implementation only ever hands out `TimerHandle(0)`.
pub struct SysTickTimer {
    syst: cortex_m::peripheral::SYST,
    reserved: bool,
    callback: Option<PreemptionCallback>,
    armed_reload: u32,
}

/// Cycles of the processor clock per microsecond. `SYSTEM_CLOCK_HZ` is
/// assumed to divide evenly by 1_000_000 for any clock configuration this
/// kernel targets (at least 1 MHz).
const CYCLES_PER_US: u32 = SYSTEM_CLOCK_HZ / 1_000_000;

impl SysTickTimer {
    pub fn new(syst: cortex_m::peripheral::SYST) -> Self {
        Self {
            syst,
            reserved: false,
            callback: None,
            armed_reload: 0,
        }
    }

    /// Invoked from the `SysTick` exception handler. Not part of the
    /// public `PreemptionTimer` surface.
    pub(crate) fn fire(&mut self) {
        if let Some(cb) = self.callback {
            cb();
        }
    }
}

impl PreemptionTimer for SysTickTimer {
    fn create(
        &mut self,
        timer_no: u32,
        priority: NvicPriority,
        callback: PreemptionCallback,
    ) -> Result<TimerHandle, KernelError> {
        if timer_no >= NUM_KERNEL_TIMERS {
            return Err(KernelError::UnsupportedTimerNumber);
        }
        if self.reserved {
            return Err(KernelError::DuplicateTimerReservation);
        }

        self.reserved = true;
        self.callback = Some(callback);
        self.syst
            .set_clock_source(cortex_m::peripheral::syst::SystClkSource::Core);

        unsafe {
            let shpr3: *mut u32 = 0xE000_ED20 as *mut u32;
            let val = core::ptr::read_volatile(shpr3);
            let prio = (priority.raw() as u32) << 3;
            let val = (val & !(0xFF << 24)) | (prio << 24);
            core::ptr::write_volatile(shpr3, val);
        }

        Ok(TimerHandle(timer_no))
    }

    fn start(&mut self, _handle: TimerHandle, timeout_us: u32) {
        let reload = timeout_us.saturating_mul(CYCLES_PER_US).max(1) - 1;
        self.armed_reload = reload;
        self.syst.disable_counter();
        self.syst.clear_current();
        self.syst.set_reload(reload);
        self.syst.enable_interrupt();
        self.syst.enable_counter();
    }

    fn elapsed_us(&self, _handle: TimerHandle) -> u32 {
        let current = cortex_m::peripheral::SYST::get_current();
        self.armed_reload.saturating_sub(current) / CYCLES_PER_US.max(1)
    }
}
