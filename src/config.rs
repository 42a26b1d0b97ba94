//! # Kernel Configuration
//!
//! Compile-time constants governing task pool sizing, the adaptive
//! scheduler's regulator, and the preemption timer. Everything here is
//! fixed at build time — there is no runtime configuration surface.

/// Maximum number of user tasks the task pool can hold. Bounds the static
/// TCB array; the idle TCB lives outside this pool.
pub const MAX_TASKS: usize = 8;

/// Stack size, in bytes, reserved for the kernel-owned idle task.
pub const IDLE_TASK_STACK_SIZE: usize = 128;

/// Priority assigned to the idle task. Never compared against user
/// priorities — the idle task is only ever selected when no user task
/// is Ready.
pub const IDLE_TASK_PRIORITY: u8 = 0;

/// Number of hardware timers reserved for kernel use. The preemption
/// timer always claims timer 0; this bounds how many timer numbers
/// `timer::create` will accept.
pub const NUM_KERNEL_TIMERS: u32 = 4;

/// Processor clock frequency in Hz, used by the SysTick-backed preemption
/// timer to convert a microsecond timeout into a cycle count.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

// ---------------------------------------------------------------------------
// Adaptive scheduler (I+PI regulator) constants
// ---------------------------------------------------------------------------

/// Inner-loop proportional gain. Only used to derive [`AS_MULT_FACTOR`];
/// never read directly by the regulator.
pub const AS_K_PI: f32 = 0.5;

/// Outer-loop regulator proportional-integral coefficients. See
/// `scheduler::adaptive` for the update equation.
pub const AS_K_RR: f32 = 0.9;
pub const AS_Z_RR: f32 = 0.88;

/// Nominal per-task burst time, in microseconds, used to seed the inner
/// integrators and to compute the round-time setpoint.
pub const AS_BURST_NOMINAL_US: u32 = 4_000;

/// Lower clamp on a task's burst time, in microseconds. Prevents
/// thrashing the CPU with context switches that are cheaper than the
/// switch overhead itself.
pub const AS_BURST_MIN_US: u32 = 200;

/// Upper clamp on a task's burst time, in microseconds. Bounds worst-case
/// dispatch latency for any other Ready task.
pub const AS_BURST_MAX_US: u32 = 20_000;

/// Burst time, in microseconds, assigned to the idle task when it is
/// dispatched.
pub const AS_IDLE_THREAD_BURST_US: u32 = 10_000;

/// Scale factor applied to burst values carried in the inner integrator
/// (`tBurstOld`). Derived from `AS_K_PI`; never change this directly,
/// tune `AS_K_PI` instead.
pub const AS_MULT_FACTOR: f32 = 1.0 / AS_K_PI;
