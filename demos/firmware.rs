//! # Example Firmware
//!
//! Four tasks of differing character, registered with the kernel and
//! dispatched under whichever scheduler the build selects:
//!
//! | Task | Priority | Behavior |
//! |------|----------|----------|
//! | `cpu_bound_task` | 1 | Busy-loops, never yields |
//! | `periodic_task` | 2 | ~5000-iteration burst, then yields |
//! | `yielding_task` | 0 | Minimal work, yields immediately |
//! | `sporadic_task` | 4 | Short burst, then yields |
//!
//! Under the adaptive scheduler, `sporadic_task`'s higher priority gives it
//! a larger share of every round's CPU time; under cooperative round-robin
//! every task gets an equal turn regardless of priority.

#![no_std]
#![no_main]

use cortex_m_rt::entry;

use regos::kernel;

extern "C" fn cpu_bound_task(_arg: u32) -> ! {
    let mut counter: u32 = 0;
    loop {
        counter = counter.wrapping_add(1);
        core::hint::black_box(&counter);
        // Never calls kernel::yield_task() — under the adaptive scheduler
        // this task is preempted when its burst timer expires; under
        // cooperative round-robin it would monopolize the CPU, which is
        // why cooperative builds shouldn't mix this task in.
    }
}

extern "C" fn periodic_task(_arg: u32) -> ! {
    loop {
        let mut work: u32 = 0;
        for _ in 0..5000 {
            work = work.wrapping_add(1);
        }
        core::hint::black_box(&work);
        kernel::yield_task();
    }
}

extern "C" fn yielding_task(_arg: u32) -> ! {
    loop {
        let mut work: u32 = 0;
        for _ in 0..100 {
            work = work.wrapping_add(1);
        }
        core::hint::black_box(&work);
        kernel::yield_task();
    }
}

extern "C" fn sporadic_task(_arg: u32) -> ! {
    loop {
        let mut work: u32 = 0;
        for _ in 0..2000 {
            work = work.wrapping_add(1);
        }
        core::hint::black_box(&work);
        kernel::yield_task();
    }
}

static mut CPU_BOUND_STACK: [u8; 512] = [0; 512];
static mut PERIODIC_STACK: [u8; 512] = [0; 512];
static mut YIELDING_STACK: [u8; 512] = [0; 512];
static mut SPORADIC_STACK: [u8; 512] = [0; 512];

/// Board-level setup the kernel runs once, after the scheduler is
/// initialized and before the first task starts. No task creation happens
/// here — every task is already registered by the time `kernel::start` is
/// called.
fn initialize_user_space() {
    regos::log::info!("user space initialized");
}

#[entry]
fn main() -> ! {
    unsafe {
        kernel::create_task(cpu_bound_task, 1, &mut *core::ptr::addr_of_mut!(CPU_BOUND_STACK))
            .expect("create cpu_bound_task");
        kernel::create_task(periodic_task, 2, &mut *core::ptr::addr_of_mut!(PERIODIC_STACK))
            .expect("create periodic_task");
        kernel::create_task(yielding_task, 0, &mut *core::ptr::addr_of_mut!(YIELDING_STACK))
            .expect("create yielding_task");
        kernel::create_task(sporadic_task, 4, &mut *core::ptr::addr_of_mut!(SPORADIC_STACK))
            .expect("create sporadic_task");
    }

    #[cfg(not(feature = "sched-non-preemptive"))]
    {
        let cp = cortex_m::Peripherals::take().unwrap();
        kernel::start(cp, initialize_user_space)
    }
    #[cfg(feature = "sched-non-preemptive")]
    {
        initialize_user_space();
        kernel::start()
    }
}
