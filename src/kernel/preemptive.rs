//! # Kernel Core (Preemptive)
//!
//! Owns the task pool, constructs TCBs from the static descriptor array,
//! constructs the idle TCB, wires the active scheduler's `on_switch`
//! callback to the CPU port, and starts the first task. `yield_task()` is
//! the only surface user code calls at steady state.
//!
//! ## Startup sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::create_task() ← register tasks (×N)
//!         └─► kernel::start()       ← launch scheduler (no return)
//!               ├─► build the idle TCB
//!               ├─► (adaptive only) reserve the preemption timer
//!               ├─► scheduler.init(pool, idle, on_switch)
//!               ├─► initialize_user_space()
//!               └─► arch::start_first(idle_tcb)
//! ```

use crate::arch;
use crate::config::{IDLE_TASK_PRIORITY, IDLE_TASK_STACK_SIZE, MAX_TASKS};
#[cfg(feature = "debug-assert")]
use crate::error::debug_assert_ok;
use crate::error::{KernelError, KernelResult};
use crate::scheduler::{ActiveScheduler, Scheduler};
use crate::sync;
use crate::task::{self, Tcb, TaskDescriptor, TaskEntry};
#[cfg(feature = "sched-adaptive")]
use crate::timer::{NvicPriority, PreemptionTimer, SysTickTimer};

static mut SCHEDULER: ActiveScheduler = ActiveScheduler::new();

static mut TASK_POOL: task::TaskPool = task::empty_pool();
static mut DESCRIPTORS: [Option<TaskDescriptor>; MAX_TASKS] = [const { None }; MAX_TASKS];
static mut TASK_COUNT: usize = 0;

static mut IDLE_STACK: [u8; IDLE_TASK_STACK_SIZE] = [0; IDLE_TASK_STACK_SIZE];
static mut IDLE_DESCRIPTOR: Option<TaskDescriptor> = None;
static mut IDLE_TCB: Tcb = Tcb::empty();

#[cfg(feature = "sched-adaptive")]
static mut TIMER: Option<SysTickTimer> = None;

/// Kernel-owned idle task: spins on a voluntary yield forever. Dispatched
/// only when no user task is Ready.
extern "C" fn idle_task(_arg: u32) -> ! {
    loop {
        yield_task();
    }
}

/// Bound to the active scheduler's `on_switch` at `start()` time. The
/// scheduler has already decided the next TCB by the time this runs; it
/// only hands the decision to the CPU port.
fn on_switch(next: *mut Tcb) {
    arch::yield_to(next);
}

/// Register a task. Builds the task's stack image immediately so that the
/// TCB is dispatch-ready the moment the scheduler is initialized; fails
/// once [`MAX_TASKS`] slots are taken.
pub fn create_task(
    start_fn: TaskEntry,
    priority: u8,
    stack: &'static mut [u8],
) -> KernelResult<()> {
    sync::critical_section(|_cs| unsafe {
        let count = TASK_COUNT;
        if count >= MAX_TASKS {
            let result = Err(KernelError::TaskPoolFull);
            #[cfg(feature = "debug-assert")]
            debug_assert_ok!(result, "create_task");
            return result;
        }

        let descriptor: &'static TaskDescriptor = {
            let slot = core::ptr::addr_of_mut!(DESCRIPTORS[count]);
            *slot = Some(TaskDescriptor::new(start_fn, priority, stack));
            (*slot).as_ref().unwrap()
        };

        let sp = arch::init_stack(descriptor.stack(), start_fn);

        let pool = &mut *core::ptr::addr_of_mut!(TASK_POOL);
        pool[count].bind(descriptor as *const _);
        pool[count].top_of_stack = sp;

        TASK_COUNT = count + 1;
        Ok(())
    })
}

/// Start the kernel. Builds the idle TCB, reserves the preemption timer
/// (adaptive scheduler only), initializes the scheduler over the
/// registered tasks, calls the application's `initialize_user_space` hook
/// exactly once, then hands off to the CPU port. Never returns.
///
/// `initialize_user_space` mirrors spec's application-provided startup
/// hook; it is taken as a plain function pointer here rather than an
/// `extern "Rust"` foreign symbol, since the kernel is a library crate
/// with no link-time visibility into the final firmware image.
pub fn start(core_peripherals: cortex_m::Peripherals, initialize_user_space: fn()) -> ! {
    unsafe {
        let count = TASK_COUNT;

        let idle_descriptor: &'static TaskDescriptor = {
            let stack = &mut *core::ptr::addr_of_mut!(IDLE_STACK);
            let slot = core::ptr::addr_of_mut!(IDLE_DESCRIPTOR);
            *slot = Some(TaskDescriptor::new(idle_task, IDLE_TASK_PRIORITY, stack));
            (*slot).as_ref().unwrap()
        };

        let idle_sp = arch::init_stack(idle_descriptor.stack(), idle_task);
        let idle_tcb = &mut *core::ptr::addr_of_mut!(IDLE_TCB);
        idle_tcb.bind(idle_descriptor as *const _);
        idle_tcb.top_of_stack = idle_sp;
        let idle_ptr: *mut Tcb = idle_tcb;

        let pool = &mut *core::ptr::addr_of_mut!(TASK_POOL);
        let pool_slice: &'static mut [Tcb] = &mut pool[..count];

        let scheduler = &mut *core::ptr::addr_of_mut!(SCHEDULER);

        #[cfg(feature = "sched-adaptive")]
        {
            let slot = core::ptr::addr_of_mut!(TIMER);
            *slot = Some(SysTickTimer::new(core_peripherals.SYST));
            let timer_ref: &'static mut SysTickTimer = (*slot).as_mut().unwrap();
            let handle = timer_ref
                .create(0, NvicPriority::High, preemption_isr)
                .expect("preemption timer reservation failed");
            scheduler.set_timer(timer_ref, handle);
        }
        #[cfg(not(feature = "sched-adaptive"))]
        let _ = core_peripherals;

        scheduler.init(pool_slice, idle_tcb, on_switch);

        initialize_user_space();

        arch::start_first(idle_ptr)
    }
}

/// Voluntary yield. The scheduler decides the next task and invokes
/// `on_switch`, which pends PendSV; the actual stack swap happens
/// asynchronously once this critical section exits.
pub fn yield_task() {
    sync::critical_section(|_cs| unsafe {
        let scheduler = &mut *core::ptr::addr_of_mut!(SCHEDULER);
        scheduler.yield_task();
    });
}

/// Preemption-timer expiry callback (adaptive scheduler only). Runs in ISR
/// context, where NVIC priority already serializes access to `SCHEDULER`
/// against task-level code, so no additional critical section is taken.
#[cfg(feature = "sched-adaptive")]
fn preemption_isr() {
    unsafe {
        let scheduler = &mut *core::ptr::addr_of_mut!(SCHEDULER);
        scheduler.yield_task();
    }
}

/// SysTick exception handler, reprogrammed by [`SysTickTimer`] as a
/// one-shot preemption countdown rather than a periodic OS tick.
#[cfg(feature = "sched-adaptive")]
#[no_mangle]
pub extern "C" fn SysTick() {
    unsafe {
        let slot = core::ptr::addr_of_mut!(TIMER);
        if let Some(timer) = (*slot).as_mut() {
            timer.fire();
        }
    }
}
