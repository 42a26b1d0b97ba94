//! # Kernel Core (Non-Preemptive)
//!
//! Thin wrapper over [`scheduler::non_preemptive::NonPreemptiveScheduler`].
//! There is no CPU-port involvement here: tasks run to completion on the
//! kernel's own stack, called directly as functions, so `create_task`
//! never builds a stack image. Shipped as a separate build configuration
//! from the preemptive kernel core (`sched-cooperative` / `sched-adaptive`)
//! — the two are never compiled into the same binary.

use crate::config::MAX_TASKS;
use crate::scheduler::non_preemptive::{NonPreemptiveScheduler, TaskHandle};
use crate::sync;
use crate::task::{NonPreemptiveTaskEntry, TaskDescriptor, TaskState};

/// Handle to a registered task, re-exported under a name that doesn't leak
/// the scheduler module's internal path.
pub type Handle = TaskHandle;

static mut SCHEDULER: NonPreemptiveScheduler<MAX_TASKS> = NonPreemptiveScheduler::new();
static mut DESCRIPTORS: [Option<TaskDescriptor<NonPreemptiveTaskEntry>>; MAX_TASKS] =
    [const { None }; MAX_TASKS];
static mut DESCRIPTOR_COUNT: usize = 0;

/// Register a task and mark it immediately Ready. The `stack` parameter is
/// accepted for API symmetry with the preemptive kernel core's
/// `create_task`, but is otherwise unused — this scheduler never switches
/// stacks, so nothing ever reads it back.
pub fn create_task(
    start_fn: NonPreemptiveTaskEntry,
    priority: u8,
    stack: &'static mut [u8],
) -> Option<Handle> {
    sync::critical_section(|_cs| unsafe {
        let count = DESCRIPTOR_COUNT;
        if count >= MAX_TASKS {
            return None;
        }

        let descriptor: &'static TaskDescriptor = {
            let slot = core::ptr::addr_of_mut!(DESCRIPTORS[count]);
            *slot = Some(TaskDescriptor::new(start_fn, priority, stack));
            (*slot).as_ref().unwrap()
        };
        DESCRIPTOR_COUNT = count + 1;

        let scheduler = &mut *core::ptr::addr_of_mut!(SCHEDULER);
        let handle = scheduler.add_task(descriptor)?;
        scheduler.set_state(handle, TaskState::Ready);
        Some(handle)
    })
}

/// Enter the super loop. Never returns.
pub fn start() -> ! {
    unsafe { (&mut *core::ptr::addr_of_mut!(SCHEDULER)).run() }
}
