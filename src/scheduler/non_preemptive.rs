//! # Non-Preemptive Round-Robin Scheduler
//!
//! The most primitive policy: a super loop that visits every slot in task
//! index order and runs whichever ones are `Ready`. A task only gives up
//! the processor by returning from its entry function (at which point it
//! is moved to `Waiting`, not `Terminated` — it can be made `Ready` again
//! by `set_state`).
//!
//! Deliberately separate from the `Scheduler` trait used by the
//! cooperative and adaptive policies: there is no stack, no context
//! switch, and no CPU port involvement here. A task runs to completion on
//! the kernel's own stack, called directly as a function.

use crate::task::{NonPreemptiveTaskEntry, TaskDescriptor, TaskState};

/// Handle returned by `add_task`. Indexes directly into the scheduler's
/// internal task pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(usize);

struct Slot {
    descriptor: Option<&'static TaskDescriptor<NonPreemptiveTaskEntry>>,
    state: TaskState,
}

impl Slot {
    const fn empty() -> Self {
        Self {
            descriptor: None,
            state: TaskState::New,
        }
    }
}

/// Super-loop scheduler. `N` is the pool capacity, fixed at construction.
pub struct NonPreemptiveScheduler<const N: usize> {
    pool: [Slot; N],
}

impl<const N: usize> NonPreemptiveScheduler<N> {
    pub const fn new() -> Self {
        Self {
            pool: [const { Slot::empty() }; N],
        }
    }

    /// Register a task. Returns `None` if the pool is full.
    pub fn add_task(
        &mut self,
        descriptor: &'static TaskDescriptor<NonPreemptiveTaskEntry>,
    ) -> Option<TaskHandle> {
        for (i, slot) in self.pool.iter_mut().enumerate() {
            if slot.descriptor.is_none() {
                slot.descriptor = Some(descriptor);
                slot.state = TaskState::New;
                return Some(TaskHandle(i));
            }
        }
        None
    }

    /// Terminate a task. Its slot becomes free for a future `add_task`.
    pub fn remove_task(&mut self, handle: TaskHandle) {
        self.pool[handle.0].state = TaskState::Terminated;
        self.pool[handle.0].descriptor = None;
    }

    /// Move a task into a new state, e.g. back to `Ready` after an event
    /// it was `Waiting` on has occurred.
    pub fn set_state(&mut self, handle: TaskHandle, state: TaskState) {
        self.pool[handle.0].state = state;
    }

    /// Current state of a registered task.
    pub fn state(&self, handle: TaskHandle) -> TaskState {
        self.pool[handle.0].state
    }

    /// Visit every slot once, in order. Each `Ready` task is run to
    /// completion — called directly, on the caller's own stack — and then
    /// moved to `Waiting`. `run` is just this in a loop; split out so the
    /// run-to-completion/`Waiting` transition is directly testable without
    /// looping forever.
    pub fn sweep(&mut self) {
        for slot in self.pool.iter_mut() {
            if slot.state != TaskState::Ready {
                continue;
            }
            let Some(descriptor) = slot.descriptor else {
                continue;
            };
            slot.state = TaskState::Running;
            (descriptor.start_fn)(0);
            slot.state = TaskState::Waiting;
        }
    }

    /// Run forever. Never returns.
    pub fn run(&mut self) -> ! {
        loop {
            self.sweep();
        }
    }
}
