//! # Task Model
//!
//! A task descriptor is the static, application-provided description of a
//! task (start function, priority, stack buffer). A task control block
//! (TCB) is the kernel's per-task bookkeeping record, constructed once at
//! init from a descriptor and never destroyed.

use crate::config::MAX_TASKS;

// ---------------------------------------------------------------------------
// Task descriptor
// ---------------------------------------------------------------------------

/// Entry point signature for a task run under the stack-switching kernel
/// core (cooperative or adaptive scheduler). A task receives one
/// register-sized argument and must never return; returning is treated as
/// a fatal fault (see `arch::on_task_exit`).
pub type TaskEntry = extern "C" fn(u32) -> !;

/// Entry point signature for a task run under the non-preemptive
/// super-loop scheduler. Unlike `TaskEntry`, this one genuinely returns:
/// the scheduler calls it directly (no stack switch) and moves the task
/// to `Waiting` once it comes back, per
/// `scheduler::non_preemptive`'s run-to-completion contract.
pub type NonPreemptiveTaskEntry = extern "C" fn(u32);

/// Static, immutable-after-construction description of one task.
///
/// The stack buffer is owned exclusively by the task for the lifetime of
/// the system; the kernel only ever touches it through the TCB's
/// `top_of_stack` during context save/restore. Generic over the entry
/// function type so the same descriptor shape serves both `TaskEntry`
/// (stack-switching kernel core) and `NonPreemptiveTaskEntry` (super-loop
/// kernel core); `Tcb` only ever points at the former.
pub struct TaskDescriptor<F = TaskEntry> {
    /// Task entry point.
    pub start_fn: F,
    /// Static priority. Higher values get a larger CPU-time share under
    /// the adaptive policy; ignored by the cooperative and non-preemptive
    /// policies.
    pub priority: u8,
    stack_ptr: *mut u8,
    stack_len: usize,
}

impl<F: Copy> TaskDescriptor<F> {
    /// Build a descriptor from a `'static` stack buffer. The buffer must
    /// not be reused by any other descriptor.
    pub fn new(start_fn: F, priority: u8, stack: &'static mut [u8]) -> Self {
        Self {
            start_fn,
            priority,
            stack_ptr: stack.as_mut_ptr(),
            stack_len: stack.len(),
        }
    }

    /// Reconstruct the `'static` stack slice. Safe because each
    /// descriptor's buffer is never aliased: the kernel calls this
    /// exactly once, at `init_stack` time.
    pub fn stack(&self) -> &'static mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.stack_ptr, self.stack_len) }
    }

    /// Byte length of the stack buffer.
    pub fn stack_len(&self) -> usize {
        self.stack_len
    }

    /// Lowest address of the stack buffer.
    pub fn stack_base(&self) -> usize {
        self.stack_ptr as usize
    }
}

// A TaskDescriptor's raw pointer only ever addresses that task's own
// stack, and is read (not mutated) after construction. Tasks are static
// for the life of the system, so sharing the descriptor across the task
// and ISR context is sound.
unsafe impl<F> Sync for TaskDescriptor<F> {}
unsafe impl<F> Send for TaskDescriptor<F> {}

// ---------------------------------------------------------------------------
// Task state
// ---------------------------------------------------------------------------

/// Execution state of a task. Only `Ready` and `Running` are meaningfully
/// exercised by the schedulers shipped here; `New`, `Waiting` and
/// `Terminated` are reserved for a future dynamic task-state lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Task slot has been allocated but has not yet run.
    New,
    /// Task is eligible for dispatch.
    Ready,
    /// Task is the current task.
    Running,
    /// Task is waiting for an event. Reserved — no scheduler here
    /// transitions a task into this state.
    Waiting,
    /// Task has exited. Reserved.
    Terminated,
}

// ---------------------------------------------------------------------------
// Adaptive-scheduler-private per-task state
// ---------------------------------------------------------------------------

/// Per-task state used only by the I+PI adaptive scheduler. Present on
/// every TCB regardless of which scheduler is compiled in, since it costs
/// sixteen bytes and keeps the TCB shape uniform; other schedulers never
/// read or write it.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveTaskState {
    /// Measured burst (processing time) of the most recently completed
    /// dispatch, in microseconds.
    pub t_process: u32,
    /// Target burst for the next round, in microseconds.
    pub t_process_set_point: u32,
    /// Previous-round burst command, scaled by `AS_MULT_FACTOR`.
    pub t_burst_old: i32,
    /// Share coefficient; this task's fraction of round time. Σα over all
    /// tasks in the pool equals 1.
    pub alpha: f32,
}

impl AdaptiveTaskState {
    pub const fn new() -> Self {
        Self {
            t_process: 0,
            t_process_set_point: 0,
            t_burst_old: 0,
            alpha: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Task Control Block
// ---------------------------------------------------------------------------

/// Task Control Block.
///
/// `top_of_stack` MUST remain the first field: the context-switch assembly
/// reads the first machine word of a `*const Tcb` to obtain the saved
/// stack pointer, and relies on this layout rather than a named field
/// access.
#[repr(C)]
pub struct Tcb {
    /// Saved stack pointer. Valid whenever this TCB is not the running
    /// task; undefined (owned by the CPU registers) while Running.
    pub top_of_stack: *mut u32,
    /// Back-reference to this task's static descriptor. Null for unused
    /// pool slots and for a default-constructed idle TCB before
    /// `kernel::init` binds it.
    pub descriptor: *const TaskDescriptor,
    /// Current execution state.
    pub state: TaskState,
    /// Adaptive-scheduler bookkeeping. Ignored outside that scheduler.
    pub adaptive: AdaptiveTaskState,
}

// Tcb carries raw pointers that always address either this task's own
// descriptor/stack or are null. Access is serialized by the kernel's
// critical sections and by the architecture's exception model (see
// `sync` and `arch`).
unsafe impl Send for Tcb {}
unsafe impl Sync for Tcb {}

impl Tcb {
    /// An unallocated pool slot.
    pub const fn empty() -> Self {
        Self {
            top_of_stack: core::ptr::null_mut(),
            descriptor: core::ptr::null(),
            state: TaskState::New,
            adaptive: AdaptiveTaskState::new(),
        }
    }

    /// Bind this slot to a descriptor and mark it Ready. The caller is
    /// responsible for calling `arch::init_stack` and storing the result
    /// into `top_of_stack` before the task is ever dispatched.
    pub fn bind(&mut self, descriptor: *const TaskDescriptor) {
        self.descriptor = descriptor;
        self.state = TaskState::Ready;
        self.adaptive = AdaptiveTaskState::new();
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.descriptor.is_null()
    }

    fn descriptor(&self) -> &TaskDescriptor {
        // Safety: non-null only after `bind`, which is only ever called
        // with a descriptor the kernel owns for the life of the system.
        unsafe { &*self.descriptor }
    }

    /// Static priority of the bound descriptor.
    #[inline]
    pub fn priority(&self) -> u8 {
        self.descriptor().priority
    }

    /// Lowest and highest legal addresses for this task's stack buffer,
    /// used by invariant checks and tests.
    pub fn stack_bounds(&self) -> (usize, usize) {
        let d = self.descriptor();
        let base = d.stack_base();
        (base, base + d.stack_len())
    }
}

/// Fixed-size task pool. The idle TCB is never part of this pool.
pub type TaskPool = [Tcb; MAX_TASKS];

/// A pool with every slot unallocated.
pub const fn empty_pool() -> TaskPool {
    [const { Tcb::empty() }; MAX_TASKS]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> &'static mut [u8] {
        static mut STACK: [u8; 64] = [0; 64];
        unsafe { &mut *core::ptr::addr_of_mut!(STACK) }
    }

    extern "C" fn dummy_entry(_arg: u32) -> ! {
        loop {}
    }

    #[test]
    fn empty_tcb_is_unallocated() {
        let tcb = Tcb::empty();
        assert!(!tcb.is_allocated());
        assert_eq!(tcb.state, TaskState::New);
    }

    #[test]
    fn bind_marks_ready() {
        let descriptor = TaskDescriptor::new(dummy_entry, 3, stack());
        let mut tcb = Tcb::empty();
        tcb.bind(&descriptor as *const _);
        assert!(tcb.is_allocated());
        assert!(tcb.is_ready());
    }

    #[test]
    fn stack_bounds_match_descriptor() {
        let descriptor = TaskDescriptor::new(dummy_entry, 1, stack());
        let mut tcb = Tcb::empty();
        tcb.bind(&descriptor as *const _);
        let (base, top) = tcb.stack_bounds();
        assert_eq!(top - base, 64);
    }

    #[test]
    fn top_of_stack_is_first_field() {
        let tcb = Tcb::empty();
        let tcb_addr = &tcb as *const Tcb as usize;
        let field_addr = &tcb.top_of_stack as *const _ as usize;
        assert_eq!(tcb_addr, field_addr);
    }
}
