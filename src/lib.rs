//! # A small preemptive RTOS kernel for Cortex-M
//!
//! Task control blocks, Cortex-M stack bring-up and context switching
//! (SVC + PendSV on Cortex-M3, PendSV-only on Cortex-M0), a one-shot
//! microsecond preemption timer, and three interchangeable schedulers:
//! cooperative round-robin, non-preemptive round-robin, and a
//! control-theoretic I+PI adaptive scheduler that tunes each task's CPU-time
//! burst to its priority share.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Tasks                    │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel Core (kernel/)                   │
//! │        create_task() · start() · yield_task()           │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │   Preemption Timer │  Sync Primitives  │
//! │  scheduler/  │   timer.rs         │  sync.rs          │
//! │  ─ init()    │   ─ create()       │  ─ critical_section│
//! │  ─ yield_task│   ─ start()        │                   │
//! │  ─ get_next()│   ─ elapsed_us()   │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │              Task Model (task.rs)                       │
//! │    TCB · TaskDescriptor · TaskState · AdaptiveTaskState │
//! ├────────────────────────────────────────────────────────┤
//! │              CPU-Core Port (arch/)                      │
//! │    PendSV · SVC · Context Switch · Stack Init           │
//! ├────────────────────────────────────────────────────────┤
//! │      ARM Cortex-M3 / Cortex-M0 Hardware (Thumb)          │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling model
//!
//! Exactly one scheduler and one CPU port are compiled into a given build,
//! chosen by cargo feature (`sched-cooperative` / `sched-non-preemptive` /
//! `sched-adaptive`, `cortex-m3` / `cortex-m0`). The adaptive scheduler runs
//! two nested control loops — an inner per-task integrator and an outer
//! proportional-integral loop on total round time — to keep each task's
//! share of the CPU proportional to `priority + 1` despite ISR jitter and
//! variable voluntary yields.
//!
//! ## Memory model
//!
//! - **No heap**: all state is statically allocated
//! - **No `alloc`**: pure `core`, `no_std`
//! - **Fixed-size task pool**: `[Tcb; MAX_TASKS]`, idle TCB kept separate
//! - **Critical sections**: `cortex_m::interrupt::free()` for shared state

#![no_std]

pub mod arch;
pub mod config;
pub mod error;
pub mod lang_items;
pub mod log;
pub mod kernel;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod timer;
