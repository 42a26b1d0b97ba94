//! # Cortex-M3 Port
//!
//! Context switching via SVC (start the first task) and PendSV (switch
//! between subsequent tasks), following the standard Cortex-M3
//! save/restore sequence — `r4`-`r11` are pushed/popped by hand, the
//! rest of the exception frame is handled by hardware on exception
//! entry/exit.
//!
//! `CURRENT_TCB` / `NEXT_TCB` are owned here, not by the scheduler: by
//! the time `yield_to` sets `NEXT_TCB` and pends PendSV, the scheduler
//! has already decided who runs next, so PendSV itself never calls back
//! into scheduling logic — it only moves a pointer and swaps stacks.

#[cfg(target_arch = "arm")]
use core::arch::asm;
use core::mem::size_of;

use crate::task::Tcb;

/// Word stamped at the lowest address of every task's stack at
/// `init_stack` time and checked on every switch away from that task.
/// A task whose stack has grown into this word has overflowed.
const STACK_GUARD: u32 = 0xDEAD_BEEF;

/// Exception stack frame for a suspended task, Cortex-M3 layout:
/// callee-saved `r4`-`r11` (software-pushed by PendSV), followed by the
/// hardware-stacked `r0`-`r3`, `r12`, `lr`, `pc`, `psr`. `repr(C)` with
/// all-`u32` fields rather than `repr(packed)` — every field is already
/// 4-byte aligned so packing buys nothing and would only risk
/// misaligned-access faults if a field were ever widened.
#[repr(C)]
struct ExceptionFrame {
    r4: u32,
    r5: u32,
    r6: u32,
    r7: u32,
    r8: u32,
    r9: u32,
    r10: u32,
    r11: u32,
    r0: u32,
    r1: u32,
    r2: u32,
    r3: u32,
    r12: u32,
    lr: u32,
    pc: u32,
    psr: u32,
}

const _: () = assert!(size_of::<ExceptionFrame>() == 16 * 4);

/// Currently-running task. Null until `start_first` is called.
static mut CURRENT_TCB: *mut Tcb = core::ptr::null_mut();
/// Task `yield_to` has requested; PendSV copies this into `CURRENT_TCB`.
static mut NEXT_TCB: *mut Tcb = core::ptr::null_mut();

const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
const PENDSVSET: u32 = 1 << 28;
const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;

/// Build the initial stack image for a task so that the first context
/// restore jumps to `start_fn` with interrupts enabled and Thumb mode
/// set. Returns the value to store in the TCB's `top_of_stack`.
pub fn init_stack(stack: &mut [u8], start_fn: extern "C" fn(u32) -> !) -> *mut u32 {
    let base = stack.as_mut_ptr() as usize;
    let len = stack.len();

    // Highest 8-byte aligned address within the buffer.
    let top = (base + len) & !0x7;
    let frame_addr = (top - size_of::<ExceptionFrame>()) & !0x3;
    let frame = frame_addr as *mut ExceptionFrame;

    unsafe {
        frame.write(ExceptionFrame {
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            r0: 0,
            r1: 0,
            r2: 0,
            r3: 0,
            r12: 0,
            lr: on_task_exit as usize as u32,
            pc: (start_fn as usize as u32) & !1,
            psr: 0x0100_0000,
        });

        core::ptr::write_volatile(base as *mut u32, STACK_GUARD);
    }

    frame_addr as *mut u32
}

/// A task function returned. Fatal by design.
extern "C" fn on_task_exit() -> ! {
    halt()
}

/// Disable interrupts and spin forever.
pub fn halt() -> ! {
    loop {
        cortex_m::interrupt::disable();
        cortex_m::asm::wfi();
    }
}

/// Start the very first task. Configures PendSV at the lowest NVIC
/// priority, resets MSP from the vector table, enables interrupts, and
/// issues `SVC 0`. Never returns.
#[cfg(target_arch = "arm")]
pub fn start_first(tcb: *mut Tcb) -> ! {
    unsafe {
        CURRENT_TCB = tcb;
        NEXT_TCB = tcb;

        let val = core::ptr::read_volatile(SHPR3);
        core::ptr::write_volatile(SHPR3, val | (0xFF << 16));

        asm!(
            "ldr r0, =0xE000ED08",
            "ldr r0, [r0]",
            "ldr r0, [r0]",
            "msr msp, r0",
            "cpsie i",
            "dsb",
            "isb",
            "svc 0",
            options(noreturn)
        );
    }
}

/// Host stand-in so the crate type-checks off-target. `SVC`/`PendSV`
/// never exist on this build, so there is nothing a call here could do.
#[cfg(not(target_arch = "arm"))]
pub fn start_first(_tcb: *mut Tcb) -> ! {
    panic!("start_first requires target_arch = \"arm\"")
}

/// Request a switch to `next`. The switch itself happens asynchronously
/// in the PendSV handler, at the next point execution is interruptible.
pub fn yield_to(next: *mut Tcb) {
    unsafe {
        NEXT_TCB = next;
        core::ptr::write_volatile(ICSR, PENDSVSET);
    }
    cortex_m::asm::dmb();
}

/// Copy `NEXT_TCB` into `CURRENT_TCB`, after checking the outgoing
/// task's stack guard word. Called from `PendSV` with interrupts
/// effectively masked (we are already inside the exception).
#[no_mangle]
unsafe extern "C" fn switch_context() {
    if !CURRENT_TCB.is_null() {
        let (base, _top) = (*CURRENT_TCB).stack_bounds();
        if core::ptr::read_volatile(base as *const u32) != STACK_GUARD {
            halt();
        }
    }
    CURRENT_TCB = NEXT_TCB;
}

/// SVC exception handler. Loads the first task's saved context from
/// `CURRENT_TCB` and returns from exception using PSP.
#[cfg(target_arch = "arm")]
#[no_mangle]
#[naked]
unsafe extern "C" fn SVCall() {
    asm!(
        "ldr r3, ={current}",
        "ldr r1, [r3]",
        "ldr r0, [r1]",
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "isb",
        "orr lr, lr, #0xd",
        "bx lr",
        current = sym CURRENT_TCB,
        options(noreturn)
    );
}

/// PendSV exception handler. Saves the outgoing task's callee-saved
/// registers onto its own stack, hands off to `switch_context`, then
/// restores the incoming task's registers and returns from exception.
#[cfg(target_arch = "arm")]
#[no_mangle]
#[naked]
unsafe extern "C" fn PendSV() {
    asm!(
        "mrs r0, psp",
        "ldr r3, ={current}",
        "ldr r2, [r3]",
        "stmdb r0!, {{r4-r11}}",
        "str r0, [r2]",
        "stmdb sp!, {{r3, lr}}",
        "bl {switch_context}",
        "ldmia sp!, {{r3, lr}}",
        "ldr r1, [r3]",
        "ldr r0, [r1]",
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "isb",
        "bx lr",
        current = sym CURRENT_TCB,
        switch_context = sym switch_context,
        options(noreturn)
    );
}
