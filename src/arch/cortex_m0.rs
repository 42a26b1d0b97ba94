//! # Cortex-M0 Port
//!
//! Alternate port for cores without SVC-assisted first-task launch and
//! without Thumb-2's `ldmia`/`stmdb` access to the high registers
//! (`r8`-`r11`). Context switching uses PendSV only: the very first
//! dispatch is just a PendSV taken with `CURRENT_TCB` still null, which
//! the handler recognizes and skips the save half for.
//!
//! Critical sections use PRIMASK (`cpsid i` / `cpsie i`) rather than
//! BASEPRI, which the M0 core does not implement.

#[cfg(target_arch = "arm")]
use core::arch::asm;
use core::mem::size_of;

use crate::task::Tcb;

const STACK_GUARD: u32 = 0xDEAD_BEEF;

/// Cortex-M0 exception frame. Layout is identical to M3's, but the
/// handler below must move `r8`-`r11` through a low register since
/// Thumb-1 `ldmia`/`stmdb` only address `r0`-`r7`.
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

static mut CURRENT_TCB: *mut Tcb = core::ptr::null_mut();
static mut NEXT_TCB: *mut Tcb = core::ptr::null_mut();

const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
const PENDSVSET: u32 = 1 << 28;
const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;

pub fn init_stack(stack: &mut [u8], start_fn: extern "C" fn(u32) -> !) -> *mut u32 {
    let base = stack.as_mut_ptr() as usize;
    let len = stack.len();

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

extern "C" fn on_task_exit() -> ! {
    halt()
}

pub fn halt() -> ! {
    loop {
        cortex_m::interrupt::disable();
        cortex_m::asm::wfi();
    }
}

/// Start the first task. Unlike the M3 port there is no SVC step: PendSV
/// is pended directly, and the handler's own null check on `CURRENT_TCB`
/// takes care of skipping the (nonexistent) outgoing context.
#[cfg(target_arch = "arm")]
pub fn start_first(tcb: *mut Tcb) -> ! {
    unsafe {
        CURRENT_TCB = core::ptr::null_mut();
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
        );
        core::ptr::write_volatile(ICSR, PENDSVSET);
        loop {
            cortex_m::asm::wfi();
        }
    }
}

/// Host stand-in so the crate type-checks off-target.
#[cfg(not(target_arch = "arm"))]
pub fn start_first(_tcb: *mut Tcb) -> ! {
    panic!("start_first requires target_arch = \"arm\"")
}

pub fn yield_to(next: *mut Tcb) {
    unsafe {
        NEXT_TCB = next;
        core::ptr::write_volatile(ICSR, PENDSVSET);
    }
    cortex_m::asm::dmb();
}

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

/// PendSV handler. `r8`-`r11` are shuttled through `r4`-`r7` since
/// Thumb-1 cannot address them directly in a multiple-register
/// load/store. A null `CURRENT_TCB` (the very first dispatch) skips the
/// save half entirely.
#[cfg(target_arch = "arm")]
#[no_mangle]
#[naked]
unsafe extern "C" fn PendSV() {
    asm!(
        "ldr r3, ={current}",
        "ldr r2, [r3]",
        "cmp r2, #0",
        "beq 1f",

        "mrs r0, psp",
        "subs r0, r0, #32",
        "stmia r0!, {{r4-r7}}",
        "mov r4, r8",
        "mov r5, r9",
        "mov r6, r10",
        "mov r7, r11",
        "stmia r0!, {{r4-r7}}",
        "subs r0, r0, #32",
        "str r0, [r2]",

        "1:",
        "push {{r3, lr}}",
        "bl {switch_context}",
        "pop {{r3, lr}}",

        "ldr r1, [r3]",
        "ldr r0, [r1]",
        "ldmia r0!, {{r4-r7}}",
        "mov r8, r4",
        "mov r9, r5",
        "mov r10, r6",
        "mov r11, r7",
        "ldmia r0!, {{r4-r7}}",
        "msr psp, r0",
        "movs r0, #0xd",
        "mov r1, lr",
        "orrs r0, r1",
        "mov lr, r0",
        "bx lr",
        current = sym CURRENT_TCB,
        switch_context = sym switch_context,
        options(noreturn)
    );
}
