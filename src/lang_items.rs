//! Language items and default exception handlers.
//!
//! Everything here only makes sense on a real Cortex-M target: a panic
//! handler and the `HardFault` vector both assume there is no host `std`
//! runtime underneath to supply its own. Gated on `target_arch` rather
//! than on `test` so that host unit/integration test builds, which link
//! against `std`'s own panic runtime, never see a conflicting
//! `#[panic_handler]`.

#[cfg(all(feature = "defmt", target_arch = "arm"))]
use defmt_rtt as _;
#[cfg(all(feature = "defmt", target_arch = "arm"))]
use panic_probe as _;

#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[defmt::panic_handler]
fn defmt_panic() -> ! {
    cortex_m::asm::udf()
}

#[cfg(all(not(feature = "defmt"), target_arch = "arm"))]
use panic_halt as _;

/// Default `HardFault` handler. A hard fault on this kernel is always a
/// programming error (stack overflow past the guard word, a faulted
/// exception return) rather than a recoverable condition.
#[cfg(target_arch = "arm")]
#[cortex_m_rt::exception]
unsafe fn HardFault(_ef: &cortex_m_rt::ExceptionFrame) -> ! {
    loop {
        cortex_m::asm::udf();
    }
}
