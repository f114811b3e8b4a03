// Generic interrupt control wrapper.
// Delegates to the architecture when running on bare metal; host builds
// (tests, `std` feature) get a per-thread mock so spinlock users can run
// under the standard test harness.

#[cfg(all(not(any(test, feature = "std")), target_arch = "riscv64"))]
mod arch {
    use core::arch::asm;

    /// Supervisor interrupt enable bit in `sstatus`.
    const SSTATUS_SIE: u64 = 1 << 1;

    #[inline(always)]
    pub fn disable() -> u64 {
        let prev: u64;
        // SAFETY: clearing SIE only masks interrupts on this hart
        unsafe { asm!("csrrci {}, sstatus, 2", out(reg) prev, options(nostack)) };
        prev & SSTATUS_SIE
    }

    #[inline(always)]
    pub unsafe fn enable() {
        unsafe { asm!("csrsi sstatus, 2", options(nostack)) };
    }

    #[inline(always)]
    pub fn restore(state: u64) {
        if state & SSTATUS_SIE != 0 {
            // SAFETY: SIE was set when the matching disable() ran
            unsafe { enable() };
        }
    }

    #[inline(always)]
    pub fn is_enabled() -> bool {
        let sstatus: u64;
        // SAFETY: reading sstatus has no side effects
        unsafe { asm!("csrr {}, sstatus", out(reg) sstatus, options(nomem, nostack)) };
        sstatus & SSTATUS_SIE != 0
    }
}

#[cfg(all(not(any(test, feature = "std")), target_arch = "aarch64"))]
mod arch {
    use aarch64_cpu::registers::{DAIF, Readable, Writeable};

    #[inline(always)]
    pub fn disable() -> u64 {
        let state = DAIF.get();
        // SAFETY: daifset is a special immediate-only instruction not provided by aarch64-cpu
        unsafe { core::arch::asm!("msr daifset, #2") };
        state
    }

    #[inline(always)]
    pub unsafe fn enable() {
        // SAFETY: daifclr is a special immediate-only instruction not provided by aarch64-cpu
        unsafe { core::arch::asm!("msr daifclr, #2") };
    }

    #[inline(always)]
    pub fn restore(state: u64) {
        DAIF.set(state);
    }

    #[inline(always)]
    pub fn is_enabled() -> bool {
        // IRQ mask is bit 7
        (DAIF.get() & (1 << 7)) == 0
    }
}

#[cfg(all(not(any(test, feature = "std")), target_arch = "x86_64"))]
mod arch {
    use x86_64::instructions::interrupts;

    #[inline(always)]
    pub fn disable() -> u64 {
        let was_enabled = interrupts::are_enabled();
        interrupts::disable();
        u64::from(was_enabled)
    }

    #[inline(always)]
    pub unsafe fn enable() {
        interrupts::enable();
    }

    #[inline(always)]
    pub fn restore(state: u64) {
        if state != 0 {
            interrupts::enable();
        }
    }

    #[inline(always)]
    pub fn is_enabled() -> bool {
        interrupts::are_enabled()
    }
}

#[cfg(any(test, feature = "std"))]
mod arch {
    use core::cell::Cell;

    std::thread_local! {
        static ENABLED: Cell<bool> = const { Cell::new(true) };
    }

    pub fn disable() -> u64 {
        u64::from(ENABLED.with(|e| e.replace(false)))
    }

    pub unsafe fn enable() {
        ENABLED.with(|e| e.set(true));
    }

    pub fn restore(state: u64) {
        ENABLED.with(|e| e.set(state != 0));
    }

    pub fn is_enabled() -> bool {
        ENABLED.with(Cell::get)
    }
}

#[cfg(all(
    not(any(test, feature = "std")),
    not(any(target_arch = "riscv64", target_arch = "aarch64", target_arch = "x86_64"))
))]
mod arch {
    pub fn disable() -> u64 {
        0
    }

    pub unsafe fn enable() {}

    pub fn restore(state: u64) {
        let _ = state;
    }

    pub fn is_enabled() -> bool {
        true
    }
}

/// [I1] Disables interrupts, [I2] returns previous state
#[inline(always)]
pub fn disable() -> u64 {
    arch::disable()
}

/// [I7] Unconditionally enables interrupts
///
/// # Safety
/// Any lock taken with interrupts masked must already be released.
#[inline(always)]
pub unsafe fn enable() {
    unsafe { arch::enable() }
}

/// [I3] Restores previous interrupt state
#[inline(always)]
pub fn restore(state: u64) {
    arch::restore(state);
}

/// [I4] Returns true when enabled, [I5] returns false when disabled
#[inline(always)]
pub fn is_enabled() -> bool {
    arch::is_enabled()
}
