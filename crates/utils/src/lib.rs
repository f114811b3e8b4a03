#![cfg_attr(not(feature = "std"), no_std)]

// Re-export spin crate types as our lock API.
// spin::Mutex busy-waits, which is what every caller below the scheduler needs.
pub use spin::{Mutex, MutexGuard, Once};

/// Round `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. Saturates to the largest aligned value
/// instead of wrapping when `value` is within `align` of `usize::MAX`.
#[inline]
#[must_use]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    match value.checked_add(align - 1) {
        Some(v) => v & !(align - 1),
        None => usize::MAX & !(align - 1),
    }
}

/// Round `value` down to a multiple of `align` (a power of two).
#[inline]
#[must_use]
pub const fn align_down(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    value & !(align - 1)
}

#[inline]
#[must_use]
pub const fn is_aligned(value: usize, align: usize) -> bool {
    debug_assert!(align.is_power_of_two());
    value & (align - 1) == 0
}

// ============================================================================
// Unit Tests
// ============================================================================
