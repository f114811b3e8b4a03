#![cfg_attr(not(feature = "std"), no_std)]

// Physical memory HAL: interrupt-safe locking, the boot memory layout and
// the reference-counted frame allocator that sits on top of them.

#[cfg(all(test, not(feature = "std")))]
extern crate std;

pub mod allocator;
pub mod interrupts;
pub mod layout;
pub mod memory;
pub mod traits;

pub use allocator::{FrameAllocator, FrameError, FrameMetadata, PhysAddr};
pub use layout::{MemoryLayout, PAGE_SIZE};
pub use memory::{FRAME_ALLOCATOR, frame_allocator};
pub use traits::PageAllocator;

use core::mem::ManuallyDrop;
use pfa_utils::{Mutex, MutexGuard};

/// IRQ-safe lock that disables interrupts while held.
///
/// An interrupt handler that allocates or frees a frame on the same hart
/// would otherwise spin forever on a lock its own hart holds.
/// Behaviors: [L1]-[L5] interrupt-safe locking
pub struct IrqSafeLock<T> {
    inner: Mutex<T>,
}

impl<T> IrqSafeLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            inner: Mutex::new(data),
        }
    }

    /// [L1] Disables interrupts before acquiring, [L4] data accessible through guard
    pub fn lock(&self) -> IrqSafeLockGuard<'_, T> {
        let state = interrupts::disable(); // [L1] disable before acquire
        let guard = self.inner.lock();
        IrqSafeLockGuard {
            guard: ManuallyDrop::new(guard), // [L4] data access
            state,
        }
    }

    /// Try to acquire the lock without spinning.
    /// Returns None (with interrupts restored) if the lock is already held.
    pub fn try_lock(&self) -> Option<IrqSafeLockGuard<'_, T>> {
        let state = interrupts::disable();
        if let Some(guard) = self.inner.try_lock() {
            Some(IrqSafeLockGuard {
                guard: ManuallyDrop::new(guard),
                state,
            })
        } else {
            interrupts::restore(state);
            None
        }
    }

    /// [L5] Lock-free access through exclusive ownership.
    ///
    /// Only reachable while the lock is not yet shared, e.g. during
    /// single-threaded initialization.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

pub struct IrqSafeLockGuard<'a, T> {
    guard: ManuallyDrop<MutexGuard<'a, T>>,
    state: u64,
}

impl<T> core::ops::Deref for IrqSafeLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> core::ops::DerefMut for IrqSafeLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for IrqSafeLockGuard<'_, T> {
    /// [L2] Restores interrupts after releasing
    fn drop(&mut self) {
        // SAFETY: guard is only dropped once, here in Drop, before restoring interrupts
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        interrupts::restore(self.state); // [L2] restore on drop
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
