// Process-wide frame allocator.
//
// Boot calls init() once with the layout it discovered and the metadata
// storage it set aside; every other subsystem reaches the same allocator
// through frame_allocator().

use crate::allocator::{FrameAllocator, FrameError, FrameMetadata, PhysAddr};
use crate::layout::MemoryLayout;
use crate::traits::PageAllocator;
use pfa_error::fatal;
use pfa_utils::Once;

impl PageAllocator for FrameAllocator {
    fn alloc_page(&self) -> Option<usize> {
        self.alloc().map(usize::from)
    }

    fn free_page(&self, pa: usize) {
        self.free(pa.into());
    }

    fn add_page_ref(&self, pa: usize, delta: i32) {
        self.adjust_ref_count(pa.into(), delta);
    }

    fn page_ref_count(&self, pa: usize) -> u32 {
        self.ref_count(PhysAddr::from(pa))
    }
}

/// Global frame allocator instance
pub static FRAME_ALLOCATOR: Once<FrameAllocator> = Once::new();

/// Initialize physical memory management.
///
/// Fatal if called more than once.
///
/// # Safety
/// Same contract as [`FrameAllocator::new`]: the layout's memory belongs to
/// the allocator from now on, and no other hart may touch the allocator
/// before this returns.
pub unsafe fn init(layout: MemoryLayout, metadata: FrameMetadata) {
    let mut initialized_here = false;
    FRAME_ALLOCATOR.call_once(|| {
        initialized_here = true;
        // SAFETY: forwarded from the caller
        unsafe { FrameAllocator::new(layout, metadata) }
    });
    if !initialized_here {
        fatal(FrameError::AlreadyInitialized);
    }
}

/// The global frame allocator. Fatal before [`init`].
pub fn frame_allocator() -> &'static FrameAllocator {
    FRAME_ALLOCATOR
        .get()
        .unwrap_or_else(|| fatal(FrameError::NotInitialized))
}
