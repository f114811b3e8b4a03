// Physical frame allocator.
//
// Fixed-size frames handed out from a LIFO free list, with a per-frame
// reference count so a frame can be shared (copy-on-write, shared mappings)
// and is only reclaimed when its last owner lets go.
//
// Two locks, never nested: one for the free list, one for the reference
// counts. Any invariant violation goes through pfa_error::fatal.

mod frame;
mod frame_allocator;
mod freelist;
mod refcount;

pub use frame::{FrameIndexer, PhysAddr};
pub use frame_allocator::{ALLOC_JUNK, FREE_JUNK, FrameAllocator, FrameMetadata};
pub use freelist::FreeList;
pub use refcount::RefCountTable;

use pfa_error::define_kernel_error;

define_kernel_error! {
    /// Frame allocator invariant violations. Every one of these is fatal.
    pub enum FrameError(0x02) {
        /// Misaligned, outside the managed range, or outside the table
        InvalidAddress(PhysAddr) = 0x01 => "invalid address",
        /// A reference count adjustment would go below zero
        NegativeRefCount(PhysAddr) = 0x02 => "invariant violated: reference count went negative",
        /// Freeing a frame that has no owners left
        DoubleFree(PhysAddr) = 0x03 => "double free",
        /// A frame popped off the free list still had owners
        RefCountDesync(PhysAddr) = 0x04 => "free frame has nonzero reference count",
        /// A reference count adjustment would exceed u32::MAX
        RefCountOverflow(PhysAddr) = 0x05 => "reference count overflow",
        /// Metadata storage has fewer slots than the layout has frames
        MetadataTooSmall = 0x06 => "frame metadata storage too small for layout",
        /// More frames than the free-list links can index
        LayoutTooLarge = 0x07 => "memory layout has too many frames",
        NotInitialized = 0x08 => "frame allocator not initialized",
        AlreadyInitialized = 0x09 => "frame allocator already initialized",
    }
}
