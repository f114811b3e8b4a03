//! Interfaces the frame allocator offers to the rest of the kernel.

/// Physical page allocation as seen by the VM layer (page tables,
/// copy-on-write mappings, pipe buffers, kernel stacks).
///
/// Addresses are raw physical addresses of 4KB frames.
pub trait PageAllocator: Send + Sync {
    /// Allocate a 4KB physical page with one owner. None when out of memory.
    fn alloc_page(&self) -> Option<usize>;
    /// Drop one owner of a page; the page is reclaimed when none remain.
    fn free_page(&self, pa: usize);
    /// Record `delta` more (or fewer) owners of a page.
    fn add_page_ref(&self, pa: usize, delta: i32);
    /// Current number of owners of a page.
    fn page_ref_count(&self, pa: usize) -> u32;
}
