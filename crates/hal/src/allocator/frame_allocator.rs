use core::ops::Range;

use super::{FrameError, FrameIndexer, FreeList, PhysAddr, RefCountTable};
use crate::IrqSafeLock;
use crate::layout::{MemoryLayout, PAGE_SIZE};
use pfa_error::fatal;

/// Fill byte for freshly allocated frames, to catch reads of memory the
/// caller never initialized.
pub const ALLOC_JUNK: u8 = 0x05;
/// Fill byte for freed frames, to catch dangling references.
pub const FREE_JUNK: u8 = 0x01;

/// Storage for the per-frame metadata: one reference count and one
/// free-list link per frame.
///
/// Lives outside the managed range (a `static` array or memory the boot code
/// set aside), so every frame of the layout can be handed out. Size both
/// slices with [`MemoryLayout::frame_count`]; longer slices are fine.
pub struct FrameMetadata {
    counts: &'static mut [u32],
    links: &'static mut [u32],
}

impl FrameMetadata {
    pub fn new(counts: &'static mut [u32], links: &'static mut [u32]) -> Self {
        Self { counts, links }
    }
}

/// Reference-counted physical frame allocator.
///
/// Built once at boot from the [`MemoryLayout`] and its [`FrameMetadata`],
/// then shared by reference with everything that needs frames (see
/// `memory::FRAME_ALLOCATOR`). The managed range is every whole frame from
/// the rounded-up layout start to the layout end.
///
/// Locking: the free list and the reference counts each have their own
/// [`IrqSafeLock`]. No method holds both at once, and frame contents are
/// filled with no lock held.
pub struct FrameAllocator {
    indexer: FrameIndexer,
    managed: Range<PhysAddr>,
    total_frames: usize,
    direct_map_offset: usize,
    free_list: IrqSafeLock<FreeList>,
    ref_counts: IrqSafeLock<RefCountTable>,
}

impl FrameAllocator {
    /// Take ownership of the layout's memory and put every whole frame in
    /// it on the free list.
    ///
    /// Fatal if `metadata` has fewer slots than the layout has frames.
    ///
    /// # Safety
    /// - `[layout.start, layout.end)` must be RAM that nothing else uses for
    ///   the lifetime of the kernel, writable at `pa + direct_map_offset`.
    /// - Seeding writes reference counts without taking the lock. No other
    ///   hart may run allocator code until this returns, which `&mut`-only
    ///   access to the value under construction guarantees for this object.
    pub unsafe fn new(layout: MemoryLayout, metadata: FrameMetadata) -> Self {
        unsafe { Self::try_new(layout, metadata) }.unwrap_or_else(|err| fatal(err))
    }

    unsafe fn try_new(layout: MemoryLayout, metadata: FrameMetadata) -> Result<Self, FrameError> {
        let slots = layout.frame_count();
        let base = layout.start.page_round_up();
        let indexer = FrameIndexer::new(base, layout.end.page_round_down());
        debug_assert_eq!(indexer.len(), slots);
        let end = indexer.address(slots);

        let mut allocator = Self {
            indexer,
            managed: base..end,
            total_frames: 0,
            direct_map_offset: layout.direct_map_offset,
            free_list: IrqSafeLock::new(FreeList::new(slots, metadata.links)?),
            ref_counts: IrqSafeLock::new(RefCountTable::new(indexer, metadata.counts)?),
        };
        allocator.range_init(base, end)?;

        if indexer.is_empty() {
            log::warn!("[MEM] Frame allocator: no whole frame in [{}, {})", layout.start, layout.end);
        } else {
            log::info!(
                "[MEM] Frame allocator: {} frames in [{}, {})",
                allocator.total_frames,
                base,
                end
            );
        }
        Ok(allocator)
    }

    /// Seed every whole frame in `[start, end)` onto the free list.
    ///
    /// Each frame's count is forced to 1 and then released through the
    /// normal free path, which validates it, drives the count to 0 and
    /// pushes it.
    fn range_init(&mut self, start: PhysAddr, end: PhysAddr) -> Result<(), FrameError> {
        let mut pa = start.page_round_up();
        while let Some(next) = pa.next_frame().filter(|&next| next <= end) {
            self.ref_counts.get_mut().force(pa, 1)?;
            self.try_free(pa)?;
            self.total_frames += 1;
            pa = next;
        }
        Ok(())
    }

    /// Allocate one frame.
    ///
    /// The frame comes back filled with [`ALLOC_JUNK`] and with a reference
    /// count of 1. Returns None when no frame is free; that is not an error
    /// and nothing is reclaimed on the caller's behalf.
    pub fn alloc(&self) -> Option<PhysAddr> {
        let slot = self.free_list.lock().pop();
        let Some(slot) = slot else {
            log::debug!("[MEM] Frame allocator exhausted");
            return None;
        };
        let pa = self.indexer.address(slot);

        // SAFETY: pa just left the free list, so nobody else can reach it
        unsafe { self.fill(pa, ALLOC_JUNK) };

        let claimed = self.ref_counts.lock().claim(pa);
        claimed.unwrap_or_else(|err| fatal(err));
        Some(pa)
    }

    /// Drop one owner of the frame at `pa`.
    ///
    /// While other owners remain the frame stays where it is. When the last
    /// owner goes, the frame is filled with [`FREE_JUNK`] and returned to
    /// the free list.
    ///
    /// Fatal if `pa` is misaligned or outside the managed range, or if the
    /// frame has no owners.
    pub fn free(&self, pa: PhysAddr) {
        self.try_free(pa).unwrap_or_else(|err| fatal(err));
    }

    fn try_free(&self, pa: PhysAddr) -> Result<(), FrameError> {
        if !pa.is_page_aligned() || !self.managed.contains(&pa) {
            return Err(FrameError::InvalidAddress(pa));
        }
        let slot = self.indexer.index(pa).ok_or(FrameError::InvalidAddress(pa))?;

        let remaining = self.ref_counts.lock().release(pa)?;
        if remaining > 0 {
            return Ok(());
        }

        // SAFETY: the last owner is gone and the frame is not on the list yet
        unsafe { self.fill(pa, FREE_JUNK) };

        self.free_list.lock().push(slot);
        Ok(())
    }

    /// Add `delta` to the reference count of the frame containing `pa`.
    ///
    /// This is how a second owner is recorded, e.g. when the VM layer maps
    /// a frame copy-on-write into another address space. The caller must
    /// already own the frame: raising the count of a frame on the free list
    /// desynchronizes it (caught by a debug assertion, and by `alloc` later).
    /// Fatal if `pa` has no slot in the reference-count table or the count
    /// would go negative.
    pub fn adjust_ref_count(&self, pa: PhysAddr, delta: i32) {
        let adjusted = self.ref_counts.lock().adjust(pa, delta);
        if let Err(err) = adjusted {
            fatal(err);
        }
    }

    /// Current reference count of the frame containing `pa`.
    pub fn ref_count(&self, pa: PhysAddr) -> u32 {
        let count = self.ref_counts.lock().get(pa);
        count.unwrap_or_else(|err| fatal(err))
    }

    /// Number of frames on the free list right now.
    pub fn free_frames(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Number of frames brought under management at init.
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// `[first_usable_address, physical_memory_top)`.
    pub fn managed_range(&self) -> Range<PhysAddr> {
        self.managed.clone()
    }

    /// Overwrite a whole frame with `byte`.
    ///
    /// # Safety
    /// The caller must be the only one able to reach the frame.
    unsafe fn fill(&self, pa: PhysAddr, byte: u8) {
        let va = pa.as_usize().wrapping_add(self.direct_map_offset) as *mut u8;
        unsafe { core::ptr::write_bytes(va, byte, PAGE_SIZE) };
    }
}
