//! Boot-time physical memory layout.
//!
//! The boot code describes which physical range the frame allocator may
//! manage and how the kernel reaches physical memory (identity mapping or a
//! higher-half direct map). Nothing here touches memory.

use crate::allocator::PhysAddr;

/// Page shift (4KB pages)
pub const PAGE_SHIFT: usize = 12;
/// Size of one physical frame
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Start of RAM on the QEMU `virt` machine
pub const KERNBASE: usize = 0x8000_0000;
/// Top of RAM the kernel uses on the QEMU `virt` machine (128MB)
pub const PHYSTOP: usize = KERNBASE + 128 * 1024 * 1024;

/// Physical range handed to the frame allocator at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    /// First address after the kernel image (the linker's `end` symbol).
    pub start: PhysAddr,
    /// Top of physical memory, exclusive.
    pub end: PhysAddr,
    /// Added to a physical address to get the kernel virtual address that
    /// maps it. Zero for an identity-mapped kernel.
    pub direct_map_offset: usize,
}

impl MemoryLayout {
    /// Identity-mapped layout over `[start, end)`.
    pub const fn new(start: PhysAddr, end: PhysAddr) -> Self {
        Self {
            start,
            end,
            direct_map_offset: 0,
        }
    }

    /// Default QEMU `virt` layout: everything from the kernel end up to `PHYSTOP`.
    pub const fn qemu_virt(kernel_end: PhysAddr) -> Self {
        Self::new(kernel_end, PhysAddr::new(PHYSTOP))
    }

    /// Same range, reached through a direct map at `offset`
    /// (e.g. `KERNEL_VIRT_START` for a higher-half kernel).
    pub const fn with_direct_map(self, offset: usize) -> Self {
        Self {
            direct_map_offset: offset,
            ..self
        }
    }

    /// Kernel virtual address of `pa`.
    #[inline]
    pub const fn phys_to_virt(&self, pa: PhysAddr) -> usize {
        pa.as_usize().wrapping_add(self.direct_map_offset)
    }

    /// Number of whole frames between the rounded-up start and the end.
    pub const fn frame_count(&self) -> usize {
        let first = self.start.page_round_up().as_usize();
        let last = self.end.page_round_down().as_usize();
        if first >= last {
            0
        } else {
            (last - first) / PAGE_SIZE
        }
    }
}
