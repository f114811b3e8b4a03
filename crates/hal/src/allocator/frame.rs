use core::fmt;

use crate::layout::{PAGE_SHIFT, PAGE_SIZE};
use pfa_utils::{align_down, align_up, is_aligned};

/// A physical address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(usize);

impl PhysAddr {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    pub const fn is_page_aligned(self) -> bool {
        is_aligned(self.0, PAGE_SIZE)
    }

    pub const fn page_round_up(self) -> Self {
        Self(align_up(self.0, PAGE_SIZE))
    }

    pub const fn page_round_down(self) -> Self {
        Self(align_down(self.0, PAGE_SIZE))
    }

    /// Global frame number: `address / PAGE_SIZE`.
    pub const fn frame_number(self) -> usize {
        self.0 >> PAGE_SHIFT
    }

    pub const fn from_frame_number(frame: usize) -> Self {
        Self(frame << PAGE_SHIFT)
    }

    /// The next frame, or None past the top of the address space.
    pub const fn next_frame(self) -> Option<Self> {
        match self.0.checked_add(PAGE_SIZE) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<usize> for PhysAddr {
    fn from(addr: usize) -> Self {
        Self(addr)
    }
}

impl From<PhysAddr> for usize {
    fn from(pa: PhysAddr) -> Self {
        pa.0
    }
}

/// Maps physical addresses to slots in the per-frame metadata arrays.
///
/// Slot `i` describes frame number `base_frame + i`. Addresses inside a
/// frame map to that frame's slot; anything below the base or at/after
/// `base_frame + frames` has no slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameIndexer {
    base_frame: usize,
    frames: usize,
}

impl FrameIndexer {
    /// Cover every whole frame in `[base, end)`. `base` is rounded down and
    /// `end` is truncated to a frame boundary.
    pub const fn new(base: PhysAddr, end: PhysAddr) -> Self {
        let base_frame = base.frame_number();
        let end_frame = end.frame_number();
        Self {
            base_frame,
            frames: end_frame.saturating_sub(base_frame),
        }
    }

    /// Number of slots.
    pub const fn len(&self) -> usize {
        self.frames
    }

    pub const fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Slot for `pa`, if the table covers it.
    #[inline]
    pub fn index(&self, pa: PhysAddr) -> Option<usize> {
        pa.frame_number()
            .checked_sub(self.base_frame)
            .filter(|&index| index < self.frames)
    }

    /// Frame address of slot `index`.
    #[inline]
    pub const fn address(&self, index: usize) -> PhysAddr {
        PhysAddr::from_frame_number(self.base_frame + index)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::format;

    #[test]
    fn test_phys_addr_rounding() {
        let pa = PhysAddr::new(0x8002_1234);
        assert!(!pa.is_page_aligned());
        assert_eq!(pa.page_round_up(), PhysAddr::new(0x8002_2000));
        assert_eq!(pa.page_round_down(), PhysAddr::new(0x8002_1000));
        assert!(pa.page_round_up().is_page_aligned());
        assert_eq!(pa.frame_number(), 0x80021);
        assert_eq!(PhysAddr::from_frame_number(0x80021), PhysAddr::new(0x8002_1000));
    }

    #[test]
    fn test_phys_addr_display_is_hex() {
        assert_eq!(format!("{}", PhysAddr::new(0x8000_0000)), "0x80000000");
    }

    #[test]
    fn test_next_frame_stops_at_top() {
        assert_eq!(
            PhysAddr::new(0x1000).next_frame(),
            Some(PhysAddr::new(0x2000))
        );
        assert_eq!(PhysAddr::new(usize::MAX & !0xfff).next_frame(), None);
    }

    /// Tests: [X1] index is address / PAGE_SIZE relative to the base frame
    #[test]
    fn test_indexer_maps_addresses() {
        let indexer = FrameIndexer::new(PhysAddr::new(0x8000_0000), PhysAddr::new(0x8001_0000));
        assert_eq!(indexer.len(), 16);
        assert_eq!(indexer.index(PhysAddr::new(0x8000_0000)), Some(0));
        assert_eq!(indexer.index(PhysAddr::new(0x8000_3000)), Some(3));
        // Interior addresses map to their frame
        assert_eq!(indexer.index(PhysAddr::new(0x8000_3fff)), Some(3));
        assert_eq!(indexer.address(3), PhysAddr::new(0x8000_3000));
    }

    /// Tests: [X2] addresses outside the covered frames have no slot
    #[test]
    fn test_indexer_bounds() {
        let indexer = FrameIndexer::new(PhysAddr::new(0x8000_0000), PhysAddr::new(0x8001_0000));
        assert_eq!(indexer.index(PhysAddr::new(0x7fff_f000)), None);
        assert_eq!(indexer.index(PhysAddr::new(0x8001_0000)), None);
        assert_eq!(indexer.index(PhysAddr::new(0)), None);
        assert_eq!(indexer.index(PhysAddr::new(usize::MAX)), None);
    }

    #[test]
    fn test_indexer_empty_when_end_below_base() {
        let indexer = FrameIndexer::new(PhysAddr::new(0x2000), PhysAddr::new(0x1000));
        assert!(indexer.is_empty());
        assert_eq!(indexer.index(PhysAddr::new(0x2000)), None);
    }
}
