use super::FrameError;

/// End-of-list marker in the link array.
const NIL: u32 = u32::MAX;

/// LIFO stack of free frame slots.
///
/// The link for each slot lives in a side array rather than in the free
/// frame itself, so a free frame's bytes are never reinterpreted. `links[i]`
/// is only meaningful while slot `i` is on the list. Push and pop are O(1).
///
/// Not synchronized on its own; `FrameAllocator` keeps it behind a lock.
pub struct FreeList {
    head: u32,
    links: &'static mut [u32],
    len: usize,
}

impl FreeList {
    /// Largest number of slots a list can index.
    pub const MAX_SLOTS: usize = NIL as usize;

    /// Empty list of `slots` slots, linked through the front of `links`.
    pub fn new(slots: usize, links: &'static mut [u32]) -> Result<Self, FrameError> {
        if slots > Self::MAX_SLOTS {
            return Err(FrameError::LayoutTooLarge);
        }
        if links.len() < slots {
            return Err(FrameError::MetadataTooSmall);
        }
        let (links, _) = links.split_at_mut(slots);
        links.fill(NIL);
        Ok(Self {
            head: NIL,
            links,
            len: 0,
        })
    }

    /// Push `slot` onto the list. The slot must not already be on it.
    pub fn push(&mut self, slot: usize) {
        debug_assert!(slot < self.links.len());
        self.links[slot] = self.head;
        // Bounded by MAX_SLOTS in new()
        self.head = slot as u32;
        self.len += 1;
    }

    /// Pop the most recently pushed slot.
    pub fn pop(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let slot = self.head as usize;
        self.head = self.links[slot];
        self.links[slot] = NIL;
        self.len -= 1;
        Some(slot)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head == NIL
    }
}
