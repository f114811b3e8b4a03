use super::{FrameError, FrameIndexer, PhysAddr};

/// Per-frame owner counts.
///
/// A count of 0 means the frame is free (or not managed yet), 1 means a
/// single owner, more than 1 means the frame is shared. Counts are unsigned:
/// an adjustment that would take one below zero is rejected with
/// [`FrameError::NegativeRefCount`] and leaves the table untouched.
///
/// Not synchronized on its own; `FrameAllocator` keeps it behind a lock.
pub struct RefCountTable {
    indexer: FrameIndexer,
    counts: &'static mut [u32],
}

impl RefCountTable {
    /// Build a table over the front of `counts`, one slot per frame the
    /// indexer covers. All counts start at 0.
    pub fn new(indexer: FrameIndexer, counts: &'static mut [u32]) -> Result<Self, FrameError> {
        if counts.len() < indexer.len() {
            return Err(FrameError::MetadataTooSmall);
        }
        let (counts, _) = counts.split_at_mut(indexer.len());
        counts.fill(0);
        Ok(Self { indexer, counts })
    }

    fn slot(&mut self, pa: PhysAddr) -> Result<&mut u32, FrameError> {
        let index = self.indexer.index(pa).ok_or(FrameError::InvalidAddress(pa))?;
        Ok(&mut self.counts[index])
    }

    /// Current count of the frame containing `pa`.
    pub fn get(&self, pa: PhysAddr) -> Result<u32, FrameError> {
        let index = self.indexer.index(pa).ok_or(FrameError::InvalidAddress(pa))?;
        Ok(self.counts[index])
    }

    /// Add `delta` to the frame's count and return the new count.
    ///
    /// The caller must own the frame: a count of 0 means the frame sits on
    /// the free list, and giving it owners there desynchronizes the two.
    pub fn adjust(&mut self, pa: PhysAddr, delta: i32) -> Result<u32, FrameError> {
        let count = self.slot(pa)?;
        debug_assert!(
            delta <= 0 || *count != 0,
            "adjusting the reference count of a free frame {pa}"
        );
        let updated = match count.checked_add_signed(delta) {
            Some(updated) => updated,
            None if delta < 0 => return Err(FrameError::NegativeRefCount(pa)),
            None => return Err(FrameError::RefCountOverflow(pa)),
        };
        *count = updated;
        Ok(updated)
    }

    /// Drop one owner of the frame and return how many remain.
    ///
    /// Releasing a frame nobody owns is a double free.
    pub fn release(&mut self, pa: PhysAddr) -> Result<u32, FrameError> {
        let count = self.slot(pa)?;
        if *count == 0 {
            return Err(FrameError::DoubleFree(pa));
        }
        *count -= 1;
        Ok(*count)
    }

    /// Give a frame fresh off the free list its first owner.
    pub fn claim(&mut self, pa: PhysAddr) -> Result<(), FrameError> {
        let count = self.slot(pa)?;
        if *count != 0 {
            return Err(FrameError::RefCountDesync(pa));
        }
        *count = 1;
        Ok(())
    }

    /// Overwrite the count without any checks on the old value.
    ///
    /// Only for seeding frames that are not under management yet.
    pub(crate) fn force(&mut self, pa: PhysAddr, count: u32) -> Result<(), FrameError> {
        *self.slot(pa)? = count;
        Ok(())
    }
}
