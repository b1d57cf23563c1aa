use serde::Serialize;

use super::{
    Address, ByteHeap, NULL,
    block::{BLOCK_OVERHEAD, GUARD_SIZE, HEADER_SIZE, MAGIC_GUARD},
};
use crate::error::{Result, VmError};

/// Byte accounting produced by a full walk of the heap.
///
/// For a healthy heap `allocated + free + overhead == capacity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    pub capacity: usize,
    pub allocated: usize,
    pub free: usize,
    pub overhead: usize,
    pub blocks: usize,
    pub free_blocks: usize,
}

impl ByteHeap {
    /// Steps through every block by its size field, verifying guards.
    ///
    /// Never mutates. Stops at the first bad guard.
    pub fn walk(&self) -> Result<HeapStats> {
        let mut stats = HeapStats {
            capacity: self.memory.len(),
            ..HeapStats::default()
        };

        let mut addr = HEADER_SIZE;
        while addr - HEADER_SIZE < self.memory.len() {
            let size = self.word(addr - 8) as usize;
            let guard_at = addr + size;
            if size % 8 != 0
                || guard_at + GUARD_SIZE > self.memory.len()
                || self.word(guard_at) != MAGIC_GUARD
            {
                return Err(VmError::CorruptionDetected {
                    address: addr as Address,
                });
            }

            if self.refcount_of(addr as Address) == 0 {
                stats.free += size;
                stats.free_blocks += 1;
            } else {
                stats.allocated += size;
            }
            stats.overhead += BLOCK_OVERHEAD;
            stats.blocks += 1;
            addr = guard_at + GUARD_SIZE + HEADER_SIZE;
        }

        Ok(stats)
    }

    pub fn check_integrity(&self) -> bool {
        match self.walk() {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(%err, "heap integrity check failed");
                false
            }
        }
    }

    /// Exercises allocation, locking and release on the live buffer.
    pub(super) fn self_test(&mut self) -> bool {
        let Ok(before) = self.walk() else {
            return false;
        };

        let probe = self.malloc(8);
        if probe == NULL {
            return false;
        }
        self.store_u64(probe, 0x0123_4567_89AB_CDEF);
        let round_trips = self.load_u64(probe) == 0x0123_4567_89AB_CDEF;

        self.lock(probe);
        let locked = self.get_reference_count(probe) == 2;
        self.free(probe);
        let still_live = self.get_reference_count(probe) == 1;
        self.free(probe);

        let Ok(after) = self.walk() else {
            return false;
        };
        round_trips
            && locked
            && still_live
            && after.allocated == 0
            && after.allocated + after.free + after.overhead == before.capacity
    }
}
