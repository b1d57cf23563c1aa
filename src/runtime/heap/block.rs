//! Block layout inside the heap buffer.
//!
//! ```text
//!   addr-12     addr-8      addr-4      addr              addr+size
//!   +-----------+-----------+-----------+-----------------+-----------+
//!   | link      | size      | refcount  | payload ...     | guard     |
//!   +-----------+-----------+-----------+-----------------+-----------+
//! ```
//!
//! An [`Address`] always names the first payload byte. `link` is only
//! meaningful while the block sits on a free structure. The first block's
//! payload starts at [`HEADER_SIZE`], so address 0 is never handed out.

use super::ByteHeap;

/// Byte offset of a payload inside the heap buffer.
pub type Address = u32;

/// Returned by `malloc`/`realloc` when no block could be produced.
pub const NULL: Address = 0;

pub const HEADER_SIZE: usize = 12;
pub const GUARD_SIZE: usize = 4;
pub const BLOCK_OVERHEAD: usize = HEADER_SIZE + GUARD_SIZE;
pub const ALIGNMENT: usize = 8;
pub const MIN_PAYLOAD: usize = 8;
pub const MIN_CAPACITY: usize = 64;

/// Sentinel stored right after every payload, live or free.
pub const MAGIC_GUARD: u32 = 0x5AFE_B10C;

const LINK_OFFSET: usize = 12;
const SIZE_OFFSET: usize = 8;
const REFCOUNT_OFFSET: usize = 4;

/// Rounds a request up to the allocation granularity.
///
/// Zero-byte requests still get the minimum payload. Returns `None` when
/// the rounded size cannot be represented in a block header.
pub(crate) fn align_size(size: usize) -> Option<usize> {
    let size = size.max(MIN_PAYLOAD);
    let aligned = size.checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1);
    if aligned > u32::MAX as usize {
        None
    } else {
        Some(aligned)
    }
}

impl ByteHeap {
    #[inline]
    pub(super) fn word(&self, at: usize) -> u32 {
        let bytes = [
            self.memory[at],
            self.memory[at + 1],
            self.memory[at + 2],
            self.memory[at + 3],
        ];
        u32::from_le_bytes(bytes)
    }

    #[inline]
    pub(super) fn set_word(&mut self, at: usize, value: u32) {
        self.memory[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(super) fn link_of(&self, addr: Address) -> Address {
        self.word(addr as usize - LINK_OFFSET)
    }

    #[inline]
    pub(super) fn set_link(&mut self, addr: Address, next: Address) {
        self.set_word(addr as usize - LINK_OFFSET, next);
    }

    #[inline]
    pub(super) fn size_of_block(&self, addr: Address) -> usize {
        self.word(addr as usize - SIZE_OFFSET) as usize
    }

    /// Writes the size field and stamps the guard after the new payload end.
    pub(super) fn set_block_size(&mut self, addr: Address, size: usize) {
        self.set_word(addr as usize - SIZE_OFFSET, size as u32);
        self.set_word(addr as usize + size, MAGIC_GUARD);
    }

    #[inline]
    pub(super) fn refcount_of(&self, addr: Address) -> u32 {
        self.word(addr as usize - REFCOUNT_OFFSET)
    }

    #[inline]
    pub(super) fn set_refcount(&mut self, addr: Address, count: u32) {
        self.set_word(addr as usize - REFCOUNT_OFFSET, count);
    }

    /// Payload address of the block physically following `addr`, if any.
    pub(super) fn next_block(&self, addr: Address) -> Option<Address> {
        let next = addr as usize + self.size_of_block(addr) + BLOCK_OVERHEAD;
        if next - HEADER_SIZE >= self.memory.len() {
            None
        } else {
            Some(next as Address)
        }
    }

    /// Checks that `addr` names a well-formed block and returns its size.
    ///
    /// Does not consult the hooks; see [`ByteHeap::checked`] for that.
    pub(super) fn probe(&self, addr: Address) -> Option<usize> {
        let at = addr as usize;
        if at < HEADER_SIZE || (at - HEADER_SIZE) % ALIGNMENT != 0 {
            return None;
        }
        if at + GUARD_SIZE > self.memory.len() {
            return None;
        }
        let size = self.size_of_block(addr);
        if size % ALIGNMENT != 0 {
            return None;
        }
        let guard_at = at.checked_add(size)?;
        if guard_at + GUARD_SIZE > self.memory.len() {
            return None;
        }
        if self.word(guard_at) != MAGIC_GUARD {
            return None;
        }
        Some(size)
    }

    /// Like [`ByteHeap::probe`], but raises the invalid-access hook on failure.
    pub(super) fn checked(&self, addr: Address) -> Option<usize> {
        let size = self.probe(addr);
        if size.is_none() {
            (self.on_invalid_access)(addr);
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_size_rounds_to_granularity() {
        assert_eq!(align_size(0), Some(8));
        assert_eq!(align_size(1), Some(8));
        assert_eq!(align_size(8), Some(8));
        assert_eq!(align_size(9), Some(16));
        assert_eq!(align_size(2049), Some(2056));
    }

    #[test]
    fn align_size_rejects_unrepresentable_sizes() {
        assert_eq!(align_size(usize::MAX), None);
    }
}
