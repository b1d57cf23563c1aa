//! Size classes for small blocks.
//!
//! Class `k` holds free blocks whose payload is at least `2^k` bytes, for
//! `k` in `MIN_CLASS..=MAX_CLASS`. A request is served from the smallest
//! class whose capacity covers it, so any block popped from that class or
//! a higher one is large enough without re-splitting.

pub const MIN_CLASS: u32 = 3;
pub const MAX_CLASS: u32 = 11;
pub const CLASS_COUNT: usize = (MAX_CLASS - MIN_CLASS + 1) as usize;

/// Largest payload handled by the size classes.
pub const BUDDY_MAX: usize = 1 << MAX_CLASS;

/// Smallest class `k` with `2^k >= size`, or `None` above the buddy ceiling.
pub fn class_for_request(size: usize) -> Option<u32> {
    if size > BUDDY_MAX {
        return None;
    }
    Some(size.next_power_of_two().trailing_zeros().max(MIN_CLASS))
}

/// Class a free block of `size` bytes is filed under.
///
/// For power-of-two sizes this is the same class [`class_for_request`]
/// computes. Other sizes round down so that every block in class `k`
/// still holds at least `2^k` bytes.
pub fn class_for_block(size: usize) -> Option<u32> {
    if size > BUDDY_MAX || size < (1 << MIN_CLASS) {
        return None;
    }
    Some((usize::BITS - 1 - size.leading_zeros()).max(MIN_CLASS))
}

pub fn class_size(level: u32) -> usize {
    1 << level
}

#[inline]
pub(super) fn slot(level: u32) -> usize {
    (level - MIN_CLASS) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_powers_map_to_their_own_class() {
        for k in MIN_CLASS..=MAX_CLASS {
            assert_eq!(class_for_request(1 << k), Some(k));
            assert_eq!(class_for_block(1 << k), Some(k));
        }
    }

    #[test]
    fn requests_round_up_and_blocks_round_down() {
        assert_eq!(class_for_request(24), Some(5));
        assert_eq!(class_for_block(24), Some(4));
        assert_eq!(class_for_request(1), Some(MIN_CLASS));
    }

    #[test]
    fn sizes_above_ceiling_have_no_class() {
        assert_eq!(class_for_request(BUDDY_MAX + 8), None);
        assert_eq!(class_for_block(BUDDY_MAX + 8), None);
    }
}
