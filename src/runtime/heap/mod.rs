//! Reference-counted byte heap over a fixed-capacity buffer.
//!
//! Small requests (up to [`buddy::BUDDY_MAX`] bytes) are served from
//! power-of-two size classes; everything else goes through a first-fit
//! walk of the general free list, splitting oversized blocks. Freed large
//! blocks absorb free neighbours that physically follow them.
//!
//! Failures never unwind: an exhausted heap calls the out-of-memory hook
//! and yields [`NULL`], a bad pointer calls the invalid-access hook and
//! leaves the heap untouched.

pub mod access;
pub mod block;
pub mod buddy;
pub mod integrity;

pub use block::{Address, BLOCK_OVERHEAD, HEADER_SIZE, MAGIC_GUARD, MIN_CAPACITY, NULL};
pub use integrity::HeapStats;

use block::{ALIGNMENT, align_size};
use buddy::CLASS_COUNT;

/// Called with the rounded request size when the heap is exhausted.
pub type OutOfMemoryHook = Box<dyn Fn(usize)>;
/// Called with the offending address when a guard check fails.
pub type InvalidAccessHook = Box<dyn Fn(Address)>;

fn log_out_of_memory(requested: usize) {
    tracing::error!(requested, "byte heap exhausted");
}

fn log_invalid_access(address: Address) {
    tracing::warn!(address, "invalid heap access");
}

pub struct ByteHeap {
    memory: Vec<u8>,
    free_head: Address,
    classes: [Address; CLASS_COUNT],
    live_blocks: usize,
    on_out_of_memory: OutOfMemoryHook,
    on_invalid_access: InvalidAccessHook,
}

impl ByteHeap {
    /// Creates a heap whose hooks log through `tracing`.
    pub fn new(capacity: usize) -> Self {
        Self::with_hooks(
            capacity,
            Box::new(log_out_of_memory),
            Box::new(log_invalid_access),
        )
    }

    pub fn with_hooks(
        capacity: usize,
        on_out_of_memory: OutOfMemoryHook,
        on_invalid_access: InvalidAccessHook,
    ) -> Self {
        let mut heap = Self {
            memory: Vec::new(),
            free_head: NULL,
            classes: [NULL; CLASS_COUNT],
            live_blocks: 0,
            on_out_of_memory,
            on_invalid_access,
        };
        heap.reset(capacity);
        heap
    }

    /// Re-creates the buffer, installs the hooks and runs the self-test.
    ///
    /// Returns whether the self-test passed. The heap is freshly seeded
    /// afterwards either way.
    pub fn init(
        &mut self,
        capacity: usize,
        on_out_of_memory: OutOfMemoryHook,
        on_invalid_access: InvalidAccessHook,
    ) -> bool {
        self.on_out_of_memory = on_out_of_memory;
        self.on_invalid_access = on_invalid_access;
        self.reset(capacity);
        self.verify()
    }

    /// Runs the self-test against the current hooks and reseeds the heap.
    pub fn verify(&mut self) -> bool {
        let capacity = self.capacity();
        let healthy = self.self_test();
        self.reset(capacity);
        if !healthy {
            tracing::error!(capacity, "byte heap self-test failed");
        }
        healthy
    }

    /// Drops every block and seeds one free block spanning the buffer.
    ///
    /// Capacities are rounded down to the allocation granularity and
    /// clamped to `MIN_CAPACITY..=u32::MAX`.
    pub fn reset(&mut self, capacity: usize) {
        let capacity = capacity.clamp(MIN_CAPACITY, u32::MAX as usize) & !(ALIGNMENT - 1);
        self.memory = vec![0; capacity];
        self.classes = [NULL; CLASS_COUNT];
        self.live_blocks = 0;

        let first = HEADER_SIZE as Address;
        self.set_link(first, NULL);
        self.set_refcount(first, 0);
        self.set_block_size(first, capacity - BLOCK_OVERHEAD);
        self.free_head = first;
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Number of blocks currently holding at least one reference.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks
    }

    /// Allocates `size` bytes with a reference count of one.
    ///
    /// Returns [`NULL`] after calling the out-of-memory hook when nothing
    /// fits.
    pub fn malloc(&mut self, size: usize) -> Address {
        let Some(size) = align_size(size) else {
            (self.on_out_of_memory)(size);
            return NULL;
        };

        if let Some(level) = buddy::class_for_request(size) {
            if let Some(addr) = self.pop_class_from(level) {
                return self.hand_out(addr);
            }
            // Carve a full class-sized block so it files back into the same
            // class when released.
            if let Some(addr) = self.first_fit(buddy::class_size(level)) {
                return self.hand_out(addr);
            }
        }

        match self.first_fit(size) {
            Some(addr) => self.hand_out(addr),
            None => {
                (self.on_out_of_memory)(size);
                NULL
            }
        }
    }

    /// Drops one reference; the block is recycled when the count hits zero.
    pub fn free(&mut self, address: Address) {
        self.release(address);
    }

    pub fn lock(&mut self, address: Address) {
        if self.checked(address).is_none() {
            return;
        }
        let count = self.refcount_of(address);
        if count == 0 {
            (self.on_invalid_access)(address);
            return;
        }
        self.set_refcount(address, count + 1);
    }

    pub fn unlock(&mut self, address: Address) {
        self.release(address);
    }

    /// Grows a block, preserving its bytes.
    ///
    /// Shrinking is not supported: a request that fits the current block
    /// returns `address` unchanged. On failure the old block is left intact
    /// and [`NULL`] is returned.
    pub fn realloc(&mut self, address: Address, new_size: usize) -> Address {
        let Some(old_size) = self.checked(address) else {
            return NULL;
        };
        if self.refcount_of(address) == 0 {
            (self.on_invalid_access)(address);
            return NULL;
        }
        let Some(new_size) = align_size(new_size) else {
            (self.on_out_of_memory)(new_size);
            return NULL;
        };
        if new_size <= old_size {
            return address;
        }

        let fresh = self.malloc(new_size);
        if fresh == NULL {
            return NULL;
        }
        let from = address as usize;
        self.memory
            .copy_within(from..from + old_size.min(new_size), fresh as usize);
        self.free(address);
        fresh
    }

    /// Payload size in bytes, or 0 for an invalid address.
    pub fn get_size(&self, address: Address) -> usize {
        self.checked(address).unwrap_or(0)
    }

    pub fn get_reference_count(&self, address: Address) -> u32 {
        match self.checked(address) {
            Some(_) => self.refcount_of(address),
            None => 0,
        }
    }

    pub fn is_last_reference(&self, address: Address) -> bool {
        self.get_reference_count(address) == 1
    }

    fn hand_out(&mut self, addr: Address) -> Address {
        self.set_link(addr, NULL);
        self.set_refcount(addr, 1);
        self.live_blocks += 1;
        addr
    }

    fn release(&mut self, address: Address) {
        if self.checked(address).is_none() {
            return;
        }
        let count = self.refcount_of(address);
        if count == 0 {
            // Already on a free structure.
            (self.on_invalid_access)(address);
            return;
        }
        self.set_refcount(address, count - 1);
        if count == 1 {
            self.live_blocks -= 1;
            self.coalesce(address);
        }
    }

    /// Files a block whose count just reached zero.
    fn coalesce(&mut self, addr: Address) {
        if buddy::class_for_block(self.size_of_block(addr)).is_none() {
            self.absorb_following(addr);
        }
        self.insert_free(addr);
    }

    fn insert_free(&mut self, addr: Address) {
        let size = self.size_of_block(addr);
        if let Some(level) = buddy::class_for_block(size) {
            let slot = buddy::slot(level);
            self.set_link(addr, self.classes[slot]);
            self.classes[slot] = addr;
            return;
        }

        // Best fit: splice in front of the smallest block that is at least
        // as large, or push on the head.
        let mut best: Option<(Address, Address)> = None;
        let mut prev = NULL;
        let mut cursor = self.free_head;
        while cursor != NULL {
            let candidate = self.size_of_block(cursor);
            if candidate >= size {
                let better = match best {
                    Some((_, current)) => candidate < self.size_of_block(current),
                    None => true,
                };
                if better {
                    best = Some((prev, cursor));
                }
            }
            prev = cursor;
            cursor = self.link_of(cursor);
        }

        match best {
            Some((before, at)) => {
                self.set_link(addr, at);
                if before == NULL {
                    self.free_head = addr;
                } else {
                    self.set_link(before, addr);
                }
            }
            None => {
                self.set_link(addr, self.free_head);
                self.free_head = addr;
            }
        }
    }

    /// Merges free blocks that physically follow `addr` into it.
    fn absorb_following(&mut self, addr: Address) {
        while let Some(next) = self.next_block(addr) {
            if self.probe(next).is_none() || self.refcount_of(next) != 0 {
                break;
            }
            if !self.unlink(next) {
                break;
            }
            let merged = self.size_of_block(addr) + BLOCK_OVERHEAD + self.size_of_block(next);
            self.set_block_size(addr, merged);
        }
    }

    /// Removes a free block from whichever list holds it.
    fn unlink(&mut self, addr: Address) -> bool {
        let class = buddy::class_for_block(self.size_of_block(addr)).map(buddy::slot);
        let head = match class {
            Some(slot) => self.classes[slot],
            None => self.free_head,
        };

        if head == addr {
            let next = self.link_of(addr);
            match class {
                Some(slot) => self.classes[slot] = next,
                None => self.free_head = next,
            }
            return true;
        }

        let mut cursor = head;
        while cursor != NULL {
            let next = self.link_of(cursor);
            if next == addr {
                let after = self.link_of(addr);
                self.set_link(cursor, after);
                return true;
            }
            cursor = next;
        }
        false
    }

    fn pop_class_from(&mut self, level: u32) -> Option<Address> {
        for level in level..=buddy::MAX_CLASS {
            let slot = buddy::slot(level);
            let head = self.classes[slot];
            if head != NULL {
                self.classes[slot] = self.link_of(head);
                return Some(head);
            }
        }
        None
    }

    /// Takes the first general-list block of at least `size` bytes,
    /// splitting off the excess when it can stand as a block of its own.
    fn first_fit(&mut self, size: usize) -> Option<Address> {
        let mut prev = NULL;
        let mut cursor = self.free_head;
        while cursor != NULL {
            let available = self.size_of_block(cursor);
            let next = self.link_of(cursor);
            if available >= size {
                if prev == NULL {
                    self.free_head = next;
                } else {
                    self.set_link(prev, next);
                }
                if available - size >= BLOCK_OVERHEAD + block::MIN_PAYLOAD {
                    self.set_block_size(cursor, size);
                    let rest = cursor + (size + BLOCK_OVERHEAD) as Address;
                    self.set_refcount(rest, 0);
                    self.set_block_size(rest, available - size - BLOCK_OVERHEAD);
                    self.insert_free(rest);
                }
                return Some(cursor);
            }
            prev = cursor;
            cursor = next;
        }
        None
    }
}
