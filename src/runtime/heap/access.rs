//! Little-endian typed loads and stores at arbitrary byte offsets.
//!
//! Offsets are absolute positions in the heap buffer; nothing here checks
//! block boundaries. An access that runs past the buffer raises the
//! invalid-access hook, loads yield zero and stores do nothing.

use super::{Address, ByteHeap};

impl ByteHeap {
    fn read_array<const N: usize>(&self, offset: Address) -> Option<[u8; N]> {
        let start = offset as usize;
        match self.memory.get(start..start + N) {
            Some(bytes) => {
                let mut out = [0u8; N];
                out.copy_from_slice(bytes);
                Some(out)
            }
            None => {
                (self.on_invalid_access)(offset);
                None
            }
        }
    }

    fn write_array<const N: usize>(&mut self, offset: Address, bytes: [u8; N]) {
        let start = offset as usize;
        match self.memory.get_mut(start..start + N) {
            Some(slot) => slot.copy_from_slice(&bytes),
            None => (self.on_invalid_access)(offset),
        }
    }

    pub fn load_u8(&self, offset: Address) -> u8 {
        self.read_array::<1>(offset).map_or(0, u8::from_le_bytes)
    }

    pub fn load_u16(&self, offset: Address) -> u16 {
        self.read_array(offset).map_or(0, u16::from_le_bytes)
    }

    pub fn load_u32(&self, offset: Address) -> u32 {
        self.read_array(offset).map_or(0, u32::from_le_bytes)
    }

    pub fn load_u64(&self, offset: Address) -> u64 {
        self.read_array(offset).map_or(0, u64::from_le_bytes)
    }

    pub fn load_i32(&self, offset: Address) -> i32 {
        self.load_u32(offset) as i32
    }

    pub fn load_i64(&self, offset: Address) -> i64 {
        self.load_u64(offset) as i64
    }

    pub fn load_f32(&self, offset: Address) -> f32 {
        f32::from_bits(self.load_u32(offset))
    }

    pub fn load_f64(&self, offset: Address) -> f64 {
        f64::from_bits(self.load_u64(offset))
    }

    pub fn store_u8(&mut self, offset: Address, value: u8) {
        self.write_array(offset, value.to_le_bytes());
    }

    pub fn store_u16(&mut self, offset: Address, value: u16) {
        self.write_array(offset, value.to_le_bytes());
    }

    pub fn store_u32(&mut self, offset: Address, value: u32) {
        self.write_array(offset, value.to_le_bytes());
    }

    pub fn store_u64(&mut self, offset: Address, value: u64) {
        self.write_array(offset, value.to_le_bytes());
    }

    pub fn store_i32(&mut self, offset: Address, value: i32) {
        self.store_u32(offset, value as u32);
    }

    pub fn store_i64(&mut self, offset: Address, value: i64) {
        self.store_u64(offset, value as u64);
    }

    pub fn store_f32(&mut self, offset: Address, value: f32) {
        self.store_u32(offset, value.to_bits());
    }

    pub fn store_f64(&mut self, offset: Address, value: f64) {
        self.store_u64(offset, value.to_bits());
    }

    /// Borrows `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: Address, len: usize) -> Option<&[u8]> {
        let start = offset as usize;
        let slice = self.memory.get(start..start.checked_add(len)?);
        if slice.is_none() {
            (self.on_invalid_access)(offset);
        }
        slice
    }

    /// Copies `bytes` into the buffer starting at `offset`.
    pub fn write_bytes(&mut self, offset: Address, bytes: &[u8]) {
        let start = offset as usize;
        match self.memory.get_mut(start..start + bytes.len()) {
            Some(slot) => slot.copy_from_slice(bytes),
            None => (self.on_invalid_access)(offset),
        }
    }
}
