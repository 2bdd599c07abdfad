//! The 2 MiB VM scratchpad.
//!
//! Addresses come pre-masked (8-byte aligned for the L1/L2/L3 masks, 64-byte
//! aligned for the loop addresses), so every access is in bounds.

use zeroize::Zeroize;

use super::registers::FloatPair;
use crate::kernels::constants::{DYNAMIC_MANTISSA_MASK, SCRATCHPAD_L3};

/// Byte-addressed little-endian scratchpad.
pub struct Scratchpad {
    bytes: Vec<u8>,
}

impl Drop for Scratchpad {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl Default for Scratchpad {
    fn default() -> Self {
        Self::new()
    }
}

impl Scratchpad {
    /// Allocate a zeroed scratchpad.
    pub fn new() -> Self {
        Self {
            bytes: vec![0; SCRATCHPAD_L3],
        }
    }

    /// Raw contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw contents, for the AES fill.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Little-endian word at `addr`.
    #[inline]
    pub fn read_u64(&self, addr: usize) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.bytes[addr..addr + 8]);
        u64::from_le_bytes(word)
    }

    /// Store `value` at `addr`.
    #[inline]
    pub fn write_u64(&mut self, addr: usize, value: u64) {
        self.bytes[addr..addr + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Two signed 32-bit integers at `addr`, converted to doubles.
    #[inline]
    pub fn read_pair(&self, addr: usize) -> FloatPair {
        let word = self.read_u64(addr);
        [f64::from(word as u32 as i32), f64::from((word >> 32) as u32 as i32)]
    }

    /// Like [`Self::read_pair`], then forced into the `e` register range.
    #[inline]
    pub fn read_pair_masked(&self, addr: usize, e_mask: [u64; 2]) -> FloatPair {
        let [lo, hi] = self.read_pair(addr);
        [
            f64::from_bits((lo.to_bits() & DYNAMIC_MANTISSA_MASK) | e_mask[0]),
            f64::from_bits((hi.to_bits() & DYNAMIC_MANTISSA_MASK) | e_mask[1]),
        ]
    }

    /// Store both lanes of `pair` as raw doubles (16 bytes).
    #[inline]
    pub fn write_pair(&mut self, addr: usize, pair: FloatPair) {
        self.write_u64(addr, pair[0].to_bits());
        self.write_u64(addr + 8, pair[1].to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_access() {
        let mut sp = Scratchpad::new();
        assert_eq!(sp.as_bytes().len(), SCRATCHPAD_L3);
        sp.write_u64(SCRATCHPAD_L3 - 8, 0x0102_0304_0506_0708);
        assert_eq!(sp.read_u64(SCRATCHPAD_L3 - 8), 0x0102_0304_0506_0708);
        assert_eq!(sp.as_bytes()[SCRATCHPAD_L3 - 8], 8);
    }

    #[test]
    fn test_pair_conversion() {
        let mut sp = Scratchpad::new();
        sp.write_u64(64, (u64::from(7u32) << 32) | u64::from((-3i32) as u32));
        let [lo, hi] = sp.read_pair(64);
        assert_eq!(lo.to_bits(), (-3.0f64).to_bits());
        assert_eq!(hi.to_bits(), 7.0f64.to_bits());
    }

    #[test]
    fn test_masked_pair_is_positive_and_finite() {
        let mut sp = Scratchpad::new();
        sp.write_u64(0, u64::MAX);
        let mask = 0x300 << 52;
        for x in sp.read_pair_masked(0, [mask, mask]) {
            assert!(x.is_finite() && x > 0.0);
        }
    }
}
