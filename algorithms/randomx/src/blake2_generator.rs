//! Deterministic byte stream driving superscalar program generation.

use crate::blake2_long::hash_512;
use crate::kernels::constants::{GENERATOR_MAX_SEED_SIZE, SEED_HASH_SIZE};

/// Blake2b-512 based pseudo-random byte generator.
///
/// The 64-byte state holds up to 60 seed bytes followed by a little-endian
/// 32-bit nonce. The state is rehashed whenever a request would run past it.
#[derive(Clone)]
pub struct Blake2Generator {
    data: [u8; SEED_HASH_SIZE],
    index: usize,
}

impl Blake2Generator {
    /// Create a generator from `seed` (truncated to 60 bytes) and `nonce`.
    pub fn new(seed: &[u8], nonce: u32) -> Self {
        let mut data = [0u8; SEED_HASH_SIZE];
        let n = seed.len().min(GENERATOR_MAX_SEED_SIZE);
        data[..n].copy_from_slice(&seed[..n]);
        data[GENERATOR_MAX_SEED_SIZE..].copy_from_slice(&nonce.to_le_bytes());
        Self {
            data,
            index: SEED_HASH_SIZE,
        }
    }

    fn check_data(&mut self, bytes_needed: usize) {
        if self.index + bytes_needed > SEED_HASH_SIZE {
            self.data = hash_512(&[&self.data]);
            self.index = 0;
        }
    }

    /// Next byte of the stream.
    pub fn next_u8(&mut self) -> u8 {
        self.check_data(1);
        let b = self.data[self.index];
        self.index += 1;
        b
    }

    /// Next little-endian 32-bit word of the stream.
    pub fn next_u32(&mut self) -> u32 {
        self.check_data(4);
        let mut w = [0u8; 4];
        w.copy_from_slice(&self.data[self.index..self.index + 4]);
        self.index += 4;
        u32::from_le_bytes(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_byte_comes_from_rehashed_state() {
        let mut g = Blake2Generator::new(b"seed", 0);
        let mut state = [0u8; 64];
        state[..4].copy_from_slice(b"seed");
        let expected = hash_512(&[&state]);
        assert_eq!(g.next_u8(), expected[0]);
        assert_eq!(g.next_u8(), expected[1]);
    }

    #[test]
    fn test_word_never_straddles_a_rehash() {
        let mut g = Blake2Generator::new(b"k", 7);
        for _ in 0..62 {
            g.next_u8();
        }
        // 2 bytes left in the buffer: a 4-byte read must rehash first.
        let mut reference = Blake2Generator::new(b"k", 7);
        for _ in 0..64 {
            reference.next_u8();
        }
        let next_block_first = reference.next_u32();
        assert_eq!(g.next_u32(), next_block_first);
    }

    #[test]
    fn test_seed_is_truncated_to_60_bytes() {
        let long = [0xAAu8; 80];
        let mut a = Blake2Generator::new(&long, 0);
        let mut b = Blake2Generator::new(&long[..60], 0);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_nonce_changes_stream() {
        let mut a = Blake2Generator::new(b"k", 0);
        let mut b = Blake2Generator::new(b"k", 1);
        assert_ne!(
            (0..8).map(|_| a.next_u32()).collect::<Vec<_>>(),
            (0..8).map(|_| b.next_u32()).collect::<Vec<_>>()
        );
    }
}
