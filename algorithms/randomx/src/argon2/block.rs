//! Argon2 memory block and the BlaMka compression function.

use zeroize::Zeroize;

use crate::kernels::constants::{ARGON_BLOCK_SIZE, ARGON_QWORDS_IN_BLOCK};

/// 1 KiB Argon2 block as 128 little-endian words.
#[derive(Clone, Copy)]
#[repr(C, align(64))]
pub struct Block(pub [u64; ARGON_QWORDS_IN_BLOCK]);

impl Block {
    /// All-zero block.
    pub const ZERO: Self = Self([0; ARGON_QWORDS_IN_BLOCK]);

    /// Decode a block from its 1024-byte little-endian encoding.
    pub fn from_bytes(bytes: &[u8; ARGON_BLOCK_SIZE]) -> Self {
        let mut block = Self::ZERO;
        for (word, chunk) in block.0.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut w = [0u8; 8];
            w.copy_from_slice(chunk);
            *word = u64::from_le_bytes(w);
        }
        block
    }

    fn xor_with(&mut self, other: &Self) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a ^= *b;
        }
    }
}

impl Zeroize for Block {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

// =============================================================================
// BLAMKA PERMUTATION
// =============================================================================

/// `x + y + 2 * lo32(x) * lo32(y)` (mod 2^64).
#[inline]
const fn f_bla_mka(x: u64, y: u64) -> u64 {
    let m = (x & 0xFFFF_FFFF).wrapping_mul(y & 0xFFFF_FFFF);
    x.wrapping_add(y).wrapping_add(m.wrapping_mul(2))
}

#[inline]
fn g(v: &mut [u64; ARGON_QWORDS_IN_BLOCK], a: usize, b: usize, c: usize, d: usize) {
    v[a] = f_bla_mka(v[a], v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = f_bla_mka(v[c], v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = f_bla_mka(v[a], v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = f_bla_mka(v[c], v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

/// Blake2b round without message words over 16 words selected by `i`.
#[inline]
fn round(v: &mut [u64; ARGON_QWORDS_IN_BLOCK], i: &[usize; 16]) {
    g(v, i[0], i[4], i[8], i[12]);
    g(v, i[1], i[5], i[9], i[13]);
    g(v, i[2], i[6], i[10], i[14]);
    g(v, i[3], i[7], i[11], i[15]);
    g(v, i[0], i[5], i[10], i[15]);
    g(v, i[1], i[6], i[11], i[12]);
    g(v, i[2], i[7], i[8], i[13]);
    g(v, i[3], i[4], i[9], i[14]);
}

/// Argon2 compression: `next = P(prev ^ reference) ^ (prev ^ reference) [^ next]`.
///
/// `P` applies eight row-wise rounds (16 consecutive words each) followed by
/// eight column-wise rounds (pairs of words strided by 16).
pub fn fill_block(prev: &Block, reference: &Block, next: &mut Block, with_xor: bool) {
    let mut r = *reference;
    r.xor_with(prev);
    let mut tmp = r;
    if with_xor {
        tmp.xor_with(next);
    }

    for row in 0..8 {
        let base = row * 16;
        let idx: [usize; 16] = core::array::from_fn(|k| base + k);
        round(&mut r.0, &idx);
    }

    for col in 0..8 {
        let base = col * 2;
        let idx: [usize; 16] = core::array::from_fn(|k| base + (k / 2) * 16 + (k % 2));
        round(&mut r.0, &idx);
    }

    r.xor_with(&tmp);
    *next = r;
}
