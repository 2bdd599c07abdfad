//! Portable software implementation of the AES round primitives.

use crate::kernels::constants::GF_POLY;

// AES S-Box
#[rustfmt::skip]
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16
];

/// Inverse S-Box, derived from `SBOX` at compile time.
const INV_SBOX: [u8; 256] = invert_sbox(&SBOX);

const fn invert_sbox(sbox: &[u8; 256]) -> [u8; 256] {
    let mut inv = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        inv[sbox[i] as usize] = i as u8;
        i += 1;
    }
    inv
}

/// One 128-bit AES lane, byte order as in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct U128 {
    pub b: [u8; 16],
}

impl U128 {
    pub const fn zero() -> Self {
        Self { b: [0; 16] }
    }

    /// Build a lane from four little-endian 32-bit words (memory order).
    pub fn from_words(words: &[u32; 4]) -> Self {
        let mut b = [0u8; 16];
        for (dst, w) in b.chunks_exact_mut(4).zip(words) {
            dst.copy_from_slice(&w.to_le_bytes());
        }
        Self { b }
    }

    #[cfg(test)]
    pub fn from_u64s(lo: u64, hi: u64) -> Self {
        let mut b = [0u8; 16];
        b[0..8].copy_from_slice(&lo.to_le_bytes());
        b[8..16].copy_from_slice(&hi.to_le_bytes());
        Self { b }
    }

    /// Load 16 bytes. `src` must be at least 16 bytes long.
    #[inline]
    pub fn load(src: &[u8]) -> Self {
        let mut b = [0u8; 16];
        b.copy_from_slice(&src[..16]);
        Self { b }
    }

    #[inline]
    pub fn store(&self, dst: &mut [u8]) {
        dst[..16].copy_from_slice(&self.b);
    }

    #[cfg(test)]
    pub fn lo_hi(&self) -> (u64, u64) {
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&self.b[0..8]);
        hi.copy_from_slice(&self.b[8..16]);
        (u64::from_le_bytes(lo), u64::from_le_bytes(hi))
    }
}

/// GF(2^8) multiplication by 2 (used in `MixColumns`).
/// Branchless: `b >> 7` extracts the MSB as 0 or 1; multiplying by `GF_POLY`
/// produces the conditional reduction polynomial without a data-dependent branch.
const fn gf_double(b: u8) -> u8 {
    (b << 1) ^ ((b >> 7) * GF_POLY)
}

/// AES `MixColumns` on a single 4-byte column.
fn mix_column(c: &mut [u8]) {
    let t = [c[0], c[1], c[2], c[3]];
    c[0] = gf_double(t[0] ^ t[1]) ^ t[1] ^ t[2] ^ t[3];
    c[1] = gf_double(t[1] ^ t[2]) ^ t[2] ^ t[3] ^ t[0];
    c[2] = gf_double(t[2] ^ t[3]) ^ t[3] ^ t[0] ^ t[1];
    c[3] = gf_double(t[3] ^ t[0]) ^ t[0] ^ t[1] ^ t[2];
}

/// AES `InvMixColumns` on a single 4-byte column.
///
/// Coefficients 14, 11, 13, 9 expressed through repeated doubling.
fn inv_mix_column(c: &mut [u8]) {
    // [x * 9, x * 11, x * 13, x * 14]
    let multiples = |x: u8| {
        let x2 = gf_double(x);
        let x4 = gf_double(x2);
        let x8 = gf_double(x4);
        [x8 ^ x, x8 ^ x2 ^ x, x8 ^ x4 ^ x, x8 ^ x4 ^ x2]
    };
    let [m0, m1, m2, m3] = [c[0], c[1], c[2], c[3]].map(multiples);
    c[0] = m0[3] ^ m1[1] ^ m2[2] ^ m3[0];
    c[1] = m0[0] ^ m1[3] ^ m2[1] ^ m3[2];
    c[2] = m0[2] ^ m1[0] ^ m2[3] ^ m3[1];
    c[3] = m0[1] ^ m1[2] ^ m2[0] ^ m3[3];
}

fn add_round_key(s: &[u8; 16], key: &U128) -> U128 {
    let mut res = U128::zero();
    for (i, res_i) in res.b.iter_mut().enumerate() {
        *res_i = s[i] ^ key.b[i];
    }
    res
}

/// One AES encryption round (`AESENC` semantics).
pub fn aesenc(state: U128, key: &U128) -> U128 {
    let mut s = state.b;

    // SubBytes
    for b in &mut s {
        *b = SBOX[*b as usize];
    }

    // ShiftRows
    // Row 0: No shift
    // Row 1: Shift left 1
    let tmp = s[1];
    s[1] = s[5];
    s[5] = s[9];
    s[9] = s[13];
    s[13] = tmp;
    // Row 2: Shift left 2
    s.swap(2, 10);
    s.swap(6, 14);
    // Row 3: Shift left 3
    let tmp = s[15];
    s[15] = s[11];
    s[11] = s[7];
    s[7] = s[3];
    s[3] = tmp;

    // MixColumns
    for col in s.chunks_exact_mut(4) {
        mix_column(col);
    }

    add_round_key(&s, key)
}

/// One AES decryption round (`AESDEC` semantics).
pub fn aesdec(state: U128, key: &U128) -> U128 {
    let mut s = state.b;

    // InvShiftRows
    // Row 1: Shift right 1
    let tmp = s[13];
    s[13] = s[9];
    s[9] = s[5];
    s[5] = s[1];
    s[1] = tmp;
    // Row 2: Shift right 2
    s.swap(2, 10);
    s.swap(6, 14);
    // Row 3: Shift right 3
    let tmp = s[3];
    s[3] = s[7];
    s[7] = s[11];
    s[11] = s[15];
    s[15] = tmp;

    // InvSubBytes
    for b in &mut s {
        *b = INV_SBOX[*b as usize];
    }

    // InvMixColumns
    for col in s.chunks_exact_mut(4) {
        inv_mix_column(col);
    }

    add_round_key(&s, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aesenc_manual_verification() {
        let c0 = 0xB172_17F7_D1CF_79AB;
        let seed = 0xDEAD_BEEF;

        let acc = U128::from_u64s(c0, c0 + 1);
        let key = U128::from_u64s(seed, seed);

        let (res_lo, res_hi) = aesenc(acc, &key).lo_hi();

        assert_eq!(res_lo, 0x321c_e16f_8973_6a62, "Low 64-bit mismatch");
        assert_eq!(res_hi, 0x321c_e16f_8780_999f, "High 64-bit mismatch");
    }

    #[test]
    fn test_inverse_sbox() {
        for i in 0..=255u8 {
            assert_eq!(INV_SBOX[SBOX[i as usize] as usize], i);
        }
    }

    #[test]
    fn test_inv_mix_columns_undoes_mix_columns() {
        let original = [0xdb, 0x13, 0x53, 0x45];
        let mut col = original;
        mix_column(&mut col);
        assert_eq!(col, [0x8e, 0x4d, 0xa1, 0xbc]);
        inv_mix_column(&mut col);
        assert_eq!(col, original);
    }

    #[test]
    fn test_zero_key_rounds_are_inverse_permutations() {
        // With a zero key, aesdec(aesenc(x)) is not x, but both rounds must be bijections:
        // two distinct inputs never collide.
        let zero = U128::zero();
        let a = U128::from_u64s(1, 2);
        let b = U128::from_u64s(1, 3);
        assert_ne!(aesenc(a, &zero), aesenc(b, &zero));
        assert_ne!(aesdec(a, &zero), aesdec(b, &zero));
    }
}
