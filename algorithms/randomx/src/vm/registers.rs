//! VM register file and its 256-byte serialization.

use zeroize::Zeroize;

use crate::kernels::constants::{REGISTER_COUNT, REGISTER_COUNT_FLT, REGISTER_FILE_SIZE};

/// Two packed doubles, `[lo, hi]`.
pub type FloatPair = [f64; 2];

/// Integer, float, exponent and constant register groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterFile {
    /// Integer registers `r0..r7`.
    pub r: [u64; REGISTER_COUNT],
    /// Additive float registers `f0..f3`.
    pub f: [FloatPair; REGISTER_COUNT_FLT],
    /// Multiplicative float registers `e0..e3`.
    pub e: [FloatPair; REGISTER_COUNT_FLT],
    /// Read-only constants `a0..a3`.
    pub a: [FloatPair; REGISTER_COUNT_FLT],
}

impl Zeroize for RegisterFile {
    fn zeroize(&mut self) {
        self.r.zeroize();
        self.f.zeroize();
        self.e.zeroize();
        self.a.zeroize();
    }
}

impl RegisterFile {
    /// Little-endian image: `r`, then `f`, `e`, `a` as `lo, hi` doubles.
    pub fn to_bytes(&self) -> [u8; REGISTER_FILE_SIZE] {
        let mut out = [0u8; REGISTER_FILE_SIZE];
        let floats = self.f.iter().chain(&self.e).chain(&self.a).flatten();
        let words = self.r.iter().copied().chain(floats.map(|x| x.to_bits()));
        for (chunk, word) in out.chunks_exact_mut(8).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Overwrite the `a` group with 64 raw bytes.
    pub fn set_a_bytes(&mut self, bytes: &[u8; 64]) {
        let lanes = self.a.iter_mut().flatten();
        for (slot, chunk) in lanes.zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *slot = f64::from_bits(u64::from_le_bytes(word));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut regs = RegisterFile::default();
        regs.r[0] = 0x0102_0304_0506_0708;
        regs.r[7] = u64::MAX;
        regs.f[0] = [1.0, -2.0];
        regs.e[3][1] = 0.5;
        regs.a[3][1] = f64::from_bits(0xAABB);

        let bytes = regs.to_bytes();
        assert_eq!(&bytes[0..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[56..64], &[0xFF; 8]);
        assert_eq!(&bytes[64..72], &1.0f64.to_bits().to_le_bytes());
        assert_eq!(&bytes[72..80], &(-2.0f64).to_bits().to_le_bytes());
        assert_eq!(&bytes[184..192], &0.5f64.to_bits().to_le_bytes());
        assert_eq!(&bytes[248..256], &0xAABBu64.to_le_bytes());
    }

    #[test]
    fn test_set_a_bytes() {
        let mut regs = RegisterFile::default();
        let mut raw = [0u8; 64];
        raw[8..16].copy_from_slice(&1.5f64.to_bits().to_le_bytes());
        raw[56] = 1;
        regs.set_a_bytes(&raw);
        assert_eq!(regs.a[0][1].to_bits(), 1.5f64.to_bits());
        assert_eq!(regs.a[3][1].to_bits(), 1);
        assert_eq!(&regs.to_bytes()[192..], &raw[..]);
    }
}
