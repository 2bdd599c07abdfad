//! Random program layout and the per-program configuration it encodes.
//!
//! A program is the 2176-byte output of `fill_aes_4rx4`: 128 bytes of entropy
//! (sixteen little-endian words) followed by 256 eight-byte instructions.

use crate::kernels::constants::{
    CACHE_LINE_ALIGN_MASK, CACHE_LINE_SIZE, CONST_EXPONENT_BITS, DATASET_EXTRA_ITEMS,
    DYNAMIC_EXPONENT_BITS, E_MASK_ENTROPY_BITS, EXPONENT_BIAS, EXPONENT_MASK, INSTRUCTION_SIZE,
    MANTISSA_MASK, MANTISSA_SIZE, PROGRAM_BYTES, PROGRAM_ENTROPY_SIZE, PROGRAM_SIZE,
    REGISTER_COUNT_FLT, STATIC_EXPONENT_BITS,
};
use crate::vm::registers::FloatPair;

const ENTROPY_WORDS: usize = PROGRAM_ENTROPY_SIZE / 8;

fn read_u64(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(word)
}

/// One undecoded 8-byte instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawInstruction {
    /// Opcode byte; its range selects the instruction kind.
    pub opcode: u8,
    /// Destination register selector.
    pub dst: u8,
    /// Source register selector.
    pub src: u8,
    /// Modifier bits (memory level, shift, branch condition, store level).
    pub modifier: u8,
    /// 32-bit immediate.
    pub imm32: u32,
}

impl RawInstruction {
    /// Decode from 8 little-endian bytes.
    pub fn from_bytes(bytes: &[u8; INSTRUCTION_SIZE]) -> Self {
        Self {
            opcode: bytes[0],
            dst: bytes[1],
            src: bytes[2],
            modifier: bytes[3],
            imm32: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Scratchpad level selector: non-zero means L1, zero means L2.
    pub const fn mod_mem(&self) -> u8 {
        self.modifier % 4
    }

    /// Shift amount for `IADD_RS`.
    pub const fn mod_shift(&self) -> u8 {
        (self.modifier >> 2) % 4
    }

    /// Branch condition offset (and `ISTORE` level selector).
    pub const fn mod_cond(&self) -> u8 {
        self.modifier >> 4
    }
}

/// A parsed random program.
#[derive(Debug, Clone)]
pub struct Program {
    entropy: [u64; ENTROPY_WORDS],
    instructions: Vec<RawInstruction>,
}

impl Program {
    /// Parse the generator output.
    pub fn from_bytes(bytes: &[u8; PROGRAM_BYTES]) -> Self {
        let (head, body) = bytes.split_at(PROGRAM_ENTROPY_SIZE);
        let entropy = core::array::from_fn(|i| read_u64(&head[i * 8..]));
        let instructions = body
            .chunks_exact(INSTRUCTION_SIZE)
            .map(|chunk| {
                let mut raw = [0u8; INSTRUCTION_SIZE];
                raw.copy_from_slice(chunk);
                RawInstruction::from_bytes(&raw)
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(instructions.len(), PROGRAM_SIZE);
        Self {
            entropy,
            instructions,
        }
    }

    /// Entropy word `index` (0..16).
    pub const fn entropy(&self, index: usize) -> u64 {
        self.entropy[index]
    }

    /// The 256 instructions in program order.
    pub fn instructions(&self) -> &[RawInstruction] {
        &self.instructions
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Per-program VM parameters drawn from the entropy words.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramConfig {
    /// Constant registers `a0..a3`.
    pub a: [FloatPair; REGISTER_COUNT_FLT],
    /// Initial dataset read address (cache-line aligned).
    pub ma: u32,
    /// Initial dataset prefetch address.
    pub mx: u32,
    /// Registers mixed into the scratchpad addresses and dataset address.
    pub read_reg: [usize; 4],
    /// Byte offset added to every dataset address.
    pub dataset_offset: u64,
    /// OR-masks applied to the exponent/mantissa of `e` register loads.
    pub e_mask: [u64; 2],
}

impl ProgramConfig {
    /// Derive the configuration from `program`'s entropy.
    pub fn new(program: &Program) -> Self {
        let e = |i| program.entropy(i);

        let a = core::array::from_fn(|i| {
            [
                f64::from_bits(small_positive_float_bits(e(2 * i))),
                f64::from_bits(small_positive_float_bits(e(2 * i + 1))),
            ]
        });

        let selectors = e(12);
        let read_reg = core::array::from_fn(|i| 2 * i + ((selectors >> i) & 1) as usize);

        Self {
            a,
            ma: (e(8) & CACHE_LINE_ALIGN_MASK) as u32,
            mx: e(10) as u32,
            read_reg,
            dataset_offset: (e(13) % (DATASET_EXTRA_ITEMS + 1)) * CACHE_LINE_SIZE as u64,
            e_mask: [float_mask(e(14)), float_mask(e(15))],
        }
    }
}

/// A positive double in `[1, 2^32)` built from the top five bits (exponent)
/// and low 52 bits (mantissa) of `entropy`.
pub const fn small_positive_float_bits(entropy: u64) -> u64 {
    let exponent = ((entropy >> 59) + EXPONENT_BIAS) & EXPONENT_MASK;
    (exponent << MANTISSA_SIZE) | (entropy & MANTISSA_MASK)
}

/// Exponent/mantissa mask for `e` registers: 22 random mantissa bits and a
/// static exponent with the `0x300` base.
pub const fn float_mask(entropy: u64) -> u64 {
    let exponent =
        (CONST_EXPONENT_BITS | ((entropy >> (64 - STATIC_EXPONENT_BITS)) << DYNAMIC_EXPONENT_BITS))
            << MANTISSA_SIZE;
    (entropy & E_MASK_ENTROPY_BITS) | exponent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_with_entropy(entropy: [u64; 16]) -> Program {
        let mut bytes = [0u8; PROGRAM_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(entropy) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes[PROGRAM_ENTROPY_SIZE..PROGRAM_ENTROPY_SIZE + 8]
            .copy_from_slice(&[0xAB, 9, 10, 0xF7, 0x78, 0x56, 0x34, 0x12]);
        Program::from_bytes(&bytes)
    }

    #[test]
    fn test_instruction_decoding() {
        let program = program_with_entropy([0; 16]);
        assert_eq!(program.instructions().len(), PROGRAM_SIZE);
        let first = program.instructions()[0];
        assert_eq!(first.opcode, 0xAB);
        assert_eq!(first.dst, 9);
        assert_eq!(first.src, 10);
        assert_eq!(first.imm32, 0x1234_5678);
        assert_eq!(first.mod_mem(), 3);
        assert_eq!(first.mod_shift(), 1);
        assert_eq!(first.mod_cond(), 15);
    }

    #[test]
    fn test_small_positive_float() {
        assert_eq!(small_positive_float_bits(0), 1.0f64.to_bits());
        // Exponent field 31 and a full mantissa: just below 2^32.
        let max = f64::from_bits(small_positive_float_bits(u64::MAX));
        assert!(max < 4_294_967_296.0 && max > 2_147_483_648.0);
    }

    #[test]
    fn test_float_mask() {
        assert_eq!(float_mask(0), 0x300 << 52);
        assert_eq!(float_mask(u64::MAX), ((0x300 | 0xF0) << 52) | ((1 << 22) - 1));
    }

    #[test]
    fn test_config_from_entropy() {
        let mut entropy = [0u64; 16];
        entropy[8] = u64::MAX;
        entropy[10] = 0x1_2345_6789;
        entropy[12] = 0b1010;
        entropy[13] = DATASET_EXTRA_ITEMS + 3;
        let cfg = ProgramConfig::new(&program_with_entropy(entropy));

        assert_eq!(u64::from(cfg.ma), CACHE_LINE_ALIGN_MASK);
        assert_eq!(cfg.ma % 64, 0);
        assert_eq!(cfg.mx, 0x2345_6789);
        assert_eq!(cfg.read_reg, [0, 3, 4, 7]);
        assert_eq!(cfg.dataset_offset, 2 * 64);
        assert_eq!(cfg.a[0][0].to_bits(), 1.0f64.to_bits());
    }
}
