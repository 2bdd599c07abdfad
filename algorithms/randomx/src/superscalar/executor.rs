//! Superscalar program execution and the reciprocal table.

use super::instructions::Opcode;
use super::program::SuperscalarProgram;
use crate::kernels::constants::REGISTER_COUNT;

/// High 64 bits of the unsigned 128-bit product.
#[inline]
pub const fn mulh(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

/// High 64 bits of the signed 128-bit product.
#[inline]
pub const fn smulh(a: u64, b: u64) -> u64 {
    ((a as i64 as i128 * b as i64 as i128) >> 64) as u64
}

/// Sign-extend a 32-bit immediate to 64 bits.
#[inline]
pub const fn sign_extend(imm: u32) -> u64 {
    imm as i32 as i64 as u64
}

/// Fixed-point reciprocal `2^x / divisor` for `IMUL_RCP`.
///
/// `x` is the largest exponent keeping the result in 64 bits: the quotient of
/// `2^63 / divisor` is extended bit by bit, one step per significant bit of
/// the divisor. `divisor` must be neither zero nor a power of two.
pub const fn reciprocal(divisor: u32) -> u64 {
    debug_assert!(divisor != 0 && !divisor.is_power_of_two());
    let divisor = divisor as u64;
    let p2exp63 = 1u64 << 63;

    let mut quotient = p2exp63 / divisor;
    let mut remainder = p2exp63 % divisor;

    let mut bsr = 64 - divisor.leading_zeros();
    while bsr > 0 {
        if remainder >= divisor - remainder {
            quotient = quotient.wrapping_mul(2).wrapping_add(1);
            remainder = remainder.wrapping_mul(2).wrapping_sub(divisor);
        } else {
            quotient = quotient.wrapping_mul(2);
            remainder = remainder.wrapping_mul(2);
        }
        bsr -= 1;
    }
    quotient
}

/// Run `program` over the register file `r`.
///
/// `IMulRcp` immediates index `reciprocals`.
pub fn execute(program: &SuperscalarProgram, r: &mut [u64; REGISTER_COUNT], reciprocals: &[u64]) {
    for instr in program.instructions() {
        let dst = instr.dst as usize;
        let src = instr.src as usize;
        match instr.opcode {
            Opcode::ISubR => r[dst] = r[dst].wrapping_sub(r[src]),
            Opcode::IXorR => r[dst] ^= r[src],
            Opcode::IAddRs => r[dst] = r[dst].wrapping_add(r[src] << instr.mod_shift()),
            Opcode::IMulR => r[dst] = r[dst].wrapping_mul(r[src]),
            Opcode::IRorC => r[dst] = r[dst].rotate_right(instr.imm32),
            Opcode::IAddC7 | Opcode::IAddC8 | Opcode::IAddC9 => {
                r[dst] = r[dst].wrapping_add(sign_extend(instr.imm32));
            }
            Opcode::IXorC7 | Opcode::IXorC8 | Opcode::IXorC9 => r[dst] ^= sign_extend(instr.imm32),
            Opcode::IMulHR => r[dst] = mulh(r[dst], r[src]),
            Opcode::ISMulHR => r[dst] = smulh(r[dst], r[src]),
            Opcode::IMulRcp => {
                r[dst] = r[dst].wrapping_mul(reciprocals[instr.imm32 as usize]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superscalar::instructions::Instruction;

    #[test]
    fn test_reciprocal_known_values() {
        assert_eq!(reciprocal(3), 12_297_829_382_473_034_410);
        assert_eq!(reciprocal(13), 11_351_842_506_898_185_609);
    }

    #[test]
    fn test_reciprocal_large_divisor() {
        // 2^95 / (2^32 - 1), rounded down to 64 bits.
        let r = reciprocal(u32::MAX);
        assert_eq!(r >> 63, 1);
        assert_eq!(r, ((1u128 << 95) / u128::from(u32::MAX)) as u64);
    }

    #[test]
    fn test_high_multiplications() {
        assert_eq!(mulh(u64::MAX, u64::MAX), u64::MAX - 1);
        assert_eq!(smulh(u64::MAX, u64::MAX), 0); // (-1) * (-1) = 1
        assert_eq!(smulh(u64::MAX, 2), u64::MAX); // -2 >> 64 = -1
        assert_eq!(sign_extend(0x8000_0000), 0xFFFF_FFFF_8000_0000);
        assert_eq!(sign_extend(0x7FFF_FFFF), 0x7FFF_FFFF);
    }

    #[test]
    fn test_execute_semantics() {
        let ins = |opcode, dst, src, modifier, imm32| Instruction {
            opcode,
            dst,
            src,
            modifier,
            imm32,
        };
        let program = SuperscalarProgram::new(vec![
            ins(Opcode::IAddRs, 0, 1, 0b0000_1000, 0), // r0 += r1 << 2
            ins(Opcode::ISubR, 2, 0, 0, 0),            // r2 -= r0
            ins(Opcode::IRorC, 3, 3, 0, 4),            // r3 >>>= 4
            ins(Opcode::IXorC8, 4, 4, 0, 0xFFFF_FFFF), // r4 ^= -1
            ins(Opcode::IMulRcp, 5, 5, 0, 1),          // r5 *= table[1]
        ]);
        let mut r = [1, 3, 100, 0x10, 0, 2, 0, 0];
        execute(&program, &mut r, &[0, 7]);
        assert_eq!(r[0], 13);
        assert_eq!(r[2], 87);
        assert_eq!(r[3], 1);
        assert_eq!(r[4], u64::MAX);
        assert_eq!(r[5], 14);
    }
}
