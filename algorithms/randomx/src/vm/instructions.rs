//! VM instruction set.
//!
//! Raw instructions are compiled once per program into [`Op`] bytecode with
//! registers, masks and immediates resolved, then interpreted for every
//! iteration of the program loop.

use super::float::{self, RoundingMode};
use super::program::RawInstruction;
use super::registers::{FloatPair, RegisterFile};
use super::scratchpad::Scratchpad;
use crate::kernels::constants::{
    CONDITION_MASK, JUMP_OFFSET, REGISTER_COUNT, REGISTER_COUNT_FLT, REGISTER_NEEDS_DISPLACEMENT,
    SCALE_MASK, SCRATCHPAD_L1_MASK, SCRATCHPAD_L2_MASK, SCRATCHPAD_L3_MASK, STORE_L3_CONDITION,
};
use crate::superscalar::{mulh, reciprocal, sign_extend, smulh};

// =============================================================================
// OPCODE TABLE
// =============================================================================

/// Instruction kinds, in opcode-range order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    IAddRs,
    IAddM,
    ISubR,
    ISubM,
    IMulR,
    IMulM,
    IMulhR,
    IMulhM,
    ISMulhR,
    ISMulhM,
    IMulRcp,
    INegR,
    IXorR,
    IXorM,
    IRorR,
    IRolR,
    ISwapR,
    FSwapR,
    FAddR,
    FAddM,
    FSubR,
    FSubM,
    FScalR,
    FMulR,
    FDivM,
    FSqrtR,
    CBranch,
    CFround,
    IStore,
    Nop,
}

/// Number of opcode values mapped to each kind (sums to 256).
const FREQUENCIES: [(InstructionKind, usize); 30] = [
    (InstructionKind::IAddRs, 16),
    (InstructionKind::IAddM, 7),
    (InstructionKind::ISubR, 16),
    (InstructionKind::ISubM, 7),
    (InstructionKind::IMulR, 16),
    (InstructionKind::IMulM, 4),
    (InstructionKind::IMulhR, 4),
    (InstructionKind::IMulhM, 1),
    (InstructionKind::ISMulhR, 4),
    (InstructionKind::ISMulhM, 1),
    (InstructionKind::IMulRcp, 8),
    (InstructionKind::INegR, 2),
    (InstructionKind::IXorR, 15),
    (InstructionKind::IXorM, 5),
    (InstructionKind::IRorR, 8),
    (InstructionKind::IRolR, 2),
    (InstructionKind::ISwapR, 4),
    (InstructionKind::FSwapR, 4),
    (InstructionKind::FAddR, 16),
    (InstructionKind::FAddM, 5),
    (InstructionKind::FSubR, 16),
    (InstructionKind::FSubM, 5),
    (InstructionKind::FScalR, 6),
    (InstructionKind::FMulR, 32),
    (InstructionKind::FDivM, 4),
    (InstructionKind::FSqrtR, 6),
    (InstructionKind::CBranch, 25),
    (InstructionKind::CFround, 1),
    (InstructionKind::IStore, 16),
    (InstructionKind::Nop, 0),
];

const OPCODE_TABLE: [InstructionKind; 256] = build_opcode_table();

const fn build_opcode_table() -> [InstructionKind; 256] {
    let mut table = [InstructionKind::Nop; 256];
    let mut opcode = 0;
    let mut k = 0;
    while k < FREQUENCIES.len() {
        let (kind, count) = FREQUENCIES[k];
        let end = opcode + count;
        while opcode < end {
            table[opcode] = kind;
            opcode += 1;
        }
        k += 1;
    }
    assert!(opcode == 256);
    table
}

impl InstructionKind {
    /// Kind selected by an opcode byte.
    #[inline]
    pub const fn from_opcode(opcode: u8) -> Self {
        OPCODE_TABLE[opcode as usize]
    }
}

// =============================================================================
// BYTECODE
// =============================================================================

/// Second operand of a register-register integer instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Integer register.
    Reg(usize),
    /// Sign-extended immediate (used when `src == dst`).
    Imm(u64),
}

impl Source {
    #[inline]
    const fn value(self, r: &[u64; REGISTER_COUNT]) -> u64 {
        match self {
            Self::Reg(src) => r[src],
            Self::Imm(imm) => imm,
        }
    }
}

/// Scratchpad address: `(base + imm) & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    base: Option<usize>,
    imm: u64,
    mask: u64,
}

impl Address {
    #[inline]
    const fn resolve(self, r: &[u64; REGISTER_COUNT]) -> usize {
        let base = match self.base {
            Some(reg) => r[reg],
            None => 0,
        };
        (base.wrapping_add(self.imm) & self.mask) as usize
    }
}

/// A decoded instruction with its operands resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub enum Op {
    IAddRs { dst: usize, src: usize, shift: u32, imm: u64 },
    IAddM { dst: usize, addr: Address },
    ISubR { dst: usize, src: Source },
    ISubM { dst: usize, addr: Address },
    IMulR { dst: usize, src: Source },
    IMulM { dst: usize, addr: Address },
    IMulhR { dst: usize, src: usize },
    IMulhM { dst: usize, addr: Address },
    ISMulhR { dst: usize, src: usize },
    ISMulhM { dst: usize, addr: Address },
    IMulRcp { dst: usize, rcp: u64 },
    INegR { dst: usize },
    IXorR { dst: usize, src: Source },
    IXorM { dst: usize, addr: Address },
    IRorR { dst: usize, src: Source },
    IRolR { dst: usize, src: Source },
    ISwapR { dst: usize, src: usize },
    /// `reg < 4` selects `f[reg]`, otherwise `e[reg - 4]`.
    FSwapR { reg: usize },
    FAddR { dst: usize, src: usize },
    FAddM { dst: usize, addr: Address },
    FSubR { dst: usize, src: usize },
    FSubM { dst: usize, addr: Address },
    FScalR { dst: usize },
    FMulR { dst: usize, src: usize },
    FDivM { dst: usize, addr: Address },
    FSqrtR { dst: usize },
    /// Add `imm`; jump to `target` if the bits under `mask` are all zero.
    CBranch { reg: usize, imm: u64, mask: u64, target: usize },
    CFround { src: usize, rotate: u32 },
    IStore { src: usize, addr: Address },
    Nop,
}

const fn memory_operand(instr: &RawInstruction, dst: usize, src: usize) -> Address {
    let imm = sign_extend(instr.imm32);
    if src == dst {
        Address {
            base: None,
            imm,
            mask: SCRATCHPAD_L3_MASK,
        }
    } else {
        float_memory_operand(instr, src)
    }
}

const fn float_memory_operand(instr: &RawInstruction, src: usize) -> Address {
    Address {
        base: Some(src),
        imm: sign_extend(instr.imm32),
        mask: if instr.mod_mem() == 0 {
            SCRATCHPAD_L2_MASK
        } else {
            SCRATCHPAD_L1_MASK
        },
    }
}

const fn register_or_imm(instr: &RawInstruction, dst: usize, src: usize) -> Source {
    if src == dst {
        Source::Imm(sign_extend(instr.imm32))
    } else {
        Source::Reg(src)
    }
}

/// Compile a program into bytecode.
///
/// Branch targets resolve to the instruction after the last one that wrote
/// the condition register (or the start of the program).
pub fn compile(instructions: &[RawInstruction]) -> Vec<Op> {
    let mut last_write: [Option<usize>; REGISTER_COUNT] = [None; REGISTER_COUNT];
    let mut ops = Vec::with_capacity(instructions.len());

    for (index, instr) in instructions.iter().enumerate() {
        let dst = instr.dst as usize % REGISTER_COUNT;
        let src = instr.src as usize % REGISTER_COUNT;
        let fdst = instr.dst as usize % REGISTER_COUNT_FLT;
        let fsrc = instr.src as usize % REGISTER_COUNT_FLT;

        let op = match InstructionKind::from_opcode(instr.opcode) {
            InstructionKind::IAddRs => Op::IAddRs {
                dst,
                src,
                shift: u32::from(instr.mod_shift()),
                imm: if dst == REGISTER_NEEDS_DISPLACEMENT {
                    sign_extend(instr.imm32)
                } else {
                    0
                },
            },
            InstructionKind::IAddM => Op::IAddM {
                dst,
                addr: memory_operand(instr, dst, src),
            },
            InstructionKind::ISubR => Op::ISubR {
                dst,
                src: register_or_imm(instr, dst, src),
            },
            InstructionKind::ISubM => Op::ISubM {
                dst,
                addr: memory_operand(instr, dst, src),
            },
            InstructionKind::IMulR => Op::IMulR {
                dst,
                src: register_or_imm(instr, dst, src),
            },
            InstructionKind::IMulM => Op::IMulM {
                dst,
                addr: memory_operand(instr, dst, src),
            },
            InstructionKind::IMulhR => Op::IMulhR { dst, src },
            InstructionKind::IMulhM => Op::IMulhM {
                dst,
                addr: memory_operand(instr, dst, src),
            },
            InstructionKind::ISMulhR => Op::ISMulhR { dst, src },
            InstructionKind::ISMulhM => Op::ISMulhM {
                dst,
                addr: memory_operand(instr, dst, src),
            },
            InstructionKind::IMulRcp => {
                if instr.imm32 == 0 || instr.imm32.is_power_of_two() {
                    ops.push(Op::Nop);
                    continue;
                }
                Op::IMulRcp {
                    dst,
                    rcp: reciprocal(instr.imm32),
                }
            }
            InstructionKind::INegR => Op::INegR { dst },
            InstructionKind::IXorR => Op::IXorR {
                dst,
                src: register_or_imm(instr, dst, src),
            },
            InstructionKind::IXorM => Op::IXorM {
                dst,
                addr: memory_operand(instr, dst, src),
            },
            InstructionKind::IRorR => Op::IRorR {
                dst,
                src: register_or_imm(instr, dst, src),
            },
            InstructionKind::IRolR => Op::IRolR {
                dst,
                src: register_or_imm(instr, dst, src),
            },
            InstructionKind::ISwapR => {
                if src == dst {
                    ops.push(Op::Nop);
                    continue;
                }
                last_write[src] = Some(index);
                Op::ISwapR { dst, src }
            }
            InstructionKind::FSwapR => {
                ops.push(Op::FSwapR { reg: dst });
                continue;
            }
            InstructionKind::FAddR => Op::FAddR {
                dst: fdst,
                src: fsrc,
            },
            InstructionKind::FAddM => Op::FAddM {
                dst: fdst,
                addr: float_memory_operand(instr, src),
            },
            InstructionKind::FSubR => Op::FSubR {
                dst: fdst,
                src: fsrc,
            },
            InstructionKind::FSubM => Op::FSubM {
                dst: fdst,
                addr: float_memory_operand(instr, src),
            },
            InstructionKind::FScalR => Op::FScalR { dst: fdst },
            InstructionKind::FMulR => Op::FMulR {
                dst: fdst,
                src: fsrc,
            },
            InstructionKind::FDivM => Op::FDivM {
                dst: fdst,
                addr: float_memory_operand(instr, src),
            },
            InstructionKind::FSqrtR => Op::FSqrtR { dst: fdst },
            InstructionKind::CBranch => {
                let shift = u32::from(instr.mod_cond()) + JUMP_OFFSET;
                let imm = (sign_extend(instr.imm32) | (1 << shift)) & !(1 << (shift - 1));
                let target = last_write[dst].map_or(0, |i| i + 1);
                last_write = [Some(index); REGISTER_COUNT];
                ops.push(Op::CBranch {
                    reg: dst,
                    imm,
                    mask: CONDITION_MASK << shift,
                    target,
                });
                continue;
            }
            InstructionKind::CFround => {
                ops.push(Op::CFround {
                    src,
                    rotate: instr.imm32 & 63,
                });
                continue;
            }
            InstructionKind::IStore => {
                let mask = if instr.mod_cond() >= STORE_L3_CONDITION {
                    SCRATCHPAD_L3_MASK
                } else if instr.mod_mem() == 0 {
                    SCRATCHPAD_L2_MASK
                } else {
                    SCRATCHPAD_L1_MASK
                };
                ops.push(Op::IStore {
                    src,
                    addr: Address {
                        base: Some(dst),
                        imm: sign_extend(instr.imm32),
                        mask,
                    },
                });
                continue;
            }
            InstructionKind::Nop => {
                ops.push(Op::Nop);
                continue;
            }
        };

        if op.writes_integer_dst() {
            last_write[dst] = Some(index);
        }
        ops.push(op);
    }
    ops
}

impl Op {
    const fn writes_integer_dst(&self) -> bool {
        matches!(
            self,
            Self::IAddRs { .. }
                | Self::IAddM { .. }
                | Self::ISubR { .. }
                | Self::ISubM { .. }
                | Self::IMulR { .. }
                | Self::IMulM { .. }
                | Self::IMulhR { .. }
                | Self::IMulhM { .. }
                | Self::ISMulhR { .. }
                | Self::ISMulhM { .. }
                | Self::IMulRcp { .. }
                | Self::INegR { .. }
                | Self::IXorR { .. }
                | Self::IXorM { .. }
                | Self::IRorR { .. }
                | Self::IRolR { .. }
                | Self::ISwapR { .. }
        )
    }
}

// =============================================================================
// INTERPRETER
// =============================================================================

#[inline]
fn lanes(dst: &mut FloatPair, src: FloatPair, op: impl Fn(f64, f64) -> f64) {
    dst[0] = op(dst[0], src[0]);
    dst[1] = op(dst[1], src[1]);
}

/// Run `ops` once over `regs` and `scratchpad`.
///
/// `mode` is the current rounding mode; `CFROUND` updates it in place.
pub fn execute(
    ops: &[Op],
    regs: &mut RegisterFile,
    scratchpad: &mut Scratchpad,
    e_mask: [u64; 2],
    mode: &mut RoundingMode,
) {
    let RegisterFile { r, f, e, a } = regs;
    let mut pc = 0;

    while pc < ops.len() {
        match ops[pc] {
            Op::IAddRs {
                dst,
                src,
                shift,
                imm,
            } => r[dst] = r[dst].wrapping_add(r[src] << shift).wrapping_add(imm),
            Op::IAddM { dst, addr } => {
                r[dst] = r[dst].wrapping_add(scratchpad.read_u64(addr.resolve(r)));
            }
            Op::ISubR { dst, src } => r[dst] = r[dst].wrapping_sub(src.value(r)),
            Op::ISubM { dst, addr } => {
                r[dst] = r[dst].wrapping_sub(scratchpad.read_u64(addr.resolve(r)));
            }
            Op::IMulR { dst, src } => r[dst] = r[dst].wrapping_mul(src.value(r)),
            Op::IMulM { dst, addr } => {
                r[dst] = r[dst].wrapping_mul(scratchpad.read_u64(addr.resolve(r)));
            }
            Op::IMulhR { dst, src } => r[dst] = mulh(r[dst], r[src]),
            Op::IMulhM { dst, addr } => r[dst] = mulh(r[dst], scratchpad.read_u64(addr.resolve(r))),
            Op::ISMulhR { dst, src } => r[dst] = smulh(r[dst], r[src]),
            Op::ISMulhM { dst, addr } => {
                r[dst] = smulh(r[dst], scratchpad.read_u64(addr.resolve(r)));
            }
            Op::IMulRcp { dst, rcp } => r[dst] = r[dst].wrapping_mul(rcp),
            Op::INegR { dst } => r[dst] = r[dst].wrapping_neg(),
            Op::IXorR { dst, src } => r[dst] ^= src.value(r),
            Op::IXorM { dst, addr } => r[dst] ^= scratchpad.read_u64(addr.resolve(r)),
            Op::IRorR { dst, src } => r[dst] = r[dst].rotate_right((src.value(r) & 63) as u32),
            Op::IRolR { dst, src } => r[dst] = r[dst].rotate_left((src.value(r) & 63) as u32),
            Op::ISwapR { dst, src } => r.swap(dst, src),
            Op::FSwapR { reg } => {
                if reg < REGISTER_COUNT_FLT {
                    f[reg].swap(0, 1);
                } else {
                    e[reg - REGISTER_COUNT_FLT].swap(0, 1);
                }
            }
            Op::FAddR { dst, src } => lanes(&mut f[dst], a[src], |x, y| float::add(x, y, *mode)),
            Op::FAddM { dst, addr } => {
                let value = scratchpad.read_pair(addr.resolve(r));
                lanes(&mut f[dst], value, |x, y| float::add(x, y, *mode));
            }
            Op::FSubR { dst, src } => lanes(&mut f[dst], a[src], |x, y| float::sub(x, y, *mode)),
            Op::FSubM { dst, addr } => {
                let value = scratchpad.read_pair(addr.resolve(r));
                lanes(&mut f[dst], value, |x, y| float::sub(x, y, *mode));
            }
            Op::FScalR { dst } => {
                for x in &mut f[dst] {
                    *x = f64::from_bits(x.to_bits() ^ SCALE_MASK);
                }
            }
            Op::FMulR { dst, src } => lanes(&mut e[dst], a[src], |x, y| float::mul(x, y, *mode)),
            Op::FDivM { dst, addr } => {
                let value = scratchpad.read_pair_masked(addr.resolve(r), e_mask);
                lanes(&mut e[dst], value, |x, y| float::div(x, y, *mode));
            }
            Op::FSqrtR { dst } => {
                for x in &mut e[dst] {
                    *x = float::sqrt(*x, *mode);
                }
            }
            Op::CBranch {
                reg,
                imm,
                mask,
                target,
            } => {
                r[reg] = r[reg].wrapping_add(imm);
                if r[reg] & mask == 0 {
                    pc = target;
                    continue;
                }
            }
            Op::CFround { src, rotate } => {
                *mode = RoundingMode::from_bits(r[src].rotate_right(rotate));
            }
            Op::IStore { src, addr } => scratchpad.write_u64(addr.resolve(r), r[src]),
            Op::Nop => {}
        }
        pc += 1;
    }
}
