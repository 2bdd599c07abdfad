//! Superscalar instruction set and the macro-op shape of each instruction.

use super::cpu::MacroOp;

/// Superscalar opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `dst -= src`
    ISubR,
    /// `dst ^= src`
    IXorR,
    /// `dst += src << shift`
    IAddRs,
    /// `dst *= src`
    IMulR,
    /// `dst = dst >>> imm`
    IRorC,
    /// `dst += imm` (7-byte encoding)
    IAddC7,
    /// `dst ^= imm` (7-byte encoding)
    IXorC7,
    /// `dst += imm` (8-byte encoding)
    IAddC8,
    /// `dst ^= imm` (8-byte encoding)
    IXorC8,
    /// `dst += imm` (9-byte encoding)
    IAddC9,
    /// `dst ^= imm` (9-byte encoding)
    IXorC9,
    /// High 64 bits of the unsigned 128-bit product.
    IMulHR,
    /// High 64 bits of the signed 128-bit product.
    ISMulHR,
    /// `dst *= reciprocal(imm)`
    IMulRcp,
}

impl Opcode {
    /// Whether the instruction occupies the multiplication port.
    pub const fn is_multiplication(self) -> bool {
        matches!(self, Self::IMulR | Self::IMulHR | Self::ISMulHR | Self::IMulRcp)
    }

    pub(crate) const fn info(self) -> &'static InstructionInfo {
        match self {
            Self::ISubR => &InstructionInfo::ISUB_R,
            Self::IXorR => &InstructionInfo::IXOR_R,
            Self::IAddRs => &InstructionInfo::IADD_RS,
            Self::IMulR => &InstructionInfo::IMUL_R,
            Self::IRorC => &InstructionInfo::IROR_C,
            Self::IAddC7 | Self::IAddC8 | Self::IAddC9 => &InstructionInfo::IADD_C,
            Self::IXorC7 | Self::IXorC8 | Self::IXorC9 => &InstructionInfo::IXOR_C,
            Self::IMulHR => &InstructionInfo::IMULH_R,
            Self::ISMulHR => &InstructionInfo::ISMULH_R,
            Self::IMulRcp => &InstructionInfo::IMUL_RCP,
        }
    }
}

/// Macro-ops an instruction decodes to and which of them touch operands.
#[derive(Debug)]
pub(crate) struct InstructionInfo {
    pub ops: &'static [MacroOp],
    /// Macro-op that produces the destination value.
    pub result_op: usize,
    /// Macro-op at which the destination register is chosen.
    pub dst_op: usize,
    /// Macro-op at which the source register is chosen (`None`: immediate form).
    pub src_op: Option<usize>,
}

impl InstructionInfo {
    /// One macro-op that reads and writes its operands.
    const fn register_form(op: &'static [MacroOp; 1]) -> Self {
        Self {
            ops: op,
            result_op: 0,
            dst_op: 0,
            src_op: Some(0),
        }
    }

    /// One macro-op with an immediate operand.
    const fn immediate_form(op: &'static [MacroOp; 1]) -> Self {
        Self {
            ops: op,
            result_op: 0,
            dst_op: 0,
            src_op: None,
        }
    }

    const ISUB_R: Self = Self::register_form(&[MacroOp::SUB_RR]);
    const IXOR_R: Self = Self::register_form(&[MacroOp::XOR_RR]);
    const IADD_RS: Self = Self::register_form(&[MacroOp::LEA_SIB]);
    const IMUL_R: Self = Self::register_form(&[MacroOp::IMUL_RR]);
    const IROR_C: Self = Self::immediate_form(&[MacroOp::ROR_RI]);
    const IADD_C: Self = Self::immediate_form(&[MacroOp::ADD_RI]);
    const IXOR_C: Self = Self::immediate_form(&[MacroOp::XOR_RI]);
    const IMULH_R: Self = Self {
        ops: &[MacroOp::MOV_RR, MacroOp::MUL_R, MacroOp::MOV_RR],
        result_op: 1,
        dst_op: 0,
        src_op: Some(1),
    };
    const ISMULH_R: Self = Self {
        ops: &[MacroOp::MOV_RR, MacroOp::IMUL_R, MacroOp::MOV_RR],
        result_op: 1,
        dst_op: 0,
        src_op: Some(1),
    };
    const IMUL_RCP: Self = Self {
        ops: &[MacroOp::MOV_RI64, MacroOp::IMUL_RR_DEPENDENT],
        result_op: 1,
        dst_op: 1,
        src_op: None,
    };
}

/// A generated superscalar instruction.
///
/// For `IMulRcp`, `imm32` holds the divisor while generating and is rewritten
/// to an index into the owning cache's reciprocal table afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Operation.
    pub opcode: Opcode,
    /// Destination register.
    pub dst: u8,
    /// Source register (equals `dst` for immediate forms).
    pub src: u8,
    /// Modifier byte; bits 2..4 carry the `IAddRs` shift.
    pub modifier: u8,
    /// Immediate.
    pub imm32: u32,
}

impl Instruction {
    /// Shift amount used by `IAddRs`.
    pub const fn mod_shift(&self) -> u32 {
        ((self.modifier >> 2) & 3) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(Opcode::IMulHR.info().ops.len(), 3);
        assert_eq!(Opcode::IMulRcp.info().ops.len(), 2);
        assert_eq!(Opcode::IMulRcp.info().src_op, None);
        assert_eq!(Opcode::ISubR.info().src_op, Some(0));
        assert_eq!(Opcode::IRorC.info().src_op, None);
        assert_eq!(Opcode::IXorC9.info().ops[0], MacroOp::XOR_RI);
    }

    #[test]
    fn test_mod_shift() {
        let instr = Instruction {
            opcode: Opcode::IAddRs,
            dst: 0,
            src: 1,
            modifier: 0b1110_1100,
            imm32: 0,
        };
        assert_eq!(instr.mod_shift(), 3);
    }
}
