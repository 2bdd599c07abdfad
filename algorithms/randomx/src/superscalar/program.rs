//! Generated superscalar program and its address register.

use super::instructions::Instruction;
use crate::kernels::constants::REGISTER_COUNT;

/// A generated superscalar program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperscalarProgram {
    instructions: Vec<Instruction>,
    address_register: usize,
}

impl SuperscalarProgram {
    /// Wrap `instructions`, selecting the address register.
    ///
    /// The address register is the one with the longest dependency chain,
    /// assuming unit latency and unlimited parallelism. Ties keep the lower
    /// register index.
    pub(crate) fn new(instructions: Vec<Instruction>) -> Self {
        let mut latencies = [0usize; REGISTER_COUNT];
        for instr in &instructions {
            let dst = instr.dst as usize;
            let src = instr.src as usize;
            let lat_dst = latencies[dst] + 1;
            let lat_src = if dst == src { 0 } else { latencies[src] + 1 };
            latencies[dst] = lat_dst.max(lat_src);
        }

        let mut address_register = 0;
        let mut max_latency = 0;
        for (reg, &lat) in latencies.iter().enumerate() {
            if lat > max_latency {
                max_latency = lat;
                address_register = reg;
            }
        }

        Self {
            instructions,
            address_register,
        }
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    /// Register whose final value selects the next cache line.
    pub const fn address_register(&self) -> usize {
        self.address_register
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superscalar::instructions::Opcode;

    fn op(opcode: Opcode, dst: u8, src: u8) -> Instruction {
        Instruction {
            opcode,
            dst,
            src,
            modifier: 0,
            imm32: 1,
        }
    }

    #[test]
    fn test_address_register_longest_chain() {
        let program = SuperscalarProgram::new(vec![
            op(Opcode::IXorR, 1, 0),
            op(Opcode::IAddC7, 3, 3),
            op(Opcode::ISubR, 2, 1),
            op(Opcode::IRorC, 2, 2),
        ]);
        // r2: chain r1 (1) -> r2 (2) -> r2 (3)
        assert_eq!(program.address_register(), 2);
    }

    #[test]
    fn test_address_register_ties_keep_lowest() {
        let program = SuperscalarProgram::new(vec![op(Opcode::IAddC7, 6, 6), op(Opcode::IAddC7, 4, 4)]);
        assert_eq!(program.address_register(), 4);
    }

    #[test]
    fn test_empty_program_uses_r0() {
        let program = SuperscalarProgram::new(Vec::new());
        assert!(program.is_empty());
        assert_eq!(program.address_register(), 0);
    }
}
