//! Superscalar program generation.
//!
//! Instructions are picked to fill x86 decode groups and scheduled on the
//! simulated ports until the target latency is reached or a port saturates.
//! Every choice consumes bytes from the `Blake2Generator`, so the exact order
//! of draws below is part of the output format.

use super::cpu::{DecoderBuffer, PortMap, LOOK_FORWARD_CYCLES, MAX_THROWAWAY_COUNT};
use super::instructions::{Instruction, InstructionInfo, Opcode};
use super::observer::{DiscardReason, GeneratorObserver};
use super::program::SuperscalarProgram;
use crate::blake2_generator::Blake2Generator;
use crate::kernels::constants::{
    REGISTER_COUNT, REGISTER_NEEDS_DISPLACEMENT, SUPERSCALAR_LATENCY, SUPERSCALAR_MAX_SIZE,
};

// =============================================================================
// REGISTER TRACKING
// =============================================================================

/// Scheduling view of one integer register.
#[derive(Debug, Clone, Copy)]
struct RegisterInfo {
    /// Cycle at which the register value becomes available.
    latency: usize,
    /// Group of the last instruction that wrote the register.
    last_op_group: Option<Opcode>,
    /// Parameter of that instruction (source register, random tag or -1).
    last_op_par: i32,
}

impl Default for RegisterInfo {
    fn default() -> Self {
        Self {
            latency: 0,
            last_op_group: None,
            last_op_par: -1,
        }
    }
}

/// Pick one of `available` (uniformly when more than one).
fn select_register(available: &[u8], gen: &mut Blake2Generator) -> Option<u8> {
    match available.len() {
        0 => None,
        1 => Some(available[0]),
        n => Some(available[gen.next_u32() as usize % n]),
    }
}

// =============================================================================
// CANDIDATE INSTRUCTION
// =============================================================================

/// Instruction being decoded: operands are filled in as its macro-ops issue.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    opcode: Opcode,
    info: &'static InstructionInfo,
    src: Option<u8>,
    dst: Option<u8>,
    modifier: u8,
    imm32: u32,
    /// Operation class used to reject redundant sequences on one register.
    group: Opcode,
    group_par: i32,
    /// Destination may equal the source.
    can_reuse: bool,
    group_par_is_source: bool,
}

const SLOT_3: [Opcode; 2] = [Opcode::ISubR, Opcode::IXorR];
const SLOT_3L: [Opcode; 4] = [Opcode::ISubR, Opcode::IXorR, Opcode::IMulHR, Opcode::ISMulHR];
const SLOT_4: [Opcode; 2] = [Opcode::IRorC, Opcode::IAddRs];
const SLOT_7: [Opcode; 2] = [Opcode::IXorC7, Opcode::IAddC7];
const SLOT_8: [Opcode; 2] = [Opcode::IXorC8, Opcode::IAddC8];
const SLOT_9: [Opcode; 2] = [Opcode::IXorC9, Opcode::IAddC9];

const fn is_zero_or_power_of_2(x: u32) -> bool {
    x & x.wrapping_sub(1) == 0
}

impl Candidate {
    /// Pick an instruction whose first macro-op fits a slot of `slot_size` bytes.
    fn for_slot(gen: &mut Blake2Generator, slot_size: usize, buffer: usize, is_last: bool) -> Self {
        let opcode = match slot_size {
            3 if is_last => SLOT_3L[(gen.next_u8() & 3) as usize],
            3 => SLOT_3[(gen.next_u8() & 1) as usize],
            // The 4-4-4-4 group issues multiplications in its first three slots.
            4 if buffer == DecoderBuffer::B4444.index && !is_last => Opcode::IMulR,
            4 => SLOT_4[(gen.next_u8() & 1) as usize],
            7 => SLOT_7[(gen.next_u8() & 1) as usize],
            8 => SLOT_8[(gen.next_u8() & 1) as usize],
            9 => SLOT_9[(gen.next_u8() & 1) as usize],
            _ => Opcode::IMulRcp,
        };
        Self::create(opcode, gen)
    }

    fn create(opcode: Opcode, gen: &mut Blake2Generator) -> Self {
        let mut c = Self {
            opcode,
            info: opcode.info(),
            src: None,
            dst: None,
            modifier: 0,
            imm32: 0,
            group: opcode,
            group_par: -1,
            can_reuse: false,
            group_par_is_source: false,
        };

        match opcode {
            Opcode::ISubR => {
                c.group = Opcode::IAddRs;
                c.group_par_is_source = true;
            }
            Opcode::IXorR | Opcode::IMulR => {
                c.group_par_is_source = true;
            }
            Opcode::IAddRs => {
                c.modifier = gen.next_u8();
                c.group_par_is_source = true;
            }
            Opcode::IRorC => loop {
                c.imm32 = u32::from(gen.next_u8() & 63);
                if c.imm32 != 0 {
                    break;
                }
            },
            Opcode::IAddC7 | Opcode::IAddC8 | Opcode::IAddC9 => {
                c.imm32 = gen.next_u32();
                c.group = Opcode::IAddC7;
            }
            Opcode::IXorC7 | Opcode::IXorC8 | Opcode::IXorC9 => {
                c.imm32 = gen.next_u32();
                c.group = Opcode::IXorC7;
            }
            Opcode::IMulHR | Opcode::ISMulHR => {
                c.can_reuse = true;
                c.group_par = gen.next_u32() as i32;
            }
            Opcode::IMulRcp => loop {
                c.imm32 = gen.next_u32();
                if !is_zero_or_power_of_2(c.imm32) {
                    break;
                }
            },
        }
        c
    }

    fn select_source(
        &mut self,
        cycle: usize,
        registers: &[RegisterInfo; REGISTER_COUNT],
        gen: &mut Blake2Generator,
    ) -> bool {
        let mut available = [0u8; REGISTER_COUNT];
        let mut n = 0;
        for (i, reg) in registers.iter().enumerate() {
            if reg.latency <= cycle {
                available[n] = i as u8;
                n += 1;
            }
        }

        // r5 cannot be an IADD_RS destination: with only two candidates, take it as the source.
        let r5 = REGISTER_NEEDS_DISPLACEMENT as u8;
        if n == 2 && self.opcode == Opcode::IAddRs && available[..2].contains(&r5) {
            self.src = Some(r5);
            self.group_par = i32::from(r5);
            return true;
        }

        match select_register(&available[..n], gen) {
            Some(reg) => {
                self.src = Some(reg);
                if self.group_par_is_source {
                    self.group_par = i32::from(reg);
                }
                true
            }
            None => false,
        }
    }

    fn select_destination(
        &mut self,
        cycle: usize,
        allow_chained_mul: bool,
        registers: &[RegisterInfo; REGISTER_COUNT],
        gen: &mut Blake2Generator,
    ) -> bool {
        let mut available = [0u8; REGISTER_COUNT];
        let mut n = 0;
        for (i, reg) in registers.iter().enumerate() {
            let index = i as u8;
            let ready = reg.latency <= cycle;
            let distinct = self.can_reuse || self.src != Some(index);
            let no_chained_mul = allow_chained_mul
                || self.group != Opcode::IMulR
                || reg.last_op_group != Some(Opcode::IMulR);
            let not_repeated =
                reg.last_op_group != Some(self.group) || reg.last_op_par != self.group_par;
            let encodable = self.opcode != Opcode::IAddRs || i != REGISTER_NEEDS_DISPLACEMENT;

            if ready && distinct && no_chained_mul && not_repeated && encodable {
                available[n] = index;
                n += 1;
            }
        }

        match select_register(&available[..n], gen) {
            Some(reg) => {
                self.dst = Some(reg);
                true
            }
            None => false,
        }
    }

    fn to_instruction(&self) -> Instruction {
        debug_assert!(self.dst.is_some());
        let dst = self.dst.unwrap_or_default();
        Instruction {
            opcode: self.opcode,
            dst,
            src: self.src.unwrap_or(dst),
            modifier: self.modifier,
            imm32: self.imm32,
        }
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Decode group layout for the next cycle.
fn fetch_next(
    current: Option<Opcode>,
    decode_cycle: usize,
    mul_count: usize,
    gen: &mut Blake2Generator,
) -> DecoderBuffer {
    match current {
        // 128-bit multiplications decode to 2 uops; the next group must be 3-3-10.
        Some(Opcode::IMulHR | Opcode::ISMulHR) => DecoderBuffer::B3310,
        // Keep the multiplier saturated.
        _ if mul_count < decode_cycle + 1 => DecoderBuffer::B4444,
        // IMUL_RCP continues into a 4-byte slot.
        Some(Opcode::IMulRcp) => {
            if gen.next_u8() & 1 == 1 {
                DecoderBuffer::B484
            } else {
                DecoderBuffer::B493
            }
        }
        _ => DecoderBuffer::RANDOM[(gen.next_u8() & 3) as usize],
    }
}

/// Generate one superscalar program from `gen`, reporting to `observer`.
pub fn generate<O: GeneratorObserver>(
    gen: &mut Blake2Generator,
    observer: &mut O,
) -> SuperscalarProgram {
    let mut ports = PortMap::new();
    let mut registers = [RegisterInfo::default(); REGISTER_COUNT];
    let mut instructions: Vec<Instruction> = Vec::with_capacity(SUPERSCALAR_MAX_SIZE);

    let mut current: Option<Candidate> = None;
    let mut macro_op_index = 0usize;
    let mut cycle = 0usize;
    let mut dep_cycle = 0usize;
    let mut ports_saturated = false;
    let mut mul_count = 0usize;
    let mut throw_away_count = 0usize;
    let mut decode_cycle = 0usize;

    while decode_cycle < SUPERSCALAR_LATENCY
        && !ports_saturated
        && instructions.len() < SUPERSCALAR_MAX_SIZE
    {
        let buffer = fetch_next(current.map(|c| c.opcode), decode_cycle, mul_count, gen);
        observer.decode_cycle(decode_cycle, buffer.index);

        let mut buffer_index = 0;
        while buffer_index < buffer.len() {
            let top_cycle = cycle;

            let op_count = current.map_or(0, |c| c.info.ops.len());
            if macro_op_index >= op_count {
                if ports_saturated || instructions.len() >= SUPERSCALAR_MAX_SIZE {
                    break;
                }
                let is_last = buffer.len() == buffer_index + 1;
                current = Some(Candidate::for_slot(
                    gen,
                    buffer.slots[buffer_index],
                    buffer.index,
                    is_last,
                ));
                macro_op_index = 0;
            }
            let Some(instr) = current.as_mut() else {
                break;
            };
            let mop = instr.info.ops[macro_op_index];

            // Earliest cycle at which the macro-op could run, ignoring operands.
            let Some(mut schedule_cycle) = ports.schedule_mop(&mop, cycle, dep_cycle, false) else {
                ports_saturated = true;
                observer.ports_saturated(cycle);
                break;
            };

            if instr.info.src_op == Some(macro_op_index) {
                let mut forward = 0;
                while forward < LOOK_FORWARD_CYCLES
                    && !instr.select_source(schedule_cycle, &registers, gen)
                {
                    schedule_cycle += 1;
                    cycle += 1;
                    forward += 1;
                }
                if forward == LOOK_FORWARD_CYCLES {
                    observer.instruction_discarded(instr.opcode, DiscardReason::NoSource);
                    if throw_away_count < MAX_THROWAWAY_COUNT {
                        throw_away_count += 1;
                        macro_op_index = instr.info.ops.len();
                        continue;
                    }
                    current = None;
                    break;
                }
            }

            if instr.info.dst_op == macro_op_index {
                let mut forward = 0;
                while forward < LOOK_FORWARD_CYCLES
                    && !instr.select_destination(
                        schedule_cycle,
                        throw_away_count > 0,
                        &registers,
                        gen,
                    )
                {
                    schedule_cycle += 1;
                    cycle += 1;
                    forward += 1;
                }
                if forward == LOOK_FORWARD_CYCLES {
                    observer.instruction_discarded(instr.opcode, DiscardReason::NoDestination);
                    if throw_away_count < MAX_THROWAWAY_COUNT {
                        throw_away_count += 1;
                        macro_op_index = instr.info.ops.len();
                        continue;
                    }
                    current = None;
                    break;
                }
            }
            throw_away_count = 0;

            // Commit with operand availability taken into account.
            let Some(schedule_cycle) =
                ports.schedule_mop(&mop, schedule_cycle, schedule_cycle, true)
            else {
                ports_saturated = true;
                observer.ports_saturated(schedule_cycle);
                break;
            };
            observer.macro_op_scheduled(instr.opcode, macro_op_index, schedule_cycle);

            dep_cycle = schedule_cycle + usize::from(mop.latency);

            if macro_op_index == instr.info.result_op {
                if let Some(dst) = instr.dst {
                    let reg = &mut registers[dst as usize];
                    reg.latency = dep_cycle;
                    reg.last_op_group = Some(instr.group);
                    reg.last_op_par = instr.group_par;
                }
            }

            buffer_index += 1;
            macro_op_index += 1;

            if schedule_cycle >= SUPERSCALAR_LATENCY {
                ports_saturated = true;
                observer.ports_saturated(schedule_cycle);
            }
            cycle = top_cycle;

            if macro_op_index >= instr.info.ops.len() {
                let emitted = instr.to_instruction();
                observer.instruction_emitted(instructions.len(), &emitted);
                instructions.push(emitted);
                mul_count += usize::from(instr.opcode.is_multiplication());
            }
        }

        cycle += 1;
        decode_cycle += 1;
    }

    let program = SuperscalarProgram::new(instructions);
    observer.program_finished(&program);
    program
}
