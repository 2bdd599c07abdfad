//! Hooks into superscalar program generation.

use super::instructions::{Instruction, Opcode};
use super::program::SuperscalarProgram;

/// Why an instruction candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// No source register was ready within the look-ahead window.
    NoSource,
    /// No destination register satisfied the selection rules.
    NoDestination,
}

/// Receives scheduling events while a program is generated.
///
/// All methods default to no-ops, so an observer only implements the events
/// it cares about. Generation is generic over the observer, so [`NoopObserver`]
/// costs nothing.
pub trait GeneratorObserver {
    /// A decode cycle started with the given buffer layout index.
    fn decode_cycle(&mut self, _cycle: usize, _buffer: usize) {}

    /// A macro-op of `opcode` was committed to `cycle`.
    fn macro_op_scheduled(&mut self, _opcode: Opcode, _op_index: usize, _cycle: usize) {}

    /// A candidate instruction was thrown away.
    fn instruction_discarded(&mut self, _opcode: Opcode, _reason: DiscardReason) {}

    /// An instruction was appended to the program.
    fn instruction_emitted(&mut self, _index: usize, _instruction: &Instruction) {}

    /// Generation stopped because no port could take more work.
    fn ports_saturated(&mut self, _cycle: usize) {}

    /// Generation finished.
    fn program_finished(&mut self, _program: &SuperscalarProgram) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GeneratorObserver for NoopObserver {}

/// Observer that forwards events to `tracing` at `TRACE` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GeneratorObserver for TracingObserver {
    fn decode_cycle(&mut self, cycle: usize, buffer: usize) {
        tracing::trace!(cycle, buffer, "decode cycle");
    }

    fn macro_op_scheduled(&mut self, opcode: Opcode, op_index: usize, cycle: usize) {
        tracing::trace!(?opcode, op_index, cycle, "macro-op scheduled");
    }

    fn instruction_discarded(&mut self, opcode: Opcode, reason: DiscardReason) {
        tracing::trace!(?opcode, ?reason, "instruction discarded");
    }

    fn instruction_emitted(&mut self, index: usize, instruction: &Instruction) {
        tracing::trace!(index, ?instruction, "instruction emitted");
    }

    fn ports_saturated(&mut self, cycle: usize) {
        tracing::trace!(cycle, "execution ports saturated");
    }

    fn program_finished(&mut self, program: &SuperscalarProgram) {
        tracing::debug!(
            size = program.len(),
            address_register = program.address_register(),
            "superscalar program generated"
        );
    }
}
