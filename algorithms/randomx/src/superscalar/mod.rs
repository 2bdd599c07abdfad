//! SuperscalarHash
//!
//! Random programs tuned to saturate a modern out-of-order x86 core. Eight of
//! them, generated from the cache key, turn cache lines into dataset items.

mod cpu;
mod executor;
mod generator;
mod instructions;
mod observer;
mod program;

pub use executor::{execute, mulh, reciprocal, sign_extend, smulh};
pub use generator::generate;
pub use instructions::{Instruction, Opcode};
pub use observer::{DiscardReason, GeneratorObserver, NoopObserver, TracingObserver};
pub use program::SuperscalarProgram;

use crate::blake2_generator::Blake2Generator;

impl SuperscalarProgram {
    /// Generate a program from `gen` without observation.
    pub fn generate(gen: &mut Blake2Generator) -> Self {
        generate(gen, &mut NoopObserver)
    }

    /// Execute the program over `registers`.
    pub fn execute(&self, registers: &mut [u64; 8], reciprocals: &[u64]) {
        execute(self, registers, reciprocals);
    }
}
