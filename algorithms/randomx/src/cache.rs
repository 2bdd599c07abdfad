//! Cache: Argon2d memory, superscalar programs and reciprocals for one key.
//!
//! Dataset items are a pure function of the cache and the item index, so the
//! cache alone is enough to verify hashes (light mode).

use std::fmt;
use std::time::Instant;

use zeroize::Zeroize;

use crate::argon2::{self, Block};
use crate::blake2_generator::Blake2Generator;
use crate::kernels::constants::{
    ARGON_QWORDS_IN_BLOCK, CACHE_ACCESSES, CACHE_LINE_COUNT, CACHE_LINE_SIZE, REGISTER_COUNT,
    SUPERSCALAR_ADD, SUPERSCALAR_MUL0,
};
use crate::superscalar::{self, GeneratorObserver, NoopObserver, Opcode, SuperscalarProgram};
use crate::types::Error;

const WORDS_PER_LINE: usize = CACHE_LINE_SIZE / 8;
const LINES_PER_BLOCK: u64 = (ARGON_QWORDS_IN_BLOCK / WORDS_PER_LINE) as u64;

/// A dataset item: one 64-byte cache line worth of registers.
pub type DatasetItem = [u64; REGISTER_COUNT];

/// Immutable per-key state shared by every VM.
pub struct Cache {
    memory: Vec<Block>,
    programs: Vec<SuperscalarProgram>,
    reciprocals: Vec<u64>,
}

impl Cache {
    /// Build the cache for `seed`.
    ///
    /// Fills 256 MiB with Argon2d, then generates the eight superscalar
    /// programs from a `Blake2Generator` seeded with the same key.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySeed` if `seed` is empty.
    pub fn new(seed: &[u8]) -> Result<Self, Error> {
        Self::with_observer(seed, &mut NoopObserver)
    }

    /// Build the cache for `seed`, reporting program generation to `observer`.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySeed` if `seed` is empty.
    pub fn with_observer<O: GeneratorObserver>(seed: &[u8], observer: &mut O) -> Result<Self, Error> {
        let start = Instant::now();
        let memory = argon2::fill_memory(seed)?;
        let fill_elapsed = start.elapsed();

        let mut gen = Blake2Generator::new(seed, 0);
        let mut programs = Vec::with_capacity(CACHE_ACCESSES);
        let mut reciprocals = Vec::new();

        for _ in 0..CACHE_ACCESSES {
            let mut program = superscalar::generate(&mut gen, observer);
            for instr in program.instructions_mut() {
                if instr.opcode == Opcode::IMulRcp {
                    let rcp = superscalar::reciprocal(instr.imm32);
                    instr.imm32 = reciprocals.len() as u32;
                    reciprocals.push(rcp);
                }
            }
            programs.push(program);
        }

        tracing::info!(
            fill_ms = fill_elapsed.as_millis() as u64,
            total_ms = start.elapsed().as_millis() as u64,
            programs = programs.len(),
            reciprocals = reciprocals.len(),
            "cache initialized"
        );

        Ok(Self {
            memory,
            programs,
            reciprocals,
        })
    }

    /// The eight superscalar programs, in execution order.
    pub fn programs(&self) -> &[SuperscalarProgram] {
        &self.programs
    }

    /// Reciprocal table indexed by `IMulRcp` immediates.
    pub fn reciprocals(&self) -> &[u64] {
        &self.reciprocals
    }

    /// 64-bit word `index` of the Argon2d memory (little-endian order).
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the end of the cache.
    pub fn word(&self, index: usize) -> u64 {
        self.memory[index / ARGON_QWORDS_IN_BLOCK].0[index % ARGON_QWORDS_IN_BLOCK]
    }

    /// Cache line selected by the low bits of `address`.
    #[inline]
    fn mix_line(&self, address: u64) -> &[u64] {
        let line = address & (CACHE_LINE_COUNT - 1);
        let block = &self.memory[(line / LINES_PER_BLOCK) as usize];
        let offset = (line % LINES_PER_BLOCK) as usize * WORDS_PER_LINE;
        &block.0[offset..offset + WORDS_PER_LINE]
    }

    /// Compute dataset item `item_number`.
    ///
    /// Registers are seeded from the index, then each program runs and folds
    /// in the cache line addressed by the previous program's address register.
    pub fn dataset_item(&self, item_number: u64) -> DatasetItem {
        let r0 = item_number.wrapping_add(1).wrapping_mul(SUPERSCALAR_MUL0);
        let mut r = [r0; REGISTER_COUNT];
        for (reg, add) in r[1..].iter_mut().zip(SUPERSCALAR_ADD) {
            *reg ^= add;
        }

        let mut address = item_number;
        for program in &self.programs {
            let mix = self.mix_line(address);
            program.execute(&mut r, &self.reciprocals);
            for (reg, word) in r.iter_mut().zip(mix) {
                *reg ^= *word;
            }
            address = r[program.address_register()];
        }
        r
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.memory.zeroize();
        self.reciprocals.zeroize();
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("blocks", &self.memory.len())
            .field(
                "program_sizes",
                &self.programs.iter().map(SuperscalarProgram::len).collect::<Vec<_>>(),
            )
            .field("reciprocals", &self.reciprocals.len())
            .finish()
    }
}
