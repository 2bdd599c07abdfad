//! Virtual Machine
//!
//! One `Vm` owns a 2 MiB scratchpad and runs the eight chained random
//! programs of a hash. It holds no key material: the dataset source is passed
//! per call, so a VM can be reused across key rotations.

mod float;
mod instructions;
mod program;
mod registers;
mod scratchpad;

use std::fmt;

use zeroize::Zeroize;

use self::float::RoundingMode;
use self::program::{Program, ProgramConfig};
use self::registers::RegisterFile;
use self::scratchpad::Scratchpad;
use crate::blake2_long;
use crate::dataset::DatasetSource;
use crate::engine::dispatcher::get_best_kernels;
use crate::kernels::constants::{
    CACHE_LINE_ALIGN_MASK, CACHE_LINE_SIZE, HASH_SIZE, PROGRAM_BYTES, PROGRAM_COUNT,
    PROGRAM_ITERATIONS, REGISTER_COUNT_FLT, SCRATCHPAD_L3_MASK64, SEED_HASH_SIZE,
};
use crate::types::AesKernels;

/// A RandomX virtual machine.
pub struct Vm {
    scratchpad: Scratchpad,
    registers: RegisterFile,
    program: Box<[u8; PROGRAM_BYTES]>,
    rounding: RoundingMode,
    kernels: AesKernels,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Create a VM using the fastest AES kernels for this CPU.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kernels(get_best_kernels())
    }

    /// Create a VM with explicit AES kernels.
    #[must_use]
    pub fn with_kernels(kernels: AesKernels) -> Self {
        Self {
            scratchpad: Scratchpad::new(),
            registers: RegisterFile::default(),
            program: Box::new([0; PROGRAM_BYTES]),
            rounding: RoundingMode::Nearest,
            kernels,
        }
    }

    /// Compute the 32-byte hash of `input`, reading dataset items from `source`.
    pub fn calculate_hash(&mut self, input: &[u8], source: &DatasetSource) -> [u8; HASH_SIZE] {
        let mut seed = blake2_long::hash_512(&[input]);
        (self.kernels.fill_1r)(&mut seed, self.scratchpad.as_mut_bytes());
        self.rounding = RoundingMode::Nearest;

        for chain in 0..PROGRAM_COUNT {
            self.run(&seed, source);
            if chain + 1 < PROGRAM_COUNT {
                seed = blake2_long::hash_512(&[&self.registers.to_bytes()]);
            }
        }

        let fingerprint = (self.kernels.hash_1r)(self.scratchpad.as_bytes());
        self.registers.set_a_bytes(&fingerprint);
        blake2_long::hash_256(&self.registers.to_bytes())
    }

    /// Generate one program from `seed` and run its 2048 iterations.
    fn run(&mut self, seed: &[u8; SEED_HASH_SIZE], source: &DatasetSource) {
        (self.kernels.fill_4r)(seed, &mut self.program[..]);
        let program = Program::from_bytes(&self.program);
        let config = ProgramConfig::new(&program);
        let ops = instructions::compile(program.instructions());

        self.registers = RegisterFile {
            a: config.a,
            ..RegisterFile::default()
        };
        let [read0, read1, read2, read3] = config.read_reg;
        let mut mx = config.mx;
        let mut ma = config.ma;
        let mut sp_addr0 = mx;
        let mut sp_addr1 = ma;

        for _ in 0..PROGRAM_ITERATIONS {
            let regs = &mut self.registers;
            let sp_mix = regs.r[read0] ^ regs.r[read1];
            sp_addr0 = (sp_addr0 ^ sp_mix as u32) & SCRATCHPAD_L3_MASK64 as u32;
            sp_addr1 = (sp_addr1 ^ (sp_mix >> 32) as u32) & SCRATCHPAD_L3_MASK64 as u32;
            let (addr0, addr1) = (sp_addr0 as usize, sp_addr1 as usize);

            for (i, reg) in regs.r.iter_mut().enumerate() {
                *reg ^= self.scratchpad.read_u64(addr0 + 8 * i);
            }
            for (i, (f, e)) in regs.f.iter_mut().zip(regs.e.iter_mut()).enumerate() {
                *f = self.scratchpad.read_pair(addr1 + 8 * i);
                *e = self
                    .scratchpad
                    .read_pair_masked(addr1 + 8 * (REGISTER_COUNT_FLT + i), config.e_mask);
            }

            instructions::execute(
                &ops,
                &mut self.registers,
                &mut self.scratchpad,
                config.e_mask,
                &mut self.rounding,
            );

            let regs = &mut self.registers;
            mx ^= (regs.r[read2] ^ regs.r[read3]) as u32;
            mx &= CACHE_LINE_ALIGN_MASK as u32;
            let item = source.item((config.dataset_offset + u64::from(ma)) / CACHE_LINE_SIZE as u64);
            for (reg, word) in regs.r.iter_mut().zip(item) {
                *reg ^= word;
            }
            core::mem::swap(&mut mx, &mut ma);

            for (i, &reg) in regs.r.iter().enumerate() {
                self.scratchpad.write_u64(addr1 + 8 * i, reg);
            }
            for (i, (f, e)) in regs.f.iter_mut().zip(&regs.e).enumerate() {
                *f = [
                    f64::from_bits(f[0].to_bits() ^ e[0].to_bits()),
                    f64::from_bits(f[1].to_bits() ^ e[1].to_bits()),
                ];
                self.scratchpad.write_pair(addr0 + 16 * i, *f);
            }

            sp_addr0 = 0;
            sp_addr1 = 0;
        }
    }
}

impl Vm {
    /// Clear the scratchpad, registers and program bytes.
    fn wipe(&mut self) {
        self.scratchpad.as_mut_bytes().zeroize();
        self.registers.zeroize();
        self.program[..].zeroize();
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("rounding", &self.rounding)
            .field("kernels", &self.kernels)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dispatcher::portable_kernels;

    #[test]
    fn test_wipe_clears_hash_state() {
        let mut vm = Vm::with_kernels(portable_kernels());
        let mut seed = [0x11u8; SEED_HASH_SIZE];
        (vm.kernels.fill_1r)(&mut seed, vm.scratchpad.as_mut_bytes());
        (vm.kernels.fill_4r)(&seed, &mut vm.program[..]);
        vm.registers.r[3] = 0xDEAD_BEEF;
        vm.registers.a[1] = [1.5, -2.25];

        vm.wipe();

        assert!(vm.scratchpad.as_bytes().iter().all(|&b| b == 0));
        assert!(vm.program.iter().all(|&b| b == 0));
        assert_eq!(vm.registers.to_bytes(), [0u8; 256]);
    }
}
