//! Argon2d memory fill (RandomX parameters).
//!
//! Single lane, 3 passes over 262144 blocks, fixed salt, no secret and no
//! associated data. The filled memory is the result; the usual Argon2 tag
//! finalization is not performed.

mod block;

pub use block::Block;

use crate::blake2_long::{hash_512, hash_long};
use crate::kernels::constants::{
    ARGON_BLOCK_SIZE, ARGON_ITERATIONS, ARGON_LANES, ARGON_MEMORY, ARGON_SALT, ARGON_SYNC_POINTS,
    ARGON_TYPE_D, ARGON_VERSION,
};
use crate::types::Error;
use block::fill_block;

/// Memory-hard fill parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Number of 1 KiB blocks.
    pub memory_blocks: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Salt mixed into `H0`.
    pub salt: &'static [u8],
}

impl Params {
    /// The cache parameters used by every RandomX instance.
    pub const RANDOMX: Self = Self {
        memory_blocks: ARGON_MEMORY,
        iterations: ARGON_ITERATIONS,
        salt: ARGON_SALT,
    };

    const fn segment_length(&self) -> u32 {
        self.memory_blocks / ARGON_SYNC_POINTS
    }
}

/// Fill Argon2d memory for `seed` with the RandomX parameters.
///
/// # Errors
///
/// Returns `Error::EmptySeed` if `seed` is empty.
pub fn fill_memory(seed: &[u8]) -> Result<Vec<Block>, Error> {
    fill_memory_with(seed, &Params::RANDOMX)
}

/// Fill Argon2d memory for `seed` with explicit parameters.
///
/// `params.memory_blocks` must be a multiple of 4 and at least 8.
///
/// # Errors
///
/// Returns `Error::EmptySeed` if `seed` is empty.
pub fn fill_memory_with(seed: &[u8], params: &Params) -> Result<Vec<Block>, Error> {
    if seed.is_empty() {
        return Err(Error::EmptySeed);
    }
    debug_assert!(params.memory_blocks >= 2 * ARGON_SYNC_POINTS);
    debug_assert!(params.memory_blocks.is_multiple_of(ARGON_SYNC_POINTS));

    let mut memory = vec![Block::ZERO; params.memory_blocks as usize];

    let h0 = initial_hash(seed, params);
    fill_first_blocks(&h0, &mut memory);

    for pass in 0..params.iterations {
        for slice in 0..ARGON_SYNC_POINTS {
            fill_segment(&mut memory, params, pass, slice);
        }
    }

    Ok(memory)
}

/// `H0`: Blake2b-512 over the parameter block, password and salt.
fn initial_hash(pwd: &[u8], params: &Params) -> [u8; 64] {
    hash_512(&[
        &ARGON_LANES.to_le_bytes(),
        &0u32.to_le_bytes(), // tag length
        &params.memory_blocks.to_le_bytes(),
        &params.iterations.to_le_bytes(),
        &ARGON_VERSION.to_le_bytes(),
        &ARGON_TYPE_D.to_le_bytes(),
        &(pwd.len() as u32).to_le_bytes(),
        pwd,
        &(params.salt.len() as u32).to_le_bytes(),
        params.salt,
        &0u32.to_le_bytes(), // secret
        &0u32.to_le_bytes(), // associated data
    ])
}

/// Blocks 0 and 1 of the single lane: `H'(H0 || LE32(i) || LE32(lane))`.
fn fill_first_blocks(h0: &[u8; 64], memory: &mut [Block]) {
    let mut input = [0u8; 72];
    input[..64].copy_from_slice(h0);
    let mut bytes = [0u8; ARGON_BLOCK_SIZE];

    for (i, block) in memory.iter_mut().take(2).enumerate() {
        input[64..68].copy_from_slice(&(i as u32).to_le_bytes());
        input[68..72].copy_from_slice(&0u32.to_le_bytes());
        hash_long(&input, &mut bytes);
        *block = Block::from_bytes(&bytes);
    }
}

fn fill_segment(memory: &mut [Block], params: &Params, pass: u32, slice: u32) {
    let lane_length = u64::from(params.memory_blocks);
    let segment_length = params.segment_length();
    let starting_index = if pass == 0 && slice == 0 { 2 } else { 0 };

    let mut curr = u64::from(slice * segment_length + starting_index);
    let mut prev = if curr % lane_length == 0 {
        curr + lane_length - 1
    } else {
        curr - 1
    };

    for index in starting_index..segment_length {
        if curr % lane_length == 1 {
            prev = curr - 1;
        }

        let pseudo_rand = memory[prev as usize].0[0];
        let reference = index_alpha(params, pass, slice, index, pseudo_rand & 0xFFFF_FFFF);

        let prev_block = memory[prev as usize];
        let ref_block = memory[reference as usize];
        fill_block(&prev_block, &ref_block, &mut memory[curr as usize], pass != 0);

        curr += 1;
        prev += 1;
    }
}

/// Map the low 32 bits of `pseudo_rand` onto an already-filled block index.
///
/// Only the same lane exists, so the reference area is every block written
/// so far in this pass plus the finished slices of the previous pass.
fn index_alpha(params: &Params, pass: u32, slice: u32, index: u32, pseudo_rand: u64) -> u64 {
    let lane_length = u64::from(params.memory_blocks);
    let segment_length = u64::from(params.segment_length());
    let (slice, index) = (u64::from(slice), u64::from(index));

    let reference_area_size = if pass == 0 {
        if slice == 0 {
            index - 1
        } else {
            slice * segment_length + index - 1
        }
    } else {
        lane_length - segment_length + index - 1
    };

    let x = (pseudo_rand * pseudo_rand) >> 32;
    let relative_position = reference_area_size - 1 - ((reference_area_size * x) >> 32);

    let start_position = if pass != 0 && slice != u64::from(ARGON_SYNC_POINTS) - 1 {
        (slice + 1) * segment_length
    } else {
        0
    };

    (start_position + relative_position) % lane_length
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SMALL: Params = Params {
        memory_blocks: 64,
        iterations: 2,
        salt: ARGON_SALT,
    };

    #[test]
    fn test_empty_seed_rejected() {
        assert!(matches!(fill_memory_with(b"", &SMALL), Err(Error::EmptySeed)));
    }

    #[test]
    fn test_fill_is_deterministic() {
        let a = fill_memory_with(b"key", &SMALL).unwrap();
        let b = fill_memory_with(b"key", &SMALL).unwrap();
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x.0 == y.0));
    }

    #[test]
    fn test_fill_depends_on_seed() {
        let a = fill_memory_with(b"key", &SMALL).unwrap();
        let b = fill_memory_with(b"kez", &SMALL).unwrap();
        assert_ne!(a[63].0, b[63].0);
    }

    #[test]
    fn test_reference_index_stays_behind_cursor_on_first_pass() {
        let seg = SMALL.segment_length();
        for slice in 0..ARGON_SYNC_POINTS {
            let start = if slice == 0 { 2 } else { 0 };
            for index in start..seg {
                let position = u64::from(slice * seg + index);
                for pr in [0u64, 1, 0x7FFF_FFFF, 0xFFFF_FFFF] {
                    let r = index_alpha(&SMALL, 0, slice, index, pr);
                    assert!(r < position - 1, "slice {slice} index {index}");
                }
            }
        }
    }

    #[test]
    fn test_reference_index_in_range_on_later_passes() {
        let seg = SMALL.segment_length();
        for slice in 0..ARGON_SYNC_POINTS {
            for index in 0..seg {
                for pr in [0u64, 12345, 0xFFFF_FFFF] {
                    let r = index_alpha(&SMALL, 1, slice, index, pr);
                    assert!(r < u64::from(SMALL.memory_blocks));
                }
            }
        }
    }
}
