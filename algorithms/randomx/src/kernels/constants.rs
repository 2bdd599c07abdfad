//! RandomX Algorithm Constants
//!
//! Every value here is part of the consensus definition: changing any of them
//! produces digests no other RandomX node will accept.
//!
//! Grouped by the stage that consumes them:
//!   Argon2d cache fill, `SuperscalarHash`, dataset layout, VM / scratchpad,
//!   AES generators and the final hash.

// =============================================================================
// ARGON2D CACHE
// =============================================================================

/// Number of 1 KiB blocks filled by Argon2d (256 MiB).
pub const ARGON_MEMORY: u32 = 262_144;

/// Number of Argon2d passes over the memory.
pub const ARGON_ITERATIONS: u32 = 3;

/// Number of Argon2d lanes.
pub const ARGON_LANES: u32 = 1;

/// Argon2 version byte (1.3).
pub const ARGON_VERSION: u32 = 0x13;

/// Argon2 type identifier for Argon2d.
pub const ARGON_TYPE_D: u32 = 0;

/// Fixed 8-byte Argon2 salt.
pub const ARGON_SALT: &[u8; 8] = b"RandomX\x03";

/// Argon2 synchronization points (slices) per pass.
pub const ARGON_SYNC_POINTS: u32 = 4;

/// Argon2 block size in bytes.
pub const ARGON_BLOCK_SIZE: usize = 1024;

/// Argon2 block size in 64-bit words.
pub const ARGON_QWORDS_IN_BLOCK: usize = ARGON_BLOCK_SIZE / 8;

/// Total cache size in bytes.
pub const CACHE_SIZE: usize = ARGON_MEMORY as usize * ARGON_BLOCK_SIZE;

// =============================================================================
// SUPERSCALAR HASH
// =============================================================================

/// Number of superscalar programs (and cache accesses) per dataset item.
pub const CACHE_ACCESSES: usize = 8;

/// Target latency of a superscalar program, in simulated cycles.
pub const SUPERSCALAR_LATENCY: usize = 170;

/// Upper bound on the number of instructions in a superscalar program.
pub const SUPERSCALAR_MAX_SIZE: usize = 3 * SUPERSCALAR_LATENCY + 2;

/// Maximum seed bytes consumed by the Blake2 byte generator.
pub const GENERATOR_MAX_SEED_SIZE: usize = 60;

/// Register that cannot be the destination of `IADD_RS` (x86 `lea` limitation).
pub const REGISTER_NEEDS_DISPLACEMENT: usize = 5;

/// Multiplier decorrelating adjacent dataset item indices.
pub const SUPERSCALAR_MUL0: u64 = 6_364_136_223_846_793_005;

/// Register seeds r1..r7 for dataset item generation.
pub const SUPERSCALAR_ADD: [u64; 7] = [
    9_298_411_001_130_361_340,
    12_065_312_585_734_608_966,
    9_306_329_213_124_626_780,
    5_281_919_268_842_080_866,
    10_536_153_434_571_861_004,
    3_398_623_926_847_679_864,
    9_549_104_520_008_361_294,
];

// =============================================================================
// DATASET
// =============================================================================

/// Size of one dataset item (a cache line).
pub const CACHE_LINE_SIZE: usize = 64;

/// Mask aligning an address to a cache line.
pub const CACHE_LINE_ALIGN_MASK: u64 = !(CACHE_LINE_SIZE as u64 - 1) & (DATASET_BASE_SIZE - 1);

/// Base dataset size in bytes (2 GiB).
pub const DATASET_BASE_SIZE: u64 = 2_147_483_648;

/// Extra dataset size in bytes appended to the base size.
pub const DATASET_EXTRA_SIZE: u64 = 33_554_368;

/// Number of extra items reachable through the per-program dataset offset.
pub const DATASET_EXTRA_ITEMS: u64 = DATASET_EXTRA_SIZE / CACHE_LINE_SIZE as u64;

/// Total number of dataset items.
pub const DATASET_ITEM_COUNT: u64 = (DATASET_BASE_SIZE + DATASET_EXTRA_SIZE) / CACHE_LINE_SIZE as u64;

/// Number of cache lines in the cache (used to mask mix-block addresses).
pub const CACHE_LINE_COUNT: u64 = (CACHE_SIZE / CACHE_LINE_SIZE) as u64;

// =============================================================================
// VIRTUAL MACHINE
// =============================================================================

/// Number of VM programs chained per hash.
pub const PROGRAM_COUNT: usize = 8;

/// Iterations of each VM program.
pub const PROGRAM_ITERATIONS: usize = 2048;

/// Instructions per VM program.
pub const PROGRAM_SIZE: usize = 256;

/// Size of one encoded VM instruction.
pub const INSTRUCTION_SIZE: usize = 8;

/// Bytes of entropy preceding the instructions of a VM program.
pub const PROGRAM_ENTROPY_SIZE: usize = 128;

/// Total bytes produced by the program generator per program.
pub const PROGRAM_BYTES: usize = PROGRAM_ENTROPY_SIZE + PROGRAM_SIZE * INSTRUCTION_SIZE;

/// Integer register count.
pub const REGISTER_COUNT: usize = 8;

/// Floating register count per group (f, e, a).
pub const REGISTER_COUNT_FLT: usize = 4;

/// Scratchpad L1 size (16 KiB).
pub const SCRATCHPAD_L1: usize = 16_384;

/// Scratchpad L2 size (256 KiB).
pub const SCRATCHPAD_L2: usize = 262_144;

/// Scratchpad L3 size (2 MiB).
pub const SCRATCHPAD_L3: usize = 2_097_152;

/// 8-byte aligned L1 address mask.
pub const SCRATCHPAD_L1_MASK: u64 = (SCRATCHPAD_L1 as u64 / 8 - 1) * 8;

/// 8-byte aligned L2 address mask.
pub const SCRATCHPAD_L2_MASK: u64 = (SCRATCHPAD_L2 as u64 / 8 - 1) * 8;

/// 8-byte aligned L3 address mask.
pub const SCRATCHPAD_L3_MASK: u64 = (SCRATCHPAD_L3 as u64 / 8 - 1) * 8;

/// 64-byte aligned L3 address mask.
pub const SCRATCHPAD_L3_MASK64: u64 = (SCRATCHPAD_L3 as u64 / 64 - 1) * 64;

/// Bits tested by `CBRANCH`.
pub const JUMP_BITS: u32 = 8;

/// Lowest bit position of the `CBRANCH` condition mask.
pub const JUMP_OFFSET: u32 = 8;

/// Mask of `JUMP_BITS` ones.
pub const CONDITION_MASK: u64 = (1 << JUMP_BITS) - 1;

/// `ISTORE` writes to the full L3 range when `mod >> 4` reaches this value.
pub const STORE_L3_CONDITION: u8 = 14;

/// Serialized register file size (r, f, e, a).
pub const REGISTER_FILE_SIZE: usize = 256;

// =============================================================================
// FLOATING POINT
// =============================================================================

/// Mantissa width of an IEEE-754 double.
pub const MANTISSA_SIZE: u32 = 52;

/// Exponent width of an IEEE-754 double.
pub const EXPONENT_SIZE: u32 = 11;

/// Mantissa bit mask.
pub const MANTISSA_MASK: u64 = (1 << MANTISSA_SIZE) - 1;

/// Exponent bit mask (before shifting into place).
pub const EXPONENT_MASK: u64 = (1 << EXPONENT_SIZE) - 1;

/// IEEE-754 exponent bias.
pub const EXPONENT_BIAS: u64 = 1023;

/// Exponent bits of `e` registers taken from the loaded value.
pub const DYNAMIC_EXPONENT_BITS: u32 = 4;

/// Exponent bits of `e` registers taken from program entropy.
pub const STATIC_EXPONENT_BITS: u32 = 4;

/// Fixed high exponent bits of `e` registers.
pub const CONST_EXPONENT_BITS: u64 = 0x300;

/// Mantissa plus dynamic exponent bits kept from a loaded `e` value.
pub const DYNAMIC_MANTISSA_MASK: u64 = (1 << (MANTISSA_SIZE + DYNAMIC_EXPONENT_BITS)) - 1;

/// Low mantissa bits of the `e` mask taken from entropy.
pub const E_MASK_ENTROPY_BITS: u64 = (1 << 22) - 1;

/// Sign and exponent bits flipped by `FSCAL_R`.
pub const SCALE_MASK: u64 = 0x80F0_0000_0000_0000;

// =============================================================================
// AES GENERATORS
// =============================================================================

/// Keys of the 1-round scratchpad generator (`AesGenerator1R`), memory order.
pub const AES_GEN_1R_KEYS: [[u32; 4]; 4] = [
    [0x6dac_a553, 0x6271_6609, 0xdbb5_552b, 0xb4f4_4917],
    [0x6d7c_af07, 0x846a_710d, 0x1725_d378, 0x0da1_dc4e],
    [0x3f12_62f1, 0x9f94_7ec6, 0xf4c0_794f, 0x3e20_e345],
    [0x6aef_8135, 0xb1ba_317c, 0x1631_4c88, 0x4916_9154],
];

/// Keys of the 4-round program generator (`AesGenerator4R`), memory order.
pub const AES_GEN_4R_KEYS: [[u32; 4]; 8] = [
    [0x6421_aadd, 0xd183_3ddb, 0x2f54_6d2b, 0x99e5_d23f],
    [0xb20e_3450, 0xb691_3f55, 0x06f7_9d53, 0xa5df_cde5],
    [0x5c3e_d904, 0x515e_7baf, 0x0aa4_679f, 0x171c_02bf],
    [0x8562_3763, 0xe78f_5d08, 0xcd67_3785, 0xd8de_d291],
    [0xb582_6f73, 0xe3d6_a7a6, 0x3d51_8b6d, 0x229e_ffb4],
    [0xc756_6bf3, 0x9c10_b3d9, 0xe902_4d4e, 0xb272_b7d2],
    [0xf273_c9e7, 0xf765_a38b, 0x2ba9_660a, 0xf63b_efa7],
    [0x7a7c_d609, 0x9158_39de, 0x0c06_d1fd, 0xc0b0_762d],
];

/// Initial state of the scratchpad fingerprint (`AesHash1R`), memory order.
pub const AES_HASH_1R_STATE: [[u32; 4]; 4] = [
    [0x92b5_2c0d, 0x9fa8_56de, 0xcc82_db47, 0xd798_3aad],
    [0x338d_996e, 0x15c7_b798, 0xf59e_125a, 0xace7_8057],
    [0x6a77_0017, 0xae62_c7d0, 0x5079_506b, 0xe8a0_7ce4],
    [0x630a_240c, 0x07ad_828d, 0x79a1_0005, 0x7e99_4948],
];

/// Extra finalization keys of `AesHash1R`, memory order.
pub const AES_HASH_1R_XKEYS: [[u32; 4]; 2] = [
    [0xf6fa_8389, 0x8b24_949f, 0x90dc_56bf, 0x0689_0201],
    [0x61b2_63d1, 0x51f4_e03c, 0xee10_43c6, 0xed18_f99b],
];

/// AES GF(2^8) reduction polynomial: x^8 + x^4 + x^3 + x + 1
pub const GF_POLY: u8 = 0x1b;

// =============================================================================
// OUTPUT
// =============================================================================

/// Final digest size in bytes (256-bit).
pub const HASH_SIZE: usize = 32;

/// Size of the intermediate Blake2b-512 seed hashes.
pub const SEED_HASH_SIZE: usize = 64;
