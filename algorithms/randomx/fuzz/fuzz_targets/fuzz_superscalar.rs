#![no_main]

use libfuzzer_sys::fuzz_target;
use randomx::superscalar::SuperscalarProgram;
use randomx::Blake2Generator;

fuzz_target!(|data: &[u8]| {
    // =============================================================================
    // PREPARATION
    // =============================================================================

    // First four bytes are the nonce, the rest is the seed.
    let (nonce, seed) = match data.split_first_chunk::<4>() {
        Some((nonce, seed)) => (u32::from_le_bytes(*nonce), seed),
        None => (0, data),
    };

    // =============================================================================
    // GENERATION
    // =============================================================================

    let program = SuperscalarProgram::generate(&mut Blake2Generator::new(seed, nonce));
    assert!(!program.is_empty() && program.len() <= 512);
    assert!(program.address_register() < 8);

    // =============================================================================
    // DETERMINISM
    // =============================================================================

    let again = SuperscalarProgram::generate(&mut Blake2Generator::new(seed, nonce));
    assert_eq!(program, again, "superscalar generation is not deterministic");
});
