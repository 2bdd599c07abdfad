#![no_main]

use libfuzzer_sys::fuzz_target;
use randomx::{get_best_kernels, portable_kernels};

fuzz_target!(|data: &[u8]| {
    let (portable, best) = (portable_kernels(), get_best_kernels());

    // =============================================================================
    // GENERATORS
    // =============================================================================

    let mut seed = [0u8; 64];
    let n = data.len().min(64);
    seed[..n].copy_from_slice(&data[..n]);

    let mut state_p = seed;
    let mut state_b = seed;
    let mut out_p = [0u8; 2176];
    let mut out_b = [0u8; 2176];

    (portable.fill_1r)(&mut state_p, &mut out_p[..2112]);
    (best.fill_1r)(&mut state_b, &mut out_b[..2112]);
    assert_eq!(out_p, out_b, "fill_1r backends diverged");
    assert_eq!(state_p, state_b, "fill_1r state diverged");

    (portable.fill_4r)(&seed, &mut out_p);
    (best.fill_4r)(&seed, &mut out_b);
    assert_eq!(out_p, out_b, "fill_4r backends diverged");

    // =============================================================================
    // FINGERPRINT
    // =============================================================================

    let lines = data.len() / 64;
    if lines > 0 {
        let input = &data[..lines * 64];
        assert_eq!(
            (portable.hash_1r)(input),
            (best.hash_1r)(input),
            "hash_1r backends diverged"
        );
    }
});
