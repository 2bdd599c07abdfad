use bolero::check;
use randomx::{get_best_kernels, portable_kernels};

#[test]
fn fuzz_aes_backends_agree() {
    let (portable, best) = (portable_kernels(), get_best_kernels());

    check!()
        .with_type::<([u8; 64], Vec<u8>)>()
        .for_each(|(seed, data)| {
            // =============================================================================
            // GENERATORS
            // =============================================================================

            let mut state_p = *seed;
            let mut state_b = *seed;
            let mut out_p = [0u8; 256];
            let mut out_b = [0u8; 256];
            (portable.fill_1r)(&mut state_p, &mut out_p);
            (best.fill_1r)(&mut state_b, &mut out_b);
            assert_eq!(out_p, out_b, "fill_1r diverged");
            assert_eq!(state_p, state_b, "fill_1r state diverged");

            (portable.fill_4r)(seed, &mut out_p);
            (best.fill_4r)(seed, &mut out_b);
            assert_eq!(out_p, out_b, "fill_4r diverged");

            // =============================================================================
            // FINGERPRINT
            // =============================================================================

            // hash_1r consumes whole 64-byte lines.
            let mut input = data.clone();
            input.resize(data.len().div_ceil(64).max(1) * 64, 0);
            assert_eq!((portable.hash_1r)(&input), (best.hash_1r)(&input), "hash_1r diverged");
        });
}
