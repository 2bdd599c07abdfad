use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;

use bolero::check;
use randomx::{Mode, RandomX};

fn shared() -> &'static RandomX {
    static HANDLE: OnceLock<RandomX> = OnceLock::new();
    HANDLE.get_or_init(|| RandomX::new(b"fuzz key", Mode::Light).unwrap_or_else(|e| panic!("{e}")))
}

#[test]
fn fuzz_verification_logic() {
    // The handle's locks are not RefUnwindSafe; a panic here fails the test anyway.
    let rx = AssertUnwindSafe(shared());

    // Light-mode hashes cost milliseconds each; keep the property run short.
    check!()
        .with_iterations(16)
        .with_type::<Vec<u8>>()
        .for_each(move |data| {
            // =============================================================================
            // POSITIVE TEST
            // =============================================================================

            let h = rx.hash(data);
            assert!(rx.verify(data, &h), "verify() failed on correct data");

            // =============================================================================
            // NEGATIVE TESTS (CORRUPTION)
            // =============================================================================

            // 1. Data Corruption
            if !data.is_empty() {
                let mut corrupted_data = data.clone();
                corrupted_data[0] ^= 0x01;
                assert!(
                    !rx.verify(&corrupted_data, &h),
                    "verify() succeeded on corrupted data"
                );
            }

            // 2. Hash Corruption
            let mut bad_h = h;
            bad_h[0] ^= 0xFF;
            assert!(!rx.verify(data, &bad_h), "verify() succeeded on corrupted hash");
        });
}
