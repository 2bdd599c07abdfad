use bolero::check;
use randomx::meets_difficulty;

#[test]
fn fuzz_difficulty_monotonic() {
    check!()
        .with_type::<([u8; 32], u64)>()
        .for_each(|(hash, difficulty)| {
            let accepted = meets_difficulty(hash, *difficulty);

            // A hash that clears a target clears every easier one.
            if accepted && *difficulty > 0 {
                assert!(meets_difficulty(hash, difficulty - 1));
            }
            if !accepted {
                assert!(!meets_difficulty(hash, difficulty.saturating_add(1)));
            }

            // Difficulty 1 accepts everything.
            assert!(meets_difficulty(hash, 1));
        });
}
