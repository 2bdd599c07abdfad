use bolero::check;
use randomx::kernels::constants::SUPERSCALAR_MAX_SIZE;
use randomx::superscalar::{Opcode, SuperscalarProgram};
use randomx::Blake2Generator;

#[test]
fn fuzz_superscalar_program_shape() {
    check!()
        .with_type::<(Vec<u8>, u32)>()
        .for_each(|(seed, nonce)| {
            // Seeds longer than 60 bytes are truncated by the generator.
            let mut gen = Blake2Generator::new(seed, *nonce);
            let program = SuperscalarProgram::generate(&mut gen);

            assert!(!program.is_empty());
            assert!(program.len() <= SUPERSCALAR_MAX_SIZE);
            assert!(program.address_register() < 8);

            for instr in program.instructions() {
                assert!(instr.dst < 8 && instr.src < 8);
                match instr.opcode {
                    // Divisor must be usable for a reciprocal.
                    Opcode::IMulRcp => {
                        assert_ne!(instr.imm32, 0);
                        assert!(!instr.imm32.is_power_of_two());
                    }
                    Opcode::IRorC => assert!((1..64).contains(&instr.imm32)),
                    Opcode::ISubR | Opcode::IXorR | Opcode::IAddRs | Opcode::IMulR => {
                        assert_ne!(instr.dst, instr.src);
                    }
                    _ => {}
                }
            }

            // Same seed and nonce give the same program.
            let mut again = Blake2Generator::new(seed, *nonce);
            assert_eq!(
                SuperscalarProgram::generate(&mut again).instructions(),
                program.instructions()
            );
        });
}
