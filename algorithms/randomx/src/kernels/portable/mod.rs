//! Portable AES keystream generators and scratchpad fingerprint.
//!
//! Byte-identical to the AES-NI kernels; used on CPUs without the `aes` feature
//! and as the reference in cross-architecture tests.

use self::utils::{aesdec, aesenc, U128};
use crate::kernels::constants::{
    AES_GEN_1R_KEYS, AES_GEN_4R_KEYS, AES_HASH_1R_STATE, AES_HASH_1R_XKEYS, SEED_HASH_SIZE,
};

mod utils;

/// Split 64 bytes into four AES lanes.
fn load_lanes(src: &[u8]) -> [U128; 4] {
    [
        U128::load(&src[0..16]),
        U128::load(&src[16..32]),
        U128::load(&src[32..48]),
        U128::load(&src[48..64]),
    ]
}

fn store_lanes(lanes: &[U128; 4], dst: &mut [u8]) {
    for (i, lane) in lanes.iter().enumerate() {
        lane.store(&mut dst[i * 16..(i + 1) * 16]);
    }
}

fn keys<const N: usize>(words: &[[u32; 4]; N]) -> [U128; N] {
    words.map(|w| U128::from_words(&w))
}

/// Fill `output` with the 1-round AES keystream derived from `state`.
///
/// The final generator state is written back into `state`.
/// `output.len()` must be a multiple of 64.
pub fn fill_aes_1rx4(state: &mut [u8; SEED_HASH_SIZE], output: &mut [u8]) {
    debug_assert!(output.len().is_multiple_of(64));
    let k = keys(&AES_GEN_1R_KEYS);
    let mut s = load_lanes(state);

    for chunk in output.chunks_exact_mut(64) {
        s[0] = aesdec(s[0], &k[0]);
        s[1] = aesenc(s[1], &k[1]);
        s[2] = aesdec(s[2], &k[2]);
        s[3] = aesenc(s[3], &k[3]);
        store_lanes(&s, chunk);
    }

    store_lanes(&s, state);
}

/// Fill `output` with the 4-round AES keystream derived from `state`.
///
/// `state` is left untouched. `output.len()` must be a multiple of 64.
pub fn fill_aes_4rx4(state: &[u8; SEED_HASH_SIZE], output: &mut [u8]) {
    debug_assert!(output.len().is_multiple_of(64));
    let k = keys(&AES_GEN_4R_KEYS);
    let mut s = load_lanes(state);

    for chunk in output.chunks_exact_mut(64) {
        for r in 0..4 {
            s[0] = aesdec(s[0], &k[r]);
            s[1] = aesenc(s[1], &k[r]);
            s[2] = aesdec(s[2], &k[r + 4]);
            s[3] = aesenc(s[3], &k[r + 4]);
        }
        store_lanes(&s, chunk);
    }
}

/// 64-byte AES fingerprint of `input` (the scratchpad).
///
/// `input.len()` must be a multiple of 64.
pub fn hash_aes_1rx4(input: &[u8]) -> [u8; SEED_HASH_SIZE] {
    debug_assert!(input.len().is_multiple_of(64));
    let mut s = keys(&AES_HASH_1R_STATE);

    for chunk in input.chunks_exact(64) {
        let inp = load_lanes(chunk);
        s[0] = aesenc(s[0], &inp[0]);
        s[1] = aesdec(s[1], &inp[1]);
        s[2] = aesenc(s[2], &inp[2]);
        s[3] = aesdec(s[3], &inp[3]);
    }

    for xkey in &keys(&AES_HASH_1R_XKEYS) {
        s[0] = aesenc(s[0], xkey);
        s[1] = aesdec(s[1], xkey);
        s[2] = aesenc(s[2], xkey);
        s[3] = aesdec(s[3], xkey);
    }

    let mut out = [0u8; SEED_HASH_SIZE];
    store_lanes(&s, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_1r_writes_back_last_block() {
        let mut state = [7u8; 64];
        let mut out = vec![0u8; 256];
        fill_aes_1rx4(&mut state, &mut out);
        assert_eq!(&state[..], &out[192..256]);
    }

    #[test]
    fn test_fill_1r_is_resumable() {
        let mut one_shot_state = [0x5au8; 64];
        let mut one_shot = vec![0u8; 512];
        fill_aes_1rx4(&mut one_shot_state, &mut one_shot);

        let mut split_state = [0x5au8; 64];
        let mut split = vec![0u8; 512];
        let (head, tail) = split.split_at_mut(192);
        fill_aes_1rx4(&mut split_state, head);
        fill_aes_1rx4(&mut split_state, tail);

        assert_eq!(one_shot, split);
        assert_eq!(one_shot_state, split_state);
    }

    #[test]
    fn test_fill_4r_keeps_state() {
        let state = [3u8; 64];
        let mut a = vec![0u8; 128];
        let mut b = vec![0u8; 128];
        fill_aes_4rx4(&state, &mut a);
        fill_aes_4rx4(&state, &mut b);
        assert_eq!(a, b);
        assert_ne!(&a[..64], &a[64..]);
    }

    #[test]
    fn test_hash_depends_on_every_chunk() {
        let base = vec![0u8; 1024];
        let h0 = hash_aes_1rx4(&base);
        for pos in [0usize, 63, 64, 1023] {
            let mut modified = base.clone();
            modified[pos] ^= 1;
            assert_ne!(h0, hash_aes_1rx4(&modified), "byte {pos} not absorbed");
        }
    }
}
