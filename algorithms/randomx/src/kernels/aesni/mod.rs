//! AES-NI Kernel Module
//!
//! Hardware versions of the keystream generators and the scratchpad
//! fingerprint. Lane layout and round order mirror `kernels::portable`.

#![allow(clippy::cast_ptr_alignment)]

use crate::kernels::constants::{
    AES_GEN_1R_KEYS, AES_GEN_4R_KEYS, AES_HASH_1R_STATE, AES_HASH_1R_XKEYS, SEED_HASH_SIZE,
};

use core::arch::x86_64::{
    __m128i, _mm_aesdec_si128, _mm_aesenc_si128, _mm_loadu_si128, _mm_storeu_si128,
};

// =============================================================================
// HELPERS
// =============================================================================

/// Load four consecutive 128-bit lanes.
// SAFETY: Caller guarantees `src` holds at least 64 bytes and SSE2 is available.
#[inline]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
unsafe fn load_lanes(src: &[u8]) -> [__m128i; 4] {
    debug_assert!(src.len() >= 64);
    let p = src.as_ptr().cast::<__m128i>();
    [
        _mm_loadu_si128(p),
        _mm_loadu_si128(p.add(1)),
        _mm_loadu_si128(p.add(2)),
        _mm_loadu_si128(p.add(3)),
    ]
}

// SAFETY: Caller guarantees `dst` holds at least 64 bytes and SSE2 is available.
#[inline]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
unsafe fn store_lanes(lanes: &[__m128i; 4], dst: &mut [u8]) {
    debug_assert!(dst.len() >= 64);
    let p = dst.as_mut_ptr().cast::<__m128i>();
    for (i, lane) in lanes.iter().enumerate() {
        _mm_storeu_si128(p.add(i), *lane);
    }
}

/// Load a key table stored as little-endian 32-bit words.
// SAFETY: `[u32; 4]` is 16 bytes; unaligned load.
#[inline]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
unsafe fn load_keys<const N: usize>(words: &[[u32; 4]; N]) -> [__m128i; N] {
    words.map(|w| _mm_loadu_si128(w.as_ptr().cast()))
}

// =============================================================================
// GENERATORS
// =============================================================================

/// Hardware `fill_aes_1rx4`.
// SAFETY: Requires AES/SSE2 CPU features (enforced by dispatcher).
// `output.len()` is a multiple of 64; every store stays inside the chunk.
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn fill_aes_1rx4(state: &mut [u8; SEED_HASH_SIZE], output: &mut [u8]) {
    let k = load_keys(&AES_GEN_1R_KEYS);
    let mut s = load_lanes(state);

    for chunk in output.chunks_exact_mut(64) {
        s[0] = _mm_aesdec_si128(s[0], k[0]);
        s[1] = _mm_aesenc_si128(s[1], k[1]);
        s[2] = _mm_aesdec_si128(s[2], k[2]);
        s[3] = _mm_aesenc_si128(s[3], k[3]);
        store_lanes(&s, chunk);
    }

    store_lanes(&s, state);
}

/// Hardware `fill_aes_4rx4`.
// SAFETY: Requires AES/SSE2 CPU features (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn fill_aes_4rx4(state: &[u8; SEED_HASH_SIZE], output: &mut [u8]) {
    let k = load_keys(&AES_GEN_4R_KEYS);
    let mut s = load_lanes(state);

    for chunk in output.chunks_exact_mut(64) {
        for r in 0..4 {
            s[0] = _mm_aesdec_si128(s[0], k[r]);
            s[1] = _mm_aesenc_si128(s[1], k[r]);
            s[2] = _mm_aesdec_si128(s[2], k[r + 4]);
            s[3] = _mm_aesenc_si128(s[3], k[r + 4]);
        }
        store_lanes(&s, chunk);
    }
}

/// Hardware `hash_aes_1rx4`.
// SAFETY: Requires AES/SSE2 CPU features (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn hash_aes_1rx4(input: &[u8]) -> [u8; SEED_HASH_SIZE] {
    let mut s = load_keys(&AES_HASH_1R_STATE);

    for chunk in input.chunks_exact(64) {
        let inp = load_lanes(chunk);
        s[0] = _mm_aesenc_si128(s[0], inp[0]);
        s[1] = _mm_aesdec_si128(s[1], inp[1]);
        s[2] = _mm_aesenc_si128(s[2], inp[2]);
        s[3] = _mm_aesdec_si128(s[3], inp[3]);
    }

    for xkey in load_keys(&AES_HASH_1R_XKEYS) {
        s[0] = _mm_aesenc_si128(s[0], xkey);
        s[1] = _mm_aesdec_si128(s[1], xkey);
        s[2] = _mm_aesenc_si128(s[2], xkey);
        s[3] = _mm_aesdec_si128(s[3], xkey);
    }

    let mut out = [0u8; SEED_HASH_SIZE];
    store_lanes(&s, &mut out);
    out
}
