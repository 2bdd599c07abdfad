//! Blake2b helpers: fixed 512/256-bit digests and the Argon2 `H'` expander.

use blake2::digest::consts::U32;
use blake2::digest::{Update, VariableOutput};
use blake2::{Blake2b, Blake2b512, Blake2bVar, Digest};

use crate::kernels::constants::{HASH_SIZE, SEED_HASH_SIZE};

/// Blake2b-512 over the concatenation of `parts`.
pub fn hash_512(parts: &[&[u8]]) -> [u8; SEED_HASH_SIZE] {
    let mut hasher = Blake2b512::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    let mut out = [0u8; SEED_HASH_SIZE];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Blake2b with a 32-byte digest parameter (not a truncated Blake2b-512).
pub fn hash_256(input: &[u8]) -> [u8; HASH_SIZE] {
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&Blake2b::<U32>::digest(input));
    out
}

/// Blake2b with digest length `out.len()` (1..=64) over `parts`.
#[allow(clippy::expect_used)] // Infallible: callers pass 1..=64 byte outputs
fn hash_var(parts: &[&[u8]], out: &mut [u8]) {
    let mut hasher = Blake2bVar::new(out.len()).expect("blake2b output length in 1..=64");
    for part in parts {
        Update::update(&mut hasher, part);
    }
    hasher
        .finalize_variable(out)
        .expect("blake2b output buffer matches its length");
}

/// Variable-length hash `H'` from Argon2 (RFC 9106 §3.3).
///
/// Produces `out.len()` bytes from `input`, prefixed with the little-endian
/// 32-bit output length. Outputs longer than 64 bytes are built from chained
/// Blake2b-512 digests, emitting 32 bytes of each.
pub fn hash_long(input: &[u8], out: &mut [u8]) {
    let outlen = out.len();
    debug_assert!(outlen > 0);
    let len_prefix = (outlen as u32).to_le_bytes();

    if outlen <= SEED_HASH_SIZE {
        hash_var(&[&len_prefix, input], out);
        return;
    }

    let mut v = hash_512(&[&len_prefix, input]);
    out[..32].copy_from_slice(&v[..32]);
    let mut pos = 32;
    let mut remaining = outlen - 32;

    while remaining > SEED_HASH_SIZE {
        v = hash_512(&[&v]);
        out[pos..pos + 32].copy_from_slice(&v[..32]);
        pos += 32;
        remaining -= 32;
    }

    hash_var(&[&v], &mut out[pos..pos + remaining]);
}
