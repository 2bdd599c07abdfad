//! Hardware Dispatcher
//!
//! Selects AES-NI or the portable soft-AES kernels for the current CPU.

use crate::kernels;
use crate::kernels::constants::SEED_HASH_SIZE;
use crate::types::AesKernels;

// =============================================================================
// DISPATCHER
// =============================================================================

const PORTABLE: AesKernels = AesKernels {
    fill_1r: kernels::portable::fill_aes_1rx4,
    fill_4r: kernels::portable::fill_aes_4rx4,
    hash_1r: kernels::portable::hash_aes_1rx4,
};

#[cfg(target_arch = "x86_64")]
const AESNI: AesKernels = AesKernels {
    fill_1r: safe_aesni_fill_1r,
    fill_4r: safe_aesni_fill_4r,
    hash_1r: safe_aesni_hash_1r,
};

#[cfg(target_arch = "x86_64")]
fn has_aesni() -> bool {
    is_x86_feature_detected!("aes") && is_x86_feature_detected!("sse2")
}

/// Returns the fastest AES kernels for this CPU.
#[must_use]
pub fn get_best_kernels() -> AesKernels {
    #[cfg(target_arch = "x86_64")]
    {
        if has_aesni() {
            return AESNI;
        }
    }

    PORTABLE
}

/// Returns the portable kernels regardless of CPU support.
#[must_use]
pub const fn portable_kernels() -> AesKernels {
    PORTABLE
}

/// Returns the name of the active hardware backend.
#[must_use]
pub fn get_active_backend_name() -> &'static str {
    #[cfg(target_arch = "x86_64")]
    {
        if has_aesni() {
            return "AES-NI";
        }
    }
    "Portable"
}

// =============================================================================
// WRAPPERS
// =============================================================================

#[cfg(target_arch = "x86_64")]
#[inline]
#[allow(unsafe_code)]
fn safe_aesni_fill_1r(state: &mut [u8; SEED_HASH_SIZE], output: &mut [u8]) {
    // SAFETY: Only reachable after CPUID validation (AES/SSE2).
    unsafe { kernels::aesni::fill_aes_1rx4(state, output) }
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[allow(unsafe_code)]
fn safe_aesni_fill_4r(state: &[u8; SEED_HASH_SIZE], output: &mut [u8]) {
    // SAFETY: Only reachable after CPUID validation (AES/SSE2).
    unsafe { kernels::aesni::fill_aes_4rx4(state, output) }
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[allow(unsafe_code)]
fn safe_aesni_hash_1r(input: &[u8]) -> [u8; SEED_HASH_SIZE] {
    // SAFETY: Only reachable after CPUID validation (AES/SSE2).
    unsafe { kernels::aesni::hash_aes_1rx4(input) }
}
