//! C-API Bindings
//!
//! Exposes the RandomX handle to C/C++ via FFI with pointer checks and panic
//! boundaries.

#![allow(unsafe_code)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::hasher::{meets_difficulty, RandomX};
use crate::kernels::constants::HASH_SIZE;
use crate::types::{Error, Mode};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Light mode selector for `randomx_rs_new`.
pub const RANDOMX_RS_MODE_LIGHT: i32 = 0;
/// Fast mode selector for `randomx_rs_new`.
pub const RANDOMX_RS_MODE_FAST: i32 = 1;

/// Success.
pub const RANDOMX_RS_OK: i32 = 0;
/// A required pointer was null.
pub const RANDOMX_RS_ERR_NULL: i32 = -1;
/// A panic was caught at the boundary.
pub const RANDOMX_RS_ERR_PANIC: i32 = -2;
/// The handle was closed.
pub const RANDOMX_RS_ERR_CLOSED: i32 = -3;
/// Invalid key or dataset allocation failure.
pub const RANDOMX_RS_ERR_KEY: i32 = -4;

const fn error_code(err: &Error) -> i32 {
    match err {
        Error::Closed => RANDOMX_RS_ERR_CLOSED,
        Error::EmptySeed | Error::InvalidMode(_) | Error::DatasetAllocation { .. } => {
            RANDOMX_RS_ERR_KEY
        }
    }
}

// =============================================================================
// HANDLE LIFECYCLE
// =============================================================================

/// Opaque RandomX handle for C.
pub struct RandomXHandle(RandomX);

/// Create a handle for `key` in the given mode.
///
/// Returns NULL for a null/empty key, an unknown mode, an allocation failure
/// or a panic. Caller must free with `randomx_rs_free`.
///
/// # Safety
/// - `key_ptr` must be valid for `key_len` bytes
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_new(
    key_ptr: *const u8,
    key_len: usize,
    mode: i32,
) -> *mut RandomXHandle {
    if key_ptr.is_null() {
        return ptr::null_mut();
    }
    let mode = match mode {
        RANDOMX_RS_MODE_LIGHT => Mode::Light,
        RANDOMX_RS_MODE_FAST => Mode::Fast,
        _ => return ptr::null_mut(),
    };

    let result = catch_unwind(|| {
        let key = slice::from_raw_parts(key_ptr, key_len);
        RandomX::new(key, mode).ok()
    });

    match result {
        Ok(Some(rx)) => Box::into_raw(Box::new(RandomXHandle(rx))),
        _ => ptr::null_mut(),
    }
}

/// Release the cache/dataset while keeping the handle allocated.
///
/// # Safety
/// - `handle` must come from `randomx_rs_new`, or be null
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_close(handle: *const RandomXHandle) {
    if handle.is_null() {
        return;
    }
    (*handle).0.close();
}

/// Free a handle.
///
/// # Safety
/// - `handle` must come from `randomx_rs_new`, or be null
/// - no other thread may be using `handle`
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_free(handle: *mut RandomXHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// =============================================================================
// HASHING
// =============================================================================

/// Compute the hash of `input` under the handle's key.
///
/// # Safety
/// - `handle` must come from `randomx_rs_new`
/// - `input_ptr` must be valid for `input_len` bytes
/// - `output_ptr` must be valid for 32 writable bytes
///
/// # Returns
/// - `0`: Success
/// - `-1`: Null pointer
/// - `-2`: Panic
/// - `-3`: Handle closed
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_hash(
    handle: *const RandomXHandle,
    input_ptr: *const u8,
    input_len: usize,
    output_ptr: *mut u8,
) -> i32 {
    if handle.is_null() || input_ptr.is_null() || output_ptr.is_null() {
        return RANDOMX_RS_ERR_NULL;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        let input = slice::from_raw_parts(input_ptr, input_len);
        let hash = (*handle).0.try_hash(input)?;
        ptr::copy_nonoverlapping(hash.as_ptr(), output_ptr, HASH_SIZE);
        Ok::<(), Error>(())
    }));

    match result {
        Ok(Ok(())) => RANDOMX_RS_OK,
        Ok(Err(err)) => error_code(&err),
        Err(_) => RANDOMX_RS_ERR_PANIC,
    }
}

/// Verify `input` against a 32-byte hash in constant time.
///
/// # Safety
/// - `handle` must come from `randomx_rs_new`
/// - `input_ptr` must be valid for `input_len` bytes
/// - `hash_ptr` must point to exactly 32 bytes
///
/// # Returns
/// - `1`: Match
/// - `0`: No match (or closed handle)
/// - `-1`: Null pointer
/// - `-2`: Panic
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_verify(
    handle: *const RandomXHandle,
    input_ptr: *const u8,
    input_len: usize,
    hash_ptr: *const u8,
) -> i32 {
    if handle.is_null() || input_ptr.is_null() || hash_ptr.is_null() {
        return RANDOMX_RS_ERR_NULL;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        let input = slice::from_raw_parts(input_ptr, input_len);
        let mut expected = [0u8; HASH_SIZE];
        expected.copy_from_slice(slice::from_raw_parts(hash_ptr, HASH_SIZE));
        (*handle).0.verify(input, &expected)
    }));

    match result {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => RANDOMX_RS_ERR_PANIC,
    }
}

// =============================================================================
// KEY MANAGEMENT
// =============================================================================

/// Rotate the handle to a new key.
///
/// # Safety
/// - `handle` must come from `randomx_rs_new`
/// - `key_ptr` must be valid for `key_len` bytes
///
/// # Returns
/// - `0`: Success
/// - `-1`: Null pointer
/// - `-2`: Panic
/// - `-3`: Handle closed
/// - `-4`: Empty key or dataset allocation failure
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_update_key(
    handle: *const RandomXHandle,
    key_ptr: *const u8,
    key_len: usize,
) -> i32 {
    if handle.is_null() || key_ptr.is_null() {
        return RANDOMX_RS_ERR_NULL;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        let key = slice::from_raw_parts(key_ptr, key_len);
        (*handle).0.update_key(key)
    }));

    match result {
        Ok(Ok(())) => RANDOMX_RS_OK,
        Ok(Err(err)) => error_code(&err),
        Err(_) => RANDOMX_RS_ERR_PANIC,
    }
}

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Check a 32-byte hash against a difficulty target.
///
/// # Safety
/// - `hash_ptr` must point to exactly 32 bytes
///
/// # Returns
/// - `1`: Meets difficulty
/// - `0`: Does not
/// - `-1`: Null pointer
#[no_mangle]
pub unsafe extern "C" fn randomx_rs_meets_difficulty(hash_ptr: *const u8, difficulty: u64) -> i32 {
    if hash_ptr.is_null() {
        return RANDOMX_RS_ERR_NULL;
    }
    let mut hash = [0u8; HASH_SIZE];
    hash.copy_from_slice(slice::from_raw_parts(hash_ptr, HASH_SIZE));
    i32::from(meets_difficulty(&hash, difficulty))
}
