//! # RandomX
//!
//! Pure-Rust RandomX proof of work: a 256 MiB Argon2d cache, the
//! `SuperscalarHash` dataset and the randomized virtual machine.
//! AES generators use AES-NI when the CPU has it.

//! # Usage
//! ```rust,no_run
//! use randomx::{Config, Mode, RandomX};
//!
//! // 1. Light mode: 256 MiB cache, items computed on demand
//! let rx = RandomX::new(b"test key 000", Mode::Light)?;
//! let hash = rx.hash(b"This is a test");
//! assert!(rx.verify(b"This is a test", &hash));
//!
//! // 2. Key rotation (hashes in flight keep the old key)
//! rx.update_key(b"test key 001")?;
//!
//! // 3. Fast mode: 2 GiB dataset, materialized on 8 threads
//! let miner = RandomX::with_config(b"test key 000", Config::new(Mode::Fast).init_threads(8))?;
//! let candidate = miner.hash(b"block template");
//! let _accepted = randomx::meets_difficulty(&candidate, 100_000);
//! # Ok::<(), randomx::Error>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod argon2;
pub mod blake2_generator;
pub mod blake2_long;
mod cache;
mod dataset;
mod engine;
mod ffi;
mod hasher;
// Re-export internal kernels for benchmarking/testing, hidden from docs
#[doc(hidden)]
pub mod kernels;
mod pool;
pub mod superscalar;
pub(crate) mod types;
mod vm;

// =============================================================================
// EXPORTS
// =============================================================================

pub use blake2_generator::Blake2Generator;
pub use cache::{Cache, DatasetItem};
pub use dataset::{Dataset, DatasetSource};
#[doc(hidden)]
pub use engine::dispatcher::{get_best_kernels, portable_kernels};
pub use hasher::{meets_difficulty, RandomX};
pub use types::{AesKernels, Config, Error, Mode, DEFAULT_VM_POOL_SIZE};
pub use vm::Vm;

/// Returns the name of the hardware backend currently in use.
#[must_use]
pub fn active_backend() -> &'static str {
    engine::get_active_backend_name()
}
