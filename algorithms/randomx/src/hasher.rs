//! Public API Layer
//!
//! `RandomX` owns one key generation (cache or dataset) and a pool of VMs.
//! Hashing takes a read lock only long enough to clone the generation's `Arc`,
//! so key rotation never blocks on in-flight hashes.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use subtle::ConstantTimeEq;

use crate::cache::Cache;
use crate::dataset::{Dataset, DatasetSource};
use crate::engine::dispatcher::get_best_kernels;
use crate::kernels::constants::HASH_SIZE;
use crate::pool::VmPool;
use crate::types::{Config, Error, Mode};

// =============================================================================
// GENERATION
// =============================================================================

/// Everything derived from one key.
struct Generation {
    key: Vec<u8>,
    source: DatasetSource,
}

impl Generation {
    fn build(key: &[u8], config: &Config) -> Result<Self, Error> {
        let cache = Arc::new(Cache::new(key)?);
        let source = match config.mode {
            Mode::Light => DatasetSource::Light(cache),
            Mode::Fast => DatasetSource::Full(Arc::new(Dataset::with_threads(
                &cache,
                config.init_threads,
            )?)),
        };
        Ok(Self {
            key: key.to_vec(),
            source,
        })
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// A RandomX hasher bound to one key at a time.
///
/// `RandomX` is `Send + Sync`; share it behind an `Arc` and hash from any
/// number of threads.
///
/// # Example
/// ```rust,no_run
/// use randomx::{Mode, RandomX};
///
/// let rx = RandomX::new(b"test key 000", Mode::Light)?;
/// let hash = rx.hash(b"This is a test");
/// assert!(rx.verify(b"This is a test", &hash));
/// # Ok::<(), randomx::Error>(())
/// ```
pub struct RandomX {
    config: Config,
    generation: RwLock<Option<Arc<Generation>>>,
    pool: VmPool,
}

impl RandomX {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Build a hasher for `seed` in `mode` with default settings.
    ///
    /// # Errors
    /// Returns `Error::EmptySeed` for an empty seed, or
    /// `Error::DatasetAllocation` if fast mode cannot reserve the dataset.
    pub fn new(seed: &[u8], mode: Mode) -> Result<Self, Error> {
        Self::with_config(seed, Config::new(mode))
    }

    /// Build a hasher for `seed` with an explicit configuration.
    ///
    /// # Errors
    /// Returns `Error::EmptySeed` for an empty seed, or
    /// `Error::DatasetAllocation` if fast mode cannot reserve the dataset.
    pub fn with_config(seed: &[u8], config: Config) -> Result<Self, Error> {
        let start = Instant::now();
        let generation = Generation::build(seed, &config)?;
        tracing::info!(
            mode = %config.mode,
            vm_pool_size = config.vm_pool_size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "randomx handle ready"
        );
        Ok(Self {
            config,
            generation: RwLock::new(Some(Arc::new(generation))),
            pool: VmPool::new(config.vm_pool_size, get_best_kernels()),
        })
    }

    // =========================================================================
    // HASHING
    // =========================================================================

    /// Hash `input` under the current key.
    ///
    /// # Errors
    /// Returns `Error::Closed` once [`Self::close`] has been called.
    pub fn try_hash(&self, input: &[u8]) -> Result<[u8; HASH_SIZE], Error> {
        let generation = self.current()?;
        Ok(self
            .pool
            .with_vm(|vm| vm.calculate_hash(input, &generation.source)))
    }

    /// Hash `input` under the current key.
    ///
    /// # Panics
    /// Panics if the handle has been closed; use [`Self::try_hash`] to handle
    /// that case.
    #[must_use]
    #[allow(clippy::expect_used)] // Infallible for an open handle; closing is a caller bug
    pub fn hash(&self, input: &[u8]) -> [u8; HASH_SIZE] {
        self.try_hash(input).expect("hash called on a closed RandomX handle")
    }

    /// Check `input` against `expected` in constant time.
    ///
    /// A closed handle verifies nothing and returns `false`.
    #[must_use]
    pub fn verify(&self, input: &[u8], expected: &[u8; HASH_SIZE]) -> bool {
        self.try_hash(input)
            .is_ok_and(|computed| computed.ct_eq(expected).into())
    }

    // =========================================================================
    // KEY MANAGEMENT
    // =========================================================================

    /// Switch to a new key.
    ///
    /// The new cache (and dataset in fast mode) is built while hashes continue
    /// on the old key; the swap itself is a single pointer store. Re-applying
    /// the current key is a no-op.
    ///
    /// # Errors
    /// Returns `Error::Closed` if the handle is closed (including when it is
    /// closed during the rebuild), `Error::EmptySeed` for an empty seed, or
    /// `Error::DatasetAllocation` in fast mode.
    pub fn update_key(&self, seed: &[u8]) -> Result<(), Error> {
        if self.current()?.key == seed {
            tracing::debug!("update_key: key unchanged");
            return Ok(());
        }

        let start = Instant::now();
        let generation = Arc::new(Generation::build(seed, &self.config)?);

        let mut slot = self.generation.write();
        if slot.is_none() {
            return Err(Error::Closed);
        }
        *slot = Some(generation);
        drop(slot);

        tracing::info!(
            mode = %self.config.mode,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "key updated"
        );
        Ok(())
    }

    /// Release the cache, dataset and idle VMs.
    ///
    /// Hashes already running finish on the generation they started with;
    /// their VMs are wiped and dropped instead of returning to the pool.
    pub fn close(&self) {
        let released = self.generation.write().take();
        self.pool.close();
        if released.is_some() {
            tracing::info!("randomx handle closed");
        }
    }

    /// Whether [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.generation.read().is_none()
    }

    /// Dataset mode of this handle.
    pub const fn mode(&self) -> Mode {
        self.config.mode
    }

    fn current(&self) -> Result<Arc<Generation>, Error> {
        self.generation.read().as_ref().map(Arc::clone).ok_or(Error::Closed)
    }
}

impl fmt::Debug for RandomX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomX")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .field("idle_vms", &self.pool.idle())
            .finish()
    }
}

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Whether `hash`, read as a 256-bit little-endian integer, satisfies
/// `hash * difficulty < 2^256`.
///
/// Difficulties `0` and `1` accept every hash.
#[must_use]
pub fn meets_difficulty(hash: &[u8; HASH_SIZE], difficulty: u64) -> bool {
    let mut carry = 0u128;
    for chunk in hash.chunks_exact(8) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let product = u128::from(u64::from_le_bytes(word)) * u128::from(difficulty) + carry;
        carry = product >> 64;
    }
    carry == 0
}
