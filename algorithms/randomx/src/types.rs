//! Shared types used across the RandomX library.

use core::fmt;
use core::str::FromStr;

use crate::kernels::constants::SEED_HASH_SIZE;

// =============================================================================
// KERNEL INTERFACE
// =============================================================================

/// `fill_aes_1rx4` signature: `(state, output)`; the state is advanced in place.
pub type Fill1RFn = fn(&mut [u8; SEED_HASH_SIZE], &mut [u8]);

/// `fill_aes_4rx4` signature: `(state, output)`.
pub type Fill4RFn = fn(&[u8; SEED_HASH_SIZE], &mut [u8]);

/// `hash_aes_1rx4` signature: `input -> 64-byte fingerprint`.
pub type Hash1RFn = fn(&[u8]) -> [u8; SEED_HASH_SIZE];

/// The AES kernels used by one VM, selected once by the dispatcher.
///
/// The portable fallback and the AES-NI backend share these signatures so the
/// dispatcher can swap them at runtime.
#[derive(Clone, Copy)]
pub struct AesKernels {
    /// Scratchpad initialization generator.
    pub fill_1r: Fill1RFn,
    /// Program generator.
    pub fill_4r: Fill4RFn,
    /// Scratchpad fingerprint.
    pub hash_1r: Hash1RFn,
}

impl fmt::Debug for AesKernels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesKernels").finish_non_exhaustive()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the public API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The cache seed (key) was empty.
    #[error("seed must not be empty")]
    EmptySeed,

    /// A mode string did not name a known mode.
    #[error("unknown mode '{0}' (expected 'light' or 'fast')")]
    InvalidMode(String),

    /// The handle was closed and holds no cache or dataset.
    #[error("hasher has been closed")]
    Closed,

    /// The full dataset could not be allocated.
    #[error("failed to allocate {bytes} bytes for the dataset")]
    DatasetAllocation {
        /// Requested allocation size.
        bytes: usize,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Where dataset items come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Recompute each item from the 256 MiB cache on every access.
    #[default]
    Light,
    /// Materialize the full 2 GiB dataset once, then read items directly.
    Fast,
}

impl Mode {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" | "on-demand" => Ok(Self::Light),
            "fast" | "precomputed" => Ok(Self::Fast),
            _ => Err(Error::InvalidMode(s.to_owned())),
        }
    }
}

/// Default number of idle VMs kept for reuse.
pub const DEFAULT_VM_POOL_SIZE: usize = 4;

/// Construction options for [`crate::RandomX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Dataset mode.
    pub mode: Mode,
    /// Maximum number of idle VMs retained between hashes.
    pub vm_pool_size: usize,
    /// Worker threads for dataset materialization; `0` uses the global rayon pool.
    pub init_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Mode::Light)
    }
}

impl Config {
    /// Default configuration for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            vm_pool_size: DEFAULT_VM_POOL_SIZE,
            init_threads: 0,
        }
    }

    /// Set the dataset mode.
    #[must_use]
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set how many idle VMs are kept for reuse.
    #[must_use]
    pub const fn vm_pool_size(mut self, size: usize) -> Self {
        self.vm_pool_size = size;
        self
    }

    /// Set the number of dataset initialization threads.
    #[must_use]
    pub const fn init_threads(mut self, threads: usize) -> Self {
        self.init_threads = threads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("light".parse::<Mode>(), Ok(Mode::Light));
        assert_eq!("On-Demand".parse::<Mode>(), Ok(Mode::Light));
        assert_eq!("FAST".parse::<Mode>(), Ok(Mode::Fast));
        assert_eq!("precomputed".parse::<Mode>(), Ok(Mode::Fast));
        assert_eq!(
            "turbo".parse::<Mode>(),
            Err(Error::InvalidMode("turbo".to_owned()))
        );
    }

    #[test]
    fn test_mode_display_roundtrip() {
        for mode in [Mode::Light, Mode::Fast] {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
    }

    #[test]
    fn test_config_builder() {
        let cfg = Config::default()
            .mode(Mode::Fast)
            .vm_pool_size(0)
            .init_threads(2);
        assert_eq!(cfg.mode, Mode::Fast);
        assert_eq!(cfg.vm_pool_size, 0);
        assert_eq!(cfg.init_threads, 2);
        assert_eq!(Config::new(Mode::Light), Config::default());
    }

    #[test]
    fn test_config_usable_in_const() {
        const MINER: Config = Config::new(Mode::Fast).vm_pool_size(8).init_threads(4);
        assert_eq!(MINER.mode, Mode::Fast);
        assert_eq!(MINER.vm_pool_size, 8);
        assert_eq!(MINER.init_threads, 4);
    }
}
