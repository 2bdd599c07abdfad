//! Dataset: the materialized item table for fast mode.
//!
//! Every item is `Cache::dataset_item(index)`; the dataset just computes all
//! 34 078 719 of them up front (about 2 GiB) so the VM can read instead of
//! recompute.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use zeroize::Zeroize;

use crate::cache::{Cache, DatasetItem};
use crate::engine::parallel;
use crate::kernels::constants::DATASET_ITEM_COUNT;
use crate::types::Error;

/// A contiguous run of materialized dataset items.
pub struct Dataset {
    start: u64,
    items: Vec<DatasetItem>,
}

impl Dataset {
    /// Materialize the full dataset from `cache` on the global thread pool.
    ///
    /// # Errors
    ///
    /// Returns `Error::DatasetAllocation` if the 2 GiB table cannot be
    /// reserved.
    pub fn new(cache: &Cache) -> Result<Self, Error> {
        Self::with_threads(cache, 0)
    }

    /// Materialize the full dataset using `threads` workers (`0` = default).
    ///
    /// # Errors
    ///
    /// Returns `Error::DatasetAllocation` if the table cannot be reserved.
    pub fn with_threads(cache: &Cache, threads: usize) -> Result<Self, Error> {
        Self::build(cache, 0, DATASET_ITEM_COUNT, threads)
    }

    /// Materialize items `start..start + count` only.
    ///
    /// Every item equals the one a full dataset holds at the same index.
    ///
    /// # Errors
    ///
    /// Returns `Error::DatasetAllocation` if the range cannot be reserved.
    pub fn init_range(cache: &Cache, start: u64, count: u64) -> Result<Self, Error> {
        Self::build(cache, start, count, 0)
    }

    fn build(cache: &Cache, start: u64, count: u64, threads: usize) -> Result<Self, Error> {
        let began = Instant::now();
        let len = count as usize;
        let bytes = len.saturating_mul(size_of::<DatasetItem>());

        let mut items: Vec<DatasetItem> = Vec::new();
        items
            .try_reserve_exact(len)
            .map_err(|_| Error::DatasetAllocation { bytes })?;
        items.resize(len, [0; 8]);

        parallel::fill_items(cache, start, &mut items, threads);

        tracing::info!(
            start,
            count,
            threads,
            elapsed_ms = began.elapsed().as_millis() as u64,
            "dataset initialized"
        );
        Ok(Self { start, items })
    }

    /// Item at absolute `index`, if it lies inside the materialized range.
    #[inline]
    pub fn get(&self, index: u64) -> Option<&DatasetItem> {
        let offset = index.checked_sub(self.start)?;
        self.items.get(usize::try_from(offset).ok()?)
    }

    /// First materialized index.
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Number of materialized items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are materialized.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether this dataset covers every item index.
    pub fn is_complete(&self) -> bool {
        self.start == 0 && self.items.len() as u64 == DATASET_ITEM_COUNT
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        self.items.zeroize();
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("start", &self.start)
            .field("items", &self.items.len())
            .finish()
    }
}

// =============================================================================
// DATASET SOURCE
// =============================================================================

/// Where a VM reads dataset items from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Compute every item on demand from the cache.
    Light(Arc<Cache>),
    /// Read items from a precomputed dataset.
    Full(Arc<Dataset>),
}

impl DatasetSource {
    /// Dataset item `index`.
    ///
    /// # Panics
    ///
    /// Panics if a `Full` source does not cover `index`.
    #[inline]
    pub fn item(&self, index: u64) -> DatasetItem {
        match self {
            Self::Light(cache) => cache.dataset_item(index),
            Self::Full(dataset) => match dataset.get(index) {
                Some(item) => *item,
                None => panic!(
                    "dataset item {index} outside materialized range {}..{}",
                    dataset.start(),
                    dataset.start() + dataset.len() as u64
                ),
            },
        }
    }
}
