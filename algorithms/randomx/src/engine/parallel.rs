//! Parallel Execution Engine (Dataset Materialization)
//!
//! Splits a run of dataset items into disjoint batches and computes them:
//! 1. In parallel via Rayon if the `multithread` feature is enabled
//! 2. Serially otherwise
//!
//! Items are pure functions of `(cache, index)`, so the batch order does not
//! affect the result.

use crate::cache::{Cache, DatasetItem};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Items per parallel task (256 KiB of output).
pub const BATCH_ITEMS: usize = 4096;

// =============================================================================
// DATASET ENGINE
// =============================================================================

/// Fill `items` with dataset items `start..start + items.len()`.
///
/// `threads == 0` uses the global Rayon pool; otherwise a dedicated pool of
/// that size is built for the duration of the call.
pub fn fill_items(cache: &Cache, start: u64, items: &mut [DatasetItem], threads: usize) {
    let mut fill = || {
        items.process_batches(BATCH_ITEMS, |batch, chunk| {
            let first = start + (batch * BATCH_ITEMS) as u64;
            for (offset, item) in chunk.iter_mut().enumerate() {
                *item = cache.dataset_item(first + offset as u64);
            }
        });
    };

    #[cfg(feature = "multithread")]
    {
        if threads > 0 {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => return pool.install(fill),
                Err(err) => {
                    tracing::warn!(%err, threads, "dedicated init pool unavailable, using global pool");
                }
            }
        }
    }
    #[cfg(not(feature = "multithread"))]
    {
        let _ = threads;
    }

    fill();
}

/// Helper for feature-agnostic batch processing
trait BatchProcessor {
    fn process_batches<F>(self, batch_size: usize, f: F)
    where
        F: Fn(usize, &mut [DatasetItem]) + Sync + Send;
}

impl BatchProcessor for &mut [DatasetItem] {
    fn process_batches<F>(self, batch_size: usize, f: F)
    where
        F: Fn(usize, &mut [DatasetItem]) + Sync + Send,
    {
        #[cfg(feature = "multithread")]
        {
            use rayon::prelude::*;
            self.par_chunks_mut(batch_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk));
        }
        #[cfg(not(feature = "multithread"))]
        {
            self.chunks_mut(batch_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk));
        }
    }
}
