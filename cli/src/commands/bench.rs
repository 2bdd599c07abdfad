//! Bench Command
//!
//! Hashes sequential nonces on a Rayon pool and reports the hash rate, the
//! way a miner would drive the handle.

use anyhow::Result;
use rayon::prelude::*;
use std::time::Instant;

use crate::KeyArgs;

/// Block template stand-in; the nonce lives at bytes 39..43 as in Monero.
const TEMPLATE_LEN: usize = 76;
const NONCE_OFFSET: usize = 39;

fn blob(nonce: u32) -> [u8; TEMPLATE_LEN] {
    let mut blob = [0u8; TEMPLATE_LEN];
    blob[NONCE_OFFSET..NONCE_OFFSET + 4].copy_from_slice(&nonce.to_le_bytes());
    blob
}

/// Hash `nonces` templates and print throughput.
pub fn bench(key: &KeyArgs, nonces: u32, threads: usize, difficulty: Option<u64>) -> Result<()> {
    let init_start = Instant::now();
    let rx = super::open(key)?;
    let init = init_start.elapsed();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let workers = pool.current_num_threads();

    let hash_start = Instant::now();
    let (hits, xor) = pool.install(|| {
        (0..nonces)
            .into_par_iter()
            .map(|nonce| {
                let hash = rx.hash(&blob(nonce));
                let hit = difficulty.is_some_and(|d| randomx::meets_difficulty(&hash, d));
                (usize::from(hit), hash)
            })
            .reduce(
                || (0, [0u8; 32]),
                |(hits_a, mut acc), (hits_b, hash)| {
                    for (a, b) in acc.iter_mut().zip(hash) {
                        *a ^= b;
                    }
                    (hits_a + hits_b, acc)
                },
            )
    });
    let elapsed = hash_start.elapsed();

    println!("Backend:     {}", randomx::active_backend());
    println!("Mode:        {}", rx.mode());
    println!("Init:        {:.2?}", init);
    println!("Threads:     {}", workers);
    println!("Hashes:      {}", nonces);
    println!("Elapsed:     {:.2?}", elapsed);
    println!(
        "Rate:        {:.1} H/s",
        f64::from(nonces) / elapsed.as_secs_f64()
    );
    // Order-independent digest of all results, for comparing runs.
    println!("Result XOR:  {}", hex::encode(xor));
    if let Some(d) = difficulty {
        println!("Hits @ {}: {}", d, hits);
    }

    Ok(())
}
