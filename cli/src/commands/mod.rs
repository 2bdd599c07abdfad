//! CLI Commands
//!
//! All randomx CLI commands organized as separate modules.

mod bench;
mod check;
mod hash;

pub use bench::bench;
pub use check::check_mode;
pub use hash::hash_inputs;

use anyhow::{Context, Result};
use randomx::{Config, RandomX};

use crate::KeyArgs;

/// Build a handle from the shared key options.
pub fn open(args: &KeyArgs) -> Result<RandomX> {
    let key = match &args.key_hex {
        Some(hex_key) => hex::decode(hex_key).context("Invalid --key-hex")?,
        None => args.key.as_bytes().to_vec(),
    };
    let config = Config::new(args.mode)
        .init_threads(args.init_threads)
        .vm_pool_size(rayon::current_num_threads());
    RandomX::with_config(&key, config).map_err(|e| anyhow::anyhow!("{}", e))
}
