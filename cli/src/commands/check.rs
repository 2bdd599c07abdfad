//! Check Command
//!
//! Verify checksums from file (like sha256sum -c), under one RandomX key.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::KeyArgs;

// =============================================================================
// CHECK
// =============================================================================

/// Verify checksums from a checksum file.
pub fn check_mode(checksum_file: &PathBuf, key: &KeyArgs) -> Result<()> {
    let file = File::open(checksum_file)
        .with_context(|| format!("Failed to open: {}", checksum_file.display()))?;

    let rx = super::open(key)?;
    let reader = BufReader::new(file);
    let mut total = 0;
    let mut failed = 0;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Format: "hash  filename" (two spaces)
        let Some((expected_hex, file_path)) = line.split_once("  ") else {
            eprintln!("Warning: Invalid format: {}", line);
            continue;
        };
        let file_path = file_path.trim();
        total += 1;

        let expected: [u8; 32] = match hex::decode(expected_hex.trim())
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
        {
            Some(hash) => hash,
            None => {
                println!("{}: FAILED (Malformed hash)", file_path);
                failed += 1;
                continue;
            }
        };

        match std::fs::read(file_path) {
            Ok(data) => {
                if rx.verify(&data, &expected) {
                    println!("{}: OK", file_path);
                } else {
                    println!("{}: FAILED", file_path);
                    failed += 1;
                }
            }
            Err(e) => {
                println!("{}: FAILED ({})", file_path, e);
                failed += 1;
            }
        }
    }

    println!();
    if failed == 0 {
        println!("All {} checksums verified", total);
    } else {
        eprintln!("WARNING: {} of {} checksums did NOT match", failed, total);
        std::process::exit(1);
    }

    Ok(())
}
