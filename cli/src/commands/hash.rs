//! Hash Command
//!
//! Hashes files and literal strings under one key, in parallel via Rayon.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;

use crate::KeyArgs;

enum Input<'a> {
    File(&'a PathBuf),
    Text(&'a str),
}

impl Input<'_> {
    fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Text(text) => format!("\"{text}\""),
        }
    }

    fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => {
                std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))
            }
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
        }
    }
}

/// Hash every file and string; one line per input, in argument order.
pub fn hash_inputs(files: &[PathBuf], strings: &[String], key: &KeyArgs) -> Result<()> {
    let rx = super::open(key)?;

    let inputs: Vec<Input<'_>> = files
        .iter()
        .map(Input::File)
        .chain(strings.iter().map(|s| Input::Text(s)))
        .collect();

    // Collecting a parallel iterator keeps argument order.
    let results: Vec<(String, Result<String>)> = inputs
        .par_iter()
        .map(|input| {
            let hashed = input.bytes().map(|data| hex::encode(rx.hash(&data)));
            (input.label(), hashed)
        })
        .collect();

    let mut failed = 0;
    for (label, result) in results {
        match result {
            Ok(hex_hash) => println!("{}  {}", hex_hash, label),
            Err(e) => {
                eprintln!("Error: {}: {}", label, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("Failed to hash {} input(s)", failed);
    }

    Ok(())
}
