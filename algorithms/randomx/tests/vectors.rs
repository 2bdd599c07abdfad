//! Known-Answer Vectors for RandomX
//!
//! Checks hashes, cache words and dataset items against the canonical JSON
//! vectors shared by every RandomX implementation.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use randomx::{Cache, Mode, RandomX};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

#[derive(Deserialize)]
struct Vector {
    name: String,
    key: String,
    input: String,
    hash: String,
}

#[derive(Deserialize)]
struct CacheWord {
    index: usize,
    value: String,
}

#[derive(Deserialize)]
struct DatasetWord {
    index: u64,
    first_word: String,
}

#[derive(Deserialize)]
struct CacheVectors {
    key: String,
    words: Vec<CacheWord>,
    dataset_items: Vec<DatasetWord>,
}

#[derive(Deserialize)]
struct TestVectors {
    vectors: Vec<Vector>,
    cache: CacheVectors,
}

fn load() -> TestVectors {
    let file = File::open("tests/test_vectors.json").expect("Failed to open test_vectors.json");
    serde_json::from_reader(BufReader::new(file)).expect("Failed to parse JSON")
}

fn parse_word(hex_word: &str) -> u64 {
    u64::from_str_radix(hex_word, 16).expect("Invalid hex word")
}

#[test]
fn test_light_mode_vectors() {
    let data = load();
    let first_key = data.vectors[0].key.as_bytes();
    let rx = RandomX::new(first_key, Mode::Light).unwrap();

    println!("\n=== Verifying Light-Mode Hash Vectors ===");

    // Vectors are grouped by key; switching keys goes through update_key.
    for vector in data.vectors {
        rx.update_key(vector.key.as_bytes()).unwrap();
        let hash = rx.hash(vector.input.as_bytes());
        let hex_hash = hex::encode(hash);

        assert_eq!(hex_hash, vector.hash, "Vector Mismatched: {}", vector.name);
        assert!(rx.verify(vector.input.as_bytes(), &hash));
        println!("✅ {:<24} | {}", vector.name, hex_hash);
    }
    println!("=========================================\n");
}

#[test]
fn test_cache_and_dataset_vectors() {
    let data = load().cache;
    let cache = Cache::new(data.key.as_bytes()).unwrap();

    for word in data.words {
        assert_eq!(
            cache.word(word.index),
            parse_word(&word.value),
            "Cache word {} mismatched",
            word.index
        );
    }

    for item in data.dataset_items {
        assert_eq!(
            cache.dataset_item(item.index)[0],
            parse_word(&item.first_word),
            "Dataset item {} mismatched",
            item.index
        );
    }
}
