//! RandomX Basic Example
//!
//! Minimal usage: build a light-mode handle for a key, then hash.

#![allow(clippy::pedantic, clippy::nursery)]

use randomx::{Mode, RandomX};

fn main() -> Result<(), randomx::Error> {
    let rx = RandomX::new(b"test key 000", Mode::Light)?;

    let data = b"This is a test";
    let hash = rx.hash(data);

    println!("Backend: {}", randomx::active_backend());
    println!("Data: {:?}", String::from_utf8_lossy(data));
    println!("Hash: {}", hex::encode(hash));
    Ok(())
}
