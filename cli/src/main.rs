//! RandomX CLI
//!
//! Hash, verify and benchmark RandomX from the command line.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{bench, check_mode, hash_inputs};
use randomx::Mode;
use std::path::PathBuf;

// =============================================================================
// CLI DEFINITION
// =============================================================================

#[derive(Parser)]
#[command(name = "randomx")]
#[command(about = "RandomX proof-of-work hashing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Files to hash (if no subcommand)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Hash literal strings instead of files
    #[arg(short = 's', long = "string", value_name = "TEXT")]
    strings: Vec<String>,

    #[command(flatten)]
    key: KeyArgs,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Key and dataset options shared by every command.
#[derive(Args, Clone)]
pub struct KeyArgs {
    /// Key (seed) as a UTF-8 string
    #[arg(short, long, global = true, default_value = "test key 000")]
    key: String,

    /// Key (seed) as hex; overrides --key
    #[arg(long, global = true, value_name = "HEX")]
    key_hex: Option<String>,

    /// Dataset mode: light (on-demand) or fast (precomputed)
    #[arg(short, long, global = true, default_value = "light")]
    mode: Mode,

    /// Threads for fast-mode dataset initialization (0 = all cores)
    #[arg(long, global = true, default_value_t = 0)]
    init_threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify checksums from file (like sha256sum -c)
    Check {
        #[arg(value_name = "FILE")]
        checksum_file: PathBuf,
    },
    /// Measure hashes per second over sequential nonces
    Bench {
        /// Number of hashes to compute
        #[arg(short, long, default_value_t = 64)]
        nonces: u32,

        /// Hashing threads (0 = all cores)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,

        /// Count hashes meeting this difficulty
        #[arg(long)]
        difficulty: Option<u64>,
    },
}

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Some(Commands::Check { checksum_file }) => check_mode(checksum_file, &cli.key)?,
        Some(Commands::Bench {
            nonces,
            threads,
            difficulty,
        }) => bench(&cli.key, *nonces, *threads, *difficulty)?,
        None => {
            if cli.files.is_empty() && cli.strings.is_empty() {
                eprintln!("Error: No input specified");
                eprintln!("Usage: randomx [FILE]... | randomx -s TEXT | randomx --help");
                std::process::exit(1);
            }

            hash_inputs(&cli.files, &cli.strings, &cli.key)?;
        }
    }

    Ok(())
}
