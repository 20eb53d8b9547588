use anyhow::{Context, Result};
use clap::Parser;
use hashobj_core::{Algorithm, STORE_DIR, Store};
use std::path::PathBuf;

#[path = "../logging.rs"]
mod logging;

/// Create an empty hashobj store
#[derive(Parser)]
#[command(name = "hashobj-init")]
#[command(about = "Create an empty object store for hashobj -w", long_about = None)]
#[command(version)]
struct Cli {
    /// Work tree to create the store in
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Hash algorithm to use
    #[arg(long, default_value = "blake3")]
    algo: String,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let algorithm = match cli.algo.as_str() {
        "blake3" | "blake3-256" => Algorithm::Blake3,
        _ => anyhow::bail!("Unsupported algorithm: {}", cli.algo),
    };

    let root = cli.dir.join(STORE_DIR);
    Store::init(&root, algorithm)
        .with_context(|| format!("Failed to initialize store at {}", root.display()))?;

    println!("Initialized hashobj store at {}", root.display());
    println!("Algorithm: {}", algorithm.as_str());

    Ok(())
}
