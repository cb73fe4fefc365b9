//! ANN benchmark harness CLI.
//!
//! ## Commands
//!
//! ```bash
//! # Generate a synthetic workload with exact ground truth
//! annbench generate --out-dir ./data --vectors 10000 --queries 100 --dim 32
//!
//! # Inspect a vector file's framing
//! annbench info ./data/base.fvecs
//!
//! # Run the benchmark against the bundled scan backend
//! annbench run --base ./data/base.fvecs --query ./data/query.fvecs \
//!     --groundtruth ./data/groundtruth.ivecs --dim 32
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "annbench")]
#[command(version, about = "Recall benchmark harness for vector-search backends")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the insert/query workload against a backend and report recall
    Run(commands::RunArgs),

    /// Print the framing of an fvecs/ivecs file
    Info(commands::InfoArgs),

    /// Generate a synthetic workload with exact ground truth
    Generate(commands::GenerateArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run(args),
        Commands::Info(args) => commands::info(args),
        Commands::Generate(args) => commands::generate(args),
    }
}
