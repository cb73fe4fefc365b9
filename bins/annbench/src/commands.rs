//! CLI command implementations.
//!
//! - Run: drive the full workload against a backend and report recall
//! - Info: inspect a vector file's framing
//! - Generate: write a synthetic fvecs/ivecs workload for smoke tests

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use annbench_harness::{
    probe_file, read_fvecs, read_fvecs_limited, read_ivecs, read_ivecs_limited, write_fvecs,
    write_ivecs, BenchmarkConfig, GroundTruth, IndexParams, ScanBackend, VectorSet, WorkloadDriver,
};

// ============================================================================
// Run Command
// ============================================================================

#[derive(Parser)]
pub struct RunArgs {
    /// Base vectors (fvecs)
    #[arg(long)]
    pub base: PathBuf,

    /// Query vectors (fvecs)
    #[arg(long)]
    pub query: PathBuf,

    /// Ground truth neighbor ids (ivecs)
    #[arg(long)]
    pub groundtruth: PathBuf,

    /// Expected vector dimension
    #[arg(long)]
    pub dim: usize,

    /// Collection name declared on the backend
    #[arg(long, default_value = "items")]
    pub collection: String,

    /// Backend to drive (available: scan)
    #[arg(long, default_value = "scan")]
    pub backend: String,

    /// Index graph degree
    #[arg(long, default_value = "16")]
    pub m: usize,

    /// Index construction search width
    #[arg(long, default_value = "64")]
    pub ef_construction: usize,

    /// Index query search width
    #[arg(long, default_value = "100")]
    pub ef_search: usize,

    /// Cap on base vectors to load
    #[arg(long)]
    pub max_base: Option<usize>,

    /// Cap on queries to run (also caps ground-truth rows)
    #[arg(long)]
    pub max_queries: Option<usize>,

    /// Write the run summary as JSON
    #[arg(long)]
    pub out_json: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> Result<()> {
    println!("=== ANN Benchmark ===");
    println!("Base: {:?}", args.base);
    println!("Queries: {:?}", args.query);
    println!("Ground truth: {:?}", args.groundtruth);
    println!("Backend: {}", args.backend);
    println!(
        "Index: m={}, ef_construction={}, ef_search={}",
        args.m, args.ef_construction, args.ef_search
    );

    let base = match args.max_base {
        Some(n) => read_fvecs_limited(&args.base, n),
        None => read_fvecs(&args.base),
    }
    .context("failed to load base vectors")?;
    println!("Loaded {} base vectors ({}D)", base.len(), base.dimension());

    let queries = match args.max_queries {
        Some(n) => read_fvecs_limited(&args.query, n),
        None => read_fvecs(&args.query),
    }
    .context("failed to load query vectors")?;
    println!(
        "Loaded {} query vectors ({}D)",
        queries.len(),
        queries.dimension()
    );

    let ground_truth = match args.max_queries {
        Some(n) => read_ivecs_limited(&args.groundtruth, n),
        None => read_ivecs(&args.groundtruth),
    }
    .context("failed to load ground truth")?;
    println!(
        "Loaded ground truth for {} queries (k={})",
        ground_truth.len(),
        ground_truth.neighbors_per_query()
    );

    let mut backend = match args.backend.as_str() {
        "scan" => ScanBackend::new(),
        other => anyhow::bail!("unknown backend: {other} (available: scan)"),
    };

    let config = BenchmarkConfig::new(&args.collection, args.dim).with_index(
        IndexParams::new()
            .with_m(args.m)
            .with_ef_construction(args.ef_construction)
            .with_ef_search(args.ef_search),
    );
    let driver = WorkloadDriver::new(config);
    let summary = driver.run(&mut backend, &base, &queries, &ground_truth)?;

    println!();
    print!("{}", summary.recall);
    println!(
        "Inserted {}/{} rows, {} insert failures, {} query failures",
        summary.inserted_rows, summary.base_rows, summary.insert_failures, summary.query_failures
    );
    println!(
        "Load: {:.2}s ({:.1} rows/s), Query: {:.2}s ({:.1} q/s)",
        summary.load_secs,
        summary.inserted_rows as f64 / summary.load_secs.max(f64::EPSILON),
        summary.query_secs,
        summary.recall.queries as f64 / summary.query_secs.max(f64::EPSILON),
    );

    if let Some(path) = args.out_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write summary to {path:?}"))?;
        println!("Summary written to {path:?}");
    }

    Ok(())
}

// ============================================================================
// Info Command
// ============================================================================

#[derive(Parser)]
pub struct InfoArgs {
    /// File to inspect (fvecs and ivecs share the framing)
    pub path: PathBuf,
}

pub fn info(args: InfoArgs) -> Result<()> {
    let info = probe_file(&args.path)?;
    println!("File: {:?}", args.path);
    println!("Records: {}", info.records);
    println!("Dimension: {}", info.dimension);
    println!("Record stride: {} bytes", info.stride());
    println!("Total: {} bytes", info.bytes);
    Ok(())
}

// ============================================================================
// Generate Command
// ============================================================================

#[derive(Parser)]
pub struct GenerateArgs {
    /// Output directory for base.fvecs, query.fvecs, groundtruth.ivecs
    #[arg(long, default_value = "./data")]
    pub out_dir: PathBuf,

    /// Number of base vectors
    #[arg(long, default_value = "10000")]
    pub vectors: usize,

    /// Number of query vectors
    #[arg(long, default_value = "100")]
    pub queries: usize,

    /// Vector dimension
    #[arg(long, default_value = "32")]
    pub dim: usize,

    /// Ground-truth neighbors per query
    #[arg(long, default_value = "100")]
    pub k: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,
}

pub fn generate(args: GenerateArgs) -> Result<()> {
    if args.vectors == 0 || args.queries == 0 || args.dim == 0 {
        anyhow::bail!("vectors, queries, and dim must all be positive");
    }
    std::fs::create_dir_all(&args.out_dir).context("failed to create output directory")?;

    println!(
        "Generating {} base vectors and {} queries ({}D, seed {})",
        args.vectors, args.queries, args.dim, args.seed
    );
    let mut rng = StdRng::seed_from_u64(args.seed);
    let base_rows: Vec<Vec<f32>> = (0..args.vectors)
        .map(|_| (0..args.dim).map(|_| rng.gen::<f32>()).collect())
        .collect();
    let query_rows: Vec<Vec<f32>> = (0..args.queries)
        .map(|_| (0..args.dim).map(|_| rng.gen::<f32>()).collect())
        .collect();

    let k = args.k.min(args.vectors);
    println!("Computing exact ground truth (k={k})...");
    let gt_rows: Vec<Vec<u32>> = query_rows
        .iter()
        .enumerate()
        .map(|(qi, query)| {
            let mut scored: Vec<(u32, f32)> = base_rows
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let d: f32 = query
                        .iter()
                        .zip(v.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    (i as u32, d)
                })
                .collect();
            scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            if (qi + 1) % 100 == 0 || qi + 1 == query_rows.len() {
                println!("  {}/{} queries", qi + 1, query_rows.len());
            }
            scored.into_iter().take(k).map(|(id, _)| id).collect()
        })
        .collect();

    let base = VectorSet::from_rows(args.dim, &base_rows)?;
    let queries = VectorSet::from_rows(args.dim, &query_rows)?;
    let ground_truth = GroundTruth::from_rows(&gt_rows)?;

    let base_path = args.out_dir.join("base.fvecs");
    let query_path = args.out_dir.join("query.fvecs");
    let gt_path = args.out_dir.join("groundtruth.ivecs");
    write_fvecs(&base_path, &base)?;
    write_fvecs(&query_path, &queries)?;
    write_ivecs(&gt_path, &ground_truth)?;

    println!("Wrote {base_path:?}");
    println!("Wrote {query_path:?}");
    println!("Wrote {gt_path:?}");
    Ok(())
}
