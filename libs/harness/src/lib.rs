//! Recall benchmark harness for vector-search backends.
//!
//! Loads fvecs/ivecs workloads, drives a backend through a textual
//! insert/query command interface, and scores recall@1/10/100 against
//! precomputed ground truth.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`vecs`] | fvecs/ivecs codec → dense in-memory vector sets |
//! | [`driver`] | end-to-end workload sequencing |
//! | [`metric`] | recall@1/10/100 accounting |
//! | [`backend`] | command seam to the system under test |
//! | [`scan`] | bundled exact-scan reference backend |
//! | [`timer`] | elapsed-time source for progress lines |
//!
//! ## Example
//!
//! ```
//! use annbench_harness::{
//!     BenchmarkConfig, GroundTruth, ScanBackend, VectorSet, WorkloadDriver,
//! };
//!
//! # fn main() -> annbench_harness::Result<()> {
//! let base = VectorSet::from_rows(4, &[
//!     vec![1.0, 0.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0, 0.0],
//! ])?;
//! let queries = VectorSet::from_rows(4, &[vec![1.0, 0.0, 0.0, 0.0]])?;
//! let ground_truth = GroundTruth::from_rows(&[vec![0]])?;
//!
//! let mut backend = ScanBackend::new();
//! let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 4));
//! let summary = driver.run(&mut backend, &base, &queries, &ground_truth)?;
//! assert_eq!(summary.recall.recall_at_1, 1.0);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod driver;
pub mod error;
pub mod metric;
pub mod scan;
pub mod timer;
pub mod vecs;

pub use backend::{Backend, BackendError, IndexParams, ResultRow};
pub use driver::{BenchmarkConfig, RunSummary, WorkloadDriver, QUERY_LIMIT};
pub use error::{HarnessError, Result};
pub use metric::{RecallMetric, RecallReport};
pub use scan::ScanBackend;
pub use timer::Timer;
pub use vecs::{
    probe_file, read_fvecs, read_fvecs_limited, read_ivecs, read_ivecs_limited, write_fvecs,
    write_ivecs, FileInfo, GroundTruth, VectorSet, MAX_DIMENSION,
};
