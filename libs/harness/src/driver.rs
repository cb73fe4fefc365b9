//! Workload driver: sequences the end-to-end benchmark.
//!
//! One run is strictly ordered: create the collection, declare the index,
//! stream every base vector as an insert, run every query at `LIMIT 100`,
//! then report. Schema failures and dataset shape mismatches are fatal;
//! per-row insert/query failures are warned, counted, and skipped so a
//! partially failing backend still yields a valid recall estimate over the
//! queries that completed.

use serde::Serialize;
use tracing::warn;

use crate::backend::{self, Backend, IndexParams, ResultRow};
use crate::error::{HarnessError, Result};
use crate::metric::{RecallMetric, RecallReport};
use crate::timer::Timer;
use crate::vecs::{GroundTruth, VectorSet};

/// Row limit on every similarity query. Fixed so recall@100 is computable.
pub const QUERY_LIMIT: usize = 100;

/// Configuration for one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Collection name declared on the backend.
    pub collection: String,
    /// Expected vector dimension; decoded sets must match exactly.
    pub dim: usize,
    /// Index construction parameters, passed through verbatim.
    pub index: IndexParams,
    /// Emit a progress line every this many rows.
    pub progress_interval: usize,
}

impl BenchmarkConfig {
    pub fn new(collection: impl Into<String>, dim: usize) -> Self {
        Self {
            collection: collection.into(),
            dim,
            index: IndexParams::default(),
            progress_interval: 1000,
        }
    }

    /// Set the index parameters.
    pub fn with_index(mut self, index: IndexParams) -> Self {
        self.index = index;
        self
    }

    /// Set the progress reporting interval.
    pub fn with_progress_interval(mut self, rows: usize) -> Self {
        self.progress_interval = rows.max(1);
        self
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub collection: String,
    pub dim: usize,
    /// Base vectors in the workload.
    pub base_rows: usize,
    /// Inserts the backend accepted.
    pub inserted_rows: usize,
    /// Inserts the backend rejected (non-fatal, not retried).
    pub insert_failures: usize,
    /// Queries in the workload.
    pub queries: usize,
    /// Queries rejected or unparsable; excluded from recall accounting.
    pub query_failures: usize,
    /// Wall-clock seconds spent in the insert phase.
    pub load_secs: f64,
    /// Wall-clock seconds spent in the query phase.
    pub query_secs: f64,
    pub recall: RecallReport,
}

/// Drives a backend through the full insert/query workload.
pub struct WorkloadDriver {
    config: BenchmarkConfig,
    timer: Timer,
}

impl WorkloadDriver {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            timer: Timer::start(),
        }
    }

    /// Run the benchmark end to end.
    ///
    /// Fatal: shape mismatches between the config, the decoded sets, and the
    /// ground truth; rejection of either schema command. Everything else is
    /// per-row and survives into the summary as failure counts.
    pub fn run(
        &self,
        backend: &mut dyn Backend,
        base: &VectorSet,
        queries: &VectorSet,
        ground_truth: &GroundTruth,
    ) -> Result<RunSummary> {
        self.check_shapes(base, queries, ground_truth)?;
        self.create_schema(backend)?;

        let load_start = self.timer.elapsed_secs();
        let insert_failures = self.load(backend, base);
        let load_secs = self.timer.elapsed_secs() - load_start;

        let query_start = self.timer.elapsed_secs();
        let (metric, query_failures) = self.query(backend, queries, ground_truth);
        let query_secs = self.timer.elapsed_secs() - query_start;

        println!(
            "{} computing recalls over {} of {} queries",
            self.timer.stamp(),
            metric.total_queries(),
            queries.len()
        );

        Ok(RunSummary {
            collection: self.config.collection.clone(),
            dim: self.config.dim,
            base_rows: base.len(),
            inserted_rows: base.len() - insert_failures,
            insert_failures,
            queries: queries.len(),
            query_failures,
            load_secs,
            query_secs,
            recall: metric.report(),
        })
    }

    /// A mismatch here means the dataset and ground truth are not the pair
    /// the run was configured for; every metric downstream would be noise.
    fn check_shapes(
        &self,
        base: &VectorSet,
        queries: &VectorSet,
        ground_truth: &GroundTruth,
    ) -> Result<()> {
        if base.dimension() != self.config.dim {
            return Err(HarnessError::DimensionMismatch {
                subject: "base vector dimension",
                expected: self.config.dim,
                actual: base.dimension(),
            });
        }
        if queries.dimension() != self.config.dim {
            return Err(HarnessError::DimensionMismatch {
                subject: "query vector dimension",
                expected: self.config.dim,
                actual: queries.dimension(),
            });
        }
        if ground_truth.len() != queries.len() {
            return Err(HarnessError::DimensionMismatch {
                subject: "ground truth query count",
                expected: queries.len(),
                actual: ground_truth.len(),
            });
        }
        Ok(())
    }

    fn create_schema(&self, backend: &mut dyn Backend) -> Result<()> {
        println!(
            "{} creating collection '{}' ({}d)",
            self.timer.stamp(),
            self.config.collection,
            self.config.dim
        );
        backend
            .execute(&backend::create_collection(
                &self.config.collection,
                self.config.dim,
            ))
            .map_err(|e| HarnessError::Schema {
                stage: "create collection",
                reason: e.to_string(),
            })?;

        println!(
            "{} creating vector index (m = {}, ef_construction = {}, ef_search = {})",
            self.timer.stamp(),
            self.config.index.m,
            self.config.index.ef_construction,
            self.config.index.ef_search
        );
        backend
            .execute(&backend::create_index(
                &self.config.collection,
                &self.config.index,
            ))
            .map_err(|e| HarnessError::Schema {
                stage: "create index",
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Stream base vectors in input order with zero-based row identifiers.
    /// Returns the rejected-insert count.
    fn load(&self, backend: &mut dyn Backend, base: &VectorSet) -> usize {
        let mut failures = 0usize;
        for (row, vector) in base.iter().enumerate() {
            if row % self.config.progress_interval == 0 {
                println!(
                    "{} loading database, {}/{}",
                    self.timer.stamp(),
                    row,
                    base.len()
                );
            }
            let command = backend::insert_row(&self.config.collection, vector, row as u32);
            if let Err(e) = backend.execute(&command) {
                warn!(row, error = %e, "insert rejected");
                failures += 1;
            }
        }
        println!(
            "{} loaded {}/{} rows",
            self.timer.stamp(),
            base.len() - failures,
            base.len()
        );
        failures
    }

    /// Run every query, feeding parsed identifiers into the metric. A query
    /// whose command fails or whose rows cannot be parsed is excluded from
    /// recall accounting entirely.
    fn query(
        &self,
        backend: &mut dyn Backend,
        queries: &VectorSet,
        ground_truth: &GroundTruth,
    ) -> (RecallMetric, usize) {
        let mut metric = RecallMetric::new();
        let mut failures = 0usize;
        for (qi, vector) in queries.iter().enumerate() {
            if qi % self.config.progress_interval == 0 {
                println!(
                    "{} running queries, {}/{}",
                    self.timer.stamp(),
                    qi,
                    queries.len()
                );
            }
            let command = backend::similarity_query(&self.config.collection, vector, QUERY_LIMIT);
            match backend.execute(&command) {
                Ok(rows) => match parse_result_ids(&rows) {
                    Ok(ids) => metric.record(&ids, ground_truth.row(qi)),
                    Err(e) => {
                        warn!(query = qi, error = %e, "query result unparsable");
                        failures += 1;
                    }
                },
                Err(e) => {
                    warn!(query = qi, error = %e, "query rejected");
                    failures += 1;
                }
            }
        }
        (metric, failures)
    }
}

/// Interpret each row's first field as a stored identifier, in rank order.
fn parse_result_ids(rows: &[ResultRow]) -> Result<Vec<u32>> {
    rows.iter()
        .map(|row| {
            let field = row
                .id_field()
                .ok_or_else(|| HarnessError::Row("empty result row".to_string()))?;
            field
                .parse::<u32>()
                .map_err(|_| HarnessError::Row(format!("result id {field:?} is not an integer")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;

    /// Stub that accepts schema and inserts, and echoes a fixed id list for
    /// every query.
    struct EchoBackend {
        echo: Vec<u32>,
    }

    impl EchoBackend {
        fn new(echo: Vec<u32>) -> Self {
            Self { echo }
        }
    }

    impl Backend for EchoBackend {
        fn execute(&mut self, command: &str) -> std::result::Result<Vec<ResultRow>, BackendError> {
            if command.starts_with("SELECT") {
                Ok(self
                    .echo
                    .iter()
                    .map(|id| ResultRow::new(vec![id.to_string()]))
                    .collect())
            } else {
                Ok(Vec::new())
            }
        }
    }

    /// Stub that rejects configured insert rows and query indexes.
    struct FlakyBackend {
        inner: EchoBackend,
        fail_insert_rows: Vec<usize>,
        fail_queries: Vec<usize>,
        inserts: usize,
        selects: usize,
    }

    impl Backend for FlakyBackend {
        fn execute(&mut self, command: &str) -> std::result::Result<Vec<ResultRow>, BackendError> {
            if command.starts_with("INSERT") {
                let row = self.inserts;
                self.inserts += 1;
                if self.fail_insert_rows.contains(&row) {
                    return Err("disk full".into());
                }
            } else if command.starts_with("SELECT") {
                let q = self.selects;
                self.selects += 1;
                if self.fail_queries.contains(&q) {
                    return Err("timeout".into());
                }
            }
            self.inner.execute(command)
        }
    }

    fn workload(n_base: usize, n_queries: usize) -> (VectorSet, VectorSet, GroundTruth) {
        let base: Vec<Vec<f32>> = (0..n_base).map(|i| vec![i as f32, 0.0]).collect();
        let queries: Vec<Vec<f32>> = (0..n_queries).map(|i| vec![i as f32, 0.0]).collect();
        let gt: Vec<Vec<u32>> = (0..n_queries).map(|i| vec![i as u32]).collect();
        (
            VectorSet::from_rows(2, &base).unwrap(),
            VectorSet::from_rows(2, &queries).unwrap(),
            GroundTruth::from_rows(&gt).unwrap(),
        )
    }

    #[test]
    fn test_echoed_target_scores_full_recall() {
        let (base, queries, gt) = workload(2, 1);
        let mut backend = EchoBackend::new(vec![0, 1]);
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));

        let summary = driver.run(&mut backend, &base, &queries, &gt).unwrap();
        assert_eq!(summary.recall.recall_at_1, 1.0);
        assert_eq!(summary.recall.recall_at_10, 1.0);
        assert_eq!(summary.recall.recall_at_100, 1.0);
        assert_eq!(summary.inserted_rows, 2);
        assert_eq!(summary.insert_failures, 0);
    }

    #[test]
    fn test_insert_failure_does_not_stop_the_load() {
        let (base, queries, gt) = workload(5, 1);
        let mut backend = FlakyBackend {
            inner: EchoBackend::new(vec![0]),
            fail_insert_rows: vec![2],
            fail_queries: vec![],
            inserts: 0,
            selects: 0,
        };
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));

        let summary = driver.run(&mut backend, &base, &queries, &gt).unwrap();
        // Every row was still attempted.
        assert_eq!(backend.inserts, 5);
        assert_eq!(summary.insert_failures, 1);
        assert_eq!(summary.inserted_rows, 4);
    }

    #[test]
    fn test_failed_query_is_excluded_from_recall() {
        let (base, queries, gt) = workload(3, 3);
        let mut backend = FlakyBackend {
            inner: EchoBackend::new(vec![9, 9, 9]),
            fail_insert_rows: vec![],
            fail_queries: vec![1],
            inserts: 0,
            selects: 0,
        };
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));

        let summary = driver.run(&mut backend, &base, &queries, &gt).unwrap();
        assert_eq!(summary.query_failures, 1);
        // Two queries completed (both misses against echo [9,9,9]).
        assert_eq!(summary.recall.queries, 2);
    }

    #[test]
    fn test_unparsable_result_id_is_excluded() {
        struct Garbled;
        impl Backend for Garbled {
            fn execute(
                &mut self,
                command: &str,
            ) -> std::result::Result<Vec<ResultRow>, BackendError> {
                if command.starts_with("SELECT") {
                    Ok(vec![ResultRow::new(vec!["not-a-number".to_string()])])
                } else {
                    Ok(Vec::new())
                }
            }
        }

        let (base, queries, gt) = workload(1, 1);
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));
        let summary = driver.run(&mut Garbled, &base, &queries, &gt).unwrap();
        assert_eq!(summary.query_failures, 1);
        assert_eq!(summary.recall.queries, 0);
        assert_eq!(summary.recall.recall_at_100, 0.0);
    }

    #[test]
    fn test_schema_rejection_is_fatal() {
        struct NoSchema;
        impl Backend for NoSchema {
            fn execute(
                &mut self,
                command: &str,
            ) -> std::result::Result<Vec<ResultRow>, BackendError> {
                if command.starts_with("CREATE TABLE") {
                    Err("unsupported type VECTOR".into())
                } else {
                    Ok(Vec::new())
                }
            }
        }

        let (base, queries, gt) = workload(1, 1);
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));
        let err = driver.run(&mut NoSchema, &base, &queries, &gt).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Schema {
                stage: "create collection",
                ..
            }
        ));
    }

    #[test]
    fn test_index_rejection_is_fatal() {
        struct NoIndex;
        impl Backend for NoIndex {
            fn execute(
                &mut self,
                command: &str,
            ) -> std::result::Result<Vec<ResultRow>, BackendError> {
                if command.starts_with("CREATE INDEX") {
                    Err("hnsw not available".into())
                } else {
                    Ok(Vec::new())
                }
            }
        }

        let (base, queries, gt) = workload(1, 1);
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));
        let err = driver.run(&mut NoIndex, &base, &queries, &gt).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Schema {
                stage: "create index",
                ..
            }
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_fatal_before_any_command() {
        struct Untouchable;
        impl Backend for Untouchable {
            fn execute(&mut self, _: &str) -> std::result::Result<Vec<ResultRow>, BackendError> {
                panic!("driver must not reach the backend on a shape mismatch");
            }
        }

        let (base, queries, gt) = workload(2, 1);
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 3));
        let err = driver.run(&mut Untouchable, &base, &queries, &gt).unwrap_err();
        assert!(matches!(err, HarnessError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_ground_truth_count_mismatch_is_fatal() {
        let (base, queries, _) = workload(2, 2);
        let gt = GroundTruth::from_rows(&[vec![0]]).unwrap();
        let driver = WorkloadDriver::new(BenchmarkConfig::new("items", 2));
        let mut backend = EchoBackend::new(vec![0]);
        let err = driver.run(&mut backend, &base, &queries, &gt).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::DimensionMismatch {
                subject: "ground truth query count",
                ..
            }
        ));
    }
}
