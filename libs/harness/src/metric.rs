//! Recall accounting for benchmark queries.
//!
//! Scores the single nearest ground-truth neighbor: a query is a hit at
//! cutoff `k` when its true nearest item appears within the first `k`
//! returned identifiers. This is the classic harness convention and differs
//! from set-overlap recall@k over all ground-truth neighbors.

use serde::Serialize;

/// Running hit counters, mutated once per completed query.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecallMetric {
    hits_at_1: u64,
    hits_at_10: u64,
    hits_at_100: u64,
    total_queries: u64,
}

impl RecallMetric {
    /// Fresh accumulator with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed query.
    ///
    /// The target is `gt_row[0]`, the true nearest identifier. Result ids
    /// are scanned in rank order; only the target's first occurrence counts,
    /// bucketed into the nested cutoffs. A query whose results never contain
    /// the target still advances `total_queries`.
    pub fn record(&mut self, result_ids: &[u32], gt_row: &[u32]) {
        self.total_queries += 1;
        let Some(&target) = gt_row.first() else {
            return;
        };
        if let Some(rank) = result_ids.iter().position(|&id| id == target) {
            if rank < 1 {
                self.hits_at_1 += 1;
            }
            if rank < 10 {
                self.hits_at_10 += 1;
            }
            if rank < 100 {
                self.hits_at_100 += 1;
            }
        }
    }

    /// Queries recorded so far.
    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    /// Recall figures over everything recorded so far. All zeros when no
    /// query completed; never divides by zero.
    pub fn report(&self) -> RecallReport {
        let ratio = |hits: u64| {
            if self.total_queries == 0 {
                0.0
            } else {
                hits as f64 / self.total_queries as f64
            }
        };
        RecallReport {
            recall_at_1: ratio(self.hits_at_1),
            recall_at_10: ratio(self.hits_at_10),
            recall_at_100: ratio(self.hits_at_100),
            queries: self.total_queries,
        }
    }
}

/// Recall@1/10/100 over the queries that completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecallReport {
    pub recall_at_1: f64,
    pub recall_at_10: f64,
    pub recall_at_100: f64,
    /// Queries the figures are averaged over.
    pub queries: u64,
}

impl std::fmt::Display for RecallReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "R@1 = {:.4}", self.recall_at_1)?;
        writeln!(f, "R@10 = {:.4}", self.recall_at_10)?;
        writeln!(f, "R@100 = {:.4}", self.recall_at_100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_at_rank_two_hits_10_and_100() {
        let mut metric = RecallMetric::new();
        metric.record(&[7, 3, 9, 2], &[9, 1, 4]);

        let report = metric.report();
        assert_eq!(report.queries, 1);
        assert_eq!(report.recall_at_1, 0.0);
        assert_eq!(report.recall_at_10, 1.0);
        assert_eq!(report.recall_at_100, 1.0);
    }

    #[test]
    fn test_target_at_rank_zero_hits_all_cutoffs() {
        let mut metric = RecallMetric::new();
        metric.record(&[9, 7, 3], &[9]);

        let report = metric.report();
        assert_eq!(report.recall_at_1, 1.0);
        assert_eq!(report.recall_at_10, 1.0);
        assert_eq!(report.recall_at_100, 1.0);
    }

    #[test]
    fn test_absent_target_counts_query_without_hits() {
        let mut metric = RecallMetric::new();
        metric.record(&[1, 2, 3], &[9]);

        let report = metric.report();
        assert_eq!(report.queries, 1);
        assert_eq!(report.recall_at_1, 0.0);
        assert_eq!(report.recall_at_10, 0.0);
        assert_eq!(report.recall_at_100, 0.0);
    }

    #[test]
    fn test_only_first_occurrence_counts() {
        // Duplicate of the target past rank 0 must not double-count.
        let mut metric = RecallMetric::new();
        metric.record(&[9, 9, 9], &[9]);

        let report = metric.report();
        assert_eq!(report.recall_at_1, 1.0);
        assert_eq!(report.recall_at_10, 1.0);
    }

    #[test]
    fn test_target_beyond_rank_100_is_a_miss() {
        let mut metric = RecallMetric::new();
        let mut ids: Vec<u32> = (1..=100).collect();
        ids.push(0);
        metric.record(&ids, &[0]);

        let report = metric.report();
        assert_eq!(report.recall_at_100, 0.0);
        assert_eq!(report.queries, 1);
    }

    #[test]
    fn test_recall_is_monotonic_across_cutoffs() {
        let mut metric = RecallMetric::new();
        metric.record(&[5, 9, 1], &[9]); // rank 1
        metric.record(&[9, 2, 3], &[9]); // rank 0
        metric.record(&[1, 2, 3], &[9]); // miss
        let mut far: Vec<u32> = (100..150).collect();
        far.insert(20, 9);
        metric.record(&far, &[9]); // rank 20

        let report = metric.report();
        assert!(report.recall_at_1 <= report.recall_at_10);
        assert!(report.recall_at_10 <= report.recall_at_100);
        assert_eq!(report.queries, 4);
    }

    #[test]
    fn test_zero_queries_reports_zero() {
        let report = RecallMetric::new().report();
        assert_eq!(report.queries, 0);
        assert_eq!(report.recall_at_1, 0.0);
        assert_eq!(report.recall_at_10, 0.0);
        assert_eq!(report.recall_at_100, 0.0);
    }

    #[test]
    fn test_display_matches_harness_output() {
        let mut metric = RecallMetric::new();
        metric.record(&[9], &[9]);
        let text = metric.report().to_string();
        assert_eq!(text, "R@1 = 1.0000\nR@10 = 1.0000\nR@100 = 1.0000\n");
    }
}
