//! Aggregate counters for chaining and retraction.
//!
//! When the `tracing` feature is enabled, the knowledge base counts
//! derivation and retraction activity. When disabled, all operations are
//! no-ops with zero overhead. Counters are plain integers behind `&mut`,
//! matching the single-threaded execution model.

/// Snapshot of the counters at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsReport {
    /// (fact, rule) derivation attempts
    pub infer_attempts: u64,
    /// Attempts whose first condition matched
    pub infer_matches: u64,
    /// Facts created by derivation
    pub facts_derived: u64,
    /// Partial rules created by derivation
    pub rules_derived: u64,
    /// Justification merges into an existing item
    pub merges: u64,
    /// Successful retract calls
    pub retractions: u64,
    /// Items removed by cascading delete (including the retract root)
    pub cascade_removals: u64,
}

#[cfg(feature = "tracing")]
mod enabled {
    use super::MetricsReport;

    /// Counters collected while the knowledge base runs.
    #[derive(Debug, Clone, Default)]
    pub struct ChainMetrics {
        report: MetricsReport,
    }

    impl ChainMetrics {
        pub fn new() -> Self {
            Self::default()
        }

        pub(crate) fn infer_attempt(&mut self) {
            self.report.infer_attempts += 1;
        }

        pub(crate) fn infer_match(&mut self) {
            self.report.infer_matches += 1;
        }

        pub(crate) fn fact_derived(&mut self) {
            self.report.facts_derived += 1;
        }

        pub(crate) fn rule_derived(&mut self) {
            self.report.rules_derived += 1;
        }

        pub(crate) fn merge(&mut self) {
            self.report.merges += 1;
        }

        pub(crate) fn retraction(&mut self) {
            self.report.retractions += 1;
        }

        pub(crate) fn cascade_removal(&mut self) {
            self.report.cascade_removals += 1;
        }

        /// Snapshot the current counter values.
        pub fn report(&self) -> MetricsReport {
            self.report
        }
    }
}

#[cfg(not(feature = "tracing"))]
mod disabled {
    use super::MetricsReport;

    /// No-op twin of the metrics collector.
    #[derive(Debug, Clone, Default)]
    pub struct ChainMetrics;

    impl ChainMetrics {
        pub fn new() -> Self {
            Self
        }

        pub(crate) fn infer_attempt(&mut self) {}
        pub(crate) fn infer_match(&mut self) {}
        pub(crate) fn fact_derived(&mut self) {}
        pub(crate) fn rule_derived(&mut self) {}
        pub(crate) fn merge(&mut self) {}
        pub(crate) fn retraction(&mut self) {}
        pub(crate) fn cascade_removal(&mut self) {}

        /// All-zero report when metrics are disabled.
        pub fn report(&self) -> MetricsReport {
            MetricsReport::default()
        }
    }
}

#[cfg(feature = "tracing")]
pub use enabled::ChainMetrics;

#[cfg(not(feature = "tracing"))]
pub use disabled::ChainMetrics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metrics_report_is_zero() {
        let metrics = ChainMetrics::new();
        assert_eq!(metrics.report(), MetricsReport::default());
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn counters_accumulate() {
        let mut metrics = ChainMetrics::new();
        metrics.infer_attempt();
        metrics.infer_attempt();
        metrics.infer_match();
        metrics.fact_derived();
        let report = metrics.report();
        assert_eq!(report.infer_attempts, 2);
        assert_eq!(report.infer_matches, 1);
        assert_eq!(report.facts_derived, 1);
        assert_eq!(report.rules_derived, 0);
    }
}
