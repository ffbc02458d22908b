//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `network_enrollments_total` - Affiliates enrolled
//! - `network_payments_confirmed_total` - Orders confirmed paid
//! - `network_bv_accrued_total` - Total BV credited up the tree
//! - `network_accrual_depth` - Histogram of upline walk lengths
//! - `network_tree_queries_total` - Tree snapshots served

use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Affiliates enrolled
    pub enrollments_total: IntCounter,

    /// Payments confirmed
    pub payments_confirmed_total: IntCounter,

    /// BV credited to ancestors
    pub bv_accrued_total: Counter,

    /// Upline walk length per confirmation
    pub accrual_depth: Histogram,

    /// Tree snapshots served
    pub tree_queries_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let enrollments_total =
            IntCounter::with_opts(Opts::new("network_enrollments_total", "Affiliates enrolled"))?;
        registry.register(Box::new(enrollments_total.clone()))?;

        let payments_confirmed_total = IntCounter::with_opts(Opts::new(
            "network_payments_confirmed_total",
            "Orders confirmed paid",
        ))?;
        registry.register(Box::new(payments_confirmed_total.clone()))?;

        let bv_accrued_total = Counter::with_opts(Opts::new(
            "network_bv_accrued_total",
            "Total BV credited up the tree",
        ))?;
        registry.register(Box::new(bv_accrued_total.clone()))?;

        let accrual_depth = Histogram::with_opts(
            HistogramOpts::new("network_accrual_depth", "Upline walk length per confirmation")
                .buckets(vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]),
        )?;
        registry.register(Box::new(accrual_depth.clone()))?;

        let tree_queries_total =
            IntCounter::with_opts(Opts::new("network_tree_queries_total", "Tree snapshots served"))?;
        registry.register(Box::new(tree_queries_total.clone()))?;

        Ok(Self {
            enrollments_total,
            payments_confirmed_total,
            bv_accrued_total,
            accrual_depth,
            tree_queries_total,
            registry,
        })
    }

    /// Record a completed enrollment
    pub fn record_enrollment(&self) {
        self.enrollments_total.inc();
    }

    /// Record a confirmed payment and its accrual shape
    pub fn record_payment(&self, bv_accrued: f64, ancestors: usize) {
        self.payments_confirmed_total.inc();
        self.bv_accrued_total.inc_by(bv_accrued * ancestors as f64);
        self.accrual_depth.observe(ancestors as f64);
    }

    /// Record a tree snapshot query
    pub fn record_tree_query(&self) {
        self.tree_queries_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.enrollments_total.get(), 0);
        assert_eq!(metrics.payments_confirmed_total.get(), 0);
    }

    #[test]
    fn test_record_enrollment() {
        let metrics = Metrics::new().unwrap();
        metrics.record_enrollment();
        metrics.record_enrollment();
        assert_eq!(metrics.enrollments_total.get(), 2);
    }

    #[test]
    fn test_record_payment_accumulates_bv() {
        let metrics = Metrics::new().unwrap();
        // 300 BV credited to 2 ancestors
        metrics.record_payment(300.0, 2);
        assert_eq!(metrics.payments_confirmed_total.get(), 1);
        assert!((metrics.bv_accrued_total.get() - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_tree_query() {
        let metrics = Metrics::new().unwrap();
        metrics.record_tree_query();
        assert_eq!(metrics.tree_queries_total.get(), 1);
    }
}
