//! Reduce observability metrics
//!
//! Prometheus-compatible metrics recorded through the `metrics` facade.
//! Installing an exporter is left to the embedding process.

use std::time::Duration;

/// Record a completed reduce pass
pub fn record_reduce(kind: &str, mode: &str, duration: Duration) {
    metrics::counter!(
        "prism_aggs_reduce_total",
        "kind" => kind.to_string(),
        "mode" => mode.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "prism_aggs_reduce_duration_seconds",
        "kind" => kind.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record buckets dropped by the cutoff policy or by queue overflow
pub fn record_buckets_discarded(reason: &str, count: u64) {
    if count == 0 {
        return;
    }
    metrics::counter!(
        "prism_aggs_buckets_discarded_total",
        "reason" => reason.to_string(),
    )
    .increment(count);
}

/// Record a reduction aborted by the bucket budget
pub fn record_bucket_limit_exceeded() {
    metrics::counter!("prism_aggs_bucket_limit_exceeded_total").increment(1);
}

/// Record a reduction aborted by cancellation
pub fn record_reduce_cancelled() {
    metrics::counter!("prism_aggs_reduce_cancelled_total").increment(1);
}
