//! Reduce context and bucket budget tracking
//!
//! Every reduction receives a [`ReduceContext`] explicitly. The context
//! says whether this is the final pass of a reduce tree and carries the
//! [`BucketConsumer`] that every admitted, evicted or discarded bucket is
//! reported to. Consumers may abort the reduction by returning an error.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

/// Default bucket budget for a single reduction
pub const DEFAULT_MAX_BUCKETS: usize = 65_536;

/// Position of a reduction within a reduce tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceMode {
    /// Intermediate level: keep every distinct key, defer cutoffs
    Partial,
    /// Top level: apply cutoffs and the requested size
    #[default]
    Final,
}

impl ReduceMode {
    pub fn name(&self) -> &'static str {
        match self {
            ReduceMode::Partial => "partial",
            ReduceMode::Final => "final",
        }
    }
}

impl fmt::Display for ReduceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReduceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "partial" => Ok(ReduceMode::Partial),
            "final" => Ok(ReduceMode::Final),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

/// Budget tracker consulted for every bucket a reduction keeps or drops.
///
/// Positive deltas may fail; a failure is fatal for the reduction in flight.
pub trait BucketConsumer: Send + Sync {
    fn consume(&self, delta: i64) -> Result<()>;
}

/// Bucket consumer with a hard limit on live buckets.
///
/// The live count is atomic so one consumer may be shared by concurrent
/// reductions that deliberately draw from the same budget. An optional
/// cancellation flag lets a surrounding scheduler abort work in progress;
/// it is checked on every call.
#[derive(Debug)]
pub struct MultiBucketConsumer {
    limit: usize,
    count: AtomicI64,
    cancelled: Option<Arc<AtomicBool>>,
}

impl MultiBucketConsumer {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            count: AtomicI64::new(0),
            cancelled: None,
        }
    }

    /// Observe a shared cancellation flag
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Buckets currently accounted as live
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for MultiBucketConsumer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUCKETS)
    }
}

impl BucketConsumer for MultiBucketConsumer {
    fn consume(&self, delta: i64) -> Result<()> {
        if self.is_cancelled() {
            crate::metrics::record_reduce_cancelled();
            return Err(Error::Cancelled);
        }
        if delta == 0 {
            return Ok(());
        }

        let count = self.count.fetch_add(delta, Ordering::Relaxed) + delta;
        if delta > 0 && count > self.limit as i64 {
            tracing::warn!(
                limit = self.limit,
                count,
                "Bucket limit exceeded, aborting reduction"
            );
            crate::metrics::record_bucket_limit_exceeded();
            return Err(Error::TooManyBuckets {
                limit: self.limit,
                count,
            });
        }
        Ok(())
    }
}

/// Context threaded through a reduction and all of its nested reductions
#[derive(Clone, Copy)]
pub struct ReduceContext<'a> {
    mode: ReduceMode,
    consumer: &'a dyn BucketConsumer,
}

impl<'a> ReduceContext<'a> {
    pub fn new(mode: ReduceMode, consumer: &'a dyn BucketConsumer) -> Self {
        Self { mode, consumer }
    }

    pub fn for_partial_reduce(consumer: &'a dyn BucketConsumer) -> Self {
        Self::new(ReduceMode::Partial, consumer)
    }

    pub fn for_final_reduce(consumer: &'a dyn BucketConsumer) -> Self {
        Self::new(ReduceMode::Final, consumer)
    }

    pub fn mode(&self) -> ReduceMode {
        self.mode
    }

    pub fn is_final_reduce(&self) -> bool {
        self.mode == ReduceMode::Final
    }

    /// Report a change in live buckets; errors must abort the reduction
    pub fn consume_buckets(&self, delta: i64) -> Result<()> {
        self.consumer.consume(delta)
    }
}

impl fmt::Debug for ReduceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReduceContext")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_mode_from_str() {
        assert_eq!("final".parse::<ReduceMode>().unwrap(), ReduceMode::Final);
        assert_eq!("PARTIAL".parse::<ReduceMode>().unwrap(), ReduceMode::Partial);

        let err = "incremental".parse::<ReduceMode>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMode(ref m) if m == "incremental"));
    }

    #[test]
    fn test_consumer_within_limit() {
        let consumer = MultiBucketConsumer::new(3);
        consumer.consume(1).unwrap();
        consumer.consume(2).unwrap();
        assert_eq!(consumer.count(), 3);

        consumer.consume(-2).unwrap();
        assert_eq!(consumer.count(), 1);
    }

    #[test]
    fn test_consumer_trips_on_positive_delta() {
        let consumer = MultiBucketConsumer::new(2);
        consumer.consume(2).unwrap();

        let err = consumer.consume(1).unwrap_err();
        match err {
            Error::TooManyBuckets { limit, count } => {
                assert_eq!(limit, 2);
                assert_eq!(count, 3);
            }
            other => panic!("Expected TooManyBuckets, got {other:?}"),
        }
    }

    #[test]
    fn test_consumer_negative_delta_never_trips() {
        let consumer = MultiBucketConsumer::new(0);
        consumer.consume(-5).unwrap();
        assert_eq!(consumer.count(), -5);
    }

    #[test]
    fn test_consumer_observes_cancellation() {
        let flag = Arc::new(AtomicBool::new(false));
        let consumer = MultiBucketConsumer::new(100).with_cancellation(Arc::clone(&flag));
        consumer.consume(1).unwrap();

        flag.store(true, Ordering::Relaxed);
        assert!(matches!(consumer.consume(1), Err(Error::Cancelled)));
        assert!(matches!(consumer.consume(-1), Err(Error::Cancelled)));
    }

    #[test]
    fn test_context_modes() {
        let consumer = MultiBucketConsumer::default();
        assert!(ReduceContext::for_final_reduce(&consumer).is_final_reduce());
        assert!(!ReduceContext::for_partial_reduce(&consumer).is_final_reduce());
        assert_eq!(consumer.limit(), DEFAULT_MAX_BUCKETS);
    }
}
