//! Significant terms results and their distributed reduction
//!
//! Each shard returns a [`SignificantTerms`] holding its local subset and
//! superset sizes plus one bucket per candidate term. Reducing merges the
//! buckets of all shards by key against the global totals, rescores every
//! merged bucket, and keeps the best `required_size` of them on the final
//! pass of the reduce tree.
//!
//! ```text
//! shard partials ──► group by key ──► merge counts + reduce sub-aggs
//!                                            │
//!                                 finalize score (heuristic)
//!                                            │
//!                   cutoff (final only) ──► bounded queue ──► ranked buckets
//! ```

use super::key::TermKey;
use super::queue::{BucketSignificanceQueue, Significance};
use crate::aggregations::types::InternalAggregations;
use crate::context::ReduceContext;
use crate::error::{Error, Result};
use crate::heuristic::{HeuristicConfig, SignificanceHeuristic};
use crate::sampling::SamplingContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, trace};

/// A bucket whose score has been computed.
///
/// Renders as `key`, `doc_count` (subset df), `score`, `bg_count`
/// (superset df), followed by its named sub-aggregations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantBucket<K> {
    key: K,
    #[serde(rename = "doc_count")]
    subset_df: u64,
    #[serde(with = "score_format")]
    score: f64,
    #[serde(rename = "bg_count")]
    superset_df: u64,
    #[serde(flatten)]
    aggregations: InternalAggregations,
}

impl<K: TermKey> SignificantBucket<K> {
    /// Bucket as produced by a shard, carrying its shard-local score
    pub fn new(
        key: K,
        subset_df: u64,
        superset_df: u64,
        score: f64,
        aggregations: InternalAggregations,
    ) -> Self {
        Self {
            key,
            subset_df,
            superset_df,
            score,
            aggregations,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn subset_df(&self) -> u64 {
        self.subset_df
    }

    pub fn superset_df(&self) -> u64 {
        self.superset_df
    }

    pub fn doc_count(&self) -> u64 {
        self.subset_df
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn aggregations(&self) -> &InternalAggregations {
        &self.aggregations
    }

    /// This bucket plus every bucket nested anywhere below it
    pub fn bucket_count(&self) -> i64 {
        1 + self.aggregations.inner_bucket_count()
    }
}

impl<K> Significance for SignificantBucket<K> {
    fn significance(&self) -> f64 {
        self.score
    }
}

/// Merged statistics for one key, awaiting its score
#[derive(Debug, Clone, PartialEq)]
pub struct UnscoredBucket<K> {
    key: K,
    subset_df: u64,
    superset_df: u64,
    aggregations: InternalAggregations,
}

impl<K: TermKey> UnscoredBucket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn subset_df(&self) -> u64 {
        self.subset_df
    }

    pub fn superset_df(&self) -> u64 {
        self.superset_df
    }

    pub fn aggregations(&self) -> &InternalAggregations {
        &self.aggregations
    }

    /// Score against the given totals, producing the final bucket
    pub fn finalize(
        self,
        heuristic: &dyn SignificanceHeuristic,
        subset_size: u64,
        superset_size: u64,
    ) -> SignificantBucket<K> {
        let score = heuristic.score(self.subset_df, subset_size, self.superset_df, superset_size);
        SignificantBucket {
            key: self.key,
            subset_df: self.subset_df,
            superset_df: self.superset_df,
            score,
            aggregations: self.aggregations,
        }
    }
}

/// Significant terms result of one shard, or of a reduction of several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantTerms<K> {
    required_size: usize,
    #[serde(default)]
    min_doc_count: u64,
    #[serde(default)]
    heuristic: HeuristicConfig,
    #[serde(rename = "doc_count")]
    subset_size: u64,
    #[serde(rename = "bg_count")]
    superset_size: u64,
    buckets: Vec<SignificantBucket<K>>,
}

impl<K: TermKey> SignificantTerms<K> {
    pub fn new(
        required_size: usize,
        min_doc_count: u64,
        heuristic: HeuristicConfig,
        subset_size: u64,
        superset_size: u64,
        buckets: Vec<SignificantBucket<K>>,
    ) -> Self {
        Self {
            required_size,
            min_doc_count,
            heuristic,
            subset_size,
            superset_size,
            buckets,
        }
    }

    pub fn required_size(&self) -> usize {
        self.required_size
    }

    pub fn min_doc_count(&self) -> u64 {
        self.min_doc_count
    }

    pub fn heuristic(&self) -> &HeuristicConfig {
        &self.heuristic
    }

    pub fn subset_size(&self) -> u64 {
        self.subset_size
    }

    pub fn superset_size(&self) -> u64 {
        self.superset_size
    }

    pub fn buckets(&self) -> &[SignificantBucket<K>] {
        &self.buckets
    }

    pub fn into_buckets(self) -> Vec<SignificantBucket<K>> {
        self.buckets
    }

    /// Score with a different heuristic on the next reduce
    pub fn with_heuristic(mut self, heuristic: HeuristicConfig) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Find a bucket by its string key
    pub fn bucket(&self, key: &str) -> Option<&SignificantBucket<K>> {
        self.buckets.iter().find(|b| b.key.key_as_string() == key)
    }

    /// Buckets held by this result, nested ones included
    pub fn bucket_count(&self) -> i64 {
        self.buckets.iter().map(SignificantBucket::bucket_count).sum()
    }

    /// Check the document frequency bounds of every bucket, recursively
    pub fn validate(&self) -> Result<()> {
        for bucket in &self.buckets {
            if bucket.subset_df > self.subset_size {
                return Err(Error::InvalidPartial(format!(
                    "bucket [{}] has doc_count {} above the subset size {}",
                    bucket.key.key_as_string(),
                    bucket.subset_df,
                    self.subset_size
                )));
            }
            if bucket.superset_df > self.superset_size {
                return Err(Error::InvalidPartial(format!(
                    "bucket [{}] has bg_count {} above the superset size {}",
                    bucket.key.key_as_string(),
                    bucket.superset_df,
                    self.superset_size
                )));
            }
            bucket.aggregations.validate()?;
        }
        Ok(())
    }

    /// Reduce partials using the heuristic described by the first of them
    pub fn reduce(partials: Vec<Self>, ctx: &ReduceContext<'_>) -> Result<Self> {
        let first = partials.first().ok_or_else(empty_reduce)?;
        let heuristic = first.heuristic.build()?;
        Self::reduce_with(partials, heuristic.as_ref(), ctx)
    }

    /// Reduce partials, scoring with the given heuristic
    pub fn reduce_with(
        partials: Vec<Self>,
        heuristic: &dyn SignificanceHeuristic,
        ctx: &ReduceContext<'_>,
    ) -> Result<Self> {
        let start = Instant::now();
        let first = partials.first().ok_or_else(empty_reduce)?;
        let required_size = first.required_size;
        let min_doc_count = first.min_doc_count;
        let heuristic_config = first.heuristic.clone();

        let rewritten = heuristic.rewrite(ctx)?;
        let heuristic: &dyn SignificanceHeuristic = match rewritten.as_deref() {
            Some(rewritten) => rewritten,
            None => heuristic,
        };

        let subset_size = checked_total(partials.iter().map(|p| p.subset_size), "subset_size")?;
        let superset_size =
            checked_total(partials.iter().map(|p| p.superset_size), "superset_size")?;

        // BTreeMap keeps the merge order, and with it tie-breaking, stable
        let partial_count = partials.len();
        let mut grouped: BTreeMap<String, Vec<SignificantBucket<K>>> = BTreeMap::new();
        for partial in partials {
            for bucket in partial.buckets {
                grouped
                    .entry(bucket.key.key_as_string().into_owned())
                    .or_insert_with(|| Vec::with_capacity(partial_count))
                    .push(bucket);
            }
        }

        let distinct_keys = grouped.len();
        let size = if ctx.is_final_reduce() {
            required_size.min(distinct_keys)
        } else {
            distinct_keys
        };

        let mut ordered = BucketSignificanceQueue::new(size);
        let mut cut_off = 0u64;
        let mut overflowed = 0u64;

        for (key, same_key) in grouped {
            let merged = Self::reduce_bucket(same_key, ctx)?;
            let bucket = merged.finalize(heuristic, subset_size, superset_size);
            ctx.consume_buckets(1)?;

            let keep = !ctx.is_final_reduce()
                || (bucket.score > 0.0 && bucket.subset_df >= min_doc_count);
            if keep {
                if let Some(removed) = ordered.insert_with_overflow(bucket) {
                    trace!(key = %removed.key.key_as_string(), score = removed.score, "Bucket did not fit");
                    overflowed += 1;
                    ctx.consume_buckets(-removed.bucket_count())?;
                }
            } else {
                trace!(key = %key, score = bucket.score, doc_count = bucket.subset_df, "Bucket cut off");
                cut_off += 1;
                ctx.consume_buckets(-bucket.bucket_count())?;
            }
        }

        let buckets = ordered.into_sorted_vec();

        crate::metrics::record_buckets_discarded("cutoff", cut_off);
        crate::metrics::record_buckets_discarded("overflow", overflowed);
        crate::metrics::record_reduce(K::AGGREGATION_TYPE, ctx.mode().name(), start.elapsed());
        debug!(
            kind = K::AGGREGATION_TYPE,
            mode = %ctx.mode(),
            heuristic = heuristic.name(),
            partials = partial_count,
            distinct_keys,
            kept = buckets.len(),
            cut_off,
            overflowed,
            "Reduced significant terms"
        );

        Ok(Self {
            required_size,
            min_doc_count,
            heuristic: heuristic_config,
            subset_size,
            superset_size,
            buckets,
        })
    }

    /// Merge all buckets sharing one key, reducing their sub-aggregations
    pub fn reduce_bucket(
        buckets: Vec<SignificantBucket<K>>,
        ctx: &ReduceContext<'_>,
    ) -> Result<UnscoredBucket<K>> {
        let mut buckets = buckets.into_iter();
        let first = buckets.next().ok_or_else(|| {
            Error::Invariant("cannot merge an empty group of same-key buckets".to_string())
        })?;

        let mut subset_df = first.subset_df;
        let mut superset_df = first.superset_df;
        let mut aggregations = Vec::with_capacity(buckets.len() + 1);
        aggregations.push(first.aggregations);
        for bucket in buckets {
            subset_df = checked_total([subset_df, bucket.subset_df], "subset_df")?;
            superset_df = checked_total([superset_df, bucket.superset_df], "superset_df")?;
            aggregations.push(bucket.aggregations);
        }

        Ok(UnscoredBucket {
            key: first.key,
            subset_df,
            superset_df,
            aggregations: InternalAggregations::reduce(aggregations, ctx)?,
        })
    }

    /// Scale all counts up for sampled input. Scores are left as they are.
    pub fn finalize_sampling(self, sampling: &SamplingContext) -> Self {
        let buckets = self
            .buckets
            .into_iter()
            .map(|b| SignificantBucket {
                key: b.key,
                subset_df: sampling.scale_up(b.subset_df),
                superset_df: sampling.scale_up(b.superset_df),
                score: b.score,
                aggregations: b.aggregations.finalize_sampling(sampling),
            })
            .collect();

        Self {
            required_size: self.required_size,
            min_doc_count: self.min_doc_count,
            heuristic: self.heuristic,
            subset_size: sampling.scale_up(self.subset_size),
            superset_size: sampling.scale_up(self.superset_size),
            buckets,
        }
    }
}

fn checked_total(counts: impl IntoIterator<Item = u64>, field: &str) -> Result<u64> {
    counts
        .into_iter()
        .try_fold(0u64, u64::checked_add)
        .ok_or_else(|| Error::InvalidPartial(format!("{field} overflows when partials are merged")))
}

fn empty_reduce() -> Error {
    Error::Invariant("cannot reduce an empty list of significant terms".to_string())
}

/// Non-finite scores render as `null` and read back as negative infinity
mod score_format {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if score.is_finite() {
            serializer.serialize_f64(*score)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
    }
}
