use super::bucket::SignificantTerms;
use super::metric::{Avg, Max, MetricPartial, Min, Sum, ValueCount};
use crate::context::ReduceContext;
use crate::error::{Error, Result};
use crate::sampling::SamplingContext;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Partial result of one named aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InternalAggregation {
    SignificantStringTerms(SignificantTerms<String>),
    SignificantLongTerms(SignificantTerms<i64>),
    Sum(Sum),
    Min(Min),
    Max(Max),
    Avg(Avg),
    ValueCount(ValueCount),
}

impl InternalAggregation {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SignificantStringTerms(_) => "significant_string_terms",
            Self::SignificantLongTerms(_) => "significant_long_terms",
            Self::Sum(_) => "sum",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Avg(_) => "avg",
            Self::ValueCount(_) => "value_count",
        }
    }

    /// Reduce partials of one aggregation. All of them must be the same kind.
    pub fn reduce(aggs: Vec<Self>, ctx: &ReduceContext<'_>) -> Result<Self> {
        let mut rest = aggs.into_iter();
        let first = rest.next().ok_or_else(|| {
            Error::Invariant("cannot reduce an empty list of aggregations".to_string())
        })?;
        let expected = first.type_name();

        macro_rules! same_kind {
            ($variant:ident, $first:expr) => {{
                let mut parts = Vec::with_capacity(rest.len() + 1);
                parts.push($first);
                for agg in rest {
                    match agg {
                        Self::$variant(inner) => parts.push(inner),
                        other => {
                            return Err(Error::IncompatibleAggregations {
                                expected,
                                found: other.type_name(),
                            })
                        }
                    }
                }
                parts
            }};
        }

        Ok(match first {
            Self::SignificantStringTerms(terms) => Self::SignificantStringTerms(
                SignificantTerms::reduce(same_kind!(SignificantStringTerms, terms), ctx)?,
            ),
            Self::SignificantLongTerms(terms) => Self::SignificantLongTerms(
                SignificantTerms::reduce(same_kind!(SignificantLongTerms, terms), ctx)?,
            ),
            Self::Sum(sum) => Self::Sum(Sum::reduce(same_kind!(Sum, sum))),
            Self::Min(min) => Self::Min(Min::reduce(same_kind!(Min, min))),
            Self::Max(max) => Self::Max(Max::reduce(same_kind!(Max, max))),
            Self::Avg(avg) => Self::Avg(Avg::reduce(same_kind!(Avg, avg))),
            Self::ValueCount(count) => Self::ValueCount(ValueCount::reduce(same_kind!(ValueCount, count))),
        })
    }

    pub fn finalize_sampling(self, sampling: &SamplingContext) -> Self {
        match self {
            Self::SignificantStringTerms(terms) => {
                Self::SignificantStringTerms(terms.finalize_sampling(sampling))
            }
            Self::SignificantLongTerms(terms) => {
                Self::SignificantLongTerms(terms.finalize_sampling(sampling))
            }
            Self::Sum(sum) => Self::Sum(sum.finalize_sampling(sampling)),
            Self::Min(min) => Self::Min(min.finalize_sampling(sampling)),
            Self::Max(max) => Self::Max(max.finalize_sampling(sampling)),
            Self::Avg(avg) => Self::Avg(avg.finalize_sampling(sampling)),
            Self::ValueCount(count) => Self::ValueCount(count.finalize_sampling(sampling)),
        }
    }

    /// Buckets held by this aggregation, nested ones included
    pub fn bucket_count(&self) -> i64 {
        match self {
            Self::SignificantStringTerms(terms) => terms.bucket_count(),
            Self::SignificantLongTerms(terms) => terms.bucket_count(),
            _ => 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SignificantStringTerms(terms) => terms.validate(),
            Self::SignificantLongTerms(terms) => terms.validate(),
            _ => Ok(()),
        }
    }
}

/// Named sub-aggregations of a bucket, or the top level of a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalAggregations(BTreeMap<String, InternalAggregation>);

impl InternalAggregations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, agg: InternalAggregation) {
        self.0.insert(name.into(), agg);
    }

    pub fn get(&self, name: &str) -> Option<&InternalAggregation> {
        self.0.get(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, InternalAggregation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reduce several sets of aggregations name by name.
    ///
    /// A name missing from some of the inputs is reduced over the inputs
    /// that carry it.
    pub fn reduce(all: Vec<Self>, ctx: &ReduceContext<'_>) -> Result<Self> {
        let mut by_name: BTreeMap<String, Vec<InternalAggregation>> = BTreeMap::new();
        let input_count = all.len();
        for aggs in all {
            for (name, agg) in aggs.0 {
                by_name
                    .entry(name)
                    .or_insert_with(|| Vec::with_capacity(input_count))
                    .push(agg);
            }
        }

        let mut reduced = BTreeMap::new();
        for (name, aggs) in by_name {
            let agg = InternalAggregation::reduce(aggs, ctx)?;
            reduced.insert(name, agg);
        }
        Ok(Self(reduced))
    }

    pub fn finalize_sampling(self, sampling: &SamplingContext) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(name, agg)| (name, agg.finalize_sampling(sampling)))
                .collect(),
        )
    }

    pub fn inner_bucket_count(&self) -> i64 {
        self.0.values().map(InternalAggregation::bucket_count).sum()
    }

    pub fn validate(&self) -> Result<()> {
        self.0.values().try_for_each(InternalAggregation::validate)
    }

    /// Parse and validate one partial result
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let aggs: Self = serde_json::from_slice(bytes)?;
        aggs.validate()?;
        Ok(aggs)
    }

    pub fn read_json_file(path: &Path) -> Result<Self> {
        Self::from_json_slice(&fs::read(path)?)
    }
}

impl FromIterator<(String, InternalAggregation)> for InternalAggregations {
    fn from_iter<I: IntoIterator<Item = (String, InternalAggregation)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for InternalAggregations {
    type Item = (String, InternalAggregation);
    type IntoIter = btree_map::IntoIter<String, InternalAggregation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a InternalAggregations {
    type Item = (&'a String, &'a InternalAggregation);
    type IntoIter = btree_map::Iter<'a, String, InternalAggregation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregations::SignificantBucket;
    use crate::context::MultiBucketConsumer;
    use crate::heuristic::HeuristicConfig;

    fn terms(buckets: &[(&str, u64)]) -> InternalAggregation {
        let buckets = buckets
            .iter()
            .map(|(key, df)| {
                SignificantBucket::new(key.to_string(), *df, *df, 0.0, InternalAggregations::new())
            })
            .collect();
        InternalAggregation::SignificantStringTerms(SignificantTerms::new(
            10,
            0,
            HeuristicConfig::Jlh,
            10,
            100,
            buckets,
        ))
    }

    #[test]
    fn test_mixed_kinds_are_rejected() {
        let consumer = MultiBucketConsumer::default();
        let ctx = ReduceContext::for_final_reduce(&consumer);
        let err = InternalAggregation::reduce(
            vec![
                InternalAggregation::Sum(Sum::new(1.0)),
                InternalAggregation::Max(Max::new(Some(2.0))),
            ],
            &ctx,
        )
        .unwrap_err();

        match err {
            Error::IncompatibleAggregations { expected, found } => {
                assert_eq!(expected, "sum");
                assert_eq!(found, "max");
            }
            other => panic!("Expected IncompatibleAggregations, got {other:?}"),
        }
    }

    #[test]
    fn test_reduce_by_name() {
        let consumer = MultiBucketConsumer::default();
        let ctx = ReduceContext::for_partial_reduce(&consumer);
        let first: InternalAggregations = [
            ("total".to_string(), InternalAggregation::Sum(Sum::new(2.0))),
            ("lowest".to_string(), InternalAggregation::Min(Min::new(Some(4.0)))),
        ]
        .into_iter()
        .collect();
        let second: InternalAggregations = [
            ("total".to_string(), InternalAggregation::Sum(Sum::new(3.0))),
            ("seen".to_string(), InternalAggregation::ValueCount(ValueCount::new(7))),
        ]
        .into_iter()
        .collect();

        let reduced = InternalAggregations::reduce(vec![first, second], &ctx).unwrap();
        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced.get("total"), Some(&InternalAggregation::Sum(Sum::new(5.0))));
        assert_eq!(
            reduced.get("lowest"),
            Some(&InternalAggregation::Min(Min::new(Some(4.0))))
        );
        assert_eq!(
            reduced.get("seen"),
            Some(&InternalAggregation::ValueCount(ValueCount::new(7)))
        );
    }

    #[test]
    fn test_inner_bucket_count() {
        let mut aggs = InternalAggregations::new();
        aggs.insert("tags", terms(&[("a", 1), ("b", 2)]));
        aggs.insert("total", InternalAggregation::Sum(Sum::new(1.0)));
        assert_eq!(aggs.inner_bucket_count(), 2);
        assert_eq!(InternalAggregations::new().inner_bucket_count(), 0);
    }

    #[test]
    fn test_validate_recurses() {
        let mut aggs = InternalAggregations::new();
        aggs.insert("tags", terms(&[("a", 11)]));
        assert!(matches!(aggs.validate(), Err(Error::InvalidPartial(_))));
    }

    #[test]
    fn test_json_shape() {
        let mut aggs = InternalAggregations::new();
        aggs.insert("avg_price", InternalAggregation::Avg(Avg::new(10.0, 4)));
        aggs.insert("tags", terms(&[("rust", 3)]));

        let json = serde_json::to_value(&aggs).unwrap();
        assert_eq!(json["avg_price"]["type"], "avg");
        assert_eq!(json["avg_price"]["count"], 4);
        assert_eq!(json["tags"]["type"], "significant_string_terms");
        assert_eq!(json["tags"]["doc_count"], 10);
        assert_eq!(json["tags"]["bg_count"], 100);
        assert_eq!(json["tags"]["buckets"][0]["key"], "rust");

        let back: InternalAggregations = serde_json::from_value(json).unwrap();
        assert_eq!(back, aggs);
    }

    #[test]
    fn test_from_json_slice_validates() {
        let json = br#"{"tags": {"type": "significant_string_terms", "required_size": 5,
            "doc_count": 10, "bg_count": 100,
            "buckets": [{"key": "a", "doc_count": 12, "score": 0.5, "bg_count": 20}]}}"#;
        let err = InternalAggregations::from_json_slice(json).unwrap_err();
        assert!(matches!(err, Error::InvalidPartial(_)));

        let err = InternalAggregations::from_json_slice(b"{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let err = InternalAggregations::read_json_file(Path::new("/nonexistent/shard.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
