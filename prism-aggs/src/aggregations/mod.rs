mod bucket;
mod metric;
pub mod types;

pub use bucket::{
    BucketSignificanceQueue, Significance, SignificantBucket, SignificantTerms, TermKey,
    UnscoredBucket,
};
pub use metric::{Avg, Max, MetricPartial, Min, Sum, ValueCount};
pub use types::{InternalAggregation, InternalAggregations};
