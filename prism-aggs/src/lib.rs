//! Distributed reduction of significant terms aggregations
//!
//! Shards return partial [`InternalAggregations`]; a coordinator reduces
//! them, possibly over several levels, into one ranked result.
//!
//! ```no_run
//! use prism_aggs::{InternalAggregations, MultiBucketConsumer, ReduceContext};
//!
//! # fn shard_results() -> Vec<InternalAggregations> { Vec::new() }
//! let consumer = MultiBucketConsumer::new(10_000);
//! let ctx = ReduceContext::for_final_reduce(&consumer);
//! let reduced = InternalAggregations::reduce(shard_results(), &ctx)?;
//! # Ok::<(), prism_aggs::Error>(())
//! ```

pub mod aggregations;
pub mod config;
pub mod context;
pub mod error;
pub mod heuristic;
pub mod metrics;
pub mod sampling;

pub use aggregations::{
    InternalAggregation, InternalAggregations, SignificantBucket, SignificantTerms,
};
pub use config::Config;
pub use context::{BucketConsumer, MultiBucketConsumer, ReduceContext, ReduceMode};
pub use error::{Error, Result};
pub use heuristic::{HeuristicConfig, SignificanceHeuristic};
pub use sampling::SamplingContext;
