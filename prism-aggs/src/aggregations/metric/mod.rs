//! Single-value metric results carried inside buckets
//!
//! Each shard reports the partial state of its metric; reducing folds the
//! partial states of all shards into one with [`MetricPartial::merge`].

mod avg;
mod count;
mod minmax;
mod sum;

pub use avg::Avg;
pub use count::ValueCount;
pub use minmax::{Max, Min};
pub use sum::Sum;

use crate::sampling::SamplingContext;

/// Mergeable partial state of a metric
pub trait MetricPartial: Sized + Default {
    fn merge(&mut self, other: Self);

    /// Project a sampled result onto the full population
    fn finalize_sampling(self, sampling: &SamplingContext) -> Self;

    fn reduce(partials: Vec<Self>) -> Self {
        let mut acc = Self::default();
        for partial in partials {
            acc.merge(partial);
        }
        acc
    }
}
