use super::MetricPartial;
use crate::sampling::SamplingContext;
use serde::{Deserialize, Serialize};

/// Smallest value seen, `None` when no shard saw any value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Min {
    value: Option<f64>,
}

/// Largest value seen, `None` when no shard saw any value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Max {
    value: Option<f64>,
}

impl Min {
    pub fn new(value: Option<f64>) -> Self {
        Self { value }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Max {
    pub fn new(value: Option<f64>) -> Self {
        Self { value }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

fn merge_extreme(acc: Option<f64>, other: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (acc, other) {
        (Some(a), Some(v)) => Some(pick(a, v)),
        (None, v) => v,
        (a, None) => a,
    }
}

impl MetricPartial for Min {
    fn merge(&mut self, other: Self) {
        self.value = merge_extreme(self.value, other.value, f64::min);
    }

    // Extremes do not depend on how many documents were sampled
    fn finalize_sampling(self, _sampling: &SamplingContext) -> Self {
        self
    }
}

impl MetricPartial for Max {
    fn merge(&mut self, other: Self) {
        self.value = merge_extreme(self.value, other.value, f64::max);
    }

    fn finalize_sampling(self, _sampling: &SamplingContext) -> Self {
        self
    }
}
