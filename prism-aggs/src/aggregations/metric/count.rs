use super::MetricPartial;
use crate::sampling::SamplingContext;
use serde::{Deserialize, Serialize};

/// Number of values seen for a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    value: u64,
}

impl ValueCount {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl MetricPartial for ValueCount {
    fn merge(&mut self, other: Self) {
        self.value += other.value;
    }

    fn finalize_sampling(self, sampling: &SamplingContext) -> Self {
        Self::new(sampling.scale_up(self.value))
    }
}
