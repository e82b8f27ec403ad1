use super::MetricPartial;
use crate::sampling::SamplingContext;
use serde::{Deserialize, Serialize};

/// Running sum and count; the average itself is only derived on read
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Avg {
    sum: f64,
    count: u64,
}

impl Avg {
    pub fn new(sum: f64, count: u64) -> Self {
        Self { sum, count }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn value(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

impl MetricPartial for Avg {
    fn merge(&mut self, other: Self) {
        self.sum += other.sum;
        self.count += other.count;
    }

    fn finalize_sampling(self, sampling: &SamplingContext) -> Self {
        Self::new(sampling.scale_up_f64(self.sum), sampling.scale_up(self.count))
    }
}
