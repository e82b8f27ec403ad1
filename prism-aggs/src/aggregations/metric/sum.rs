use super::MetricPartial;
use crate::sampling::SamplingContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sum {
    value: f64,
}

impl Sum {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl MetricPartial for Sum {
    fn merge(&mut self, other: Self) {
        *self = Self::reduce(vec![*self, other]);
    }

    fn finalize_sampling(self, sampling: &SamplingContext) -> Self {
        Self::new(sampling.scale_up_f64(self.value))
    }

    // Kahan summation keeps the result independent of shard count
    fn reduce(partials: Vec<Self>) -> Self {
        let mut sum: f64 = 0.0;
        let mut compensation: f64 = 0.0;
        for partial in partials {
            if !partial.value.is_finite() || !sum.is_finite() {
                sum += partial.value;
                continue;
            }
            let corrected = partial.value - compensation;
            let next = sum + corrected;
            compensation = (next - sum) - corrected;
            sum = next;
        }
        Self::new(sum)
    }
}
