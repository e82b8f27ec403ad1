//! Sampling context for projecting sampled counts onto the full population

use crate::error::{Error, Result};

/// Scales counts collected from a random sample back up to full size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingContext {
    probability: f64,
}

impl SamplingContext {
    /// `probability` is the fraction of documents that were sampled, in `(0, 1]`
    pub fn new(probability: f64) -> Result<Self> {
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(Error::Config(format!(
                "sampling probability must be in (0, 1], got {}",
                probability
            )));
        }
        Ok(Self { probability })
    }

    /// Context for unsampled data; scaling is the identity
    pub fn none() -> Self {
        Self { probability: 1.0 }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn is_sampled(&self) -> bool {
        self.probability < 1.0
    }

    pub fn inverse_probability(&self) -> f64 {
        1.0 / self.probability
    }

    pub fn scale_up(&self, value: u64) -> u64 {
        if !self.is_sampled() {
            return value;
        }
        (value as f64 * self.inverse_probability()).round() as u64
    }

    pub fn scale_up_f64(&self, value: f64) -> f64 {
        if !self.is_sampled() {
            return value;
        }
        value * self.inverse_probability()
    }
}

impl Default for SamplingContext {
    fn default() -> Self {
        Self::none()
    }
}
