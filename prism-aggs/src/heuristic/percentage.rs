use super::{debug_check_frequencies, SignificanceHeuristic};

/// Fraction of the term's background documents that fall in the subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Percentage;

impl SignificanceHeuristic for Percentage {
    fn name(&self) -> &'static str {
        "percentage"
    }

    fn score(&self, subset_df: u64, subset_size: u64, superset_df: u64, superset_size: u64) -> f64 {
        debug_check_frequencies(subset_df, subset_size, superset_df, superset_size);
        if superset_df == 0 {
            return 0.0;
        }
        subset_df as f64 / superset_df as f64
    }
}
