use super::{debug_check_frequencies, SignificanceHeuristic};

/// JLH score: absolute change in popularity times relative change.
///
/// Favours terms whose share of the subset rose both noticeably and
/// proportionally compared to the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jlh;

impl SignificanceHeuristic for Jlh {
    fn name(&self) -> &'static str {
        "jlh"
    }

    fn score(&self, subset_df: u64, subset_size: u64, superset_df: u64, superset_size: u64) -> f64 {
        debug_check_frequencies(subset_df, subset_size, superset_df, superset_size);
        if subset_size == 0 || superset_size == 0 {
            return 0.0;
        }
        // A term unseen in the background still has to be divisible
        let superset_df = superset_df.max(1);

        let subset_probability = subset_df as f64 / subset_size as f64;
        let superset_probability = superset_df as f64 / superset_size as f64;

        let absolute_change = subset_probability - superset_probability;
        if absolute_change <= 0.0 {
            return 0.0;
        }
        let relative_change = subset_probability / superset_probability;
        absolute_change * relative_change
    }
}
