use super::{debug_check_frequencies, SignificanceHeuristic};

/// Google normalized distance between the term and the subset, inverted so
/// that closer (more significant) terms score higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gnd {
    background_is_superset: bool,
}

impl Gnd {
    pub fn new(background_is_superset: bool) -> Self {
        Self {
            background_is_superset,
        }
    }

    pub fn background_is_superset(&self) -> bool {
        self.background_is_superset
    }
}

impl Default for Gnd {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SignificanceHeuristic for Gnd {
    fn name(&self) -> &'static str {
        "gnd"
    }

    fn score(&self, subset_df: u64, subset_size: u64, superset_df: u64, superset_size: u64) -> f64 {
        debug_check_frequencies(subset_df, subset_size, superset_df, superset_size);
        // A separate background does not contain the subset yet
        let (superset_df, superset_size) = if self.background_is_superset {
            (superset_df, superset_size)
        } else {
            (
                superset_df.saturating_add(subset_df),
                superset_size.saturating_add(subset_size),
            )
        };
        let fx = superset_df as f64;
        let fy = subset_size as f64;
        let fxy = subset_df as f64;
        let n = superset_size as f64;

        if fxy == 0.0 {
            return 0.0;
        }
        if fx == fy && fx == fxy {
            return 1.0;
        }

        let distance = (fx.ln().max(fy.ln()) - fxy.ln()) / (n.ln() - fx.ln().min(fy.ln()));
        (-distance.max(0.0)).exp()
    }
}
