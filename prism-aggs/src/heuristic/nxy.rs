//! Heuristics built on the 2x2 term/class contingency table

use super::{debug_check_frequencies, SignificanceHeuristic};

/// Document counts of the term/class contingency table.
///
/// First index: contains the term (1) or not (0). Second index: in the
/// subset class (1) or not (0). `_` marks a marginal.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frequencies {
    n00: f64,
    n01: f64,
    n10: f64,
    n11: f64,
    n0_: f64,
    n1_: f64,
    n_0: f64,
    n_1: f64,
    n: f64,
}

impl Frequencies {
    fn compute(
        subset_df: u64,
        subset_size: u64,
        superset_df: u64,
        superset_size: u64,
        background_is_superset: bool,
    ) -> Self {
        let (sub_df, sub_size) = (subset_df as f64, subset_size as f64);
        let (sup_df, sup_size) = (superset_df as f64, superset_size as f64);

        if background_is_superset {
            // The subset is part of the background; take it out to form
            // the "not in class" row
            Self {
                n00: sup_size - sup_df - (sub_size - sub_df),
                n01: sub_size - sub_df,
                n10: sup_df - sub_df,
                n11: sub_df,
                n0_: sup_size - sup_df,
                n1_: sup_df,
                n_0: sup_size - sub_size,
                n_1: sub_size,
                n: sup_size,
            }
        } else {
            Self {
                n00: sup_size - sup_df,
                n01: sub_size - sub_df,
                n10: sup_df,
                n11: sub_df,
                n0_: sup_size - sup_df + sub_size - sub_df,
                n1_: sup_df + sub_df,
                n_0: sup_size,
                n_1: sub_size,
                n: sup_size + sub_size,
            }
        }
    }

    /// Term is relatively rarer inside the subset than outside it
    fn is_negative(&self) -> bool {
        self.n11 / self.n_1 < self.n10 / self.n_0
    }
}

/// Mutual information between term presence and subset membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutualInformation {
    include_negatives: bool,
    background_is_superset: bool,
}

impl MutualInformation {
    pub fn new(include_negatives: bool, background_is_superset: bool) -> Self {
        Self {
            include_negatives,
            background_is_superset,
        }
    }

    fn mi_term(nxy: f64, nx_: f64, n_y: f64, n: f64) -> f64 {
        let numerator = (n * nxy).abs();
        let denominator = (nx_ * n_y).abs();
        let factor = (nxy / n).abs();
        if numerator < 1e-7 && factor < 1e-7 {
            0.0
        } else {
            factor * (numerator / denominator).log2()
        }
    }
}

impl SignificanceHeuristic for MutualInformation {
    fn name(&self) -> &'static str {
        "mutual_information"
    }

    fn score(&self, subset_df: u64, subset_size: u64, superset_df: u64, superset_size: u64) -> f64 {
        debug_check_frequencies(subset_df, subset_size, superset_df, superset_size);
        let f = Frequencies::compute(
            subset_df,
            subset_size,
            superset_df,
            superset_size,
            self.background_is_superset,
        );
        if f.n == 0.0 {
            return 0.0;
        }

        let score = Self::mi_term(f.n00, f.n0_, f.n_0, f.n)
            + Self::mi_term(f.n01, f.n0_, f.n_1, f.n)
            + Self::mi_term(f.n10, f.n1_, f.n_0, f.n)
            + Self::mi_term(f.n11, f.n1_, f.n_1, f.n);

        if !self.include_negatives && f.is_negative() {
            return f64::NEG_INFINITY;
        }
        score
    }
}

/// Chi-square statistic of the contingency table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChiSquare {
    include_negatives: bool,
    background_is_superset: bool,
}

impl ChiSquare {
    pub fn new(include_negatives: bool, background_is_superset: bool) -> Self {
        Self {
            include_negatives,
            background_is_superset,
        }
    }
}

impl SignificanceHeuristic for ChiSquare {
    fn name(&self) -> &'static str {
        "chi_square"
    }

    fn score(&self, subset_df: u64, subset_size: u64, superset_df: u64, superset_size: u64) -> f64 {
        debug_check_frequencies(subset_df, subset_size, superset_df, superset_size);
        let f = Frequencies::compute(
            subset_df,
            subset_size,
            superset_df,
            superset_size,
            self.background_is_superset,
        );

        if !self.include_negatives && f.is_negative() {
            return f64::NEG_INFINITY;
        }

        let denominator = f.n_1 * f.n1_ * f.n0_ * f.n_0;
        if denominator == 0.0 {
            return 0.0;
        }
        f.n * (f.n11 * f.n00 - f.n01 * f.n10).powi(2) / denominator
    }
}
