//! Significance heuristics
//!
//! A heuristic scores how disproportionately a term occurs in the subset
//! under analysis compared to the background superset. Each reduce pass
//! obtains its heuristic once, lets it [`rewrite`](SignificanceHeuristic::rewrite)
//! itself against the pass's [`ReduceContext`], then scores every merged
//! bucket with the result. Anything captured during rewrite lives only as
//! long as that pass.

mod gnd;
mod jlh;
mod nxy;
mod percentage;

pub use gnd::Gnd;
pub use jlh::Jlh;
pub use nxy::{ChiSquare, MutualInformation};
pub use percentage::Percentage;

use crate::context::ReduceContext;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub trait SignificanceHeuristic: fmt::Debug + Send + Sync {
    /// Name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Score a term from its subset/superset document frequencies
    fn score(&self, subset_df: u64, subset_size: u64, superset_df: u64, superset_size: u64) -> f64;

    /// Prepare for one reduce pass.
    ///
    /// `Ok(None)` means this heuristic is used as is; `Ok(Some(_))` replaces
    /// it for the duration of the pass.
    fn rewrite(&self, _ctx: &ReduceContext<'_>) -> Result<Option<Box<dyn SignificanceHeuristic>>> {
        Ok(None)
    }
}

fn default_true() -> bool {
    true
}

/// Serializable description of a heuristic, carried by every partial result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicConfig {
    #[default]
    Jlh,
    Percentage,
    MutualInformation {
        #[serde(default)]
        include_negatives: bool,
        #[serde(default = "default_true")]
        background_is_superset: bool,
    },
    ChiSquare {
        #[serde(default)]
        include_negatives: bool,
        #[serde(default = "default_true")]
        background_is_superset: bool,
    },
    Gnd {
        #[serde(default = "default_true")]
        background_is_superset: bool,
    },
    ScriptHeuristic {
        source: String,
    },
}

impl HeuristicConfig {
    /// Parse a bare heuristic name using default parameters
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "jlh" => Ok(HeuristicConfig::Jlh),
            "percentage" => Ok(HeuristicConfig::Percentage),
            "mutual_information" => Ok(HeuristicConfig::MutualInformation {
                include_negatives: false,
                background_is_superset: true,
            }),
            "chi_square" => Ok(HeuristicConfig::ChiSquare {
                include_negatives: false,
                background_is_superset: true,
            }),
            "gnd" => Ok(HeuristicConfig::Gnd {
                background_is_superset: true,
            }),
            "script_heuristic" => Ok(HeuristicConfig::ScriptHeuristic {
                source: String::new(),
            }),
            _ => Err(Error::Config(format!(
                "unknown significance heuristic [{}]",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeuristicConfig::Jlh => "jlh",
            HeuristicConfig::Percentage => "percentage",
            HeuristicConfig::MutualInformation { .. } => "mutual_information",
            HeuristicConfig::ChiSquare { .. } => "chi_square",
            HeuristicConfig::Gnd { .. } => "gnd",
            HeuristicConfig::ScriptHeuristic { .. } => "script_heuristic",
        }
    }

    /// Instantiate the heuristic this config describes
    pub fn build(&self) -> Result<Box<dyn SignificanceHeuristic>> {
        match self {
            HeuristicConfig::Jlh => Ok(Box::new(Jlh)),
            HeuristicConfig::Percentage => Ok(Box::new(Percentage)),
            HeuristicConfig::MutualInformation {
                include_negatives,
                background_is_superset,
            } => Ok(Box::new(MutualInformation::new(
                *include_negatives,
                *background_is_superset,
            ))),
            HeuristicConfig::ChiSquare {
                include_negatives,
                background_is_superset,
            } => Ok(Box::new(ChiSquare::new(
                *include_negatives,
                *background_is_superset,
            ))),
            HeuristicConfig::Gnd {
                background_is_superset,
            } => Ok(Box::new(Gnd::new(*background_is_superset))),
            HeuristicConfig::ScriptHeuristic { .. } => Err(Error::NotImplemented(
                "script_heuristic significance heuristic".to_string(),
            )),
        }
    }
}

#[inline]
pub(crate) fn debug_check_frequencies(
    subset_df: u64,
    subset_size: u64,
    superset_df: u64,
    superset_size: u64,
) {
    debug_assert!(
        subset_df <= subset_size,
        "subset_df {subset_df} exceeds subset_size {subset_size}"
    );
    debug_assert!(
        superset_df <= superset_size,
        "superset_df {superset_df} exceeds superset_size {superset_size}"
    );
}
