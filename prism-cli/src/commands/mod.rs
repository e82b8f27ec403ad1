pub mod reduce;
pub mod rescale;

pub use reduce::{run_reduce, ReduceOptions};
pub use rescale::run_rescale;

use anyhow::{Context, Result};
use prism_aggs::InternalAggregations;
use std::path::Path;

/// Write a result as pretty JSON to a file, or to stdout
fn write_result(result: &InternalAggregations, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote result to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
