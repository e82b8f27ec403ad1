//! Rescale command: project a result computed on sampled shards onto the
//! full document set.

use super::write_result;
use anyhow::{Context, Result};
use prism_aggs::{InternalAggregations, SamplingContext};
use std::path::Path;

/// Run the rescale command
pub fn run_rescale(input: &Path, sampling: &SamplingContext, output: Option<&Path>) -> Result<()> {
    let reduced = InternalAggregations::read_json_file(input)
        .with_context(|| format!("Failed to load result {}", input.display()))?;

    tracing::info!(
        "Rescaling {} by {:.4}",
        input.display(),
        sampling.inverse_probability()
    );
    let rescaled = reduced.finalize_sampling(sampling);
    write_result(&rescaled, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_aggs::aggregations::{Avg, Max};
    use prism_aggs::InternalAggregation;
    use tempfile::TempDir;

    #[test]
    fn test_rescale_metrics() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("reduced.json");
        let output = dir.path().join("rescaled.json");

        let mut aggs = InternalAggregations::new();
        aggs.insert("avg_latency", InternalAggregation::Avg(Avg::new(12.0, 4)));
        aggs.insert("max_latency", InternalAggregation::Max(Max::new(Some(9.5))));
        std::fs::write(&input, serde_json::to_vec(&aggs).unwrap()).unwrap();

        let sampling = SamplingContext::new(0.25).unwrap();
        run_rescale(&input, &sampling, Some(&output)).unwrap();

        let rescaled = InternalAggregations::read_json_file(&output).unwrap();
        assert_eq!(
            rescaled.get("avg_latency"),
            Some(&InternalAggregation::Avg(Avg::new(48.0, 16)))
        );
        assert_eq!(
            rescaled.get("max_latency"),
            Some(&InternalAggregation::Max(Max::new(Some(9.5))))
        );
    }

    #[test]
    fn test_rescale_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = run_rescale(
            &dir.path().join("absent.json"),
            &SamplingContext::none(),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
