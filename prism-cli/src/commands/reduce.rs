//! Reduce command: merge shard results, as a multi-level tree when there
//! are more inputs than fit one batch.

use super::write_result;
use anyhow::{bail, Context, Result};
use prism_aggs::{
    HeuristicConfig, InternalAggregation, InternalAggregations, MultiBucketConsumer,
    ReduceContext, ReduceMode, SamplingContext,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ReduceOptions {
    pub inputs: Vec<PathBuf>,
    pub mode: ReduceMode,
    pub batch_size: usize,
    pub max_buckets: usize,
    pub sampling: SamplingContext,
    pub heuristic: Option<HeuristicConfig>,
    pub output: Option<PathBuf>,
}

/// Run the reduce command
pub async fn run_reduce(options: ReduceOptions) -> Result<()> {
    let start = Instant::now();
    // Only a fully reduced result can be rescaled, once
    if options.sampling.is_sampled() && options.mode != ReduceMode::Final {
        bail!("Sampling rescale needs --mode final, got {}", options.mode);
    }

    let mut shards = Vec::with_capacity(options.inputs.len());
    for path in &options.inputs {
        let shard = load_shard(path)?;
        shards.push(match &options.heuristic {
            Some(heuristic) => override_heuristic(shard, heuristic),
            None => shard,
        });
    }
    tracing::info!(
        "Reducing {} shard results (mode={}, batch={})",
        shards.len(),
        options.mode,
        options.batch_size
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling reduction");
                cancelled.store(true, Ordering::Relaxed);
            }
        })
    };
    let reduced = reduce_tree(
        shards,
        options.mode,
        options.batch_size,
        options.max_buckets,
        cancelled,
    )
    .await;
    watcher.abort();

    let mut reduced = reduced?;
    if options.sampling.is_sampled() {
        reduced = reduced.finalize_sampling(&options.sampling);
    }

    tracing::info!("Reduced in {:.2?}", start.elapsed());
    write_result(&reduced, options.output.as_deref())
}

fn load_shard(path: &Path) -> Result<InternalAggregations> {
    InternalAggregations::read_json_file(path)
        .with_context(|| format!("Failed to load shard result {}", path.display()))
}

/// Replace the heuristic of every top-level significant terms aggregation
fn override_heuristic(
    shard: InternalAggregations,
    heuristic: &HeuristicConfig,
) -> InternalAggregations {
    shard
        .into_iter()
        .map(|(name, agg)| {
            let agg = match agg {
                InternalAggregation::SignificantStringTerms(terms) => {
                    InternalAggregation::SignificantStringTerms(terms.with_heuristic(heuristic.clone()))
                }
                InternalAggregation::SignificantLongTerms(terms) => {
                    InternalAggregation::SignificantLongTerms(terms.with_heuristic(heuristic.clone()))
                }
                other => other,
            };
            (name, agg)
        })
        .collect()
}

/// Reduce in levels of at most `batch_size` results per node.
///
/// Every node of an intermediate level runs in `Partial` mode on a blocking
/// worker with its own bucket budget; all of them observe `cancelled`. The
/// top node runs in `mode`.
pub async fn reduce_tree(
    shards: Vec<InternalAggregations>,
    mode: ReduceMode,
    batch_size: usize,
    max_buckets: usize,
    cancelled: Arc<AtomicBool>,
) -> Result<InternalAggregations> {
    if shards.is_empty() {
        bail!("Nothing to reduce");
    }
    if batch_size < 2 {
        bail!("Batch size must be at least 2, got {}", batch_size);
    }

    let mut level = shards;
    let mut depth = 0;
    while level.len() > batch_size {
        depth += 1;
        let mut remaining = level.into_iter().peekable();
        let mut tasks = Vec::new();
        while remaining.peek().is_some() {
            let batch: Vec<_> = remaining.by_ref().take(batch_size).collect();
            let cancelled = Arc::clone(&cancelled);
            tasks.push(tokio::task::spawn_blocking(move || {
                reduce_node(batch, ReduceMode::Partial, max_buckets, cancelled)
            }));
        }

        let mut next = Vec::with_capacity(tasks.len());
        for task in tasks {
            let node = task.await.context("Reduce worker failed")??;
            next.push(node);
        }
        tracing::debug!(depth, nodes = next.len(), "Reduced tree level");
        level = next;
    }

    let reduced = tokio::task::spawn_blocking(move || {
        reduce_node(level, mode, max_buckets, cancelled)
    })
    .await
    .context("Reduce worker failed")??;
    Ok(reduced)
}

fn reduce_node(
    batch: Vec<InternalAggregations>,
    mode: ReduceMode,
    max_buckets: usize,
    cancelled: Arc<AtomicBool>,
) -> prism_aggs::Result<InternalAggregations> {
    let consumer = MultiBucketConsumer::new(max_buckets).with_cancellation(cancelled);
    let ctx = ReduceContext::new(mode, &consumer);
    InternalAggregations::reduce(batch, &ctx)
}
