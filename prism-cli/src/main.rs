mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use prism_aggs::config::{default_config_path, LoggingConfig};
use prism_aggs::{Config, HeuristicConfig, ReduceMode, SamplingContext};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "prism-aggs")]
#[command(about = "Prism aggregation tools - reduce and rescale significant terms results")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.prism/aggs.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reduce shard results (one JSON file per shard) into one result
    Reduce {
        /// Shard result files
        #[arg(short, long = "input", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Reduce mode of the top level: final or partial
        #[arg(long, default_value = "final")]
        mode: String,

        /// Results reduced together per tree node (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Bucket budget per reduction (overrides config)
        #[arg(long)]
        max_buckets: Option<usize>,

        /// Fraction of documents the shards sampled; counts of the final result are scaled up
        #[arg(long)]
        sample_probability: Option<f64>,

        /// Score with this heuristic instead of the one in the shard results
        #[arg(long)]
        heuristic: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scale the counts of an already reduced result
    Rescale {
        /// Reduced result file
        #[arg(short, long)]
        input: PathBuf,

        /// Sampling probability the result was computed with
        #[arg(short, long)]
        probability: f64,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default config file
    InitConfig {
        /// Destination (default: ~/.prism/aggs.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let json = logging.format == "json";

    if let Some(log_file) = &logging.file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        if json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(file)
                .init();
        }
    } else if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { output } = &cli.command {
        let path = output.clone().unwrap_or_else(default_config_path);
        Config::default().save(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(&default_config_path())?,
    };
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Reduce {
            inputs,
            mode,
            batch_size,
            max_buckets,
            sample_probability,
            heuristic,
            output,
        } => {
            let options = commands::ReduceOptions {
                inputs,
                mode: mode.parse::<ReduceMode>()?,
                batch_size: batch_size.unwrap_or(config.reduce.batched_reduce_size),
                max_buckets: max_buckets.unwrap_or(config.reduce.max_buckets),
                sampling: match sample_probability {
                    Some(p) => SamplingContext::new(p)?,
                    None => SamplingContext::none(),
                },
                heuristic: heuristic
                    .as_deref()
                    .map(HeuristicConfig::from_name)
                    .transpose()?,
                output,
            };
            commands::run_reduce(options).await?;
        }
        Commands::Rescale {
            input,
            probability,
            output,
        } => {
            let sampling = SamplingContext::new(probability)?;
            commands::run_rescale(&input, &sampling, output.as_deref())?;
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
