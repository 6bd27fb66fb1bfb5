// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

use dedupe_lib::evaluation::{match_quality, pair_counts};
use dedupe_lib::io::{load_gold_standard, load_json, save_json, to_json};
use dedupe_lib::utils::env::{load_env, ClusterConfig};
use dedupe_lib::utils::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize the clusters of a gold standard link file
    Info {
        /// Tab separated link file
        links: PathBuf,
    },
    /// Sample clusters from a gold standard link file
    Sample {
        /// Tab separated link file
        links: PathBuf,

        /// Number of clusters with two or more members
        #[arg(long)]
        k: usize,

        /// Number of singleton clusters
        #[arg(long, default_value_t = 0)]
        unmatched: usize,

        /// Seed for reproducible samples (falls back to CLUSTER_SAMPLE_SEED)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the sample as JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score a JSON cluster file against a gold standard link file
    Evaluate {
        result: PathBuf,
        gold: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging and environment
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    let config = ClusterConfig::from_env();
    let progress_config = ProgressConfig::from_env();
    let start = Instant::now();

    match cli.command {
        Command::Info { links } => {
            let index = load_gold_standard(&links, &config, &progress_config)
                .with_context(|| format!("Failed to load links from {}", links.display()))?;
            println!("{}", index.info());
            println!("links: {}", index.number_of_links());
        }
        Command::Sample {
            links,
            k,
            unmatched,
            seed,
            out,
        } => {
            let index = load_gold_standard(&links, &config, &progress_config)
                .with_context(|| format!("Failed to load links from {}", links.display()))?;
            let seed = seed.or(config.sample_seed);
            info!("Sampling {} matched and {} unmatched clusters (seed {:?})", k, unmatched, seed);
            let sample = index
                .sample(k, unmatched, seed)
                .context("Failed to sample clusters")?;
            match out {
                Some(path) => {
                    save_json(&sample, &path)
                        .with_context(|| format!("Failed to write sample to {}", path.display()))?;
                    info!("Wrote {} to {}", sample.info(), path.display());
                }
                None => println!("{}", to_json(&sample).context("Failed to serialize sample")?),
            }
        }
        Command::Evaluate { result, gold } => {
            let result_index = load_json(&result)
                .with_context(|| format!("Failed to load clusters from {}", result.display()))?;
            let gold_index = load_gold_standard(&gold, &config, &progress_config)
                .with_context(|| format!("Failed to load links from {}", gold.display()))?;
            let counts = pair_counts(&result_index, &gold_index);
            let quality = match_quality(&result_index, &gold_index);
            info!("Pair counts: {:?}", counts);
            println!(
                "precision: {:.4}\nrecall: {:.4}\nfmeasure: {:.4}",
                quality.precision, quality.recall, quality.fmeasure
            );
        }
    }

    info!("Finished in {:.2?}", start.elapsed());
    Ok(())
}
