//! CLI argument parsing for riskforest

use crate::config::PipelineConfig;
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for risk scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "riskforest")]
#[command(version)]
#[command(about = "Unsupervised credit risk scoring with Isolation Forest", long_about = None)]
pub struct Cli {
    /// Population CSV with an ID column and the application attributes
    #[arg(short = 'p', long = "population", value_name = "FILE")]
    pub population: PathBuf,

    /// Pipeline configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of isolation trees (default: 300)
    #[arg(short = 'n', long = "trees", value_name = "N")]
    pub trees: Option<usize>,

    /// Rows sampled per tree (default: 256)
    #[arg(long = "subsample-size", value_name = "SIZE")]
    pub subsample_size: Option<usize>,

    /// Master random seed (default: 42)
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Tree height limit (default: ceil(log2(subsample size)))
    #[arg(long = "max-depth", value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Build trees on a single thread
    #[arg(long = "sequential")]
    pub sequential: bool,

    /// Number of population scores to print (0 = all)
    #[arg(long = "head", value_name = "N", default_value = "5")]
    pub head: usize,

    /// Skip the interactive applicant prompt
    #[arg(long = "no-prompt")]
    pub no_prompt: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(trees) = self.trees {
            config.num_trees = trees;
        }
        if let Some(subsample_size) = self.subsample_size {
            config.subsample_size = subsample_size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = Some(max_depth);
        }
        if self.sequential {
            config.parallel = false;
        }

        config.validate()?;
        Ok(config)
    }
}
