//! Pipeline configuration
//!
//! Loadable from a TOML file; every key is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! num_trees = 300
//! subsample_size = 256
//! seed = 42
//! max_depth = 8
//! parallel = true
//! ```

use crate::error::{Result, RiskError};
use crate::isolation_forest::{
    ForestParams, DEFAULT_NUM_TREES, DEFAULT_SEED, DEFAULT_SUBSAMPLE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Hyperparameters for fitting the risk model
///
/// # Example
/// ```
/// use riskforest::config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.num_trees, 300);
/// assert_eq!(config.seed, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of isolation trees in the ensemble
    pub num_trees: usize,

    /// Rows drawn (without replacement) to build each tree
    ///
    /// Capped at the population size. Default: 256
    pub subsample_size: usize,

    /// Master seed; each tree derives its own stream from it
    pub seed: u64,

    /// Tree height limit; `None` means `ceil(log2(subsample))`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Build trees in parallel (output is identical either way)
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_trees: DEFAULT_NUM_TREES,
            subsample_size: DEFAULT_SUBSAMPLE_SIZE,
            seed: DEFAULT_SEED,
            max_depth: None,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Smaller ensemble for quick interactive runs
    pub fn fast() -> Self {
        Self {
            num_trees: 100,
            ..Self::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| RiskError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(RiskError::Config("num_trees must be >= 1".to_string()));
        }

        if self.subsample_size == 0 {
            return Err(RiskError::Config(
                "subsample_size must be >= 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            num_trees: self.num_trees,
            subsample_size: self.subsample_size,
            max_depth: self.max_depth,
            seed: self.seed,
            parallel: self.parallel,
        }
    }
}
