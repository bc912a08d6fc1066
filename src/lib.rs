//! riskforest - Unsupervised credit risk scoring
//!
//! Scores applicants by how easily an Isolation Forest separates them from
//! the rest of a population. The pipeline imputes, standardizes and one-hot
//! encodes applicant attributes, fits an ensemble of isolation trees, and
//! rescales the anomaly scores so the population spans [0, 1].
//!
//! ```no_run
//! use riskforest::config::PipelineConfig;
//! use riskforest::dataset::PopulationDataset;
//! use riskforest::pipeline::{fit_all, score_all};
//!
//! # fn main() -> riskforest::error::Result<()> {
//! let population = PopulationDataset::from_path("application_record.csv")?;
//! let model = fit_all(population.records(), &PipelineConfig::default())?;
//! let scores = score_all(population.records(), &model)?;
//! println!("{} scores", scores.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod isolation_forest;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod transform;

pub use error::{Result, RiskError};
pub use pipeline::{fit_all, score_all, FittedModel};
pub use record::{FieldValue, Record, Schema};
