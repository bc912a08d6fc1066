//! Fit-once / score-many risk pipeline
//!
//! `fit_all` produces a single immutable [`FittedModel`]; `score_all`
//! threads it through transform → forest → normalize. Refitting builds a
//! new model value, so all fitted state is replaced together.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::isolation_forest::IsolationForest;
use crate::normalizer::ScoreRange;
use crate::record::{Record, Schema};
use crate::transform::FeatureTransformer;

/// All state fitted on a population
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    transformer: FeatureTransformer,
    forest: IsolationForest,
    range: ScoreRange,
    config: PipelineConfig,
    population_size: usize,
}

impl FittedModel {
    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }

    pub fn range(&self) -> ScoreRange {
        self.range
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of records the model was fitted on
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Risk score of a single record
    pub fn score_one(&self, record: &Record) -> Result<f64> {
        let row = self.transformer.transform_one(record)?;
        let raw = self.forest.anomaly_score(&row)?;
        Ok(self.range.apply(raw))
    }
}

/// Fit the credit application pipeline on a population
pub fn fit_all(population: &[Record], config: &PipelineConfig) -> Result<FittedModel> {
    fit_all_with_schema(&Schema::credit_application(), population, config)
}

/// Fit transformer, forest and score range on a population
pub fn fit_all_with_schema(
    schema: &Schema,
    population: &[Record],
    config: &PipelineConfig,
) -> Result<FittedModel> {
    config.validate()?;

    let transformer = FeatureTransformer::fit(schema, population)?;
    let matrix = transformer.transform(population)?;
    let forest = IsolationForest::fit(&matrix, &config.forest_params())?;
    let raw = forest.score_samples(&matrix)?;
    let range = ScoreRange::fit(&raw)?;

    tracing::info!(
        "Fitted risk model on {} records: raw score range [{:.6}, {:.6}]",
        population.len(),
        range.min,
        range.max
    );

    Ok(FittedModel {
        transformer,
        forest,
        range,
        config: config.clone(),
        population_size: population.len(),
    })
}

/// Raw anomaly scores (higher = more anomalous), before normalization
pub fn raw_scores(records: &[Record], model: &FittedModel) -> Result<Vec<f64>> {
    let matrix = model.transformer.transform(records)?;
    model.forest.score_samples(&matrix)
}

/// Risk scores on the population scale; 0 = typical, 1 = most anomalous
/// population member
pub fn score_all(records: &[Record], model: &FittedModel) -> Result<Vec<f64>> {
    let raw = raw_scores(records, model)?;
    Ok(model.range.apply_all(&raw))
}
