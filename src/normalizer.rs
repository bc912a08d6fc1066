//! Min/max normalization of raw anomaly scores
//!
//! The range is fitted on population scores and reused for every query.
//! Query scores more extreme than any population member land outside
//! [0, 1] and are deliberately not clamped.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Added to the range width so identical population scores do not divide by zero
pub const NORMALIZATION_EPSILON: f64 = 1e-12;

/// Observed raw score range of the population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    /// Fit the range on population raw scores
    pub fn fit(raw_scores: &[f64]) -> Result<Self> {
        if raw_scores.is_empty() {
            return Err(RiskError::DegenerateInput(
                "cannot fit score range on zero scores".to_string(),
            ));
        }

        let (min, max) = raw_scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });

        tracing::debug!("Score range fitted: min={} max={}", min, max);

        Ok(Self { min, max })
    }

    /// Map a raw score onto the population scale
    pub fn apply(&self, raw_score: f64) -> f64 {
        (raw_score - self.min) / (self.max - self.min + NORMALIZATION_EPSILON)
    }

    pub fn apply_all(&self, raw_scores: &[f64]) -> Vec<f64> {
        raw_scores.iter().map(|&s| self.apply(s)).collect()
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}
