//! Feature preprocessing: imputation, standardization, one-hot encoding
//!
//! The transformer is fitted once on the population and then applied
//! unchanged to any record, population member or query:
//!
//! - Numeric columns: missing values take the population median, then
//!   `(value - mean) / max(std, SCALE_EPSILON)` where mean and std are
//!   computed over the median-imputed column.
//! - Categorical columns: missing values take the population mode, then a
//!   one-hot block over the sorted known categories. An unseen category
//!   encodes as an all-zero block.
//!
//! Output column order is numeric columns first, then categorical blocks,
//! both in schema order.

use crate::error::{Result, RiskError};
use crate::record::{Record, Schema};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Lower bound for the scaling divisor of a zero-variance column
pub const SCALE_EPSILON: f64 = 1e-8;

/// Fitted imputation and scaling parameters for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericColumnState {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub std: f64,
}

impl NumericColumnState {
    fn fit(name: &str, values: &[Option<f64>]) -> Self {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();

        let median = match median(&mut present) {
            Some(m) => m,
            None => {
                tracing::warn!("Column {} has no values, imputing 0.0", name);
                0.0
            }
        };

        let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(median)).collect();
        let (mean, std) = mean_std(&imputed);

        tracing::debug!(
            "Numeric column {}: median={} mean={} std={} ({} missing)",
            name,
            median,
            mean,
            std,
            values.len() - present.len()
        );

        Self {
            name: name.to_string(),
            median,
            mean,
            std,
        }
    }

    /// Impute and standardize a single value
    pub fn scale(&self, value: Option<f64>) -> f64 {
        (value.unwrap_or(self.median) - self.mean) / self.std.max(SCALE_EPSILON)
    }
}

/// Fitted imputation value and category set for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalColumnState {
    pub name: String,
    /// Most frequent category; `None` only if the column was entirely missing
    pub mode: Option<String>,
    /// Known categories in sorted order
    pub categories: Vec<String>,
}

impl CategoricalColumnState {
    fn fit(name: &str, values: &[Option<&str>]) -> Self {
        let mode = mode(values).map(str::to_string);
        if mode.is_none() {
            tracing::warn!("Column {} has no values, encoding as empty block", name);
        }

        let categories: Vec<String> = values
            .iter()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        tracing::debug!(
            "Categorical column {}: mode={:?} categories={}",
            name,
            mode,
            categories.len()
        );

        Self {
            name: name.to_string(),
            mode,
            categories,
        }
    }

    /// Append this column's one-hot block for `value` to `out`
    pub fn encode_into(&self, value: Option<&str>, out: &mut Vec<f64>) {
        let start = out.len();
        out.resize(start + self.categories.len(), 0.0);

        let Some(value) = value.or(self.mode.as_deref()) else {
            return;
        };

        if let Ok(idx) = self
            .categories
            .binary_search_by(|c| c.as_str().cmp(value))
        {
            out[start + idx] = 1.0;
        }
    }
}

/// Fitted preprocessing state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTransformer {
    schema: Schema,
    numeric: Vec<NumericColumnState>,
    categorical: Vec<CategoricalColumnState>,
}

impl FeatureTransformer {
    /// Fit imputation, scaling and encoding parameters on a population
    pub fn fit(schema: &Schema, records: &[Record]) -> Result<Self> {
        if records.is_empty() {
            return Err(RiskError::DegenerateInput(
                "cannot fit transformer on an empty population".to_string(),
            ));
        }

        for record in records {
            record.validate(schema)?;
        }

        let mut numeric = Vec::with_capacity(schema.numeric.len());
        for column in &schema.numeric {
            let values = records
                .iter()
                .map(|r| r.numeric(column))
                .collect::<Result<Vec<_>>>()?;
            numeric.push(NumericColumnState::fit(column, &values));
        }

        let mut categorical = Vec::with_capacity(schema.categorical.len());
        for column in &schema.categorical {
            let values = records
                .iter()
                .map(|r| r.categorical(column))
                .collect::<Result<Vec<_>>>()?;
            categorical.push(CategoricalColumnState::fit(column, &values));
        }

        let transformer = Self {
            schema: schema.clone(),
            numeric,
            categorical,
        };

        tracing::info!(
            "Fitted transformer on {} records ({} features)",
            records.len(),
            transformer.n_features()
        );

        Ok(transformer)
    }

    /// Transform a single record into a feature vector
    pub fn transform_one(&self, record: &Record) -> Result<Vec<f64>> {
        let mut row = Vec::with_capacity(self.n_features());

        for state in &self.numeric {
            row.push(state.scale(record.numeric(&state.name)?));
        }

        for state in &self.categorical {
            state.encode_into(record.categorical(&state.name)?, &mut row);
        }

        Ok(row)
    }

    /// Transform records into a feature matrix (one row per record)
    ///
    /// Any schema violation aborts the whole call.
    pub fn transform(&self, records: &[Record]) -> Result<Vec<Vec<f64>>> {
        records.iter().map(|r| self.transform_one(r)).collect()
    }

    /// Width of a transformed row
    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Names of the output columns, e.g. `AMT_INCOME_TOTAL`, `CODE_GENDER=F`
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|n| n.name.clone()).collect();
        for column in &self.categorical {
            for category in &column.categories {
                names.push(format!("{}={}", column.name, category));
            }
        }
        names
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn numeric_columns(&self) -> &[NumericColumnState] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[CategoricalColumnState] {
        &self.categorical
    }

    pub fn numeric_column(&self, name: &str) -> Option<&NumericColumnState> {
        self.numeric.iter().find(|c| c.name == name)
    }

    pub fn categorical_column(&self, name: &str) -> Option<&CategoricalColumnState> {
        self.categorical.iter().find(|c| c.name == name)
    }
}

/// Median of `values` (mean of the middle pair for even counts)
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Mean and population standard deviation
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Most frequent value; ties go to the first value encountered
fn mode<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for &value in values.iter().flatten() {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    let mut best: Option<(&'a str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
