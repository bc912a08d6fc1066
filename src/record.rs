//! Applicant records and the attribute schema they must conform to

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier column of the application dataset
pub const ID_COLUMN: &str = "ID";

/// Numeric attributes of the credit application schema
pub const NUMERIC_FEATURES: [&str; 3] = ["CNT_CHILDREN", "AMT_INCOME_TOTAL", "CNT_FAM_MEMBERS"];

/// Categorical attributes of the credit application schema
pub const CATEGORICAL_FEATURES: [&str; 6] = [
    "CODE_GENDER",
    "FLAG_OWN_CAR",
    "NAME_INCOME_TYPE",
    "NAME_FAMILY_STATUS",
    "NAME_HOUSING_TYPE",
    "OCCUPATION_TYPE",
];

/// Column layout a record must provide
///
/// Output feature order follows the schema: numeric columns first, then
/// categorical columns, each in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl Schema {
    pub fn new<N, C>(numeric: N, categorical: C) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            numeric: numeric.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
        }
    }

    /// The credit application schema (3 numeric, 6 categorical attributes)
    pub fn credit_application() -> Self {
        Self::new(NUMERIC_FEATURES, CATEGORICAL_FEATURES)
    }

    /// All attribute names, numeric first
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::credit_application()
    }
}

/// A single attribute value; missing values are explicit `Null`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Flat mapping from attribute name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&self, column: &str) -> Result<&FieldValue> {
        self.fields
            .get(column)
            .ok_or_else(|| RiskError::Schema(format!("record is missing attribute '{}'", column)))
    }

    /// Value of a numeric column; `None` when null
    pub fn numeric(&self, column: &str) -> Result<Option<f64>> {
        match self.require(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Number(v) if v.is_nan() => Ok(None),
            FieldValue::Number(v) => Ok(Some(*v)),
            FieldValue::Text(t) => Err(RiskError::Schema(format!(
                "attribute '{}' is numeric but holds text '{}'",
                column, t
            ))),
        }
    }

    /// Value of a categorical column; `None` when null
    pub fn categorical(&self, column: &str) -> Result<Option<&str>> {
        match self.require(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(t) => Ok(Some(t.as_str())),
            FieldValue::Number(v) => Err(RiskError::Schema(format!(
                "attribute '{}' is categorical but holds number {}",
                column, v
            ))),
        }
    }

    /// Check every schema attribute is present (null allowed)
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for column in schema.columns() {
            self.require(column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_schema_layout() {
        let schema = Schema::credit_application();
        assert_eq!(schema.numeric.len(), 3);
        assert_eq!(schema.categorical.len(), 6);
        assert_eq!(schema.columns().next(), Some("CNT_CHILDREN"));
        assert!(schema.is_numeric("AMT_INCOME_TOTAL"));
        assert!(!schema.is_numeric("CODE_GENDER"));
    }

    #[test]
    fn test_null_is_not_absent() {
        let schema = Schema::new(["income"], ["gender"]);
        let record = Record::new()
            .with("income", FieldValue::Null)
            .with("gender", "F");
        assert!(record.validate(&schema).is_ok());
        assert_eq!(record.numeric("income").unwrap(), None);

        let missing = Record::new().with("gender", "F");
        assert!(matches!(
            missing.validate(&schema),
            Err(RiskError::Schema(_))
        ));
    }

    #[test]
    fn test_nan_number_reads_as_missing() {
        let record = Record::new().with("income", f64::NAN);
        assert_eq!(record.numeric("income").unwrap(), None);
    }

    #[test]
    fn test_kind_mismatch_is_schema_error() {
        let record = Record::new().with("income", "lots").with("gender", 1.0);
        assert!(matches!(record.numeric("income"), Err(RiskError::Schema(_))));
        assert!(matches!(
            record.categorical("gender"),
            Err(RiskError::Schema(_))
        ));
    }

    #[test]
    fn test_option_into_field_value() {
        let record = Record::new()
            .with("a", None::<f64>)
            .with("b", Some("Y"));
        assert!(record.get("a").unwrap().is_null());
        assert_eq!(record.categorical("b").unwrap(), Some("Y"));
    }
}
