//! Population dataset loading from CSV
//!
//! The source must have a header row containing an `ID` column plus every
//! schema attribute; other columns are ignored. Rows sharing an ID are
//! collapsed to their last occurrence.

use crate::error::{Result, RiskError};
use crate::record::{FieldValue, Record, Schema, ID_COLUMN};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell contents read as missing values
const MISSING_MARKERS: [&str; 10] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A",
];

pub(crate) fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Convert a reader error, keeping the line it occurred on
fn csv_error(err: csv::Error) -> RiskError {
    let location = match err.position() {
        Some(pos) => format!("line {}", pos.line()),
        None => "population source".to_string(),
    };
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => RiskError::Io(io),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => RiskError::invalid_input(
            location,
            format!("expected {} fields, found {}", expected_len, len),
        ),
        _ => RiskError::invalid_input(location, message),
    }
}

/// Ordered, ID-unique collection of population records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationDataset {
    ids: Vec<String>,
    records: Vec<Record>,
}

impl PopulationDataset {
    /// Build from `(id, record)` pairs, keeping the last record per ID
    ///
    /// Survivors keep the relative order of their last occurrence.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Record)>,
    {
        let rows: Vec<(String, Record)> = rows.into_iter().collect();

        let mut last: HashMap<&str, usize> = HashMap::new();
        for (i, (id, _)) in rows.iter().enumerate() {
            last.insert(id.as_str(), i);
        }
        let keep: Vec<bool> = rows
            .iter()
            .enumerate()
            .map(|(i, (id, _))| last[id.as_str()] == i)
            .collect();

        let total = rows.len();
        let mut dataset = Self::default();
        for ((id, record), keep) in rows.into_iter().zip(keep) {
            if keep {
                dataset.ids.push(id);
                dataset.records.push(record);
            }
        }

        if dataset.len() < total {
            tracing::debug!(
                "Dropped {} duplicate IDs ({} unique records)",
                total - dataset.len(),
                dataset.len()
            );
        }

        dataset
    }

    /// Parse CSV text against the credit application schema
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_reader(content.as_bytes())
    }

    pub fn from_csv_str_with_schema(content: &str, schema: &Schema) -> Result<Self> {
        Self::from_reader_with_schema(content.as_bytes(), schema)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_schema(reader, &Schema::credit_application())
    }

    /// Read a header row plus records, keeping only schema columns
    pub fn from_reader_with_schema<R: Read>(reader: R, schema: &Schema) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let column_index = |name: &str| header.iter().position(|h| h == name);

        let id_idx = column_index(ID_COLUMN)
            .ok_or_else(|| RiskError::MissingIdentifier(ID_COLUMN.to_string()))?;

        let mut columns = Vec::with_capacity(schema.len());
        for name in schema.columns() {
            let idx = column_index(name).ok_or_else(|| {
                RiskError::Schema(format!("population source lacks column '{}'", name))
            })?;
            columns.push((name, idx, schema.is_numeric(name)));
        }

        let mut parsed = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(csv_error)?;
            let line = row.position().map_or(0, |pos| pos.line());

            let mut record = Record::new();
            for &(name, idx, numeric) in &columns {
                let cell = row.get(idx).unwrap_or_default();
                let value = if is_missing(cell) {
                    FieldValue::Null
                } else if numeric {
                    let number = cell
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| {
                            RiskError::invalid_input(
                                name,
                                format!("line {}: not a finite number: '{}'", line, cell),
                            )
                        })?;
                    FieldValue::Number(number)
                } else {
                    FieldValue::Text(cell.to_string())
                };
                record.insert(name, value);
            }

            let id = row.get(id_idx).unwrap_or_default().trim().to_string();
            parsed.push((id, record));
        }

        let dataset = Self::from_rows(parsed);
        tracing::info!("Loaded population of {} records", dataset.len());
        Ok(dataset)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.ids.iter().map(String::as_str).zip(self.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ID,CODE_GENDER,FLAG_OWN_CAR,FLAG_OWN_REALTY,CNT_CHILDREN,AMT_INCOME_TOTAL,NAME_INCOME_TYPE,NAME_EDUCATION_TYPE,NAME_FAMILY_STATUS,NAME_HOUSING_TYPE,OCCUPATION_TYPE,CNT_FAM_MEMBERS";

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out.push('\n');
        out
    }

    #[test]
    fn test_quoted_fields() {
        let content = csv(&[
            "1,M,Y,Y,0,100.0,Working,Secondary,Married,\"House, apartment\",\"Say \"\"hi\"\"\",2",
        ]);
        let dataset = PopulationDataset::from_csv_str(&content).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(
            record.categorical("NAME_HOUSING_TYPE").unwrap(),
            Some("House, apartment")
        );
        assert_eq!(
            record.categorical("OCCUPATION_TYPE").unwrap(),
            Some("Say \"hi\"")
        );
    }

    #[test]
    fn test_stray_quote_in_unquoted_field() {
        let content = csv(&[
            "1,M,Y,Y,0,100.0,Working,Secondary,Married,Rented apartment,IT 5\" staff,2",
            "2,F,N,Y,1,200.0,Working,Secondary,Married,Rented apartment,Laborers,3",
        ]);
        let dataset = PopulationDataset::from_csv_str(&content).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.records()[0].categorical("OCCUPATION_TYPE").unwrap(),
            Some("IT 5\" staff")
        );
        assert_eq!(
            dataset.records()[1].categorical("OCCUPATION_TYPE").unwrap(),
            Some("Laborers")
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let content = csv(&[
            "",
            "1,M,Y,Y,0,100.0,Working,Secondary,Married,Rented apartment,,2",
            "",
        ]);
        let dataset = PopulationDataset::from_csv_str(&content).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_load_population() {
        let content = csv(&[
            "5008804,M,Y,Y,0,427500.0,Working,Higher education,Civil marriage,Rented apartment,,2.0",
            "5008806,M,Y,Y,0,112500.0,Working,Secondary,Married,House / apartment,Security staff,2.0",
        ]);
        let dataset = PopulationDataset::from_csv_str(&content).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.ids(), &["5008804", "5008806"]);

        let first = &dataset.records()[0];
        assert_eq!(first.numeric("AMT_INCOME_TOTAL").unwrap(), Some(427500.0));
        assert_eq!(first.categorical("OCCUPATION_TYPE").unwrap(), None);
        assert_eq!(
            first.categorical("NAME_HOUSING_TYPE").unwrap(),
            Some("Rented apartment")
        );
        // Extra columns are not carried into the record
        assert!(first.get("FLAG_OWN_REALTY").is_none());
        assert_eq!(first.len(), 9);
    }

    #[test]
    fn test_duplicates_keep_last() {
        let content = csv(&[
            "1,M,Y,Y,0,100.0,Working,Secondary,Married,Rented apartment,,2",
            "2,F,N,Y,1,200.0,Working,Secondary,Married,Rented apartment,,3",
            "1,M,Y,Y,0,999.0,Working,Secondary,Married,Rented apartment,,2",
        ]);
        let dataset = PopulationDataset::from_csv_str(&content).unwrap();
        assert_eq!(dataset.ids(), &["2", "1"]);
        assert_eq!(
            dataset.records()[1].numeric("AMT_INCOME_TOTAL").unwrap(),
            Some(999.0)
        );
    }

    #[test]
    fn test_missing_id_column() {
        let content = "CODE_GENDER,CNT_CHILDREN\nM,0\n";
        assert!(matches!(
            PopulationDataset::from_csv_str(content),
            Err(RiskError::MissingIdentifier(_))
        ));
        assert!(matches!(
            PopulationDataset::from_csv_str(""),
            Err(RiskError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn test_missing_schema_column() {
        let content = "ID,CODE_GENDER\n1,M\n";
        assert!(matches!(
            PopulationDataset::from_csv_str(content),
            Err(RiskError::Schema(_))
        ));
    }

    #[test]
    fn test_non_numeric_cell() {
        let content = csv(&["1,M,Y,Y,zero,100.0,Working,Secondary,Married,Rented apartment,,2"]);
        match PopulationDataset::from_csv_str(&content) {
            Err(RiskError::InvalidInput { field, reason }) => {
                assert_eq!(field, "CNT_CHILDREN");
                assert!(reason.contains("line 2"));
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_cell() {
        for cell in ["inf", "-inf", "infinity"] {
            let content = csv(&[
                "1,M,Y,Y,0,100.0,Working,Secondary,Married,Rented apartment,,2",
                &format!("2,F,N,Y,1,{},Working,Secondary,Married,Rented apartment,,3", cell),
            ]);
            match PopulationDataset::from_csv_str(&content) {
                Err(RiskError::InvalidInput { field, reason }) => {
                    assert_eq!(field, "AMT_INCOME_TOTAL");
                    assert!(reason.contains("line 3"), "{}", reason);
                }
                other => panic!("expected InvalidInput for {}, got {:?}", cell, other),
            }
        }
    }

    #[test]
    fn test_ragged_row() {
        let content = csv(&["1,M,Y"]);
        match PopulationDataset::from_csv_str(&content) {
            Err(RiskError::InvalidInput { field, reason }) => {
                assert_eq!(field, "line 2");
                assert!(reason.contains("expected 12 fields, found 3"), "{}", reason);
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing(" NaN "));
        assert!(is_missing("NA"));
        assert!(!is_missing("Laborers"));
    }

    #[test]
    fn test_from_reader() {
        let content = csv(&["7,F,N,N,2,81000.0,Pensioner,Secondary,Widow,House / apartment,,1"]);
        let dataset = PopulationDataset::from_reader(content.as_bytes()).unwrap();
        let (id, record) = dataset.iter().next().unwrap();
        assert_eq!(id, "7");
        assert_eq!(record.numeric("CNT_CHILDREN").unwrap(), Some(2.0));
    }
}
