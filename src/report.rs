//! Text and JSON rendering of risk scores

use crate::normalizer::ScoreRange;
use serde::{Deserialize, Serialize};

/// Risk score attached to a population ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub risk_score: f64,
}

/// Pair IDs with scores in population order
pub fn scored_records(ids: &[String], scores: &[f64]) -> Vec<ScoredRecord> {
    ids.iter()
        .zip(scores)
        .map(|(id, &risk_score)| ScoredRecord {
            id: id.clone(),
            risk_score,
        })
        .collect()
}

/// Complete run output for `--format json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub population_size: usize,
    pub num_trees: usize,
    pub raw_score_range: ScoreRange,
    pub population: Vec<ScoredRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_risk_score: Option<f64>,
}

impl RiskReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Two-column `ID  risk_score` table
pub fn format_population(records: &[ScoredRecord]) -> String {
    let id_width = records
        .iter()
        .map(|r| r.id.len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut output = String::new();
    output.push_str(&format!("{:<width$}  risk_score\n", "ID", width = id_width));
    for record in records {
        output.push_str(&format!(
            "{:<width$}  {:.6}\n",
            record.id,
            record.risk_score,
            width = id_width
        ));
    }
    output
}

pub fn format_query(risk_score: f64) -> String {
    format!(
        "\nPredicted Unsupervised Credit Risk Score (0 = low risk, 1 = high risk): {}\n",
        risk_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ScoredRecord> {
        scored_records(
            &["5008804".to_string(), "5008805".to_string()],
            &[0.25, 1.0],
        )
    }

    #[test]
    fn test_scored_records_pairs_in_order() {
        let records = sample();
        assert_eq!(records[0].id, "5008804");
        assert_eq!(records[1].risk_score, 1.0);
    }

    #[test]
    fn test_format_population_table() {
        let table = format_population(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID       risk_score");
        assert_eq!(lines[1], "5008804  0.250000");
        assert_eq!(lines[2], "5008805  1.000000");
    }

    #[test]
    fn test_format_query_line() {
        let line = format_query(0.5);
        assert!(line.contains("(0 = low risk, 1 = high risk): 0.5"));
    }

    #[test]
    fn test_json_report() {
        let report = RiskReport {
            population_size: 2,
            num_trees: 10,
            raw_score_range: ScoreRange { min: 0.4, max: 0.6 },
            population: sample(),
            query_risk_score: None,
        };
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["population"][0]["id"], "5008804");
        assert_eq!(value["raw_score_range"]["max"], 0.6);
        assert!(value.get("query_risk_score").is_none());
    }
}
