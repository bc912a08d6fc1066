//! Interactive collection of a single applicant record
//!
//! Prompts are written to any `Write` and answers read from any `BufRead`,
//! so the same collector serves a terminal session and tests. Collection
//! finishes before any scoring starts.

use crate::dataset::is_missing;
use crate::error::{Result, RiskError};
use crate::record::{FieldValue, Record};
use std::io::{BufRead, Write};

/// How an answer is coerced into a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnswerKind {
    /// Trimmed and uppercased text (M/F, Y/N flags)
    Flag,
    Text,
    Integer,
    Float,
}

#[derive(Debug, Clone, Copy)]
struct Question {
    column: &'static str,
    prompt: &'static str,
    kind: AnswerKind,
}

const QUESTIONS: [Question; 9] = [
    Question {
        column: "CODE_GENDER",
        prompt: "Gender (M/F): ",
        kind: AnswerKind::Flag,
    },
    Question {
        column: "FLAG_OWN_CAR",
        prompt: "Own Car (Y/N): ",
        kind: AnswerKind::Flag,
    },
    Question {
        column: "CNT_CHILDREN",
        prompt: "Number of Children: ",
        kind: AnswerKind::Integer,
    },
    Question {
        column: "AMT_INCOME_TOTAL",
        prompt: "Total Income: ",
        kind: AnswerKind::Float,
    },
    Question {
        column: "NAME_INCOME_TYPE",
        prompt: "Income Type (e.g., Working, Pensioner, Student): ",
        kind: AnswerKind::Text,
    },
    Question {
        column: "NAME_FAMILY_STATUS",
        prompt: "Family Status (e.g., Married, Single): ",
        kind: AnswerKind::Text,
    },
    Question {
        column: "NAME_HOUSING_TYPE",
        prompt: "Housing Type (e.g., House / apartment, Rented): ",
        kind: AnswerKind::Text,
    },
    Question {
        column: "OCCUPATION_TYPE",
        prompt: "Occupation Type (e.g., Laborers, Managers, NaN if unknown): ",
        kind: AnswerKind::Text,
    },
    Question {
        column: "CNT_FAM_MEMBERS",
        prompt: "Number of Family Members: ",
        kind: AnswerKind::Integer,
    },
];

/// Coerce a raw answer
///
/// Text answers are kept as typed, so `NaN` or a blank occupation is an
/// unseen category and encodes to an all-zero block. Blank or NaN-style
/// numeric answers become `Null` and are imputed with the fitted median.
fn coerce(question: &Question, answer: &str) -> Result<FieldValue> {
    let answer = answer.trim();
    let numeric = matches!(question.kind, AnswerKind::Integer | AnswerKind::Float);
    if numeric && is_missing(answer) {
        return Ok(FieldValue::Null);
    }

    let value = match question.kind {
        AnswerKind::Flag => FieldValue::Text(answer.to_uppercase()),
        AnswerKind::Text => FieldValue::Text(answer.to_string()),
        AnswerKind::Integer => answer
            .parse::<i64>()
            .map(FieldValue::from)
            .map_err(|_| {
                RiskError::invalid_input(
                    question.column,
                    format!("expected a whole number, got '{}'", answer),
                )
            })?,
        AnswerKind::Float => answer
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FieldValue::Number)
            .ok_or_else(|| {
                RiskError::invalid_input(
                    question.column,
                    format!("expected a number, got '{}'", answer),
                )
            })?,
    };

    Ok(value)
}

/// Prompt for every schema attribute and build a record
pub fn collect_record<R, W>(input: &mut R, output: &mut W) -> Result<Record>
where
    R: BufRead,
    W: Write + ?Sized,
{
    writeln!(output, "\nEnter customer details for credit risk scoring:")?;

    let mut record = Record::new();
    for question in &QUESTIONS {
        write!(output, "{}", question.prompt)?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Err(RiskError::invalid_input(
                question.column,
                "unexpected end of input",
            ));
        }

        record.insert(question.column, coerce(question, &answer)?);
    }

    Ok(record)
}
