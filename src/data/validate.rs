use std::collections::HashMap;
use std::fmt;

use crate::data::candidate::RawCandidate;
use crate::error::OptimizeError;

pub const MAX_RUNS: f64 = 1000.0;
pub const MAX_WICKETS: f64 = 50.0;
pub const MAX_STRIKE_RATE: f64 = 250.0;
pub const MAX_PRICE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub context: String,
    pub message: String,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn push(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.issues.push(IntegrityIssue {
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_result(self) -> Result<(), OptimizeError> {
        if self.is_clean() {
            return Ok(());
        }
        Err(OptimizeError::DataIntegrity(
            self.issues.iter().map(ToString::to_string).collect(),
        ))
    }
}

/// Checks a freshly loaded candidate set before it is scored.
pub fn validate_candidates(candidates: &[RawCandidate]) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    if candidates.is_empty() {
        report.push("dataset", "candidate data is empty; no candidates available for selection");
        return report;
    }

    let mut first_row_by_id: HashMap<&str, usize> = HashMap::new();
    for (row, candidate) in candidates.iter().enumerate() {
        let context = if candidate.id.trim().is_empty() {
            format!("row[{row}]")
        } else {
            format!("row[{row}] '{}'", candidate.id)
        };

        if candidate.id.trim().is_empty() {
            report.push(&context, "missing required field 'id'");
        } else if let Some(first) = first_row_by_id.insert(candidate.id.as_str(), row) {
            report.push(&context, format!("duplicate id (first seen at row[{first}])"));
            first_row_by_id.insert(candidate.id.as_str(), first);
        }

        if !candidate.price.is_finite() || candidate.price <= 0.0 {
            report.push(&context, format!("price must be positive, got {}", candidate.price));
        } else if candidate.price > MAX_PRICE {
            report.push(
                &context,
                format!("price must be at most {MAX_PRICE}, got {}", candidate.price),
            );
        }

        check_range(&mut report, &context, "runs", candidate.attributes.runs, MAX_RUNS);
        check_range(&mut report, &context, "wickets", candidate.attributes.wickets, MAX_WICKETS);
        check_range(
            &mut report,
            &context,
            "strike_rate",
            candidate.attributes.strike_rate,
            MAX_STRIKE_RATE,
        );
    }

    report
}

fn check_range(report: &mut IntegrityReport, context: &str, field: &str, value: f64, max: f64) {
    if !value.is_finite() || !(0.0..=max).contains(&value) {
        report.push(context, format!("{field} must be between 0 and {max}, got {value}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::{Attributes, Role};

    fn raw(id: &str, price: f64) -> RawCandidate {
        RawCandidate {
            id: id.to_string(),
            role: Role::Bowl,
            price,
            attributes: Attributes {
                runs: 120.0,
                wickets: 14.0,
                strike_rate: 95.0,
            },
        }
    }

    #[test]
    fn clean_dataset_passes() {
        let report = validate_candidates(&[raw("a", 8.0), raw("b", 9.5)]);
        assert!(report.is_clean());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn duplicate_ids_and_bad_prices_are_all_reported() {
        let report = validate_candidates(&[raw("a", 8.0), raw("a", 0.0), raw("", 150.0)]);
        let messages: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 4, "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("duplicate id (first seen at row[0])")));
        assert!(messages.iter().any(|m| m.contains("price must be positive, got 0")));
        assert!(messages.iter().any(|m| m.contains("missing required field 'id'")));
        assert!(messages.iter().any(|m| m.contains("price must be at most 100")));
    }

    #[test]
    fn out_of_range_attributes_are_rejected() {
        let mut candidate = raw("a", 8.0);
        candidate.attributes.wickets = 51.0;
        candidate.attributes.strike_rate = f64::NAN;
        let err = validate_candidates(&[candidate]).into_result().unwrap_err();
        match err {
            OptimizeError::DataIntegrity(issues) => {
                assert_eq!(issues.len(), 2);
                assert!(issues[0].contains("wickets must be between 0 and 50"));
            }
            other => panic!("expected data integrity error, got {other:?}"),
        }
    }

    #[test]
    fn empty_dataset_is_an_integrity_failure() {
        assert!(!validate_candidates(&[]).is_clean());
    }
}
