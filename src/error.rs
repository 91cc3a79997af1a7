//! Failure taxonomy shared by the validator, the engine and the collaborators that
//! map failures onto transport codes.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::data::candidate::Role;

/// One rejected input field and everything wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub messages: Vec<String>,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            messages: vec![message.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InfeasibleReason {
    #[error(
        "insufficient candidates for role '{role}': required {required}, but only {available} available. Available roles: {}",
        format_counts(.availability)
    )]
    RoleShortage {
        role: Role,
        required: u32,
        available: u32,
        availability: BTreeMap<Role, u32>,
    },

    #[error(
        "budget {budget} is insufficient. Minimum cost for required team composition is {lower_bound:.2}. Please increase budget by at least {shortfall:.2}. Required composition: {}",
        format_counts(.quota)
    )]
    BudgetBelowLowerBound {
        budget: f64,
        lower_bound: f64,
        shortfall: f64,
        quota: BTreeMap<Role, u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("invalid request: {}", format_issues(.0))]
    BadRequest(Vec<FieldIssue>),

    #[error("candidate data failed integrity checks: {}", .0.join("; "))]
    DataIntegrity(Vec<String>),

    #[error("{0}")]
    Infeasible(InfeasibleReason),

    #[error("No optimal solution found. Status: {status}")]
    Optimization { status: String },

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl OptimizeError {
    pub fn bad_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest(vec![FieldIssue::new(field, message)])
    }

    /// Stable label for collaborators that map failures onto their own codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::DataIntegrity(_) => "data_integrity",
            Self::Infeasible(_) => "infeasible",
            Self::Optimization { .. } => "optimization",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

pub type OptimizeResult<T> = Result<T, OptimizeError>;

fn format_counts(counts: &BTreeMap<Role, u32>) -> String {
    let parts: Vec<String> = counts
        .iter()
        .map(|(role, count)| format!("{role}: {count}"))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{} {}", issue.field, issue.messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_shortage_message_names_counts_and_breakdown() {
        let availability = BTreeMap::from([(Role::Wk, 1), (Role::Bat, 6)]);
        let err = OptimizeError::Infeasible(InfeasibleReason::RoleShortage {
            role: Role::Wk,
            required: 2,
            available: 1,
            availability,
        });
        let text = err.to_string();
        assert!(text.contains("role 'WK'"));
        assert!(text.contains("required 2, but only 1 available"));
        assert!(text.contains("{WK: 1, BAT: 6}"));
        assert_eq!(err.kind(), "infeasible");
    }

    #[test]
    fn optimization_error_carries_status_label() {
        let err = OptimizeError::Optimization {
            status: "Infeasible".to_string(),
        };
        assert_eq!(err.to_string(), "No optimal solution found. Status: Infeasible");
    }
}
