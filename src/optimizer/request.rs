use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::candidate::Role;
use crate::error::{FieldIssue, OptimizeError};

pub const DEFAULT_TEAM_SIZE: u32 = 11;
pub const DEFAULT_MAX_TEAM_SIZE: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    #[serde(rename = "MAX_SCORE")]
    MaxScore,
    #[serde(rename = "MAX_SCORE_PER_COST")]
    MaxScorePerCost,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxScore => "MAX_SCORE",
            Self::MaxScorePerCost => "MAX_SCORE_PER_COST",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MAX_SCORE" => Ok(Self::MaxScore),
            "MAX_SCORE_PER_COST" => Ok(Self::MaxScorePerCost),
            _ => Err(format!(
                "unknown strategy '{raw}' (expected MAX_SCORE or MAX_SCORE_PER_COST)"
            )),
        }
    }
}

/// Exact number of candidates required per role. Roles absent from the map are unconstrained
/// individually but still count towards the team size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoleQuota(BTreeMap<Role, u32>);

impl Default for RoleQuota {
    /// 1 keeper, 4 batters, 3 bowlers, 3 all-rounders.
    fn default() -> Self {
        Self(BTreeMap::from([
            (Role::Wk, 1),
            (Role::Bat, 4),
            (Role::Bowl, 3),
            (Role::All, 3),
        ]))
    }
}

impl RoleQuota {
    pub fn new(counts: BTreeMap<Role, u32>) -> Self {
        Self(counts)
    }

    /// Builds a quota from role labels, rejecting labels that are not known roles.
    pub fn from_labels<'a, I>(labels: I) -> Result<Self, OptimizeError>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut counts = BTreeMap::new();
        let mut messages = Vec::new();
        for (label, count) in labels {
            match label.parse::<Role>() {
                Ok(role) => {
                    counts.insert(role, count);
                }
                Err(err) => messages.push(err.to_string()),
            }
        }
        if messages.is_empty() {
            Ok(Self(counts))
        } else {
            Err(OptimizeError::BadRequest(vec![FieldIssue {
                field: "role_quota".to_string(),
                messages,
            }]))
        }
    }

    pub fn get(&self, role: Role) -> Option<u32> {
        self.0.get(&role).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, u32)> + '_ {
        self.0.iter().map(|(role, count)| (*role, *count))
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<Role, u32> {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRequest {
    pub budget: f64,
    pub team_size: u32,
    pub strategy: Strategy,
    pub role_quota: RoleQuota,
    pub excluded_ids: BTreeSet<String>,
    pub required_ids: BTreeSet<String>,
}

impl OptimizationRequest {
    pub fn new(budget: f64, team_size: u32, strategy: Strategy) -> Self {
        Self {
            budget,
            team_size,
            strategy,
            role_quota: RoleQuota::default(),
            excluded_ids: BTreeSet::new(),
            required_ids: BTreeSet::new(),
        }
    }

    pub fn with_quota(mut self, role_quota: RoleQuota) -> Self {
        self.role_quota = role_quota;
        self
    }

    pub fn excluding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn requiring<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_ids.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Loosely typed request input, as it arrives from JSON or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizeParams {
    pub budget: f64,
    #[serde(default)]
    pub team_size: Option<i64>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub role_quota: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub excluded_ids: Vec<String>,
    #[serde(default)]
    pub required_ids: Vec<String>,
}

impl OptimizeParams {
    /// Validates every field and reports all problems at once.
    pub fn into_request(self, max_team_size: u32) -> Result<OptimizationRequest, OptimizeError> {
        let mut issues: Vec<FieldIssue> = Vec::new();

        if !self.budget.is_finite() || self.budget <= 0.0 {
            issues.push(FieldIssue::new(
                "budget",
                format!("must be positive. Provided budget: {}", self.budget),
            ));
        }

        let team_size = self.team_size.unwrap_or(i64::from(DEFAULT_TEAM_SIZE));
        if !(1..=i64::from(max_team_size)).contains(&team_size) {
            issues.push(FieldIssue::new(
                "team_size",
                format!("must be between 1 and {max_team_size}, got {team_size}"),
            ));
        }

        let strategy = match self.strategy.as_deref() {
            None => Strategy::default(),
            Some(label) => match label.parse::<Strategy>() {
                Ok(strategy) => strategy,
                Err(message) => {
                    issues.push(FieldIssue::new("strategy", message));
                    Strategy::default()
                }
            },
        };

        let role_quota = match &self.role_quota {
            None => RoleQuota::default(),
            Some(labels) => {
                let labels = labels.iter().map(|(label, count)| (label.as_str(), *count));
                match RoleQuota::from_labels(labels) {
                    Ok(quota) => quota,
                    Err(OptimizeError::BadRequest(mut quota_issues)) => {
                        issues.append(&mut quota_issues);
                        RoleQuota::default()
                    }
                    Err(other) => return Err(other),
                }
            }
        };

        if !issues.is_empty() {
            return Err(OptimizeError::BadRequest(issues));
        }

        Ok(OptimizationRequest {
            budget: self.budget,
            team_size: team_size as u32,
            strategy,
            role_quota,
            excluded_ids: self.excluded_ids.into_iter().collect(),
            required_ids: self.required_ids.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quota_sums_to_default_team_size() {
        assert_eq!(RoleQuota::default().total(), DEFAULT_TEAM_SIZE);
    }

    #[test]
    fn params_default_to_eleven_and_max_score() {
        let request = OptimizeParams {
            budget: 120.0,
            ..OptimizeParams::default()
        }
        .into_request(DEFAULT_MAX_TEAM_SIZE)
        .expect("valid request");
        assert_eq!(request.team_size, 11);
        assert_eq!(request.strategy, Strategy::MaxScore);
        assert_eq!(request.role_quota, RoleQuota::default());
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let params = OptimizeParams {
            budget: 0.0,
            team_size: Some(12),
            strategy: Some("CHEAPEST".to_string()),
            role_quota: Some(BTreeMap::from([("KEEPER".to_string(), 1)])),
            ..OptimizeParams::default()
        };
        match params.into_request(DEFAULT_MAX_TEAM_SIZE) {
            Err(OptimizeError::BadRequest(issues)) => {
                let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
                assert_eq!(fields, vec!["budget", "team_size", "strategy", "role_quota"]);
                assert!(issues[0].messages[0].contains("Provided budget: 0"));
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn strategy_labels_parse_case_insensitively() {
        assert_eq!("max_score_per_cost".parse::<Strategy>(), Ok(Strategy::MaxScorePerCost));
        assert_eq!(Strategy::MaxScorePerCost.to_string(), "MAX_SCORE_PER_COST");
    }

    #[test]
    fn quota_labels_map_onto_roles() {
        let quota = RoleQuota::from_labels([("wk", 2), ("BAT", 3)]).expect("valid quota");
        assert_eq!(quota.get(Role::Wk), Some(2));
        assert_eq!(quota.get(Role::Bowl), None);
        assert_eq!(quota.total(), 5);
    }
}
