use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roster role. Roles partition the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Role {
    #[serde(rename = "WK")]
    Wk,
    #[serde(rename = "BAT")]
    Bat,
    #[serde(rename = "BOWL")]
    Bowl,
    #[serde(rename = "ALL")]
    All,
}

impl Role {
    pub const ALL_ROLES: [Role; 4] = [Role::Wk, Role::Bat, Role::Bowl, Role::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wk => "WK",
            Self::Bat => "BAT",
            Self::Bowl => "BOWL",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}' (expected one of WK, BAT, BOWL, ALL)", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WK" => Ok(Self::Wk),
            "BAT" => Ok(Self::Bat),
            "BOWL" => Ok(Self::Bowl),
            "ALL" => Ok(Self::All),
            _ => Err(UnknownRole(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// Raw performance numbers the scorer reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub runs: f64,
    pub wickets: f64,
    pub strike_rate: f64,
}

/// A candidate as delivered by a data source, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(alias = "name")]
    pub id: String,
    pub role: Role,
    pub price: f64,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// A scored candidate. Produced by the scorer, never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub role: Role,
    pub price: f64,
    #[serde(flatten)]
    pub attributes: Attributes,
    pub score: f64,
}
