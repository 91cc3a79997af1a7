//! Flat-file candidate loading. Expected header: `name,runs,wickets,strike_rate,price,role`.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::data::candidate::{Attributes, RawCandidate, Role};
use crate::data::validate::validate_candidates;
use crate::error::OptimizeError;

pub const DEFAULT_PLAYERS_CSV_PATH: &str = "data/players.csv";

const REQUIRED_COLUMNS: &[&str] = &["name", "runs", "wickets", "strike_rate", "price", "role"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("candidate data file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse candidate rows: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("candidate data failed integrity checks: {}", .0.join("; "))]
    Integrity(Vec<String>),
}

impl From<LoadError> for OptimizeError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Integrity(issues) => OptimizeError::DataIntegrity(issues),
            LoadError::MissingColumns(columns) => OptimizeError::DataIntegrity(
                columns
                    .into_iter()
                    .map(|column| format!("missing required column '{column}'"))
                    .collect(),
            ),
            other => OptimizeError::Unexpected(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    runs: f64,
    wickets: f64,
    strike_rate: f64,
    price: f64,
    role: String,
}

pub fn load_candidates_csv(path: impl AsRef<Path>) -> Result<Vec<RawCandidate>, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_candidates_csv(file)
}

/// Parses and validates candidate rows from any reader.
pub fn read_candidates_csv<R: Read>(reader: R) -> Result<Vec<RawCandidate>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut candidates = Vec::new();
    let mut role_issues = Vec::new();
    for (row, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let record = record?;
        let role = match record.role.parse::<Role>() {
            Ok(role) => role,
            Err(err) => {
                role_issues.push(format!("row[{row}] '{}': {err}", record.name));
                continue;
            }
        };
        candidates.push(RawCandidate {
            id: record.name,
            role,
            price: record.price,
            attributes: Attributes {
                runs: record.runs,
                wickets: record.wickets,
                strike_rate: record.strike_rate,
            },
        });
    }
    if !role_issues.is_empty() {
        return Err(LoadError::Integrity(role_issues));
    }

    let report = validate_candidates(&candidates);
    if !report.is_clean() {
        return Err(LoadError::Integrity(
            report.issues.iter().map(ToString::to_string).collect(),
        ));
    }

    Ok(candidates)
}
