//! JSON snapshot store: the persistent candidate store that is preferred over the flat file
//! when it holds data. Written atomically (temp file + rename).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::candidate::RawCandidate;
use crate::data::loader::{load_candidates_csv, LoadError};
use crate::data::validate::validate_candidates;

pub const DEFAULT_STORE_PATH: &str = "data/store/players.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    synced_at: DateTime<Utc>,
    source: String,
    candidates: Vec<RawCandidate>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The store is reachable when its directory exists or can be created.
    pub fn is_available(&self) -> bool {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).is_ok(),
            _ => true,
        }
    }

    /// Number of stored candidates; 0 when the store has never been synced or is unreadable.
    pub fn count(&self) -> usize {
        match self.read_document() {
            Ok(Some(document)) => document.candidates.len(),
            Ok(None) => 0,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "snapshot store unreadable");
                0
            }
        }
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.read_document().ok().flatten().map(|document| document.synced_at)
    }

    pub fn load(&self) -> Result<Vec<RawCandidate>, LoadError> {
        let document = self
            .read_document()?
            .ok_or_else(|| LoadError::NotFound(self.path.clone()))?;
        let report = validate_candidates(&document.candidates);
        if !report.is_clean() {
            return Err(LoadError::Integrity(
                report.issues.iter().map(ToString::to_string).collect(),
            ));
        }
        Ok(document.candidates)
    }

    /// Replaces the stored candidates. Returns the number written.
    pub fn replace(&self, candidates: &[RawCandidate], source: &str) -> Result<usize, LoadError> {
        let report = validate_candidates(candidates);
        if !report.is_clean() {
            return Err(LoadError::Integrity(
                report.issues.iter().map(ToString::to_string).collect(),
            ));
        }
        let document = StoreDocument {
            synced_at: Utc::now(),
            source: source.to_string(),
            candidates: candidates.to_vec(),
        };
        let raw = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, raw).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))?;
        Ok(candidates.len())
    }

    pub fn sync_from_csv(&self, csv_path: impl AsRef<Path>) -> Result<usize, LoadError> {
        let csv_path = csv_path.as_ref();
        let candidates = load_candidates_csv(csv_path)?;
        let written = self.replace(&candidates, &csv_path.display().to_string())?;
        info!(
            store = %self.path.display(),
            csv = %csv_path.display(),
            written,
            "synced candidates into snapshot store"
        );
        Ok(written)
    }

    fn read_document(&self) -> Result<Option<StoreDocument>, LoadError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn io_error(&self, source: std::io::Error) -> LoadError {
        LoadError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::{Attributes, Role};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(name: &str) -> SnapshotStore {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        SnapshotStore::new(
            std::env::temp_dir()
                .join(format!("roster-store-{name}-{stamp}"))
                .join("players.json"),
        )
    }

    fn raw(id: &str) -> RawCandidate {
        RawCandidate {
            id: id.to_string(),
            role: Role::All,
            price: 9.0,
            attributes: Attributes {
                runs: 250.0,
                wickets: 10.0,
                strike_rate: 130.0,
            },
        }
    }

    #[test]
    fn empty_store_counts_zero_and_load_reports_not_found() {
        let store = temp_store("empty");
        assert!(store.is_available());
        assert_eq!(store.count(), 0);
        assert!(store.synced_at().is_none());
        assert!(matches!(store.load(), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn replace_then_load_returns_same_rows() {
        let store = temp_store("replace");
        let written = store.replace(&[raw("a"), raw("b")], "test").expect("write store");
        assert_eq!(written, 2);
        assert_eq!(store.count(), 2);
        assert!(store.synced_at().is_some());
        let loaded = store.load().expect("load store");
        assert_eq!(loaded, vec![raw("a"), raw("b")]);
        let _ = fs::remove_dir_all(store.path().parent().unwrap());
    }

    #[test]
    fn replace_rejects_invalid_rows() {
        let store = temp_store("invalid");
        let err = store.replace(&[raw("a"), raw("a")], "test").unwrap_err();
        assert!(matches!(err, LoadError::Integrity(_)));
        assert_eq!(store.count(), 0);
    }
}
