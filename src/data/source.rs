//! Data source selection. The optimizer only ever sees [CandidateSource::load]; which
//! backing store answers is decided once at startup.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::data::candidate::RawCandidate;
use crate::data::dataset::ScoredDataset;
use crate::data::loader::{load_candidates_csv, LoadError};
use crate::data::store::SnapshotStore;
use crate::scoring::Scorer;

pub trait CandidateSource: Send + Sync {
    /// Short label reported by the service info endpoint.
    fn name(&self) -> &'static str;

    fn load(&self) -> Result<Vec<RawCandidate>, LoadError>;
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CandidateSource for CsvSource {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn load(&self) -> Result<Vec<RawCandidate>, LoadError> {
        load_candidates_csv(&self.path)
    }
}

impl CandidateSource for SnapshotStore {
    fn name(&self) -> &'static str {
        "store"
    }

    fn load(&self) -> Result<Vec<RawCandidate>, LoadError> {
        SnapshotStore::load(self)
    }
}

/// Loads every row from `source` and scores it. Rows are validated by the source.
pub fn load_dataset(
    source: &dyn CandidateSource,
    scorer: &impl Scorer,
) -> Result<ScoredDataset, LoadError> {
    let raw = source.load()?;
    let dataset = ScoredDataset::score(&raw, scorer);
    info!(
        source = source.name(),
        candidates = dataset.len(),
        fingerprint = dataset.fingerprint(),
        "candidate data loaded"
    );
    Ok(dataset)
}

/// Prefers the snapshot store when it holds data. A reachable but empty store is seeded
/// from the CSV file when `auto_sync` is set; any failure on that path falls back to CSV.
pub fn select_source(
    csv_path: impl Into<PathBuf>,
    store_path: impl Into<PathBuf>,
    auto_sync: bool,
) -> Box<dyn CandidateSource> {
    let csv = CsvSource::new(csv_path);
    let store = SnapshotStore::new(store_path);

    if !store.is_available() {
        info!(csv = %csv.path().display(), "snapshot store unavailable; using csv source");
        return Box::new(csv);
    }

    if store.count() > 0 {
        info!(store = %store.path().display(), "using snapshot store as data source");
        return Box::new(store);
    }

    if auto_sync {
        info!("snapshot store is empty; syncing from csv");
        match store.sync_from_csv(csv.path()) {
            Ok(_) => {
                info!(
                    store = %store.path().display(),
                    "using snapshot store as data source (after sync)"
                );
                return Box::new(store);
            }
            Err(err) => warn!(error = %err, "auto-sync failed; falling back to csv"),
        }
    }

    info!(csv = %csv.path().display(), "using csv as data source");
    Box::new(csv)
}
