pub mod candidate;
pub mod dataset;
pub mod loader;
pub mod source;
pub mod store;
pub mod validate;

pub use candidate::{Attributes, Candidate, RawCandidate, Role};
pub use dataset::ScoredDataset;
pub use loader::{load_candidates_csv, LoadError, DEFAULT_PLAYERS_CSV_PATH};
pub use source::{load_dataset, select_source, CandidateSource, CsvSource};
pub use store::{SnapshotStore, DEFAULT_STORE_PATH};
