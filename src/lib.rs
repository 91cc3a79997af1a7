//! Budgeted roster selection: score candidates, check that a request can be met, pick the
//! best team under budget and role quotas, and remember the answer.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod optimizer;
pub mod scoring;
pub mod server;

pub use error::{OptimizeError, OptimizeResult};
