//! Engine error types.

use thiserror::Error;

/// Engine errors.
///
/// Benign races (orphaned value updates, remove or move for an untracked
/// key) are absorbed inside the engine and never surface here. The only
/// error is the caller-contract violation of announcing a key twice.
#[derive(Debug, Error)]
pub enum Error {
    /// The ordering stream announced a key that is already tracked.
    #[error("key {0:?} is already tracked")]
    AlreadyTracked(String),
}
