//! Error types for tinyol.

use crate::model::State;
use thiserror::Error;

/// Tinyol error types.
///
/// A rejected sample is *not* an error: `Model::update` reports rejection
/// through [`Assignment::Rejected`](crate::Assignment::Rejected), which
/// callers handle as ordinary control flow. Every variant here leaves the
/// model exactly as it was before the failed call.
#[derive(Error, Debug)]
pub enum Error {
    /// Feature dimension outside `1..=MAX_FEATURES`
    #[error("invalid feature dimension {got} (must be 1..={max})")]
    InvalidDimension { got: usize, max: usize },

    /// Learning rate outside (0, 1]
    #[error("invalid learning rate {0} (must be in (0, 1])")]
    InvalidLearningRate(f32),

    /// A point's length does not match the model's feature dimension
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Operation invoked in the wrong state
    #[error("operation requires {required:?} state, model is in {actual:?}")]
    WrongState { required: State, actual: State },

    /// All cluster slots are in use
    #[error("cluster capacity exhausted ({max} clusters)")]
    CapacityExhausted { max: usize },

    /// Empty or over-long label
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// Label already used by an existing cluster (case-sensitive match)
    #[error("label {0:?} already in use")]
    DuplicateLabel(String),

    /// Cluster id out of range
    #[error("cluster id {id} out of range (k = {k})")]
    InvalidCluster { id: usize, k: usize },

    /// Sample buffer empty where buffered samples were required
    #[error("sample buffer is empty")]
    EmptyBuffer,

    /// Snapshot carries an unsupported format version
    #[error("unsupported snapshot version {got} (expected {expected})")]
    SnapshotVersion { got: u32, expected: u32 },

    /// Snapshot contents fail structural validation
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

/// Result type alias for tinyol operations.
pub type Result<T> = std::result::Result<T, Error>;
