//! Serializable model snapshots for persistence collaborators.
//!
//! The engine does no I/O itself. A storage collaborator captures a
//! [`ModelSnapshot`] after every successful labeling action, serializes it
//! with whatever serde format the platform uses, and restores it at boot.
//! Restore validates the format version and feature dimension before
//! accepting anything; a restored model always wakes in NORMAL with an empty
//! buffer — alarms do not survive a power cycle, learned clusters do.

use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, MAX_LABEL_LEN};
use crate::error::{Error, Result};
use crate::fixed::Fixed;
use crate::model::{Model, ModelConfig, MAX_CLUSTERS, MAX_FEATURES};

/// Snapshot format version. Bump on any incompatible layout change.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Stored form of a single cluster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub centroid: Vec<Fixed>,
    pub count: u32,
    pub inertia: Fixed,
    pub label: String,
    pub active: bool,
}

/// Stored form of a whole model: header fields plus per-cluster records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: u32,
    pub feature_dim: usize,
    pub learning_rate: Fixed,
    pub outlier_threshold: Fixed,
    pub total_points: u64,
    pub clusters: Vec<ClusterSnapshot>,
}

impl Model {
    /// Capture the learned state for persistence.
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            version: SNAPSHOT_VERSION,
            feature_dim: self.feature_dim(),
            learning_rate: self.learning_rate(),
            outlier_threshold: self.outlier_threshold(),
            total_points: self.total_points(),
            clusters: self
                .clusters()
                .iter()
                .map(|c| ClusterSnapshot {
                    centroid: c.centroid().to_vec(),
                    count: c.count(),
                    inertia: c.inertia(),
                    label: c.label().to_string(),
                    active: c.is_active(),
                })
                .collect(),
        }
    }

    /// Rebuild a model from a stored snapshot.
    ///
    /// Rejects unknown versions, out-of-range dimensions or cluster counts,
    /// and structurally inconsistent cluster records. The restored model is
    /// in NORMAL with an empty, unfrozen buffer and no grace periods.
    pub fn restore(snapshot: &ModelSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::SnapshotVersion {
                got: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if snapshot.feature_dim == 0 || snapshot.feature_dim > MAX_FEATURES {
            return Err(Error::InvalidDimension {
                got: snapshot.feature_dim,
                max: MAX_FEATURES,
            });
        }
        if snapshot.clusters.is_empty() || snapshot.clusters.len() > MAX_CLUSTERS {
            return Err(Error::CorruptSnapshot(format!(
                "cluster count {} outside 1..={MAX_CLUSTERS}",
                snapshot.clusters.len()
            )));
        }
        if !snapshot.learning_rate.is_positive() || snapshot.learning_rate > Fixed::ONE {
            return Err(Error::CorruptSnapshot(format!(
                "learning rate {} outside (0, 1]",
                snapshot.learning_rate
            )));
        }
        if !snapshot.clusters.iter().any(|c| c.active) {
            return Err(Error::CorruptSnapshot(
                "no active clusters".to_string(),
            ));
        }

        let mut clusters = Vec::with_capacity(MAX_CLUSTERS);
        for (i, stored) in snapshot.clusters.iter().enumerate() {
            if stored.centroid.len() != snapshot.feature_dim {
                return Err(Error::DimensionMismatch {
                    expected: snapshot.feature_dim,
                    got: stored.centroid.len(),
                });
            }
            if stored.label.is_empty() || stored.label.len() > MAX_LABEL_LEN {
                return Err(Error::CorruptSnapshot(format!(
                    "cluster {i} has an invalid label"
                )));
            }
            if snapshot.clusters[..i].iter().any(|c| c.label == stored.label) {
                return Err(Error::DuplicateLabel(stored.label.clone()));
            }
            clusters.push(Cluster::from_parts(
                stored.centroid.clone(),
                stored.count,
                stored.inertia,
                stored.label.clone(),
                stored.active,
            ));
        }

        let config = ModelConfig::new(snapshot.feature_dim, snapshot.learning_rate.to_f32());
        Ok(Model::from_restored(
            config,
            clusters,
            snapshot.outlier_threshold,
            snapshot.total_points,
        ))
    }
}
