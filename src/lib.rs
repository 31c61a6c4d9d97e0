//! # Tinyol: Streaming, Label-Driven Clustering
//!
//! Tinyol is an online clustering engine for vibration-based fault detection
//! on resource-constrained devices. Samples arrive one at a time from a
//! feature-extraction stage; the engine classifies each one in constant
//! memory and bounded time, entirely in Q16.16 fixed-point arithmetic.
//!
//! ## Quick Start
//!
//! ```rust
//! use tinyol::{to_fixed_vec, Assignment, Model, State};
//!
//! // Two features, base learning rate 0.3. Starts with one "normal"
//! // cluster at the origin — no pre-training.
//! let mut model = Model::new(2, 0.3)?;
//!
//! // Baseline samples stream in and the normal cluster adapts.
//! for _ in 0..20 {
//!     model.update(&to_fixed_vec(&[0.1, 0.1]))?;
//! }
//!
//! // A far-off sample raises the alarm and is rejected, not learned.
//! let outcome = model.update(&to_fixed_vec(&[10.0, 10.0]))?;
//! assert_eq!(outcome, Assignment::Rejected);
//! assert_eq!(model.state(), State::Alarm);
//!
//! // The operator freezes, inspects the buffered anomaly, and names it.
//! model.request_label();
//! model.add_cluster("bearing_fault")?;
//! assert_eq!(model.k(), 2);
//! # Ok::<(), tinyol::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Fixed-point**: all streaming math runs on [`Fixed`] (Q16.16); floats
//!   appear only at the configuration boundary.
//! - **EMA adaptation**: centroids track samples with a count-decayed
//!   exponential moving average; inertia (EMA of squared distance) is each
//!   cluster's radius proxy.
//! - **Alarm lifecycle**: NORMAL → ALARM on an outlier, ALARM →
//!   WAITING_LABEL on operator request or motor idle, back to NORMAL only
//!   through an explicit label, merge, or discard.
//! - **Human in the loop**: operators create clusters from the frozen
//!   anomaly buffer, merge recurrences into existing clusters, and correct
//!   misassignments after the fact.
//!
//! The engine performs no I/O; persistence collaborators use
//! [`Model::snapshot`] / [`Model::restore`], and activity signals come from
//! whatever the platform measures (see [`Model::update_activity`]).

pub mod activity;
pub mod buffer;
pub mod cluster;
pub mod distance;
pub mod error;
pub mod fixed;
pub mod model;
pub mod snapshot;

// Re-exports for convenience
pub use activity::{ActivityMonitor, IDLE_CONSECUTIVE_SAMPLES};
pub use buffer::{RingBuffer, RING_CAPACITY};
pub use cluster::{Cluster, MAX_LABEL_LEN};
pub use distance::distance_squared;
pub use error::{Error, Result};
pub use fixed::{to_fixed_vec, Fixed};
pub use model::{
    Assignment, Model, ModelConfig, State, ALARM_CLEAR_SAMPLES, MAX_CLUSTERS, MAX_FEATURES,
    MIN_BASELINE,
};
pub use snapshot::{ClusterSnapshot, ModelSnapshot, SNAPSHOT_VERSION};
