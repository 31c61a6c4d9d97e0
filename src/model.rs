//! The streaming model: assignment, adaptation, and the alarm state machine.
//!
//! A [`Model`] starts with a single "normal" cluster at the origin and learns
//! the baseline online. When a sample lands outside the outlier envelope of
//! its nearest cluster the model raises an alarm, starts capturing the
//! anomaly in the ring buffer, and waits for a human to say what it was.
//!
//! # State machine
//!
//! ```text
//! NORMAL --outlier--> ALARM --request_label() or motor idle--> WAITING_LABEL
//! ALARM --30 consecutive in-range samples--> NORMAL (auto-clear)
//! WAITING_LABEL --add_cluster()/assign_existing()/discard()--> NORMAL
//! ```
//!
//! # Key Insight
//!
//! Freezing is backpressure, not failure. While WAITING_LABEL the model
//! rejects every sample rather than learn from an unlabeled anomaly — a
//! model that kept adapting would absorb the fault into its baseline and
//! never alarm on it again. Only an explicit operator action (label, merge,
//! or discard) resumes learning.

use crate::activity::ActivityMonitor;
use crate::buffer::RingBuffer;
use crate::cluster::{Cluster, MAX_LABEL_LEN};
use crate::distance::{distance_squared, find_nearest};
use crate::error::{Error, Result};
use crate::fixed::Fixed;

/// Maximum number of clusters a model can hold.
pub const MAX_CLUSTERS: usize = 16;

/// Maximum feature-vector dimensionality.
pub const MAX_FEATURES: usize = 64;

/// Buffered samples required before outlier checks arm in NORMAL.
pub const MIN_BASELINE: usize = 10;

/// Consecutive in-range samples that auto-clear an ALARM.
pub const ALARM_CLEAR_SAMPLES: u32 = 30;

/// Default outlier threshold multiplier (2.0).
const DEFAULT_THRESHOLD: Fixed = Fixed::from_raw(2 << 16);

/// Repel rate applied to the old cluster during manual correction (0.1).
const REPEL_RATE: Fixed = Fixed::from_raw(6554);

/// Attract rate applied to the new cluster during manual correction (0.2).
const ATTRACT_RATE: Fixed = Fixed::from_raw(13107);

/// Alarm lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Baseline sampling; everything in range.
    Normal,
    /// Outlier detected; alert active, still sampling.
    Alarm,
    /// Frozen; anomaly buffered, waiting for operator input.
    WaitingLabel,
}

/// Outcome of processing one sample.
///
/// `Rejected` is the expected steady-state response while frozen or for an
/// outlier sample — handle it as control flow, not as an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assignment {
    /// Sample folded into the cluster at this index.
    Assigned(usize),
    /// Sample not learned: it was an outlier or the model is frozen.
    Rejected,
}

impl Assignment {
    /// The assigned cluster index, if any.
    pub fn cluster(self) -> Option<usize> {
        match self {
            Assignment::Assigned(id) => Some(id),
            Assignment::Rejected => None,
        }
    }

    /// True if the sample was not learned.
    pub fn is_rejected(self) -> bool {
        matches!(self, Assignment::Rejected)
    }
}

/// Model construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct ModelConfig {
    /// Feature-vector length, `1..=MAX_FEATURES`.
    pub feature_dim: usize,
    /// Base EMA learning rate, in `(0, 1]`.
    pub learning_rate: f32,
    /// Updates during which a freshly labeled cluster's centroid stays put.
    /// Zero (the default) disables the grace period.
    pub grace_period: u32,
}

impl ModelConfig {
    /// Config with the given dimension and learning rate, no grace period.
    pub fn new(feature_dim: usize, learning_rate: f32) -> Self {
        ModelConfig {
            feature_dim,
            learning_rate,
            grace_period: 0,
        }
    }

    /// Set the post-creation grace period.
    pub fn grace_period(mut self, updates: u32) -> Self {
        self.grace_period = updates;
        self
    }
}

/// Online label-driven clustering model.
///
/// Single-threaded and synchronous: every method is a bounded-time function
/// of `k`, the feature dimension, and the buffer capacity. Callers sharing a
/// model across tasks must serialize access themselves.
#[derive(Clone, Debug)]
pub struct Model {
    clusters: Vec<Cluster>,
    config: ModelConfig,
    learning_rate: Fixed,
    outlier_threshold: Fixed,
    total_points: u64,
    state: State,
    buffer: RingBuffer,
    alarm_active: bool,
    /// Consecutive in-range samples while in ALARM (drives auto-clear).
    normal_streak: u32,
    /// Samples seen since the alarm was raised.
    samples_since_alarm: u32,
    activity: ActivityMonitor,
}

impl Model {
    /// Create a model with `feature_dim` features and the given base
    /// learning rate. Starts with k=1: a "normal" cluster at the origin.
    pub fn new(feature_dim: usize, learning_rate: f32) -> Result<Self> {
        Self::with_config(ModelConfig::new(feature_dim, learning_rate))
    }

    /// Create a model from a full [`ModelConfig`].
    pub fn with_config(config: ModelConfig) -> Result<Self> {
        if config.feature_dim == 0 || config.feature_dim > MAX_FEATURES {
            return Err(Error::InvalidDimension {
                got: config.feature_dim,
                max: MAX_FEATURES,
            });
        }
        if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
            return Err(Error::InvalidLearningRate(config.learning_rate));
        }
        Ok(Self::fresh(config))
    }

    /// Build the K=1 baseline state. `config` must already be validated.
    fn fresh(config: ModelConfig) -> Self {
        let mut clusters = Vec::with_capacity(MAX_CLUSTERS);
        clusters.push(Cluster::baseline(config.feature_dim));

        Model {
            clusters,
            config,
            learning_rate: Fixed::from_f32(config.learning_rate),
            outlier_threshold: DEFAULT_THRESHOLD,
            total_points: 0,
            state: State::Normal,
            buffer: RingBuffer::new(config.feature_dim),
            alarm_active: false,
            normal_streak: 0,
            samples_since_alarm: 0,
            activity: ActivityMonitor::new(),
        }
    }

    /// Rebuild from restored parts (snapshot path). Caller has validated
    /// dimensions and counts.
    pub(crate) fn from_restored(
        config: ModelConfig,
        clusters: Vec<Cluster>,
        outlier_threshold: Fixed,
        total_points: u64,
    ) -> Self {
        let mut model = Self::fresh(config);
        model.clusters = clusters;
        model.clusters.reserve(MAX_CLUSTERS.saturating_sub(model.clusters.len()));
        model.outlier_threshold = outlier_threshold;
        model.total_points = total_points;
        model
    }

    // =========================================================================
    // Point processing
    // =========================================================================

    /// Process one sample: assign, adapt, or reject.
    ///
    /// While WAITING_LABEL every sample is rejected without mutation. In
    /// NORMAL an outlier (once the baseline is armed) raises the alarm,
    /// resets the buffer to capture the anomaly, and is rejected. In ALARM
    /// outliers keep accumulating in the buffer while in-range samples still
    /// learn; a sustained in-range run auto-clears back to NORMAL.
    pub fn update(&mut self, point: &[Fixed]) -> Result<Assignment> {
        self.check_dim(point)?;

        match self.state {
            State::WaitingLabel => Ok(Assignment::Rejected),
            State::Normal => {
                let (nearest, dist) = find_nearest(&self.clusters, point);
                if self.buffer.len() >= MIN_BASELINE && self.is_outlier(nearest, dist) {
                    // Drop the baseline window so the buffer holds only the
                    // anomaly the operator will label.
                    self.buffer.clear();
                    self.buffer.push(point);
                    self.state = State::Alarm;
                    self.alarm_active = true;
                    self.normal_streak = 0;
                    self.samples_since_alarm = 0;
                    return Ok(Assignment::Rejected);
                }
                self.buffer.push(point);
                self.learn(nearest, point);
                Ok(Assignment::Assigned(nearest))
            }
            State::Alarm => {
                self.samples_since_alarm = self.samples_since_alarm.saturating_add(1);
                let (nearest, dist) = find_nearest(&self.clusters, point);
                if self.is_outlier(nearest, dist) {
                    self.normal_streak = 0;
                    self.buffer.push(point);
                    return Ok(Assignment::Rejected);
                }
                self.normal_streak += 1;
                self.learn(nearest, point);
                if self.normal_streak >= ALARM_CLEAR_SAMPLES {
                    self.resume_normal();
                }
                Ok(Assignment::Assigned(nearest))
            }
        }
    }

    /// Read-only nearest-cluster query. Never mutates.
    pub fn predict(&self, point: &[Fixed]) -> Result<usize> {
        self.check_dim(point)?;
        Ok(find_nearest(&self.clusters, point).0)
    }

    fn learn(&mut self, id: usize, point: &[Fixed]) {
        let cluster = &mut self.clusters[id];
        let alpha = cluster.effective_alpha(self.learning_rate);
        cluster.observe(point, alpha);
        self.total_points += 1;
    }

    /// Outlier test: squared distance beyond `threshold × inertia`, with a
    /// unit radius substituted when the cluster has no inertia yet.
    fn is_outlier(&self, id: usize, dist: Fixed) -> bool {
        let inertia = self.clusters[id].inertia();
        let radius = if inertia.is_positive() {
            inertia
        } else {
            Fixed::ONE
        };
        dist > self.outlier_threshold.mul(radius)
    }

    // =========================================================================
    // Operator interface
    // =========================================================================

    /// Manual freeze trigger (the operator's button press).
    ///
    /// Moves ALARM to WAITING_LABEL and freezes the buffer. Returns `false`
    /// with no effect in any other state.
    pub fn request_label(&mut self) -> bool {
        if self.state != State::Alarm {
            return false;
        }
        self.state = State::WaitingLabel;
        self.buffer.freeze();
        true
    }

    /// Create a new cluster from the frozen anomaly buffer.
    ///
    /// The centroid is the elementwise average of the buffered samples, the
    /// count is the buffer size, and inertia seeds from the within-buffer
    /// variance around that centroid. Returns the new cluster's index and
    /// resumes NORMAL with an empty buffer.
    pub fn add_cluster(&mut self, label: &str) -> Result<usize> {
        if self.state != State::WaitingLabel {
            return Err(Error::WrongState {
                required: State::WaitingLabel,
                actual: self.state,
            });
        }
        if self.clusters.len() >= MAX_CLUSTERS {
            return Err(Error::CapacityExhausted { max: MAX_CLUSTERS });
        }
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(Error::InvalidLabel(label.to_string()));
        }
        if self.clusters.iter().any(|c| c.label() == label) {
            return Err(Error::DuplicateLabel(label.to_string()));
        }
        if self.buffer.is_empty() {
            return Err(Error::EmptyBuffer);
        }

        let n = self.buffer.len() as i64;

        // Average with each addend pre-divided by the count, so partial sums
        // never exceed the magnitude of the samples themselves.
        let mut centroid_raw = vec![0i64; self.config.feature_dim];
        for sample in self.buffer.samples() {
            for (acc, &x) in centroid_raw.iter_mut().zip(sample.iter()) {
                *acc += x.raw() as i64 / n;
            }
        }
        let centroid: Vec<Fixed> = centroid_raw
            .iter()
            .map(|&raw| Fixed::from_raw(raw as i32))
            .collect();

        let mut variance_raw: i64 = 0;
        for sample in self.buffer.samples() {
            variance_raw += distance_squared(sample, &centroid).raw() as i64 / n;
        }

        let mut cluster = Cluster::with_centroid(centroid, label);
        cluster.set_count(self.buffer.len() as u32);
        cluster.set_inertia(Fixed::from_raw(variance_raw as i32));
        cluster.set_grace(self.config.grace_period);
        self.clusters.push(cluster);

        self.resume_normal();
        Ok(self.clusters.len() - 1)
    }

    /// Fold the frozen anomaly buffer into an existing cluster.
    ///
    /// The operator recognized a recurring fault: strengthen its cluster
    /// instead of growing K. Samples are folded oldest-first through the
    /// ordinary EMA rule. Resumes NORMAL with an empty buffer.
    pub fn assign_existing(&mut self, cluster_id: usize) -> Result<()> {
        if self.state != State::WaitingLabel {
            return Err(Error::WrongState {
                required: State::WaitingLabel,
                actual: self.state,
            });
        }
        let k = self.clusters.len();
        if cluster_id >= k {
            return Err(Error::InvalidCluster { id: cluster_id, k });
        }
        if self.buffer.is_empty() {
            return Err(Error::EmptyBuffer);
        }

        let lr = self.learning_rate;
        let cluster = &mut self.clusters[cluster_id];
        for sample in self.buffer.samples() {
            let alpha = cluster.effective_alpha(lr);
            cluster.observe(sample, alpha);
        }
        self.total_points += self.buffer.len() as u64;

        self.resume_normal();
        Ok(())
    }

    /// False-alarm path: return to NORMAL, clear the buffer, change nothing
    /// else. No-op while NORMAL (the baseline window is kept).
    pub fn discard(&mut self) {
        if self.state == State::Normal {
            return;
        }
        self.resume_normal();
    }

    /// Human-in-the-loop correction: move `point`'s evidence from
    /// `old_cluster` to `new_cluster`.
    ///
    /// Repels the old centroid (rate 0.1, count floors at zero) and attracts
    /// the new one (rate 0.2, count +1). Self-correction is a successful
    /// no-op. Works in any state and overrides any grace period.
    pub fn correct(
        &mut self,
        point: &[Fixed],
        old_cluster: usize,
        new_cluster: usize,
    ) -> Result<()> {
        self.check_dim(point)?;
        let k = self.clusters.len();
        if old_cluster >= k {
            return Err(Error::InvalidCluster { id: old_cluster, k });
        }
        if new_cluster >= k {
            return Err(Error::InvalidCluster { id: new_cluster, k });
        }
        if old_cluster == new_cluster {
            return Ok(());
        }

        self.clusters[old_cluster].repel(point, REPEL_RATE);
        self.clusters[new_cluster].attract(point, ATTRACT_RATE);
        Ok(())
    }

    // =========================================================================
    // Activity tracking
    // =========================================================================

    /// Feed one tick of external activity indicators (e.g. vibration RMS and
    /// current draw).
    ///
    /// When the motor is detected idle while an ALARM is active, the model
    /// freezes to WAITING_LABEL — the anomaly outlives the shutdown. Resumed
    /// activity never unfreezes; that takes an operator.
    pub fn update_activity(&mut self, rms: Fixed, current: Fixed) {
        self.activity.observe(rms, current);
        if !self.activity.is_running() && self.state == State::Alarm {
            self.state = State::WaitingLabel;
            self.buffer.freeze();
        }
    }

    // =========================================================================
    // Configuration & lifecycle
    // =========================================================================

    /// Set the outlier threshold multiplier, clamped to `[1.0, 5.0]`.
    pub fn set_threshold(&mut self, multiplier: f32) {
        self.outlier_threshold = Fixed::from_f32(multiplier.clamp(1.0, 5.0));
    }

    /// Reinitialize to the K=1 baseline, preserving feature dimension,
    /// learning rate, and grace configuration.
    pub fn reset(&mut self) {
        *self = Self::fresh(self.config);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current state-machine state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Number of clusters (including the baseline).
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    /// Feature-vector dimensionality.
    pub fn feature_dim(&self) -> usize {
        self.config.feature_dim
    }

    /// Base learning rate in fixed-point.
    pub fn learning_rate(&self) -> Fixed {
        self.learning_rate
    }

    /// Current outlier threshold multiplier in fixed-point.
    pub fn outlier_threshold(&self) -> Fixed {
        self.outlier_threshold
    }

    /// Total samples learned across all clusters.
    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    /// The cluster at `id`, if it exists.
    pub fn cluster(&self, id: usize) -> Option<&Cluster> {
        self.clusters.get(id)
    }

    /// Centroid of the cluster at `id`.
    pub fn centroid(&self, id: usize) -> Option<&[Fixed]> {
        self.clusters.get(id).map(Cluster::centroid)
    }

    /// Label of the cluster at `id`.
    pub fn label(&self, id: usize) -> Option<&str> {
        self.clusters.get(id).map(Cluster::label)
    }

    /// Sum of inertia over active clusters.
    pub fn total_inertia(&self) -> Fixed {
        self.clusters
            .iter()
            .filter(|c| c.is_active())
            .fold(Fixed::ZERO, |acc, c| acc + c.inertia())
    }

    /// Frozen-buffer size: the number of anomaly samples awaiting a label.
    /// Zero unless the model is frozen.
    pub fn buffer_len(&self) -> usize {
        if self.buffer.is_frozen() {
            self.buffer.len()
        } else {
            0
        }
    }

    /// True while the alert banner should be shown (ALARM or WAITING_LABEL).
    pub fn is_alarm_active(&self) -> bool {
        self.alarm_active
    }

    /// True while frozen awaiting operator input.
    pub fn is_waiting_label(&self) -> bool {
        self.state == State::WaitingLabel
    }

    /// Whether the monitored machine is currently considered running.
    pub fn is_motor_running(&self) -> bool {
        self.activity.is_running()
    }

    /// Samples observed since the current alarm was raised.
    pub fn samples_since_alarm(&self) -> u32 {
        self.samples_since_alarm
    }

    pub(crate) fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    fn resume_normal(&mut self) {
        self.state = State::Normal;
        self.buffer.clear();
        self.alarm_active = false;
        self.normal_streak = 0;
        self.samples_since_alarm = 0;
    }

    fn check_dim(&self, point: &[Fixed]) -> Result<()> {
        if point.len() != self.config.feature_dim {
            return Err(Error::DimensionMismatch {
                expected: self.config.feature_dim,
                got: point.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::to_fixed_vec;

    fn feed(model: &mut Model, point: &[f32], times: usize) {
        let p = to_fixed_vec(point);
        for _ in 0..times {
            model.update(&p).unwrap();
        }
    }

    /// Baseline, one outlier, manual freeze: model ends in WAITING_LABEL.
    fn setup_waiting_label(model: &mut Model) {
        feed(model, &[0.1, 0.1], 15);
        let outcome = model.update(&to_fixed_vec(&[5.0, 5.0])).unwrap();
        assert!(outcome.is_rejected());
        assert_eq!(model.state(), State::Alarm);
        assert!(model.request_label());
    }

    #[test]
    fn test_init_baseline() {
        let model = Model::new(3, 0.2).unwrap();
        assert_eq!(model.k(), 1);
        assert_eq!(model.feature_dim(), 3);
        assert_eq!(model.state(), State::Normal);
        assert_eq!(model.label(0), Some("normal"));
        assert_eq!(model.centroid(0).unwrap(), &[Fixed::ZERO; 3]);
        assert_eq!(model.total_points(), 0);
    }

    #[test]
    fn test_init_rejects_bad_dimension() {
        assert!(matches!(
            Model::new(0, 0.2),
            Err(Error::InvalidDimension { got: 0, .. })
        ));
        assert!(matches!(
            Model::new(MAX_FEATURES + 1, 0.2),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(Model::new(MAX_FEATURES, 0.2).is_ok());
    }

    #[test]
    fn test_init_rejects_bad_learning_rate() {
        assert!(matches!(
            Model::new(2, 0.0),
            Err(Error::InvalidLearningRate(_))
        ));
        assert!(matches!(
            Model::new(2, 1.5),
            Err(Error::InvalidLearningRate(_))
        ));
        assert!(Model::new(2, 1.0).is_ok());
    }

    #[test]
    fn test_single_update_assigns_baseline() {
        let mut model = Model::new(2, 0.1).unwrap();
        let outcome = model.update(&to_fixed_vec(&[0.5, 0.5])).unwrap();
        assert_eq!(outcome, Assignment::Assigned(0));
        assert_eq!(model.total_points(), 1);
    }

    #[test]
    fn test_update_rejects_wrong_dimension() {
        let mut model = Model::new(2, 0.1).unwrap();
        assert!(matches!(
            model.update(&to_fixed_vec(&[1.0, 2.0, 3.0])),
            Err(Error::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn test_no_alarm_before_baseline_armed() {
        let mut model = Model::new(2, 0.2).unwrap();
        // Far point on the very first sample: baseline not armed yet.
        let outcome = model.update(&to_fixed_vec(&[50.0, 50.0])).unwrap();
        assert!(!outcome.is_rejected());
        assert_eq!(model.state(), State::Normal);
    }

    #[test]
    fn test_outlier_raises_alarm_once() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        assert_eq!(model.state(), State::Normal);

        let before = model.total_points();
        let outcome = model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        assert_eq!(outcome, Assignment::Rejected);
        assert_eq!(model.state(), State::Alarm);
        assert!(model.is_alarm_active());
        // Rejected sample is not learned.
        assert_eq!(model.total_points(), before);
    }

    #[test]
    fn test_alarm_still_samples_in_range_points() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        assert_eq!(model.state(), State::Alarm);

        // In-range samples keep learning while the alert is up.
        let outcome = model.update(&to_fixed_vec(&[0.1, 0.1])).unwrap();
        assert_eq!(outcome, Assignment::Assigned(0));
        assert_eq!(model.state(), State::Alarm);
    }

    #[test]
    fn test_alarm_auto_clears_after_sustained_normal() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        assert_eq!(model.state(), State::Alarm);

        feed(&mut model, &[0.1, 0.1], ALARM_CLEAR_SAMPLES as usize);
        assert_eq!(model.state(), State::Normal);
        assert!(!model.is_alarm_active());
    }

    #[test]
    fn test_waiting_label_rejects_everything_without_mutation() {
        let mut model = Model::new(2, 0.2).unwrap();
        setup_waiting_label(&mut model);

        let points_before = model.total_points();
        let centroid_before = model.centroid(0).unwrap().to_vec();
        let buffered_before = model.buffer_len();

        for _ in 0..5 {
            let outcome = model.update(&to_fixed_vec(&[0.1, 0.1])).unwrap();
            assert_eq!(outcome, Assignment::Rejected);
        }

        assert_eq!(model.total_points(), points_before);
        assert_eq!(model.centroid(0).unwrap(), centroid_before.as_slice());
        assert_eq!(model.buffer_len(), buffered_before);
    }

    #[test]
    fn test_request_label_only_from_alarm() {
        let mut model = Model::new(2, 0.2).unwrap();
        assert!(!model.request_label());
        assert_eq!(model.state(), State::Normal);

        setup_waiting_label(&mut model);
        assert_eq!(model.state(), State::WaitingLabel);
        // Already frozen: second press has no effect.
        assert!(!model.request_label());
    }

    #[test]
    fn test_add_cluster_from_buffer() {
        let mut model = Model::new(2, 0.3).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        let outcome = model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        assert!(outcome.is_rejected());
        assert!(model.request_label());

        let id = model.add_cluster("fault").unwrap();
        assert_eq!(id, 1);
        assert_eq!(model.k(), 2);
        assert_eq!(model.state(), State::Normal);
        assert_eq!(model.label(1), Some("fault"));

        // Buffer held exactly the one anomaly sample: centroid lands on it.
        let centroid = model.centroid(1).unwrap();
        assert!((centroid[0].to_f32() - 10.0).abs() < 0.01);
        assert!((centroid[1].to_f32() - 10.0).abs() < 0.01);
        assert_eq!(model.cluster(1).unwrap().count(), 1);
    }

    #[test]
    fn test_add_cluster_requires_waiting_label() {
        let mut model = Model::new(2, 0.2).unwrap();
        assert!(matches!(
            model.add_cluster("fault"),
            Err(Error::WrongState { .. })
        ));
        assert_eq!(model.k(), 1);
    }

    #[test]
    fn test_add_cluster_duplicate_label_fails() {
        let mut model = Model::new(2, 0.2).unwrap();
        setup_waiting_label(&mut model);
        assert!(matches!(
            model.add_cluster("normal"),
            Err(Error::DuplicateLabel(_))
        ));
        assert_eq!(model.k(), 1);
        // Still frozen: the failure had no side effects.
        assert_eq!(model.state(), State::WaitingLabel);
    }

    #[test]
    fn test_add_cluster_invalid_label_fails() {
        let mut model = Model::new(2, 0.2).unwrap();
        setup_waiting_label(&mut model);
        assert!(matches!(model.add_cluster(""), Err(Error::InvalidLabel(_))));
        let long = "x".repeat(MAX_LABEL_LEN + 1);
        assert!(matches!(
            model.add_cluster(&long),
            Err(Error::InvalidLabel(_))
        ));
        assert_eq!(model.k(), 1);
    }

    #[test]
    fn test_add_cluster_capacity_exhaustion() {
        let mut model = Model::new(2, 0.3).unwrap();

        for i in 1..MAX_CLUSTERS {
            feed(&mut model, &[0.1, 0.1], MIN_BASELINE);
            let spot = 8.0 * i as f32;
            let outcome = model.update(&to_fixed_vec(&[spot, spot])).unwrap();
            assert!(outcome.is_rejected(), "outlier {i} not rejected");
            assert!(model.request_label());
            model.add_cluster(&format!("fault_{i}")).unwrap();
        }
        assert_eq!(model.k(), MAX_CLUSTERS);

        // One more anomaly: labeling must fail, state must be untouched.
        feed(&mut model, &[0.1, 0.1], MIN_BASELINE);
        let spot = 8.0 * MAX_CLUSTERS as f32;
        let outcome = model.update(&to_fixed_vec(&[spot, spot])).unwrap();
        assert!(outcome.is_rejected());
        assert!(model.request_label());

        assert!(matches!(
            model.add_cluster("one_too_many"),
            Err(Error::CapacityExhausted { .. })
        ));
        assert_eq!(model.k(), MAX_CLUSTERS);
        assert_eq!(model.state(), State::WaitingLabel);
    }

    #[test]
    fn test_discard_restores_normal() {
        let mut model = Model::new(2, 0.2).unwrap();
        setup_waiting_label(&mut model);

        model.discard();
        assert_eq!(model.state(), State::Normal);
        assert_eq!(model.buffer_len(), 0);
        assert_eq!(model.k(), 1);

        // Learning resumes immediately.
        let outcome = model.update(&to_fixed_vec(&[0.1, 0.1])).unwrap();
        assert_eq!(outcome, Assignment::Assigned(0));
    }

    #[test]
    fn test_assign_existing_strengthens_cluster() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        model.update(&to_fixed_vec(&[5.0, 5.0])).unwrap();
        model.request_label();
        model.add_cluster("fault_a").unwrap();
        let count_before = model.cluster(1).unwrap().count();

        // The same fault recurs; operator merges instead of growing K.
        feed(&mut model, &[0.1, 0.1], MIN_BASELINE);
        let outcome = model.update(&to_fixed_vec(&[15.0, 15.0])).unwrap();
        assert!(outcome.is_rejected());
        model.request_label();

        model.assign_existing(1).unwrap();
        assert_eq!(model.k(), 2);
        assert_eq!(model.state(), State::Normal);
        assert!(model.cluster(1).unwrap().count() > count_before);
    }

    #[test]
    fn test_assign_existing_preconditions() {
        let mut model = Model::new(2, 0.2).unwrap();
        assert!(matches!(
            model.assign_existing(0),
            Err(Error::WrongState { .. })
        ));

        setup_waiting_label(&mut model);
        assert!(matches!(
            model.assign_existing(99),
            Err(Error::InvalidCluster { id: 99, k: 1 })
        ));
        // Failure left the frozen state intact.
        assert_eq!(model.state(), State::WaitingLabel);
    }

    #[test]
    fn test_correct_self_is_noop() {
        let mut model = Model::new(2, 0.3).unwrap();
        let p = to_fixed_vec(&[1.0, 1.0]);
        model.update(&p).unwrap();

        let centroid_before = model.centroid(0).unwrap().to_vec();
        let count_before = model.cluster(0).unwrap().count();

        model.correct(&p, 0, 0).unwrap();

        assert_eq!(model.centroid(0).unwrap(), centroid_before.as_slice());
        assert_eq!(model.cluster(0).unwrap().count(), count_before);
    }

    #[test]
    fn test_correct_out_of_range_mutates_nothing() {
        let mut model = Model::new(2, 0.3).unwrap();
        let p = to_fixed_vec(&[1.0, 1.0]);
        model.update(&p).unwrap();
        let centroid_before = model.centroid(0).unwrap().to_vec();

        assert!(matches!(
            model.correct(&p, 0, 5),
            Err(Error::InvalidCluster { id: 5, k: 1 })
        ));
        assert!(matches!(
            model.correct(&p, 5, 0),
            Err(Error::InvalidCluster { id: 5, k: 1 })
        ));
        assert_eq!(model.centroid(0).unwrap(), centroid_before.as_slice());
    }

    #[test]
    fn test_correct_moves_counts_and_centroids() {
        let mut model = Model::new(2, 0.3).unwrap();
        setup_waiting_label(&mut model);
        model.add_cluster("fault").unwrap();

        feed(&mut model, &[0.1, 0.1], 5);
        let old_count = model.cluster(0).unwrap().count();
        let new_count = model.cluster(1).unwrap().count();
        let old_before = model.centroid(0).unwrap()[0];
        let new_before = model.centroid(1).unwrap()[0];

        let p = to_fixed_vec(&[0.2, 0.2]);
        model.correct(&p, 0, 1).unwrap();

        assert_eq!(model.cluster(0).unwrap().count(), old_count - 1);
        assert_eq!(model.cluster(1).unwrap().count(), new_count + 1);
        // Old centroid pushed away from the point, new pulled toward it.
        assert!(model.centroid(0).unwrap()[0] < old_before);
        assert!(model.centroid(1).unwrap()[0] < new_before);
        assert!(model.centroid(1).unwrap()[0] > p[0]);
    }

    #[test]
    fn test_correct_works_while_frozen() {
        let mut model = Model::new(2, 0.3).unwrap();
        setup_waiting_label(&mut model);
        model.add_cluster("fault").unwrap();

        // Second, farther anomaly: freeze again.
        feed(&mut model, &[0.1, 0.1], MIN_BASELINE);
        let outcome = model.update(&to_fixed_vec(&[20.0, 20.0])).unwrap();
        assert!(outcome.is_rejected());
        assert!(model.request_label());
        assert_eq!(model.state(), State::WaitingLabel);

        let p = to_fixed_vec(&[0.2, 0.2]);
        model.correct(&p, 0, 1).unwrap();
        assert_eq!(model.state(), State::WaitingLabel);
    }

    #[test]
    fn test_inertia_non_increasing_on_repeated_point() {
        let mut model = Model::new(2, 0.2).unwrap();
        let p = to_fixed_vec(&[1.0, 1.0]);
        for _ in 0..5 {
            model.update(&p).unwrap();
        }
        let early = model.total_inertia();
        for _ in 0..50 {
            model.update(&p).unwrap();
        }
        assert!(model.total_inertia() <= early);
    }

    #[test]
    fn test_predict_does_not_mutate() {
        let mut model = Model::new(2, 0.1).unwrap();
        let p = to_fixed_vec(&[0.3, -0.2]);
        let predicted = model.predict(&p).unwrap();
        let assigned = model.update(&p).unwrap();
        assert_eq!(Assignment::Assigned(predicted), assigned);
        assert_eq!(model.total_points(), 1);
    }

    #[test]
    fn test_two_clusters_separate_cleanly() {
        let mut model = Model::new(2, 0.3).unwrap();
        feed(&mut model, &[0.0, 0.0], 20);
        model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        model.request_label();
        model.add_cluster("fault").unwrap();

        assert_eq!(model.predict(&to_fixed_vec(&[0.1, 0.1])).unwrap(), 0);
        assert_eq!(model.predict(&to_fixed_vec(&[9.9, 9.9])).unwrap(), 1);
    }

    #[test]
    fn test_reset_preserves_config() {
        let mut model = Model::new(2, 0.1).unwrap();
        setup_waiting_label(&mut model);
        model.add_cluster("fault").unwrap();
        assert_eq!(model.k(), 2);

        model.reset();
        assert_eq!(model.k(), 1);
        assert_eq!(model.total_points(), 0);
        assert_eq!(model.state(), State::Normal);
        assert_eq!(model.feature_dim(), 2);
        assert_eq!(model.learning_rate(), Fixed::from_f32(0.1));
    }

    #[test]
    fn test_set_threshold_clamps() {
        let mut model = Model::new(2, 0.2).unwrap();
        model.set_threshold(0.2);
        assert_eq!(model.outlier_threshold(), Fixed::from_f32(1.0));
        model.set_threshold(10.0);
        assert_eq!(model.outlier_threshold(), Fixed::from_f32(5.0));
        model.set_threshold(3.0);
        assert_eq!(model.outlier_threshold(), Fixed::from_f32(3.0));
    }

    #[test]
    fn test_buffer_len_zero_unless_frozen() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        assert_eq!(model.buffer_len(), 0);

        model.update(&to_fixed_vec(&[5.0, 5.0])).unwrap();
        assert_eq!(model.buffer_len(), 0); // ALARM: not frozen yet

        model.request_label();
        assert_eq!(model.buffer_len(), 1); // the captured anomaly
    }

    #[test]
    fn test_samples_since_alarm_counts_and_resets() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        assert_eq!(model.samples_since_alarm(), 0);

        model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        assert_eq!(model.state(), State::Alarm);
        assert_eq!(model.samples_since_alarm(), 0);

        feed(&mut model, &[0.1, 0.1], 5);
        assert_eq!(model.samples_since_alarm(), 5);

        // Auto-clear zeroes the alarm bookkeeping along with the state.
        feed(&mut model, &[0.1, 0.1], (ALARM_CLEAR_SAMPLES - 5) as usize);
        assert_eq!(model.state(), State::Normal);
        assert_eq!(model.samples_since_alarm(), 0);
    }

    #[test]
    fn test_motor_idle_freezes_active_alarm() {
        let mut model = Model::new(2, 0.2).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        model.update(&to_fixed_vec(&[5.0, 5.0])).unwrap();
        assert_eq!(model.state(), State::Alarm);
        assert!(model.is_motor_running());

        let quiet_rms = Fixed::from_f32(0.2);
        let quiet_cur = Fixed::from_f32(0.05);
        for _ in 0..12 {
            model.update_activity(quiet_rms, quiet_cur);
        }
        assert!(!model.is_motor_running());
        assert_eq!(model.state(), State::WaitingLabel);

        // Machine comes back: alarm must not silently resolve.
        for _ in 0..5 {
            model.update_activity(Fixed::from_f32(5.0), Fixed::from_f32(1.5));
        }
        assert!(model.is_motor_running());
        assert_eq!(model.state(), State::WaitingLabel);
    }

    #[test]
    fn test_motor_idle_in_normal_does_not_freeze() {
        let mut model = Model::new(2, 0.2).unwrap();
        let quiet_rms = Fixed::from_f32(0.1);
        let quiet_cur = Fixed::from_f32(0.01);
        for _ in 0..20 {
            model.update_activity(quiet_rms, quiet_cur);
        }
        assert!(!model.is_motor_running());
        assert_eq!(model.state(), State::Normal);
    }

    #[test]
    fn test_grace_period_suppresses_drift() {
        let config = ModelConfig::new(2, 0.3).grace_period(3);
        let mut model = Model::with_config(config).unwrap();
        setup_waiting_label(&mut model);
        model.add_cluster("fault").unwrap();
        let frozen_centroid = model.centroid(1).unwrap().to_vec();

        // Re-arm the baseline, then feed near-fault samples. During grace
        // the fault centroid must not move even as it soaks up samples.
        feed(&mut model, &[0.1, 0.1], MIN_BASELINE);
        for _ in 0..3 {
            let outcome = model.update(&to_fixed_vec(&[5.2, 5.2])).unwrap();
            assert_eq!(outcome, Assignment::Assigned(1));
            assert_eq!(model.centroid(1).unwrap(), frozen_centroid.as_slice());
        }

        model.update(&to_fixed_vec(&[5.2, 5.2])).unwrap();
        assert_ne!(model.centroid(1).unwrap(), frozen_centroid.as_slice());
    }

    #[test]
    fn test_first_fault_end_to_end() {
        let mut model = Model::new(2, 0.3).unwrap();
        feed(&mut model, &[0.1, 0.1], 20);
        assert_eq!(model.state(), State::Normal);
        assert_eq!(model.cluster(0).unwrap().count(), 20);

        let outcome = model.update(&to_fixed_vec(&[10.0, 10.0])).unwrap();
        assert_eq!(outcome, Assignment::Rejected);
        assert_ne!(model.state(), State::Normal);

        model.request_label();
        model.add_cluster("fault").unwrap();
        assert_eq!(model.k(), 2);
        assert_eq!(model.state(), State::Normal);
        let centroid = model.centroid(1).unwrap();
        assert!((centroid[0].to_f32() - 10.0).abs() < 0.05);
        assert!((centroid[1].to_f32() - 10.0).abs() < 0.05);
    }
}
