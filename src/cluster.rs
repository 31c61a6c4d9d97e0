//! Cluster state: centroid, sample count, inertia, label.
//!
//! A cluster tracks its center as an exponential moving average of the
//! samples assigned to it, with a count-decayed step size so the centroid
//! settles as evidence accumulates. Inertia — an EMA of the squared distance
//! between incoming samples and the centroid — doubles as the cluster's
//! radius proxy for outlier detection.

use crate::distance::distance_squared;
use crate::fixed::Fixed;

/// Maximum label length in bytes.
pub const MAX_LABEL_LEN: usize = 32;

/// Per-update count decay coefficient: α_eff = α / (1 + 0.01·count).
const COUNT_DECAY: Fixed = Fixed::from_raw(655); // ~0.01 in Q16.16

/// A single cluster: fixed-point centroid plus adaptation bookkeeping.
#[derive(Clone, Debug)]
pub struct Cluster {
    centroid: Vec<Fixed>,
    count: u32,
    inertia: Fixed,
    label: String,
    active: bool,
    grace_remaining: u32,
}

impl Cluster {
    /// The baseline cluster: labeled "normal", seeded at the origin.
    pub(crate) fn baseline(feature_dim: usize) -> Self {
        Self::with_centroid(vec![Fixed::ZERO; feature_dim], "normal")
    }

    /// Create a cluster at a given centroid with zero history.
    pub(crate) fn with_centroid(centroid: Vec<Fixed>, label: &str) -> Self {
        Cluster {
            centroid,
            count: 0,
            inertia: Fixed::ZERO,
            label: label.to_string(),
            active: true,
            grace_remaining: 0,
        }
    }

    /// Rebuild a cluster from stored parts (snapshot restore path).
    pub(crate) fn from_parts(
        centroid: Vec<Fixed>,
        count: u32,
        inertia: Fixed,
        label: String,
        active: bool,
    ) -> Self {
        Cluster {
            centroid,
            count,
            inertia,
            label,
            active,
            grace_remaining: 0,
        }
    }

    /// The centroid vector.
    pub fn centroid(&self) -> &[Fixed] {
        &self.centroid
    }

    /// Number of samples folded into this cluster.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// EMA of squared distance to the centroid (radius proxy).
    pub fn inertia(&self) -> Fixed {
        self.inertia
    }

    /// The operator-assigned label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this cluster participates in assignment.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remaining updates during which the centroid will not move.
    pub fn grace_remaining(&self) -> u32 {
        self.grace_remaining
    }

    pub(crate) fn set_grace(&mut self, updates: u32) {
        self.grace_remaining = updates;
    }

    pub(crate) fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    pub(crate) fn set_inertia(&mut self, inertia: Fixed) {
        self.inertia = inertia;
    }

    /// Effective learning rate for the next observation: α / (1 + 0.01·count).
    ///
    /// Computed entirely in 64-bit integer arithmetic so large counts never
    /// overflow the decay denominator.
    pub(crate) fn effective_alpha(&self, base: Fixed) -> Fixed {
        let decay = (Fixed::ONE.raw() as i64) + COUNT_DECAY.raw() as i64 * self.count as i64;
        Fixed::from_raw((((base.raw() as i64) << 16) / decay) as i32)
    }

    /// Fold one sample into the cluster with step size `alpha`.
    ///
    /// Centroid: `c += α(x - c)` per dimension, then inertia is updated as an
    /// EMA of the squared distance to the *post-update* centroid with the
    /// same step size. During a grace period the centroid and inertia stay
    /// put; the sample still counts and the grace counter ticks down.
    pub(crate) fn observe(&mut self, point: &[Fixed], alpha: Fixed) {
        if self.grace_remaining > 0 {
            self.grace_remaining -= 1;
            self.count += 1;
            return;
        }

        for (c, &x) in self.centroid.iter_mut().zip(point.iter()) {
            let diff = x - *c;
            *c += alpha.mul(diff);
        }
        self.count += 1;

        let dist = distance_squared(point, &self.centroid);
        self.inertia += alpha.mul(dist - self.inertia);
    }

    /// Pull the centroid toward `point` by `rate` and credit one sample.
    ///
    /// Operator override: any grace period is cancelled so the move takes
    /// effect immediately.
    pub(crate) fn attract(&mut self, point: &[Fixed], rate: Fixed) {
        self.grace_remaining = 0;
        for (c, &x) in self.centroid.iter_mut().zip(point.iter()) {
            let diff = x - *c;
            *c += rate.mul(diff);
        }
        self.count += 1;
    }

    /// Push the centroid away from `point` by `rate` and debit one sample.
    pub(crate) fn repel(&mut self, point: &[Fixed], rate: Fixed) {
        self.grace_remaining = 0;
        for (c, &x) in self.centroid.iter_mut().zip(point.iter()) {
            let diff = x - *c;
            *c -= rate.mul(diff);
        }
        self.count = self.count.saturating_sub(1);
    }
}
