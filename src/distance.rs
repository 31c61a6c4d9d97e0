//! Squared Euclidean distance and nearest-cluster search.
//!
//! Distances drive both assignment and outlier detection, so they stay in
//! fixed-point end to end. Each per-dimension term is shifted back down by
//! the fractional bit width before accumulation, which keeps the running sum
//! within the Q16.16 range for physically sane feature values.

use crate::cluster::Cluster;
use crate::fixed::{Fixed, FRACTIONAL_BITS};

/// Squared Euclidean distance between two fixed-point vectors.
///
/// The accumulator is 64-bit; the final value saturates at the Q16.16
/// maximum rather than wrapping, so absurdly distant points stay "very far"
/// instead of aliasing to something near.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn distance_squared(a: &[Fixed], b: &[Fixed]) -> Fixed {
    assert_eq!(a.len(), b.len(), "dimension mismatch in distance");

    let mut sum: i64 = 0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let diff = x.raw() as i64 - y.raw() as i64;
        sum += (diff * diff) >> FRACTIONAL_BITS;
    }

    Fixed::from_raw(sum.min(i32::MAX as i64) as i32)
}

/// Find the nearest active cluster to `point`.
///
/// Linear scan over active clusters; ties break toward the lowest index.
/// Returns the index and its squared distance. Callers guarantee at least
/// one active cluster (cluster 0 is always active).
pub(crate) fn find_nearest(clusters: &[Cluster], point: &[Fixed]) -> (usize, Fixed) {
    let mut nearest = 0;
    let mut min_dist = Fixed::from_raw(i32::MAX);

    for (i, cluster) in clusters.iter().enumerate() {
        if !cluster.is_active() {
            continue;
        }
        let dist = distance_squared(point, cluster.centroid());
        if dist < min_dist {
            min_dist = dist;
            nearest = i;
        }
    }

    (nearest, min_dist)
}
