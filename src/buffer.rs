//! Fixed-capacity ring buffer of feature vectors.
//!
//! The buffer serves two roles depending on the model state. While NORMAL it
//! is a rolling window of recent samples and arms the outlier check once a
//! minimum baseline has been observed. After an alarm it captures only the
//! anomalous samples, so a frozen buffer is exactly the evidence an operator
//! labels.
//!
//! Storage is a single flat arena allocated once at construction; pushing
//! never allocates.

use crate::fixed::Fixed;

/// Number of samples the ring buffer can hold.
pub const RING_CAPACITY: usize = 100;

/// Circular store of `RING_CAPACITY` feature vectors with freeze semantics.
#[derive(Clone, Debug)]
pub struct RingBuffer {
    /// Flat arena: `RING_CAPACITY * dim` elements.
    data: Vec<Fixed>,
    dim: usize,
    /// Next write slot.
    head: usize,
    /// Number of valid samples (saturates at capacity).
    count: usize,
    frozen: bool,
}

impl RingBuffer {
    /// Create an empty, unfrozen buffer for vectors of length `dim`.
    pub(crate) fn new(dim: usize) -> Self {
        RingBuffer {
            data: vec![Fixed::ZERO; RING_CAPACITY * dim],
            dim,
            head: 0,
            count: 0,
            frozen: false,
        }
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if the buffer currently rejects writes.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Append a sample, overwriting the oldest once full.
    ///
    /// Returns `false` (and stores nothing) while frozen.
    pub(crate) fn push(&mut self, sample: &[Fixed]) -> bool {
        debug_assert_eq!(sample.len(), self.dim, "dimension mismatch in buffer push");
        if self.frozen {
            return false;
        }

        let start = self.head * self.dim;
        self.data[start..start + self.dim].copy_from_slice(sample);
        self.head = (self.head + 1) % RING_CAPACITY;
        if self.count < RING_CAPACITY {
            self.count += 1;
        }
        true
    }

    /// Stop accepting writes.
    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Discard all samples and accept writes again.
    pub(crate) fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
        self.frozen = false;
    }

    /// The `i`-th buffered sample in insertion order (0 = oldest).
    fn sample(&self, i: usize) -> &[Fixed] {
        let oldest = if self.count == RING_CAPACITY {
            self.head
        } else {
            0
        };
        let slot = (oldest + i) % RING_CAPACITY;
        &self.data[slot * self.dim..(slot + 1) * self.dim]
    }

    /// Iterate buffered samples oldest-first.
    pub fn samples(&self) -> impl Iterator<Item = &[Fixed]> {
        (0..self.count).map(move |i| self.sample(i))
    }
}
