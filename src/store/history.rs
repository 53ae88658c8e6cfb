//! Bounded history of metrics snapshots for trends and averages.

use std::collections::VecDeque;

use indra_types::MetricsSnapshot;

/// Default number of historical snapshots to keep.
pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// Recent snapshots in arrival order (oldest first, most recent last).
///
/// Recording appends and then trims from the front, so the length never
/// exceeds the capacity.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<MetricsSnapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Record a new snapshot, dropping the oldest ones beyond capacity.
    pub fn record(&mut self, snapshot: MetricsSnapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MetricsSnapshot> {
        self.entries.iter()
    }

    /// The most recently recorded snapshot.
    pub fn latest(&self) -> Option<&MetricsSnapshot> {
        self.entries.back()
    }

    /// Mean of a reading across the retained snapshots.
    ///
    /// Returns None if the history is empty.
    pub fn average<F>(&self, reading: F) -> Option<f64>
    where
        F: Fn(&MetricsSnapshot) -> f64,
    {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(&reading).sum();
        Some(sum / self.entries.len() as f64)
    }

    /// Highest value of a reading across the retained snapshots.
    pub fn peak<F>(&self, reading: F) -> Option<f64>
    where
        F: Fn(&MetricsSnapshot) -> f64,
    {
        self.entries.iter().map(reading).reduce(f64::max)
    }
}
