//! Stream-level sanitization of a group's raw readings.
//!
//! Genuine values form a counter that only grows within a session. A reading
//! below the last accepted value is a misread, and one at or above the ceiling
//! is implausible; both are dropped without moving the baseline.

use tracing::info;

/// Drop readings that break the non-decreasing sequence or reach `ceiling`.
///
/// The first reading is always kept and becomes the baseline. Returns the kept
/// readings in their original order and the number rejected.
pub fn filter_outliers(numbers: &[u32], ceiling: u32) -> (Vec<u32>, usize) {
    if numbers.len() < 2 {
        return (numbers.to_vec(), 0);
    }

    let mut kept = Vec::with_capacity(numbers.len());
    kept.push(numbers[0]);
    let mut baseline = numbers[0];
    let mut rejected = 0;

    for &current in &numbers[1..] {
        if current >= baseline && current < ceiling {
            kept.push(current);
            baseline = current;
        } else {
            rejected += 1;
        }
    }

    (kept, rejected)
}

/// Configured stream filter that reports what it removed.
#[derive(Debug, Clone, Copy)]
pub struct StreamFilter {
    ceiling: u32,
}

impl StreamFilter {
    pub fn new(ceiling: u32) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn apply(&self, numbers: &[u32]) -> (Vec<u32>, usize) {
        let (kept, rejected) = filter_outliers(numbers, self.ceiling);
        if rejected > 0 {
            info!(rejected, kept = kept.len(), ceiling = self.ceiling, "outliers removed from stream");
        }
        (kept, rejected)
    }
}
