//! Batch median extraction over a fixed sorting network.

use super::{RangeSource, RawSample};
use crate::config::{MAX_RANGE_CM, OUTLIER_CEILING_CM, SAMPLE_WINDOW};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

// The exchange table below is sized for a 9-element window.
const_assert!(SAMPLE_WINDOW == 9);

/// Optimal 9-input sorting network: 25 exchanges in 7 data-independent
/// rounds. Every batch runs the same compare-and-swap sequence regardless
/// of its values, so median latency is constant.
const EXCHANGES: [(usize, usize); 25] = [
    (0, 3),
    (1, 7),
    (2, 5),
    (4, 8),
    (0, 7),
    (2, 4),
    (3, 8),
    (5, 6),
    (0, 2),
    (1, 3),
    (4, 5),
    (7, 8),
    (1, 4),
    (3, 6),
    (5, 7),
    (0, 1),
    (2, 4),
    (3, 5),
    (6, 8),
    (2, 3),
    (4, 5),
    (6, 7),
    (1, 2),
    (3, 4),
    (5, 6),
];

/// Fully order the window in place and return its middle element.
pub fn median_of_window(window: &mut [i32; SAMPLE_WINDOW]) -> i32 {
    for &(i, j) in &EXCHANGES {
        if window[i] > window[j] {
            window.swap(i, j);
        }
    }
    window[SAMPLE_WINDOW / 2]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct FilterStats {
    pub batches: u32,
    pub substituted_samples: u32,
    pub echo_timeouts: u32,
}

/// Collects fixed-size batches from a [`RangeSource`] and reduces each to
/// its median.
#[derive(Debug)]
pub struct MedianFilter {
    stats: FilterStats,
}

impl MedianFilter {
    pub fn new() -> Self {
        Self {
            stats: FilterStats::default(),
        }
    }

    /// Draw `SAMPLE_WINDOW` samples, substitute outliers, return the
    /// median. Never fails; the result is always in
    /// `[0, OUTLIER_CEILING_CM]`.
    pub fn filter_batch<R: RangeSource>(&mut self, source: &mut R) -> i32 {
        let mut window = [0i32; SAMPLE_WINDOW];
        for slot in &mut window {
            *slot = self.substitute(source.sample_once());
            source.settle();
        }
        self.stats.batches = self.stats.batches.wrapping_add(1);

        let median = median_of_window(&mut window);
        debug_assert!(
            (0..=OUTLIER_CEILING_CM).contains(&median),
            "median {} escaped substitution bounds",
            median
        );
        median
    }

    /// Outlier policy: timeouts and readings beyond 1.5x the configured
    /// range are replaced with the max-range value, keeping the batch
    /// full-size and biasing outliers toward "far". Substitution happens
    /// before sorting.
    fn substitute(&mut self, sample: RawSample) -> i32 {
        match sample {
            RawSample::NoEcho => {
                self.stats.echo_timeouts += 1;
                self.stats.substituted_samples += 1;
                MAX_RANGE_CM
            }
            RawSample::Distance(d) if d < 0 || d > OUTLIER_CEILING_CM => {
                self.stats.substituted_samples += 1;
                MAX_RANGE_CM
            }
            RawSample::Distance(d) => d,
        }
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self::new()
    }
}
