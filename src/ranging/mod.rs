//! Signal path from echo pulse to smoothed distance.
//!
//! Three stages, each its own module: [`sampler`] turns trigger/echo
//! timing into raw centimeter readings, [`median`] collects fixed batches
//! and extracts a deterministic median through a sorting network, and
//! [`smoothing`] runs the exponential filter that produces the distance
//! actually reported downstream.

pub mod median;
pub mod sampler;
pub mod smoothing;

pub use median::{median_of_window, FilterStats, MedianFilter};
pub use sampler::{pulse_to_cm, RangeSampler};
pub use smoothing::SmoothingFilter;

use serde::{Deserialize, Serialize};

/// One raw range measurement.
///
/// `NoEcho` means the sensor saw nothing within the echo timeout. That is
/// "no object in range", not a fault; the batch filter substitutes it
/// before sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSample {
    Distance(i32),
    NoEcho,
}

/// Source of raw samples for batch collection.
///
/// [`RangeSampler`] is the hardware-backed implementation; tests script
/// their own to feed the filter exact sequences.
pub trait RangeSource {
    fn sample_once(&mut self) -> RawSample;

    /// Settle between consecutive pulses so one echo cannot smear into the
    /// next measurement.
    fn settle(&mut self);
}
