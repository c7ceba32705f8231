//! Exponential smoothing of the median stream.

use crate::config::{EMA_ALPHA, MAX_RANGE_CM};
use serde::{Deserialize, Serialize};

/// Running exponential moving average over filtered distances.
///
/// The state starts at max range, an optimistic "nothing detected" prior,
/// and persists for the life of the process. Inputs outside the display
/// range leave it untouched, so transient spikes never enter the smoothed
/// trajectory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmoothingFilter {
    state_cm: f32,
    rejected_inputs: u32,
}

impl SmoothingFilter {
    pub fn new() -> Self {
        Self {
            state_cm: MAX_RANGE_CM as f32,
            rejected_inputs: 0,
        }
    }

    /// Blend a new filtered distance into the running state. Each update
    /// is a convex combination of the previous state and the input, so
    /// the state never overshoots either.
    pub fn update(&mut self, input_cm: i32) -> f32 {
        if input_cm < 0 || input_cm > MAX_RANGE_CM {
            self.rejected_inputs += 1;
            return self.state_cm;
        }
        let input = input_cm as f32;
        self.state_cm = input * EMA_ALPHA + self.state_cm * (1.0 - EMA_ALPHA);
        self.state_cm
    }

    pub fn state_cm(&self) -> f32 {
        self.state_cm
    }

    pub fn rejected_inputs(&self) -> u32 {
        self.rejected_inputs
    }
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self::new()
    }
}
