//! Sweep target state machine.

use crate::config::{MAX_ANGLE_DEG, MIN_ANGLE_DEG, SWEEP_INTERVAL_MS, SWEEP_STEP_DEG};
use crate::scheduler::IntervalGate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepDirection {
    Forward,
    Backward,
}

/// Joint sweep/actuator state as reported in snapshots. The controller
/// owns target and direction; the actuator driver owns the current angle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepState {
    pub current_deg: i32,
    pub target_deg: i32,
    pub direction: SweepDirection,
    pub last_sweep_ms: u64,
    pub last_servo_ms: u64,
}

/// Walks the target angle back and forth across the arc.
///
/// Updates are gated on `SWEEP_INTERVAL_MS`. Each gated update advances
/// the target one step in the current direction; overshooting a boundary
/// clamps to it and flips direction in the same update, so a step that
/// lands exactly on a boundary keeps the current direction until the next
/// update pushes past it.
#[derive(Debug)]
pub struct SweepController {
    target_deg: i32,
    direction: SweepDirection,
    gate: IntervalGate,
    reversals: u32,
}

impl SweepController {
    pub fn new() -> Self {
        Self {
            target_deg: MIN_ANGLE_DEG,
            direction: SweepDirection::Forward,
            gate: IntervalGate::new(SWEEP_INTERVAL_MS),
            reversals: 0,
        }
    }

    /// Advance the target if the sweep interval has elapsed. Returns
    /// whether an update ran.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if !self.gate.try_fire(now_ms) {
            return false;
        }

        match self.direction {
            SweepDirection::Forward => {
                self.target_deg += SWEEP_STEP_DEG;
                if self.target_deg > MAX_ANGLE_DEG {
                    self.target_deg = MAX_ANGLE_DEG;
                    self.direction = SweepDirection::Backward;
                    self.reversals += 1;
                }
            }
            SweepDirection::Backward => {
                self.target_deg -= SWEEP_STEP_DEG;
                if self.target_deg < MIN_ANGLE_DEG {
                    self.target_deg = MIN_ANGLE_DEG;
                    self.direction = SweepDirection::Forward;
                    self.reversals += 1;
                }
            }
        }

        debug_assert!(
            (MIN_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&self.target_deg),
            "sweep target {} outside arc",
            self.target_deg
        );
        true
    }

    pub fn target_deg(&self) -> i32 {
        self.target_deg
    }

    pub fn direction(&self) -> SweepDirection {
        self.direction
    }

    pub fn reversals(&self) -> u32 {
        self.reversals
    }

    pub fn last_update_ms(&self) -> u64 {
        self.gate.last_fire_ms()
    }
}

impl Default for SweepController {
    fn default() -> Self {
        Self::new()
    }
}
