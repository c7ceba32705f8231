//! Bounded-rate actuator motion.

use crate::config::{MAX_ANGLE_DEG, MIN_ANGLE_DEG, SERVO_INTERVAL_MS, SERVO_STEP_DEG};
use crate::hal::ServoOutput;
use crate::scheduler::IntervalGate;

/// Moves the physical actuator toward a target angle at a bounded rate.
///
/// Gated on `SERVO_INTERVAL_MS`, independent of and faster than the sweep
/// interval; that decoupling is what turns coarse target steps into smooth
/// motion. Each gated update moves at most `SERVO_STEP_DEG`, snapping to
/// the target once the remaining gap is within one step. The hardware is
/// written only when the angle actually changes, which is what keeps a
/// rapidly-updating target from making the horn hunt.
#[derive(Debug)]
pub struct ServoDriver<S> {
    out: S,
    current_deg: i32,
    gate: IntervalGate,
    writes: u32,
}

impl<S: ServoOutput> ServoDriver<S> {
    pub fn new(out: S) -> Self {
        Self {
            out,
            current_deg: MIN_ANGLE_DEG,
            gate: IntervalGate::new(SERVO_INTERVAL_MS),
            writes: 0,
        }
    }

    /// Step toward `target_deg` if the servo interval has elapsed.
    /// Returns whether the angle changed.
    pub fn advance_toward(&mut self, target_deg: i32, now_ms: u64) -> bool {
        if !self.gate.try_fire(now_ms) {
            return false;
        }

        let gap = target_deg - self.current_deg;
        if gap == 0 {
            return false;
        }

        self.current_deg = if gap.abs() <= SERVO_STEP_DEG {
            target_deg
        } else if gap > 0 {
            self.current_deg + SERVO_STEP_DEG
        } else {
            self.current_deg - SERVO_STEP_DEG
        };

        debug_assert!(
            (MIN_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&self.current_deg),
            "servo angle {} outside arc",
            self.current_deg
        );

        self.out.write_degrees(self.current_deg);
        self.writes += 1;
        true
    }

    pub fn current_deg(&self) -> i32 {
        self.current_deg
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    pub fn last_update_ms(&self) -> u64 {
        self.gate.last_fire_ms()
    }
}
