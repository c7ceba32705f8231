use echoscan::config::{MAX_ANGLE_DEG, SERVO_INTERVAL_MS, SWEEP_INTERVAL_MS, SWEEP_STEP_DEG};
use echoscan::hal::ServoOutput;
use echoscan::servo::ServoDriver;
use echoscan::sweep::{SweepController, SweepDirection};

/// Captures every commanded angle so tests can assert on the exact write
/// sequence.
#[derive(Default)]
struct RecordingServo {
    angles: Vec<i32>,
}

impl ServoOutput for &mut RecordingServo {
    fn write_degrees(&mut self, angle_deg: i32) {
        self.angles.push(angle_deg);
    }
}

#[cfg(test)]
mod sweep_pattern_tests {
    use super::*;

    #[test]
    fn test_boundary_update_dwells_then_reverses() {
        let mut sweep = SweepController::new();
        let mut now = 0;

        // Sixty gated updates walk the target to the far stop.
        for _ in 0..60 {
            now += SWEEP_INTERVAL_MS;
            assert!(sweep.update(now));
        }
        assert_eq!(sweep.target_deg(), MAX_ANGLE_DEG);
        assert_eq!(sweep.direction(), SweepDirection::Forward);
        assert_eq!(sweep.reversals(), 0);

        // The overshooting update clamps, dwells at the stop, and flips.
        now += SWEEP_INTERVAL_MS;
        assert!(sweep.update(now));
        assert_eq!(sweep.target_deg(), MAX_ANGLE_DEG);
        assert_eq!(sweep.direction(), SweepDirection::Backward);
        assert_eq!(sweep.reversals(), 1);

        now += SWEEP_INTERVAL_MS;
        assert!(sweep.update(now));
        assert_eq!(sweep.target_deg(), MAX_ANGLE_DEG - SWEEP_STEP_DEG);
    }

    #[test]
    fn test_jittered_polling_fires_once_per_period() {
        let mut sweep = SweepController::new();

        let polls: [(u64, bool); 6] = [
            (10, true),
            (11, false),
            (19, false),
            (20, true),
            (21, false),
            (30, true),
        ];
        for (now_ms, should_fire) in polls {
            assert_eq!(sweep.update(now_ms), should_fire);
        }

        // Three firings, three steps.
        assert_eq!(sweep.target_deg(), 3 * SWEEP_STEP_DEG);
    }
}

#[cfg(test)]
mod servo_slew_tests {
    use super::*;

    #[test]
    fn test_uneven_slew_lands_exactly_on_target() {
        let mut recorder = RecordingServo::default();
        let mut driver = ServoDriver::new(&mut recorder);

        let mut now = 0;
        for _ in 0..40 {
            now += SERVO_INTERVAL_MS;
            driver.advance_toward(100, now);
        }

        // 100 is not a step multiple; the final update snaps the remainder
        // instead of overshooting, and arrival stops further writes.
        assert_eq!(driver.current_deg(), 100);
        assert_eq!(driver.writes(), 34);
        assert_eq!(recorder.angles.len(), 34);
        assert_eq!(recorder.angles[32], 99);
        assert_eq!(recorder.angles[33], 100);
    }

    #[test]
    fn test_servo_chase_keeps_pace_with_the_sweep() {
        let mut recorder = RecordingServo::default();
        let mut sweep = SweepController::new();
        let mut driver = ServoDriver::new(&mut recorder);

        // Poll every millisecond for a tenth of a second; both intervals
        // divide it evenly.
        for now_ms in 1..=100 {
            sweep.update(now_ms);
            driver.advance_toward(sweep.target_deg(), now_ms);
        }

        assert_eq!(sweep.target_deg(), 30);
        assert_eq!(driver.current_deg(), 30);
        assert_eq!(driver.writes(), 10);

        let expected: Vec<i32> = (1..=10).map(|i| i * SWEEP_STEP_DEG).collect();
        assert_eq!(recorder.angles, expected);
    }

    #[test]
    fn test_slew_rate_is_capped_by_the_servo_interval() {
        let mut recorder = RecordingServo::default();
        let mut driver = ServoDriver::new(&mut recorder);

        for now_ms in 1..=150 {
            driver.advance_toward(MAX_ANGLE_DEG, now_ms);
        }
        // Thirty firings in, the arm is halfway across the arc.
        assert_eq!(driver.current_deg(), 90);

        for now_ms in 151..=310 {
            driver.advance_toward(MAX_ANGLE_DEG, now_ms);
        }
        assert_eq!(driver.current_deg(), MAX_ANGLE_DEG);
        assert_eq!(driver.writes(), 60);
        assert_eq!(recorder.angles.len(), 60);
    }
}
