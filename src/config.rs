//! Compile-time tunables for the sweep controller.
//!
//! Everything the surrounding system can reasonably want to adjust lives
//! here: sweep geometry, motion rates, ranging limits, filter parameters,
//! and the stream endpoint the bench rig serves on. None of these are
//! runtime-reconfigurable.

use static_assertions::const_assert;

// Sweep geometry and pacing
pub const MIN_ANGLE_DEG: i32 = 0;
pub const MAX_ANGLE_DEG: i32 = 180;
pub const SWEEP_STEP_DEG: i32 = 3;
pub const SWEEP_INTERVAL_MS: u64 = 10;

// Actuator motion, deliberately gated faster than the sweep so coarse
// target steps are walked out smoothly
pub const SERVO_STEP_DEG: i32 = 3;
pub const SERVO_INTERVAL_MS: u64 = 5;

// Ranging limits
pub const MAX_RANGE_CM: i32 = 100;
pub const OUTLIER_CEILING_CM: i32 = MAX_RANGE_CM + MAX_RANGE_CM / 2;

// Alert thresholds, consumed by the monitor display only
pub const RED_ZONE_CM: i32 = 25;
pub const YELLOW_ZONE_CM: i32 = 35;

// Signal conditioning
pub const SAMPLE_WINDOW: usize = 9;
pub const EMA_ALPHA: f32 = 0.25;

// Sensor timing. The echo timeout bounds one measurement and is sized for
// the maximum supported range with margin.
pub const TRIGGER_SETTLE_US: u64 = 2;
pub const TRIGGER_PULSE_US: u64 = 10;
pub const ECHO_TIMEOUT_US: u64 = 35_000;
pub const INTER_SAMPLE_DELAY_US: u64 = 100;

// Scheduler idle yield between ticks
pub const IDLE_YIELD_US: u64 = 500;

// Stream endpoint. Physical deployments push the same byte stream over a
// 115200 baud serial link; the bench rig serves it over TCP.
pub const SERIAL_BAUD: u32 = 115_200;
pub const DEFAULT_STREAM_HOST: &str = "127.0.0.1";
pub const DEFAULT_STREAM_PORT: u16 = 9600;

const_assert!(SAMPLE_WINDOW % 2 == 1);
const_assert!(MIN_ANGLE_DEG < MAX_ANGLE_DEG);
const_assert!(SWEEP_STEP_DEG > 0);
const_assert!(SERVO_STEP_DEG > 0);
const_assert!(RED_ZONE_CM < YELLOW_ZONE_CM);
const_assert!(YELLOW_ZONE_CM < MAX_RANGE_CM);
const_assert!(MAX_RANGE_CM < OUTLIER_CEILING_CM);
