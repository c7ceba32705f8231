//! Virtual test bench standing in for the physical board.
//!
//! One [`SimBench`] owns a microsecond clock, the trigger and echo lines,
//! and the servo horn. Cloneable handles implement the hardware traits
//! against it, so a [`crate::agent::ScanAgent`] built on them runs the
//! exact production control path with no hardware attached. The bench
//! synthesizes echo pulses from a fixed obstacle scene keyed on the
//! current servo angle, with optional distance noise and echo dropout.

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::MAX_ANGLE_DEG;
use crate::hal::{EchoPin, ServoOutput, Timebase, TriggerPin};

/// Delay between trigger falling edge and echo rise, standing in for the
/// sensor's internal burst plus flight time to the first reflection.
const SIM_ECHO_LATENCY_US: u64 = 200;
const DEFAULT_NOISE_CM: i32 = 2;
const DEFAULT_DROPOUT_PCT: u8 = 3;

/// Pulse width that converts back to exactly `distance_cm`.
///
/// Ceiling form of the inverse of [`crate::ranging::pulse_to_cm`]; the
/// floor conversion recovers the input exactly for every distance up to
/// the outlier ceiling. A width of zero never rises, so distance zero
/// reads back as a timeout rather than a measurement.
pub fn echo_width_us(distance_cm: i32) -> u64 {
    debug_assert!(distance_cm >= 0, "negative distance {distance_cm}");
    (distance_cm as u64 * 20_000 + 342) / 343
}

/// Fixed obstacle layout the bench reflects echoes from.
///
/// A close object dead ahead, a mid-range one on the right shoulder, a
/// far one on the left, open range everywhere else.
pub fn scene_distance_cm(angle_deg: i32) -> i32 {
    match angle_deg {
        70..=95 => 18,
        40..=69 => 32,
        120..=150 => 60,
        _ => 90,
    }
}

/// Shared state behind every simulated peripheral handle.
#[derive(Debug)]
pub struct SimBench {
    clock_us: u64,
    trigger_high: bool,
    // Scheduled echo as (rise_at, fall_at) in bench clock time.
    pulse: Option<(u64, u64)>,
    servo_deg: i32,
    servo_writes: u32,
    rng_state: u64,
    noise_cm: i32,
    dropout_pct: u8,
}

impl SimBench {
    /// Bench with the default noise profile.
    pub fn new(seed: u64) -> Self {
        Self::with_noise(seed, DEFAULT_NOISE_CM, DEFAULT_DROPOUT_PCT)
    }

    /// Noiseless bench: every echo arrives and reads the scene exactly.
    pub fn quiet(seed: u64) -> Self {
        Self::with_noise(seed, 0, 0)
    }

    pub fn with_noise(seed: u64, noise_cm: i32, dropout_pct: u8) -> Self {
        Self {
            clock_us: 0,
            trigger_high: false,
            pulse: None,
            servo_deg: 0,
            servo_writes: 0,
            rng_state: seed,
            noise_cm,
            dropout_pct,
        }
    }

    pub fn shared(self) -> SharedBench {
        SharedBench(Arc::new(Mutex::new(self)))
    }

    // Linear congruential generator (Numerical Recipes)
    fn next_random(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.rng_state
    }

    fn random_u8(&mut self) -> u8 {
        (self.next_random() >> 24) as u8
    }

    fn on_trigger_low(&mut self) {
        let was_high = self.trigger_high;
        self.trigger_high = false;
        if was_high {
            self.arm_echo();
        }
    }

    // Runs at the trigger falling edge: roll for dropout, then schedule
    // the echo window for the scene distance at the current horn angle.
    fn arm_echo(&mut self) {
        if self.dropout_pct > 0 && self.random_u8() % 100 < self.dropout_pct {
            self.pulse = None;
            return;
        }

        let base = scene_distance_cm(self.servo_deg);
        let offset = if self.noise_cm > 0 {
            let spread = 2 * self.noise_cm + 1;
            (self.next_random() % spread as u64) as i32 - self.noise_cm
        } else {
            0
        };
        let distance_cm = (base + offset).max(1);

        let rise_at = self.clock_us + SIM_ECHO_LATENCY_US;
        self.pulse = Some((rise_at, rise_at + echo_width_us(distance_cm)));
    }

    fn echo_is_high(&self) -> bool {
        self.pulse
            .map_or(false, |(rise, fall)| self.clock_us >= rise && self.clock_us < fall)
    }
}

/// Cheaply cloneable owner of a [`SimBench`].
#[derive(Debug, Clone)]
pub struct SharedBench(Arc<Mutex<SimBench>>);

impl SharedBench {
    /// One handle per hardware trait, all over the same bench.
    pub fn handles(&self) -> (SimTrigger, SimEcho, SimTimebase, SimServo) {
        (
            SimTrigger {
                bench: self.clone(),
            },
            SimEcho {
                bench: self.clone(),
            },
            SimTimebase {
                bench: self.clone(),
            },
            SimServo {
                bench: self.clone(),
            },
        )
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimBench) -> R) -> R {
        let mut bench = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut bench)
    }

    pub fn clock_us(&self) -> u64 {
        self.with(|bench| bench.clock_us)
    }

    pub fn servo_deg(&self) -> i32 {
        self.with(|bench| bench.servo_deg)
    }

    pub fn servo_writes(&self) -> u32 {
        self.with(|bench| bench.servo_writes)
    }
}

#[derive(Debug, Clone)]
pub struct SimTrigger {
    bench: SharedBench,
}

#[derive(Debug, Clone)]
pub struct SimEcho {
    bench: SharedBench,
}

#[derive(Debug, Clone)]
pub struct SimTimebase {
    bench: SharedBench,
}

#[derive(Debug, Clone)]
pub struct SimServo {
    bench: SharedBench,
}

impl TriggerPin for SimTrigger {
    fn set_high(&mut self) {
        self.bench.with(|bench| bench.trigger_high = true);
    }

    fn set_low(&mut self) {
        self.bench.with(SimBench::on_trigger_low);
    }
}

impl EchoPin for SimEcho {
    fn is_high(&mut self) -> bool {
        self.bench.with(|bench| bench.echo_is_high())
    }
}

impl Timebase for SimTimebase {
    fn now_us(&mut self) -> u64 {
        self.bench.with(|bench| {
            bench.clock_us += 1;
            bench.clock_us
        })
    }

    fn delay_us(&mut self, us: u64) {
        self.bench.with(|bench| bench.clock_us += us);
    }
}

impl ServoOutput for SimServo {
    fn write_degrees(&mut self, angle_deg: i32) {
        debug_assert!(
            (0..=MAX_ANGLE_DEG).contains(&angle_deg),
            "servo write {angle_deg} outside arc"
        );
        self.bench.with(|bench| {
            bench.servo_deg = angle_deg;
            bench.servo_writes += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::{pulse_to_cm, RangeSampler, RangeSource, RawSample};

    #[test]
    fn test_echo_width_inverts_the_pulse_conversion() {
        for distance in 0..=150 {
            assert_eq!(pulse_to_cm(echo_width_us(distance)), distance);
        }
    }

    #[test]
    fn test_quiet_bench_reads_the_scene_exactly() {
        let bench = SimBench::quiet(7).shared();
        let (trigger, echo, timebase, mut servo) = bench.handles();
        let mut sampler = RangeSampler::new(trigger, echo, timebase);

        // Horn starts at 0: open range.
        assert_eq!(sampler.sample_once(), RawSample::Distance(90));

        servo.write_degrees(80);
        assert_eq!(sampler.sample_once(), RawSample::Distance(18));

        servo.write_degrees(45);
        assert_eq!(sampler.sample_once(), RawSample::Distance(32));

        servo.write_degrees(130);
        assert_eq!(sampler.sample_once(), RawSample::Distance(60));
    }

    #[test]
    fn test_same_seed_replays_the_same_samples() {
        let mut runs = Vec::new();
        for _ in 0..2 {
            let bench = SimBench::new(42).shared();
            let (trigger, echo, timebase, _servo) = bench.handles();
            let mut sampler = RangeSampler::new(trigger, echo, timebase);
            let samples: Vec<RawSample> = (0..8).map(|_| sampler.sample_once()).collect();
            runs.push(samples);
        }
        assert_eq!(runs[0], runs[1]);
    }

    #[test]
    fn test_noise_stays_within_its_band() {
        let bench = SimBench::with_noise(99, 2, 0).shared();
        let (trigger, echo, timebase, _servo) = bench.handles();
        let mut sampler = RangeSampler::new(trigger, echo, timebase);

        for _ in 0..32 {
            match sampler.sample_once() {
                RawSample::Distance(cm) => assert!((88..=92).contains(&cm), "got {cm}"),
                RawSample::NoEcho => panic!("dropout disabled but echo missing"),
            }
        }
    }

    #[test]
    fn test_full_dropout_times_out_every_sample() {
        let bench = SimBench::with_noise(1, 0, 100).shared();
        let (trigger, echo, timebase, _servo) = bench.handles();
        let mut sampler = RangeSampler::new(trigger, echo, timebase);
        assert_eq!(sampler.sample_once(), RawSample::NoEcho);
        assert_eq!(sampler.sample_once(), RawSample::NoEcho);
    }

    #[test]
    fn test_bench_records_servo_writes() {
        let bench = SimBench::quiet(3).shared();
        let (_trigger, _echo, _timebase, mut servo) = bench.handles();
        servo.write_degrees(15);
        servo.write_degrees(18);
        assert_eq!(bench.servo_deg(), 18);
        assert_eq!(bench.servo_writes(), 2);
    }
}
