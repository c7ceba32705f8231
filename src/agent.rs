//! The scan agent: one cooperative tick wiring every component together.

use serde::{Deserialize, Serialize};

use crate::hal::{EchoPin, ServoOutput, Timebase, TriggerPin};
use crate::ranging::{MedianFilter, RangeSampler, SmoothingFilter};
use crate::servo::ServoDriver;
use crate::sweep::{SweepController, SweepState};
use crate::telemetry::{TelemetryEmitter, TelemetryRecord};

/// Aggregated counters across every component, for status reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ScanStats {
    pub ticks: u64,
    pub batches: u32,
    pub substituted_samples: u32,
    pub echo_timeouts: u32,
    pub smoothing_rejections: u32,
    pub servo_writes: u32,
    pub sweep_reversals: u32,
    pub records_emitted: u32,
}

/// Point-in-time view of the whole scan, serializable for status output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub sweep: SweepState,
    pub smoothed_cm: f32,
    pub last_record: Option<TelemetryRecord>,
    pub stats: ScanStats,
}

/// Owns every component and runs the cooperative control loop, one tick
/// at a time.
///
/// The agent never reads wall-clock time itself. Callers pass
/// milliseconds-since-start into `tick`, which keeps the whole control
/// path runnable under fake time in tests and under a virtual bench in
/// the simulator.
///
/// Tick order is fixed: advance the sweep target if its interval has
/// elapsed, step the actuator toward it if its own interval has elapsed,
/// then run a full sampling batch, smooth the median, and emit one
/// record. Sampling dominates the tick's latency; the two motion updates
/// are timestamp-gated and never block.
pub struct ScanAgent<T, E, B, S> {
    // Motion
    sweep: SweepController,
    servo: ServoDriver<S>,

    // Sensing pipeline
    sampler: RangeSampler<T, E, B>,
    median: MedianFilter,
    smoothing: SmoothingFilter,

    // Output
    emitter: TelemetryEmitter,

    ticks: u64,
    last_record: Option<TelemetryRecord>,
}

impl<T, E, B, S> ScanAgent<T, E, B, S>
where
    T: TriggerPin,
    E: EchoPin,
    B: Timebase,
    S: ServoOutput,
{
    pub fn new(trigger: T, echo: E, timebase: B, servo_out: S) -> Self {
        Self {
            sweep: SweepController::new(),
            servo: ServoDriver::new(servo_out),
            sampler: RangeSampler::new(trigger, echo, timebase),
            median: MedianFilter::new(),
            smoothing: SmoothingFilter::new(),
            emitter: TelemetryEmitter::new(),
            ticks: 0,
            last_record: None,
        }
    }

    /// Runs one scheduler tick and returns the record it produced.
    ///
    /// `now_ms` is milliseconds since an arbitrary caller-chosen origin;
    /// it only has to be monotonic.
    pub fn tick(&mut self, now_ms: u64) -> TelemetryRecord {
        self.ticks += 1;

        // Motion first, so this tick's record reflects the freshest angle.
        self.sweep.update(now_ms);
        self.servo.advance_toward(self.sweep.target_deg(), now_ms);

        // Full sampling batch, the dominant cost of the tick.
        let median_cm = self.median.filter_batch(&mut self.sampler);
        let smoothed = self.smoothing.update(median_cm);

        let record = TelemetryRecord {
            angle_deg: self.servo.current_deg(),
            distance_cm: smoothed as i32,
        };
        self.emitter.emit(record);
        self.last_record = Some(record);
        record
    }

    /// The last emitted line, terminator included.
    pub fn line(&self) -> &str {
        self.emitter.last_line()
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        let filter = self.median.stats();
        ScanSnapshot {
            sweep: SweepState {
                current_deg: self.servo.current_deg(),
                target_deg: self.sweep.target_deg(),
                direction: self.sweep.direction(),
                last_sweep_ms: self.sweep.last_update_ms(),
                last_servo_ms: self.servo.last_update_ms(),
            },
            smoothed_cm: self.smoothing.state_cm(),
            last_record: self.last_record,
            stats: ScanStats {
                ticks: self.ticks,
                batches: filter.batches,
                substituted_samples: filter.substituted_samples,
                echo_timeouts: filter.echo_timeouts,
                smoothing_rejections: self.smoothing.rejected_inputs(),
                servo_writes: self.servo.writes(),
                sweep_reversals: self.sweep.reversals(),
                records_emitted: self.emitter.records_emitted(),
            },
        }
    }
}
