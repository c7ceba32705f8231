//! Hardware seam for the sweep controller.
//!
//! The controller core talks to the board through these four traits. All
//! of them are infallible: there is no transport-level error channel at
//! this layer, so a misbehaving peripheral shows up as a timeout or a
//! stale reading, never as an `Err`.

use std::time::{Duration, Instant};

/// Digital output driving the ranging sensor's trigger line.
pub trait TriggerPin {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// Digital input reading the ranging sensor's echo line.
pub trait EchoPin {
    fn is_high(&mut self) -> bool;
}

/// Monotonic microsecond clock plus bounded busy delays.
///
/// `now_us` only has to be monotonic relative to itself; absolute epoch is
/// irrelevant. Test doubles drive a virtual counter through this trait so
/// every timing path in the crate runs under fake time.
pub trait Timebase {
    fn now_us(&mut self) -> u64;
    fn delay_us(&mut self, us: u64);
}

/// Absolute-angle actuator output, 0 to 180 degrees.
pub trait ServoOutput {
    fn write_degrees(&mut self, angle_deg: i32);
}

/// Wall-clock timebase for real runs, anchored to process start.
///
/// Delays of a millisecond or more are handed to the OS scheduler; shorter
/// ones spin, since `thread::sleep` cannot be trusted at that resolution.
#[derive(Debug)]
pub struct WallTimebase {
    origin: Instant,
}

impl WallTimebase {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl Timebase for WallTimebase {
    fn now_us(&mut self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn delay_us(&mut self, us: u64) {
        if us >= 1_000 {
            std::thread::sleep(Duration::from_micros(us));
        } else {
            let deadline = Instant::now() + Duration::from_micros(us);
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_timebase_is_monotonic() {
        let mut tb = WallTimebase::new();
        let a = tb.now_us();
        let b = tb.now_us();
        assert!(b >= a);
    }

    #[test]
    fn test_wall_timebase_delay_advances_clock() {
        let mut tb = WallTimebase::new();
        let before = tb.now_us();
        tb.delay_us(200);
        let after = tb.now_us();
        assert!(after - before >= 200);
    }
}
