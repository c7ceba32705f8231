//! Trigger/echo measurement against the hardware seam.

use super::{RangeSource, RawSample};
use crate::config::{
    ECHO_TIMEOUT_US, INTER_SAMPLE_DELAY_US, TRIGGER_PULSE_US, TRIGGER_SETTLE_US,
};
use crate::hal::{EchoPin, Timebase, TriggerPin};

/// Round-trip pulse width to centimeters.
///
/// Sound covers one centimeter out and back in 2cm / 34300cm/s, about
/// 58.3us. Integer form keeps the conversion off the FPU:
/// `cm = us * 343 / 20000`.
pub fn pulse_to_cm(width_us: u64) -> i32 {
    ((width_us * 343) / 20_000) as i32
}

/// Drives one ranging measurement at a time: fires the trigger pulse,
/// waits (bounded) for the echo line to rise and fall, and converts the
/// high width to a distance.
///
/// `sample_once` blocks the calling thread for the duration of one
/// measurement, capped by the echo timeout in each wait. That is the
/// dominant cost of a control-loop tick by design.
#[derive(Debug)]
pub struct RangeSampler<T, E, B> {
    trigger: T,
    echo: E,
    timebase: B,
}

impl<T: TriggerPin, E: EchoPin, B: Timebase> RangeSampler<T, E, B> {
    pub fn new(trigger: T, echo: E, timebase: B) -> Self {
        Self {
            trigger,
            echo,
            timebase,
        }
    }

    fn fire_trigger(&mut self) {
        self.trigger.set_low();
        self.timebase.delay_us(TRIGGER_SETTLE_US);
        self.trigger.set_high();
        self.timebase.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low();
    }
}

impl<T: TriggerPin, E: EchoPin, B: Timebase> RangeSource for RangeSampler<T, E, B> {
    fn sample_once(&mut self) -> RawSample {
        self.fire_trigger();

        // Wait for the echo line to rise.
        let armed_at = self.timebase.now_us();
        while !self.echo.is_high() {
            let now = self.timebase.now_us();
            if now.saturating_sub(armed_at) > ECHO_TIMEOUT_US {
                return RawSample::NoEcho;
            }
        }

        // Measure the high width.
        let rise = self.timebase.now_us();
        while self.echo.is_high() {
            let now = self.timebase.now_us();
            if now.saturating_sub(rise) > ECHO_TIMEOUT_US {
                return RawSample::NoEcho;
            }
        }
        let fall = self.timebase.now_us();

        RawSample::Distance(pulse_to_cm(fall - rise))
    }

    fn settle(&mut self) {
        self.timebase.delay_us(INTER_SAMPLE_DELAY_US);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_RANGE_CM;

    #[test]
    fn test_conversion_matches_known_widths() {
        assert_eq!(pulse_to_cm(0), 0);
        assert_eq!(pulse_to_cm(583), 9);
        assert_eq!(pulse_to_cm(584), 10);
        assert_eq!(pulse_to_cm(5831), MAX_RANGE_CM);
        // Echo timeout corresponds to a range far beyond the ceiling.
        assert_eq!(pulse_to_cm(ECHO_TIMEOUT_US), 600);
    }

    #[test]
    fn test_conversion_is_monotonic() {
        let mut last = pulse_to_cm(0);
        for width in 1..10_000 {
            let cm = pulse_to_cm(width);
            assert!(cm >= last);
            last = cm;
        }
    }

    struct StuckLowEcho;

    impl EchoPin for StuckLowEcho {
        fn is_high(&mut self) -> bool {
            false
        }
    }

    struct NullTrigger;

    impl TriggerPin for NullTrigger {
        fn set_high(&mut self) {}
        fn set_low(&mut self) {}
    }

    struct CountingClock {
        now_us: u64,
    }

    impl Timebase for CountingClock {
        fn now_us(&mut self) -> u64 {
            self.now_us += 1;
            self.now_us
        }

        fn delay_us(&mut self, us: u64) {
            self.now_us += us;
        }
    }

    #[test]
    fn test_silent_echo_line_times_out_as_no_echo() {
        let mut sampler =
            RangeSampler::new(NullTrigger, StuckLowEcho, CountingClock { now_us: 0 });
        assert_eq!(sampler.sample_once(), RawSample::NoEcho);
    }
}
