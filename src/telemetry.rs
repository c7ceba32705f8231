//! Line telemetry: one `angle,distance\r\n` record per completed
//! measurement, plus the consumer-side parser, zone classification, and
//! link statistics used by the monitoring tools.

use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;

use crate::config::{
    MAX_ANGLE_DEG, MAX_RANGE_CM, MIN_ANGLE_DEG, OUTLIER_CEILING_CM, RED_ZONE_CM, SAMPLE_WINDOW,
    SWEEP_STEP_DEG, YELLOW_ZONE_CM,
};

const LINE_CAPACITY: usize = 16; // "180,100\r\n" is 9 bytes
const BANNER_CAPACITY: usize = 96;

/// One measurement as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub angle_deg: i32,
    pub distance_cm: i32,
}

/// Formats records into a fixed-capacity line buffer.
///
/// The buffer is reused across emissions; `last_line` stays valid until
/// the next `emit`.
#[derive(Debug)]
pub struct TelemetryEmitter {
    line: ArrayString<LINE_CAPACITY>,
    records_emitted: u32,
}

impl TelemetryEmitter {
    pub fn new() -> Self {
        Self {
            line: ArrayString::new(),
            records_emitted: 0,
        }
    }

    pub fn emit(&mut self, record: TelemetryRecord) -> &str {
        debug_assert!(
            (MIN_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&record.angle_deg),
            "emitting angle {} outside arc",
            record.angle_deg
        );
        debug_assert!(
            (0..=MAX_RANGE_CM).contains(&record.distance_cm),
            "emitting unsmoothed distance {}",
            record.distance_cm
        );

        self.line.clear();
        let _ = write!(self.line, "{},{}\r\n", record.angle_deg, record.distance_cm);
        self.records_emitted += 1;
        self.line.as_str()
    }

    pub fn last_line(&self) -> &str {
        self.line.as_str()
    }

    pub fn records_emitted(&self) -> u32 {
        self.records_emitted
    }
}

impl Default for TelemetryEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Startup banner sent before the first record.
///
/// Banner lines carry no comma, so consumers fall through to
/// `TelemetryParseError::NotARecord` and skip them.
pub fn banner() -> ArrayString<BANNER_CAPACITY> {
    let mut out = ArrayString::new();
    let _ = write!(
        out,
        "READY echoscan v{}\r\nsweep {}..{} deg step {} window {} range {} cm\r\n",
        env!("CARGO_PKG_VERSION"),
        MIN_ANGLE_DEG,
        MAX_ANGLE_DEG,
        SWEEP_STEP_DEG,
        SAMPLE_WINDOW,
        MAX_RANGE_CM,
    );
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TelemetryParseError {
    /// No comma in the line. Banners and noise land here; skip, don't count
    /// against the link.
    #[error("line is not a telemetry record")]
    NotARecord,
    #[error("telemetry field is not a number")]
    BadField,
    #[error("telemetry field out of range")]
    OutOfRange,
}

/// Parses one received line back into a record.
///
/// Accepts distances up to the outlier ceiling rather than the configured
/// maximum so raw medians from variant firmware still get through.
pub fn parse_line(line: &str) -> Result<TelemetryRecord, TelemetryParseError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let (angle_text, distance_text) = trimmed
        .split_once(',')
        .ok_or(TelemetryParseError::NotARecord)?;

    let angle_deg: i32 = angle_text
        .trim()
        .parse()
        .map_err(|_| TelemetryParseError::BadField)?;
    let distance_cm: i32 = distance_text
        .trim()
        .parse()
        .map_err(|_| TelemetryParseError::BadField)?;

    if !(MIN_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&angle_deg) {
        return Err(TelemetryParseError::OutOfRange);
    }
    if !(0..=OUTLIER_CEILING_CM).contains(&distance_cm) {
        return Err(TelemetryParseError::OutOfRange);
    }

    Ok(TelemetryRecord {
        angle_deg,
        distance_cm,
    })
}

/// Proximity zone for a reported distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Red,
    Yellow,
    Clear,
}

impl Zone {
    pub fn classify(distance_cm: i32) -> Self {
        if distance_cm <= RED_ZONE_CM {
            Zone::Red
        } else if distance_cm <= YELLOW_ZONE_CM {
            Zone::Yellow
        } else {
            Zone::Clear
        }
    }
}

/// Counters a consumer keeps while reading a telemetry stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct LinkStats {
    pub lines_seen: u32,
    pub records_parsed: u32,
    pub lines_skipped: u32,
    pub parse_errors: u32,
}

impl LinkStats {
    /// Folds one parse outcome into the counters and hands back the record
    /// if there was one.
    pub fn observe(
        &mut self,
        outcome: Result<TelemetryRecord, TelemetryParseError>,
    ) -> Option<TelemetryRecord> {
        self.lines_seen += 1;
        match outcome {
            Ok(record) => {
                self.records_parsed += 1;
                Some(record)
            }
            Err(TelemetryParseError::NotARecord) => {
                self.lines_skipped += 1;
                None
            }
            Err(_) => {
                self.parse_errors += 1;
                None
            }
        }
    }
}
