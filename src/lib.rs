//! # Ultrasonic Sweep Scanner
//!
//! An embedded-style ultrasonic scanning library: a servo sweeps a ranging
//! sensor across an arc while a cooperative control loop filters noisy
//! echo readings and streams angle/distance telemetry over a serial-style
//! line protocol.
//!
//! ## Features
//!
//! - **Deterministic median filtering**: fixed 9-sample batches ordered by
//!   a branch-light sorting network with bounded latency
//! - **Outlier substitution**: timeouts and implausible echoes read as
//!   max range instead of poisoning the batch
//! - **Exponential smoothing**: a convex-blend running estimate that
//!   rejects out-of-range spikes outright
//! - **Cooperative scheduling**: sweep and servo updates gated on elapsed
//!   timestamps, never on blocking delays
//! - **Line telemetry**: one `angle,distance` record per measurement at
//!   115200 baud framing
//! - **Virtual bench**: the full control path runs against a simulated
//!   scene with no hardware attached
//!
//! ## Quick Start
//!
//! ```rust
//! use echoscan::sim::SimBench;
//! use echoscan::ScanAgent;
//!
//! // Deterministic virtual bench in place of real pins
//! let bench = SimBench::quiet(1).shared();
//! let (trigger, echo, timebase, servo) = bench.handles();
//! let mut agent = ScanAgent::new(trigger, echo, timebase, servo);
//!
//! // Drive the control loop under fake time, one tick per 10ms
//! for tick in 1..=10 {
//!     let record = agent.tick(tick * 10);
//!     assert!(record.distance_cm >= 0 && record.distance_cm <= 100);
//! }
//! println!("last record: {}", agent.line().trim_end());
//! ```
//!
//! ## Architecture
//!
//! The scanner is organized into several key modules:
//!
//! - [`agent`] - Main control loop and public API
//! - [`ranging`] - Sampling, median filtering, and smoothing pipeline
//! - [`sweep`] - Sweep target state machine
//! - [`servo`] - Bounded-rate actuator driver
//! - [`scheduler`] - Timestamp-gated interval scheduling
//! - [`telemetry`] - Line protocol emission and parsing
//! - [`hal`] - Hardware traits the control path is written against
//! - [`sim`] - Virtual bench implementing the hardware traits
//! - [`config`] - Compile-time tunables

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod agent;
pub mod ranging;
pub mod sweep;
pub mod servo;
pub mod telemetry;
pub mod scheduler;
pub mod hal;
pub mod sim;
pub mod config;

// Re-export main public types for convenience
pub use agent::{ScanAgent, ScanSnapshot, ScanStats};
pub use telemetry::{TelemetryRecord, Zone};
