use echoscan::config::{MAX_ANGLE_DEG, MAX_RANGE_CM, MIN_ANGLE_DEG, SWEEP_INTERVAL_MS};
use echoscan::sim::SimBench;
use echoscan::sweep::SweepDirection;
use echoscan::telemetry::parse_line;
use echoscan::{ScanAgent, ScanSnapshot};

#[test]
fn test_first_ticks_read_the_scene_through_the_whole_pipeline() {
    let bench = SimBench::quiet(1).shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let mut agent = ScanAgent::new(trigger, echo, timebase, servo);

    // Tick one: the arm steps to 3 degrees, the scene there reads 90 cm,
    // and smoothing pulls the 100 cm prior a quarter of the way down.
    let record = agent.tick(SWEEP_INTERVAL_MS);
    assert_eq!(record.angle_deg, 3);
    assert_eq!(record.distance_cm, 97);
    assert_eq!(agent.line(), "3,97\r\n");

    // Tick two: 97.5 blends toward 90 and truncates to 95.
    let record = agent.tick(2 * SWEEP_INTERVAL_MS);
    assert_eq!(record.angle_deg, 6);
    assert_eq!(record.distance_cm, 95);

    assert_eq!(bench.servo_deg(), 6);
}

#[test]
fn test_every_record_parses_and_stays_in_band() {
    let bench = SimBench::new(42).shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let mut agent = ScanAgent::new(trigger, echo, timebase, servo);

    for tick in 1..=200u64 {
        let record = agent.tick(tick * SWEEP_INTERVAL_MS);

        let parsed = parse_line(agent.line()).expect("emitted line must parse");
        assert_eq!(parsed, record);
        assert!((MIN_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&record.angle_deg));
        assert!((0..=MAX_RANGE_CM).contains(&record.distance_cm));
    }
}

#[test]
fn test_run_statistics_agree_with_the_bench() {
    let bench = SimBench::quiet(7).shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let mut agent = ScanAgent::new(trigger, echo, timebase, servo);

    let ticks = 130u64;
    for tick in 1..=ticks {
        agent.tick(tick * SWEEP_INTERVAL_MS);
    }

    let snapshot = agent.snapshot();
    assert_eq!(snapshot.stats.ticks, ticks);
    assert_eq!(snapshot.stats.batches, 130);
    assert_eq!(snapshot.stats.records_emitted, 130);

    // Quiet bench: every sample lands, nothing is substituted.
    assert_eq!(snapshot.stats.substituted_samples, 0);
    assert_eq!(snapshot.stats.echo_timeouts, 0);
    assert_eq!(snapshot.stats.smoothing_rejections, 0);

    // Flips land on gated updates 61 and 122; the target dwells for one
    // update at each boundary, which skips one actuator write.
    assert_eq!(snapshot.stats.sweep_reversals, 2);
    assert_eq!(snapshot.stats.servo_writes, 130 - 2);
    assert_eq!(snapshot.sweep.direction, SweepDirection::Forward);
    assert_eq!(snapshot.sweep.target_deg, 24);
    assert_eq!(snapshot.sweep.current_deg, snapshot.sweep.target_deg);

    // The bench saw the same actuator traffic the agent counted.
    assert_eq!(bench.servo_deg(), snapshot.sweep.current_deg);
    assert_eq!(bench.servo_writes(), snapshot.stats.servo_writes);

    // The smoothed state settled inside the scene's 18..=90 cm span long
    // ago.
    assert!(snapshot.smoothed_cm >= 18.0);
    assert!(snapshot.smoothed_cm <= 90.0);
}

#[test]
fn test_noisy_bench_records_stay_parseable_and_bounded() {
    let bench = SimBench::with_noise(9, 2, 10).shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let mut agent = ScanAgent::new(trigger, echo, timebase, servo);

    for tick in 1..=200u64 {
        let record = agent.tick(tick * SWEEP_INTERVAL_MS);
        assert!(parse_line(agent.line()).is_ok());
        assert!((0..=MAX_RANGE_CM).contains(&record.distance_cm));
    }

    let snapshot = agent.snapshot();
    // One-in-ten dropout over 1800 samples is certain to show up, and the
    // noise band never pushes a reading out of the accepted range.
    assert!(snapshot.stats.echo_timeouts > 0);
    assert_eq!(
        snapshot.stats.substituted_samples,
        snapshot.stats.echo_timeouts
    );
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let bench = SimBench::quiet(3).shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let mut agent = ScanAgent::new(trigger, echo, timebase, servo);

    for tick in 1..=3u64 {
        agent.tick(tick * SWEEP_INTERVAL_MS);
    }

    let snapshot = agent.snapshot();
    let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
    let back: ScanSnapshot = serde_json::from_str(&json).expect("snapshot deserializes");

    assert_eq!(back.stats.ticks, snapshot.stats.ticks);
    assert_eq!(back.sweep.target_deg, snapshot.sweep.target_deg);
    assert_eq!(back.last_record, snapshot.last_record);
}
