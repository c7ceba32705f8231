use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use std::process::Command;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use echoscan::config::{
    DEFAULT_STREAM_HOST, IDLE_YIELD_US, MAX_RANGE_CM, RED_ZONE_CM, YELLOW_ZONE_CM,
};
use echoscan::sim::SimBench;
use echoscan::telemetry::{banner, parse_line, LinkStats, TelemetryRecord, Zone};
use echoscan::ScanAgent;

const DEFAULT_PORT: &str = "9600";
const STATUS_SAMPLE_RECORDS: u32 = 12;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("echoscan")
        .version("0.1.0")
        .author("Embedded Sensing Team")
        .about("📡 Ultrasonic Sweep Scanner - sweep simulation and telemetry tooling")
        .arg(
            Arg::with_name("host")
                .short("h")
                .long("host")
                .value_name("HOST")
                .help("Telemetry stream host address")
                .takes_value(true)
                .default_value(DEFAULT_STREAM_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Telemetry stream port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("🔄 Run the scan loop in-process on the virtual bench")
                .long_about("Drives the full control loop against the simulated scene and prints every telemetry line to stdout")
                .arg(
                    Arg::with_name("ticks")
                        .short("t")
                        .long("ticks")
                        .value_name("N")
                        .help("Scheduler ticks to run (0 = until interrupted)")
                        .takes_value(true)
                        .default_value("2000")
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Tick count must be a valid number".into()),
                        }),
                )
                .arg(
                    Arg::with_name("seed")
                        .short("s")
                        .long("seed")
                        .value_name("SEED")
                        .help("Bench noise seed")
                        .takes_value(true)
                        .default_value("42")
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Seed must be a valid number".into()),
                        }),
                )
                .arg(
                    Arg::with_name("quiet")
                        .short("q")
                        .long("quiet")
                        .help("Disable bench noise and echo dropout"),
                ),
        )
        .subcommand(
            SubCommand::with_name("monitor")
                .about("📈 Monitor the live telemetry stream")
                .long_about("Connects to a running scanner stream and renders each record with its proximity zone")
                .arg(
                    Arg::with_name("lines")
                        .short("n")
                        .long("lines")
                        .value_name("N")
                        .help("Stop after N records (0 = until the stream closes)")
                        .takes_value(true)
                        .default_value("0")
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Line count must be a valid number".into()),
                        }),
                ),
        )
        .subcommand(
            SubCommand::with_name("status")
                .about("📊 Summarize the live stream")
                .long_about("Reads a short burst of records from the stream and reports range spread and zone distribution"),
        )
        .subcommand(
            SubCommand::with_name("zones")
                .about("🎯 Show proximity zone thresholds"),
        )
        .subcommand(
            SubCommand::with_name("server")
                .about("🚀 Start the scanner simulator server")
                .long_about("Launches the streaming simulator for testing and development")
                .arg(
                    Arg::with_name("background")
                        .short("b")
                        .long("background")
                        .help("Run server in background"),
                ),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap();
    let port = matches.value_of("port").unwrap().parse::<u16>()?;
    let format = matches.value_of("format").unwrap();
    let verbose = matches.is_present("verbose");

    if verbose {
        println!("{}", "📡 Echoscan - Ultrasonic Sweep Scanner".bright_blue().bold());
        println!("{} {}:{}", "Stream endpoint".dimmed(), host, port);
    }

    match matches.subcommand() {
        ("run", Some(sub_matches)) => {
            handle_run(sub_matches, format, verbose).await?;
        }
        ("monitor", Some(sub_matches)) => {
            handle_monitor(sub_matches, host, port, format, verbose).await?;
        }
        ("status", _) => {
            handle_status(host, port, format, verbose).await?;
        }
        ("zones", _) => {
            handle_zones(format);
        }
        ("server", Some(sub_matches)) => {
            handle_server(sub_matches, port)?;
        }
        _ => {
            println!("{}", "No command specified. Use --help for usage information.".yellow());
            println!("{}", "Quick start:".bright_green());
            println!("  {} Start the simulator server", "echoscan server".bright_cyan());
            println!("  {} Watch the telemetry stream", "echoscan monitor".bright_cyan());
            println!("  {} Run the loop locally", "echoscan run".bright_cyan());
        }
    }

    Ok(())
}

async fn handle_run(
    matches: &ArgMatches<'_>,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let requested: u64 = matches.value_of("ticks").unwrap().parse()?;
    let seed: u64 = matches.value_of("seed").unwrap().parse()?;
    let quiet = matches.is_present("quiet");
    let ticks = if requested == 0 { u64::MAX } else { requested };

    if verbose {
        println!(
            "{} seed {} noise {}",
            "Bench profile:".dimmed(),
            seed,
            if quiet { "off" } else { "on" }
        );
    }

    let bench = if quiet {
        SimBench::quiet(seed)
    } else {
        SimBench::new(seed)
    }
    .shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let mut agent = ScanAgent::new(trigger, echo, timebase, servo);

    print!("{}", banner());

    let origin = Instant::now();
    for _ in 0..ticks {
        let now_ms = origin.elapsed().as_millis() as u64;
        agent.tick(now_ms);
        print!("{}", agent.line());
        tokio::time::sleep(Duration::from_micros(IDLE_YIELD_US)).await;
    }

    let snapshot = agent.snapshot();
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        "compact" => println!(
            "DONE ticks={} records={} reversals={}",
            snapshot.stats.ticks, snapshot.stats.records_emitted, snapshot.stats.sweep_reversals
        ),
        _ => {
            println!("{} {}", "✅".green(), "Scan complete".bright_green().bold());
            println!(
                "   ticks: {} | records: {} | sweep reversals: {}",
                snapshot.stats.ticks.to_string().bright_cyan(),
                snapshot.stats.records_emitted.to_string().bright_cyan(),
                snapshot.stats.sweep_reversals.to_string().bright_cyan()
            );
            println!(
                "   echo timeouts: {} | substituted samples: {} | servo writes: {}",
                snapshot.stats.echo_timeouts.to_string().bright_yellow(),
                snapshot.stats.substituted_samples.to_string().bright_yellow(),
                snapshot.stats.servo_writes.to_string().bright_cyan()
            );
        }
    }

    Ok(())
}

async fn handle_monitor(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let limit: u64 = matches.value_of("lines").unwrap().parse()?;

    println!(
        "{}",
        "📡 Monitoring scanner telemetry (Press Ctrl+C to stop)..."
            .bright_blue()
            .bold()
    );

    let stream = connect_or_explain(host, port).await?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let mut stats = LinkStats::default();

    if format == "table" {
        println!("{}", "┌──────────┬─────────────┬──────────┐".bright_white());
        println!("{}", "│  Angle   │  Distance   │  Zone    │".bright_white());
        println!("{}", "├──────────┼─────────────┼──────────┤".bright_white());
    }

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }

        match stats.observe(parse_line(&line)) {
            Some(record) => {
                render_record(record, format);
                if limit > 0 && u64::from(stats.records_parsed) >= limit {
                    break;
                }
            }
            None => {
                if verbose {
                    println!("{} {}", "skipped:".dimmed(), line.trim_end().dimmed());
                }
            }
        }
    }

    if format == "table" {
        println!("{}", "└──────────┴─────────────┴──────────┘".bright_white());
    }
    println!(
        "{} lines {} | records {} | skipped {} | errors {}",
        "Link:".bright_white(),
        stats.lines_seen,
        stats.records_parsed.to_string().bright_green(),
        stats.lines_skipped,
        stats.parse_errors.to_string().bright_red()
    );

    Ok(())
}

async fn handle_status(
    host: &str,
    port: u16,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("{}", "Sampling the telemetry stream...".dimmed());
    }

    let stream = connect_or_explain(host, port).await?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let mut stats = LinkStats::default();
    let mut records: heapless::Vec<TelemetryRecord, 16> = heapless::Vec::new();

    // Bounded sampling window so a stalled stream cannot hang the command.
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        while stats.records_parsed < STATUS_SAMPLE_RECORDS {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break;
            }
            if let Some(record) = stats.observe(parse_line(&line)) {
                let _ = records.push(record);
            }
        }
        Ok::<(), std::io::Error>(())
    })
    .await;

    if records.is_empty() {
        println!("{} {}", "❌".red(), "No records received from the stream".bright_red());
        return Ok(());
    }

    let latest = records[records.len() - 1];
    let min_cm = records.iter().map(|r| r.distance_cm).min().unwrap_or(0);
    let max_cm = records.iter().map(|r| r.distance_cm).max().unwrap_or(0);
    let red = records
        .iter()
        .filter(|r| Zone::classify(r.distance_cm) == Zone::Red)
        .count();
    let yellow = records
        .iter()
        .filter(|r| Zone::classify(r.distance_cm) == Zone::Yellow)
        .count();
    let clear = records.len() - red - yellow;

    match format {
        "json" => {
            let summary = serde_json::json!({
                "records": records.len(),
                "latest": latest,
                "min_cm": min_cm,
                "max_cm": max_cm,
                "zones": { "red": red, "yellow": yellow, "clear": clear },
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "compact" => {
            println!(
                "{} records={} latest={}°/{}cm span={}..{}cm",
                zone_tag(Zone::classify(latest.distance_cm)),
                records.len(),
                latest.angle_deg,
                latest.distance_cm,
                min_cm,
                max_cm
            );
        }
        _ => {
            println!("{} {}", "📊".bright_blue(), "Scanner Status".bright_blue().bold());
            println!("{}", "══════════════════".bright_blue());
            println!(
                "{} {}° at {} cm ({})",
                "Latest:".bright_white(),
                latest.angle_deg.to_string().bright_cyan(),
                latest.distance_cm.to_string().bright_cyan(),
                zone_tag(Zone::classify(latest.distance_cm))
            );
            println!(
                "{} {} records spanning {}..{} cm",
                "Window:".bright_white(),
                records.len(),
                min_cm,
                max_cm
            );
            println!(
                "{} {} red | {} yellow | {} clear",
                "Zones: ".bright_white(),
                red.to_string().bright_red(),
                yellow.to_string().bright_yellow(),
                clear.to_string().bright_green()
            );
        }
    }

    Ok(())
}

fn handle_zones(format: &str) {
    match format {
        "json" => {
            let thresholds = serde_json::json!({
                "red_max_cm": RED_ZONE_CM,
                "yellow_max_cm": YELLOW_ZONE_CM,
                "max_range_cm": MAX_RANGE_CM,
            });
            println!("{}", thresholds);
        }
        "compact" => {
            println!(
                "red<={} yellow<={} clear>{} max={}",
                RED_ZONE_CM, YELLOW_ZONE_CM, YELLOW_ZONE_CM, MAX_RANGE_CM
            );
        }
        _ => {
            println!("{} {}", "🎯".bright_blue(), "Proximity Zones".bright_blue().bold());
            println!("{}", "═══════════════════".bright_blue());
            println!(
                "  {}  0..={} cm   immediate alert band",
                "RED   ".bright_red().bold(),
                RED_ZONE_CM
            );
            println!(
                "  {}  {}..={} cm  caution band",
                "YELLOW".bright_yellow().bold(),
                RED_ZONE_CM + 1,
                YELLOW_ZONE_CM
            );
            println!(
                "  {}  beyond {} cm  open range",
                "CLEAR ".bright_green().bold(),
                YELLOW_ZONE_CM
            );
            println!("  reportable range caps at {} cm", MAX_RANGE_CM);
        }
    }
}

fn handle_server(matches: &ArgMatches<'_>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let background = matches.is_present("background");

    println!("{}", "🚀 Starting scanner simulator server...".bright_green().bold());

    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--bin", "echoscan-simulator"]);

    if background {
        cmd.spawn()?;
        println!("{} Server started in background on port {}", "✅".green(), port);
    } else {
        println!(
            "{} Server starting on port {} (Press Ctrl+C to stop)",
            "🌐".bright_blue(),
            port
        );
        cmd.status()?;
    }

    Ok(())
}

// Helper functions

fn render_record(record: TelemetryRecord, format: &str) {
    let zone = Zone::classify(record.distance_cm);
    match format {
        "json" => {
            let row = serde_json::json!({
                "angle_deg": record.angle_deg,
                "distance_cm": record.distance_cm,
                "zone": zone,
            });
            println!("{}", row);
        }
        "compact" => {
            println!(
                "[{:>3}°] {:>3} cm {}",
                record.angle_deg, record.distance_cm, zone_tag(zone)
            );
        }
        _ => {
            let angle_str = format!("{:>6}°", record.angle_deg);
            let distance_str = format!("{:>8} cm", record.distance_cm);
            println!("│ {} │ {} │ {} │", angle_str, distance_str, zone_cell(zone));
        }
    }
}

fn zone_cell(zone: Zone) -> ColoredString {
    match zone {
        Zone::Red => "  RED   ".bright_red().bold(),
        Zone::Yellow => " YELLOW ".bright_yellow(),
        Zone::Clear => " CLEAR  ".bright_green(),
    }
}

fn zone_tag(zone: Zone) -> ColoredString {
    match zone {
        Zone::Red => "RED".bright_red().bold(),
        Zone::Yellow => "YELLOW".bright_yellow(),
        Zone::Clear => "CLEAR".bright_green(),
    }
}

async fn connect_or_explain(
    host: &str,
    port: u16,
) -> Result<TcpStream, Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", host, port);
    match TcpStream::connect(&addr).await {
        Ok(stream) => Ok(stream),
        Err(e) => {
            eprintln!(
                "{} Failed to connect to scanner stream at {}",
                "❌".red(),
                addr.bright_white()
            );

            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                eprintln!("{} Server is not running. Start it with:", "💡".yellow());
                eprintln!("   {}", "echoscan server".bright_cyan());
                eprintln!("   or");
                eprintln!("   {}", "cargo run --bin echoscan-simulator".bright_cyan());
            } else {
                eprintln!("{} Network error: {}", "🔌".yellow(), e.to_string().bright_red());
                eprintln!("{} Check network connectivity and firewall settings", "💡".yellow());
            }

            Err(e.into())
        }
    }
}
