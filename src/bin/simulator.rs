use echoscan::agent::ScanAgent;
use echoscan::config::{DEFAULT_STREAM_HOST, DEFAULT_STREAM_PORT};
use echoscan::sim::SimBench;
use echoscan::telemetry::banner;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::time;
use tracing::{error, info, warn};

const TELEMETRY_BROADCAST_BUFFER_SIZE: usize = 256;
const BENCH_SEED: u64 = 42;
// Wall-clock pacing of the scan loop. Real firmware is paced by the
// blocking sample batch; the virtual bench finishes a batch instantly,
// so the rig spreads ticks out to a believable record rate instead.
const TICK_PERIOD_MS: u64 = 5;
const SUMMARY_EVERY_TICKS: u64 = 1_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("📡 Echoscan Bench Simulator");
    println!("===========================");

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_STREAM_HOST, DEFAULT_STREAM_PORT));

    // Scan agent wired to the virtual bench
    let bench = SimBench::new(BENCH_SEED).shared();
    let (trigger, echo, timebase, servo) = bench.handles();
    let agent = Arc::new(Mutex::new(ScanAgent::new(trigger, echo, timebase, servo)));

    // Broadcast channel fanning telemetry lines out to every client
    let (telemetry_tx, _) = broadcast::channel::<String>(TELEMETRY_BROADCAST_BUFFER_SIZE);

    let stream_telemetry_tx = telemetry_tx.clone();
    let stream_addr = addr.clone();
    let stream_server = tokio::spawn(async move {
        if let Err(e) = start_stream_server(stream_addr, stream_telemetry_tx).await {
            error!("TCP server error: {}", e);
        }
    });

    // Main scan loop
    let origin = Instant::now();
    let mut interval = time::interval(Duration::from_millis(TICK_PERIOD_MS));
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let line = {
                    let mut agent_guard = agent.lock().await;
                    let now_ms = origin.elapsed().as_millis() as u64;
                    agent_guard.tick(now_ms);
                    agent_guard.line().to_string()
                };
                ticks += 1;

                if telemetry_tx.receiver_count() > 0 {
                    if let Err(e) = telemetry_tx.send(line) {
                        warn!("Failed to broadcast telemetry: {}", e);
                    }
                }

                if ticks % SUMMARY_EVERY_TICKS == 0 {
                    let snapshot = agent.lock().await.snapshot();
                    info!(
                        "📡 horn at {}° | smoothed {:.1} cm | {} reversals | {} echo timeouts",
                        snapshot.sweep.current_deg,
                        snapshot.smoothed_cm,
                        snapshot.stats.sweep_reversals,
                        snapshot.stats.echo_timeouts
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let snapshot = agent.lock().await.snapshot();
    info!(
        "Final totals: {} ticks | {} records | {} sweep reversals",
        snapshot.stats.ticks, snapshot.stats.records_emitted, snapshot.stats.sweep_reversals
    );

    stream_server.abort();
    println!("📡 Echoscan simulator stopped");

    Ok(())
}

async fn start_stream_server(
    addr: String,
    telemetry_tx: broadcast::Sender<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&addr).await?;
    info!("🌐 Telemetry stream listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("🔗 New client connected: {}", peer);
                let client_rx = telemetry_tx.subscribe();

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_rx).await {
                        warn!("Client {} error: {}", peer, e);
                    }
                    info!("🔌 Client {} disconnected", peer);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    mut stream: TcpStream,
    mut telemetry_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Banner first, exactly as the firmware prints it after reset. Lines
    // already carry their terminators, so bytes go out as-is.
    stream.write_all(banner().as_bytes()).await?;

    loop {
        match telemetry_rx.recv().await {
            Ok(line) => {
                stream.write_all(line.as_bytes()).await?;
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Client fell behind; {} records dropped", missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    Ok(())
}
