//! ais-feeder: Edge binary for AIS sentence ingestion and vessel tracking.
//!
//! Supports:
//! - Decoding capture files into vessel position reports
//! - Replaying capture files through the TTL tracker
//! - Live tracking from a TCP AIS receiver

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ais_core::config::{self, Config};
use ais_core::tracker::{TrackEvent, Tracker, VesselObserver};
use ais_core::{coords, Mmsi, VesselFactory};

mod capture;

use capture::{LineFramer, SentenceReader};

#[derive(Parser)]
#[command(name = "ais-feeder", version, about = "AIS decoding and vessel tracking")]
struct Cli {
    /// Config file (defaults to ~/.ais-decode/config.yaml)
    #[arg(long, global = true, env = "AIS_CONFIG")]
    config: Option<PathBuf>,

    /// JSON layout table overriding the configured one
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Drop reports carrying the "position not available" sentinel
    #[arg(long, global = true)]
    skip_unavailable: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode sentences from a capture file and print each vessel report
    Decode {
        /// Path to capture file (one sentence per line)
        file: PathBuf,
    },

    /// Replay a capture file through the tracker and print notifications
    Track {
        /// Path to capture file, optionally `<secs> <sentence>` per line
        file: PathBuf,

        /// Seconds without a sighting before a vessel expires
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Connect to a TCP AIS source and track vessels live
    Listen {
        /// host:port of the AIS source (defaults to the configured source)
        addr: Option<String>,

        /// Seconds without a sighting before a vessel expires
        #[arg(long)]
        ttl: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match config::load_config_from(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => config::load_config(),
    };

    let factory = match build_factory(&config, cli.layout.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error loading field layout: {e}");
            std::process::exit(1);
        }
    };

    let out = Output {
        json: cli.json,
        skip_unavailable: cli.skip_unavailable,
    };

    match cli.command {
        Commands::Decode { file } => cmd_decode(&file, &factory, &out),
        Commands::Track { file, ttl } => {
            let ttl = ttl.unwrap_or(config.tracker.ttl_seconds);
            cmd_track(&file, &factory, ttl, &out);
        }
        Commands::Listen { addr, ttl } => {
            let addr = addr.unwrap_or_else(|| config.source.addr());
            let ttl = ttl.unwrap_or(config.tracker.ttl_seconds);
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error starting runtime: {e}");
                    std::process::exit(1);
                }
            };
            if let Err(e) = runtime.block_on(cmd_listen(&addr, factory, ttl, out)) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn build_factory(config: &Config, layout: Option<&Path>) -> ais_core::Result<VesselFactory> {
    let table = match layout {
        Some(path) => ais_core::FieldLayoutTable::load(path)?,
        None => config.load_layout()?,
    };
    info!(position_types = ?table.position_types(), "field layout ready");
    Ok(VesselFactory::new(Arc::new(table)))
}

fn read_capture(file: &Path) -> Vec<capture::RawSentence> {
    match SentenceReader::new(file).read_all() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        }
    }
}

fn cmd_decode(file: &Path, factory: &VesselFactory, out: &Output) {
    let sentences = read_capture(file);
    let mut decoded = 0u64;

    for raw in &sentences {
        let Some(vessel) = factory.process(raw.text.as_bytes()) else {
            continue;
        };
        if out.skip_unavailable && !coords::is_available(vessel.latitude, vessel.longitude) {
            continue;
        }
        decoded += 1;
        if out.json {
            match serde_json::to_string(&vessel) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "failed to serialize vessel"),
            }
        } else {
            println!("{} {vessel}", raw.timestamp);
        }
    }

    eprintln!("{} sentences, {decoded} position reports", sentences.len());
}

fn cmd_track(file: &Path, factory: &VesselFactory, ttl: u64, out: &Output) {
    let sentences = read_capture(file);
    let mut tracker = Tracker::new(ttl);
    let mut presenter = ConsolePresenter::default();

    for raw in &sentences {
        let Some(vessel) = factory.process(raw.text.as_bytes()) else {
            continue;
        };
        if out.skip_unavailable && !coords::is_available(vessel.latitude, vessel.longitude) {
            continue;
        }
        let events = tracker.record(&vessel, raw.timestamp);
        out.emit(&events, &mut presenter);
    }

    eprintln!(
        "{} sentences, {} records, {} expired, {} still tracked",
        sentences.len(),
        tracker.total_records,
        tracker.total_expired,
        tracker.len()
    );
}

async fn cmd_listen(
    addr: &str,
    factory: VesselFactory,
    ttl: u64,
    out: Output,
) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    info!(%addr, ttl, "connected to AIS source");

    let started = Instant::now();
    let now = || started.elapsed().as_secs();

    let mut tracker = Tracker::new(ttl);
    let mut presenter = ConsolePresenter::default();
    let mut framer = LineFramer::new();
    let mut purge_tick = tokio::time::interval(Duration::from_secs(ttl.max(1)));

    loop {
        tokio::select! {
            read = stream.read_buf(framer.buffer_mut()) => {
                let n = read?;
                if n == 0 {
                    info!("connection closed by remote");
                    break;
                }
                while let Some(line) = framer.next_sentence() {
                    if let Some(vessel) = factory.process(&line) {
                        if out.skip_unavailable
                            && !coords::is_available(vessel.latitude, vessel.longitude)
                        {
                            continue;
                        }
                        let events = tracker.record(&vessel, now());
                        out.emit(&events, &mut presenter);
                    }
                }
            }
            _ = purge_tick.tick() => {
                // Expire vessels even when the feed goes quiet
                let events = tracker.purge(now());
                out.emit(&events, &mut presenter);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    eprintln!(
        "{} records, {} expired, {} still tracked",
        tracker.total_records,
        tracker.total_expired,
        tracker.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

struct Output {
    json: bool,
    skip_unavailable: bool,
}

impl Output {
    fn emit(&self, events: &[TrackEvent], presenter: &mut ConsolePresenter) {
        for event in events {
            if self.json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "failed to serialize event"),
                }
            } else {
                event.dispatch(presenter);
            }
        }
    }
}

/// Text presentation of tracker notifications.
#[derive(Default)]
struct ConsolePresenter {
    visible: HashSet<Mmsi>,
}

impl VesselObserver for ConsolePresenter {
    fn on_vessel_updated(&mut self, mmsi: Mmsi, lat: f64, lon: f64) {
        let tag = if self.visible.insert(mmsi) { "new    " } else { "update " };
        println!("{tag} {mmsi:>9} {lat:>10.6} {lon:>11.6}");
    }

    fn on_vessel_expired(&mut self, mmsi: Mmsi) {
        self.visible.remove(&mmsi);
        println!("expired {mmsi:>9} ({} visible)", self.visible.len());
    }
}
