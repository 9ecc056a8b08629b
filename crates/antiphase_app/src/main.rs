//! Antiphase runner
//!
//! Starts a session against the simulated driver (at its preferred frame
//! size unless a config file says otherwise), runs the meter monitor,
//! and logs lifecycle and meter events until the run time elapses.
//!
//! Usage: `antiphase [config.json] [seconds]`
//!
//! `RUST_LOG` overrides the default log filter.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use antiphase_core::{
    AudioSession, Event, FrameSource, MeterMonitor, MonitorConfig, SessionConfig,
    SimulatedDriver, SimulatedDriverConfig,
};
use crossbeam_channel::select;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_RUN_SECS: u64 = 5;

fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn log_event(event: &Event) {
    match event {
        Event::LevelUpdate { level } => debug!(level, "Level"),
        Event::SpectrumUpdate { bands } => {
            let peak = bands.iter().copied().fold(0.0_f32, f32::max);
            debug!(bands = bands.len(), peak, "Spectrum");
        }
        other => info!(?other, "Session event"),
    }
}

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("antiphase=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let info = SimulatedDriver::default().info();
    info!(driver = ?info, "Using frame source");

    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => info.preferred_config(SessionConfig::default().sample_rate),
    };
    info.check(&config)?;
    let run_for = match args.next() {
        Some(secs) => Duration::from_secs(
            secs.parse()
                .with_context(|| format!("invalid run time '{secs}'"))?,
        ),
        None => Duration::from_secs(DEFAULT_RUN_SECS),
    };

    info!(
        frame_size = config.frame_size,
        sample_rate = config.sample_rate,
        latency_ms = config.latency_ms(),
        "Starting Antiphase"
    );

    let session = Arc::new(AudioSession::with_config(config.clone())?);
    let events = session.events();
    let meters = session.meter_events();

    let mut driver = SimulatedDriver::new(SimulatedDriverConfig {
        sample_rate: config.sample_rate,
        ..Default::default()
    });

    let outcome = session.start(config.initial_gain);
    info!(gain = outcome.gain, "Processing started");
    driver.start(session.frame_handle())?;

    let mut monitor = MeterMonitor::spawn(
        Arc::clone(&session),
        MonitorConfig {
            interval: Duration::from_millis(100),
            ..Default::default()
        },
    )?;

    let deadline = Instant::now() + run_for;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        select! {
            recv(events) -> event => {
                if let Ok(event) = event {
                    log_event(&event);
                }
            }
            recv(meters) -> event => {
                if let Ok(event) = event {
                    log_event(&event);
                }
            }
            default(remaining) => {}
        }
    }

    monitor.stop();
    session.stop();
    driver.stop();

    for event in events.try_iter().chain(meters.try_iter()) {
        log_event(&event);
    }

    info!(
        frames = session.frames_processed(),
        "Antiphase finished"
    );
    Ok(())
}
