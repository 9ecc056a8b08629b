//! Meter Monitor
//!
//! Background thread that polls the session's level meter and band energy
//! estimator at a display rate and publishes the results on the session's
//! meter channel ([`AudioSession::meter_events`]). It is an
//! ordinary consumer: it takes the same short lock any other reader does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use antiphase_dsp::{BandSmoother, DEFAULT_NUM_BANDS};

use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::session::AudioSession;

/// Monitor polling settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Time between meter reads (16ms = ~60fps)
    pub interval: Duration,

    /// Bands requested from the estimator
    pub num_bands: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(16),
            num_bands: DEFAULT_NUM_BANDS,
        }
    }
}

/// Handle to a running meter monitor thread
pub struct MeterMonitor {
    thread: Option<JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
}

impl MeterMonitor {
    /// Spawn the monitor thread for `session`
    pub fn spawn(session: Arc<AudioSession>, config: MonitorConfig) -> EngineResult<Self> {
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown_flag);

        let thread = thread::Builder::new()
            .name("antiphase-meter".into())
            .spawn(move || Self::monitor_main(session, config, shutdown_clone))
            .map_err(|e| EngineError::ThreadSpawnError(e.to_string()))?;

        Ok(Self {
            thread: Some(thread),
            shutdown_flag,
        })
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    fn monitor_main(session: Arc<AudioSession>, config: MonitorConfig, shutdown: Arc<AtomicBool>) {
        info!(interval_ms = config.interval.as_millis() as u64, "Meter monitor started");

        let mut smoother = BandSmoother::new(config.num_bands);
        let mut was_running = false;

        while !shutdown.load(Ordering::SeqCst) {
            thread::sleep(config.interval);

            if !session.is_running() {
                if was_running {
                    // Let the display fall back to silence on the next start
                    smoother.reset();
                    was_running = false;
                }
                continue;
            }
            was_running = true;

            let level = session.level();
            let bands = session.band_energies(config.num_bands);
            let smoothed = smoother.update(&bands).to_vec();

            session.publish(Event::LevelUpdate { level });
            session.publish(Event::SpectrumUpdate { bands: smoothed });
        }

        debug!("Meter monitor exiting");
    }
}

impl Drop for MeterMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
