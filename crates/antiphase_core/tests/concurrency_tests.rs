//! Concurrency tests for the frame exchange
//!
//! These drive a session from a dedicated "driver" thread while several
//! consumer threads read from it, and check that:
//! - Readers only ever see whole frames (input and output from the same cycle)
//! - The realtime callback stays well inside a frame period
//! - Stop is immediate and idempotent under live delivery
//!
//! No audio hardware is required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use antiphase_core::{
    AudioSession, FrameSource, ProcessingState, SessionConfig, SimulatedDriver,
    SimulatedDriverConfig, SlotIndex, Waveform,
};

const FRAME_SIZE: usize = 1024;

fn running_session(gain: f32) -> Arc<AudioSession> {
    let session = AudioSession::with_config(SessionConfig {
        frame_size: FRAME_SIZE,
        ..Default::default()
    })
    .unwrap();
    session.start(gain);
    Arc::new(session)
}

/// Every sample of frame `k` holds the same value, so a torn read shows up
/// as a frame with more than one distinct input value.
fn frame_value(k: usize) -> f32 {
    ((k % 97) as f32 + 1.0) * 0.01
}

#[test]
fn test_readers_never_observe_torn_frames() {
    let session = running_session(1.0);
    let done = Arc::new(AtomicBool::new(false));

    let driver = {
        let handle = session.frame_handle();
        thread::spawn(move || {
            let mut input = vec![0.0_f32; FRAME_SIZE];
            let mut output = vec![0.0_f32; FRAME_SIZE];
            let mut slot = SlotIndex::Zero;
            for k in 0..3000 {
                input.fill(frame_value(k));
                handle.on_frame_ready(slot, &input, &mut output);
                slot = slot.other();
            }
        })
    };

    let gain_twiddler = {
        let session = Arc::clone(&session);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut step = 0u32;
            while !done.load(Ordering::Relaxed) {
                session.set_gain((step % 5) as f32 * 0.5);
                step += 1;
                thread::yield_now();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checked = 0usize;
                while !done.load(Ordering::Relaxed) {
                    let snap = session.snapshot();
                    let first = snap.input[0];
                    assert!(
                        snap.input.iter().all(|&s| s == first),
                        "torn input in frame {}",
                        snap.frame
                    );
                    for (i, &s) in snap.input.iter().enumerate() {
                        assert_eq!(snap.output[i], s * -snap.gain, "torn output at {i}");
                    }

                    let level = session.level();
                    assert!((0.0..=100.0).contains(&level));
                    let bands = session.spectrum();
                    assert!(bands.iter().all(|b| (0.0..=100.0).contains(b)));
                    checked += 1;
                }
                checked
            })
        })
        .collect();

    driver.join().unwrap();
    done.store(true, Ordering::Relaxed);
    gain_twiddler.join().unwrap();

    let total: usize = readers.into_iter().map(|r| r.join().unwrap()).sum();
    assert!(total > 0);
    assert_eq!(session.frames_processed(), 3000);
}

#[test]
fn test_callback_time_budget() {
    let session = running_session(1.0);
    let handle = session.frame_handle();
    let stop_reader = Arc::new(AtomicBool::new(false));

    // One consumer hammering the lock while the callback runs
    let reader = {
        let session = Arc::clone(&session);
        let stop_reader = Arc::clone(&stop_reader);
        thread::spawn(move || {
            while !stop_reader.load(Ordering::Relaxed) {
                let _ = session.band_energies(32);
            }
        })
    };

    let input: Vec<f32> = (0..FRAME_SIZE).map(|i| (i as f32 * 0.01).sin()).collect();
    let mut output = vec![0.0_f32; FRAME_SIZE];
    let frames = 1000u32;

    let started = Instant::now();
    let mut slot = SlotIndex::Zero;
    for _ in 0..frames {
        handle.on_frame_ready(slot, &input, &mut output);
        slot = slot.other();
    }
    let per_frame = started.elapsed() / frames;

    stop_reader.store(true, Ordering::Relaxed);
    reader.join().unwrap();

    // A 1024-sample frame at 48kHz lasts ~21ms
    let period = session.config().frame_period();
    assert!(
        per_frame < period / 10,
        "callback took {per_frame:?} per frame (period {period:?})"
    );
}

#[test]
fn test_full_scale_sine_reads_near_100() {
    let session = running_session(1.0);
    let input: Vec<f32> = (0..FRAME_SIZE)
        .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 64.0).sin())
        .collect();
    let mut output = vec![0.0_f32; FRAME_SIZE];
    session
        .frame_handle()
        .on_frame_ready(SlotIndex::Zero, &input, &mut output);

    let level = session.level();
    assert!((level - 100.0).abs() < 0.1, "level = {level}");

    for (i, &s) in input.iter().enumerate() {
        assert_eq!(output[i], s * -1.0);
    }
}

#[test]
fn test_loudest_band_reads_100() {
    let session = running_session(1.0);
    let mut input = vec![0.0_f32; FRAME_SIZE];
    // Band 20 of 32 covers samples 640..672
    input[640..672].fill(0.9);
    let mut output = vec![0.0_f32; FRAME_SIZE];
    session
        .frame_handle()
        .on_frame_ready(SlotIndex::One, &input, &mut output);

    let bands = session.spectrum();
    assert_eq!(bands.len(), 32);
    assert_eq!(bands[20], 100.0);
    assert_eq!(bands.iter().filter(|&&b| b == 0.0).count(), 31);
}

#[test]
fn test_stop_under_live_delivery() {
    let session = running_session(1.0);
    let mut driver = SimulatedDriver::new(SimulatedDriverConfig {
        waveform: Waveform::Sine {
            frequency_hz: 1000.0,
            amplitude: 0.5,
        },
        paced: false,
        ..Default::default()
    });
    driver.start(session.frame_handle()).unwrap();
    assert!(session.wait_for_frame(Duration::from_secs(5)));

    assert!(session.stop().success);
    let after_stop = session.frames_processed();
    assert!(session.stop().success);
    assert_eq!(session.state(), ProcessingState::Stopped);

    thread::sleep(Duration::from_millis(30));
    assert_eq!(session.frames_processed(), after_stop);
    assert_eq!(session.level(), 0.0);
    assert!(session.spectrum().iter().all(|&b| b == 0.0));

    // The driver keeps calling; the callbacks are no-ops
    let delivered = driver.frames_delivered();
    thread::sleep(Duration::from_millis(10));
    assert!(driver.frames_delivered() >= delivered);
    driver.stop();

    // A fresh start resumes processing
    session.start(0.5);
    let mut output = vec![0.0_f32; FRAME_SIZE];
    session
        .frame_handle()
        .on_frame_ready(SlotIndex::Zero, &vec![1.0; FRAME_SIZE], &mut output);
    assert_eq!(session.frames_processed(), after_stop + 1);
    assert!(output.iter().all(|&s| s == -0.5));
}
