//! Frame Exchange
//!
//! The synchronization point between the realtime delivery thread and any
//! number of consumer threads.
//!
//! # Locking
//!
//! ```text
//!  driver thread                       consumer threads
//!  ─────────────                       ────────────────
//!  on_frame_ready(slot, in, out)       level_percent() / band_energies(n)
//!    processing? ── no ──▶ return        processing? ── no ──▶ zeros
//!    lock ─────────────────────┐         lock ───────────────────┐
//!    active = slot             │         scan active input       │  O(frame)
//!    load input, invert        │ O(frame)unlock ─────────────────┘
//!    mark ready, notify        │         finish math outside lock
//!    copy output ──────────────┘
//!    unlock
//! ```
//!
//! One `parking_lot::Mutex` guards slot contents, the active slot and the
//! gain, so a reader can never observe a slot halfway through a transform.
//! Every critical section is a fixed-size copy or scan with no nested locks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use antiphase_dsp::{
    accumulate_band_energies, normalize_band_energies, AudioProcessor, Gain, PhaseInverter,
    ProcessContext, RmsAccumulator,
};

use crate::buffer::{FrameBufferPair, SlotIndex};
use crate::config::SessionConfig;
use crate::error::{EngineError, EngineResult};

/// Everything guarded by the exchange lock
struct ExchangeState {
    buffers: FrameBufferPair,
    active: SlotIndex,
    inverter: PhaseInverter,
    context: ProcessContext,
    frames_processed: u64,
}

/// Consistent copy of the active slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub slot: SlotIndex,
    /// Number of frames processed when the copy was taken
    pub frame: u64,
    /// Gain the transform of this frame ran with
    pub gain: f32,
    pub input: Vec<f32>,
    pub output: Vec<f32>,
}

/// Double-buffered frame exchange
pub struct Exchange {
    state: Mutex<ExchangeState>,
    frame_published: Condvar,
    ready: [AtomicBool; 2],
    processing: AtomicBool,
    frame_size: AtomicUsize,
}

impl Exchange {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            state: Mutex::new(ExchangeState {
                buffers: FrameBufferPair::new(config.frame_size),
                active: SlotIndex::Zero,
                inverter: PhaseInverter::new(Gain::new(config.initial_gain)),
                context: ProcessContext::new(config.sample_rate as f32, config.frame_size),
                frames_processed: 0,
            }),
            frame_published: Condvar::new(),
            ready: [AtomicBool::new(false), AtomicBool::new(false)],
            processing: AtomicBool::new(false),
            frame_size: AtomicUsize::new(config.frame_size),
        }
    }

    /// Realtime entry point, called once per frame period by the driver
    ///
    /// # Real-time Safety
    /// - No allocations, no logging
    /// - One lock held for one fixed-size copy + transform + copy
    /// - Never fails; a stopped exchange ignores the call
    ///
    /// `input` is copied into the slot (zero-filled if short) and the
    /// transformed frame is copied back into `output` (common prefix).
    #[inline]
    pub fn on_frame_ready(&self, slot: SlotIndex, input: &[f32], output: &mut [f32]) {
        if !self.processing.load(Ordering::Acquire) {
            return;
        }

        let mut guard = self.state.lock();
        // stop() flips the flag under this lock; once it returns, no frame lands
        if !self.processing.load(Ordering::Relaxed) {
            return;
        }
        let state = &mut *guard;

        state.active = slot;
        let frame = state.buffers.slot_mut(slot);
        frame.load_input(input);
        let (src, dst) = frame.split_mut();
        state.inverter.process(src, dst, &state.context);
        frame.set_applied_gain(state.inverter.gain().value());

        self.ready[slot.index()].store(true, Ordering::Release);
        state.frames_processed += 1;
        self.frame_published.notify_all();

        frame.store_output(output);
    }

    /// Whether the realtime path is armed
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Store a gain and arm the realtime path
    ///
    /// Returns the clamped gain and whether the path was already armed.
    pub(crate) fn arm(&self, gain: f32) -> (f32, bool) {
        let mut state = self.state.lock();
        let gain = Gain::new(gain);
        state.inverter.set_gain(gain);
        let was_armed = self.processing.swap(true, Ordering::AcqRel);
        (gain.value(), was_armed)
    }

    /// Disarm the realtime path; returns whether it was armed
    pub(crate) fn disarm(&self) -> bool {
        let _state = self.state.lock();
        self.processing.swap(false, Ordering::AcqRel)
    }

    /// Clamp and store a gain, effective from the next frame
    pub fn set_gain(&self, value: f32) -> f32 {
        let gain = Gain::new(value);
        self.state.lock().inverter.set_gain(gain);
        gain.value()
    }

    pub fn gain(&self) -> f32 {
        self.state.lock().inverter.gain().value()
    }

    /// Resize (or zero, if the size is unchanged) both slots and clear all readiness
    ///
    /// Note: This may allocate. Fails while the realtime path is armed.
    pub(crate) fn reconfigure(&self, config: &SessionConfig) -> EngineResult<()> {
        let mut state = self.state.lock();
        if self.processing.load(Ordering::Acquire) {
            return Err(EngineError::ReconfigureWhileRunning);
        }

        if state.buffers.frame_size() == config.frame_size {
            state.buffers.clear();
        } else {
            state.buffers.resize(config.frame_size);
        }
        state.active = SlotIndex::Zero;
        state.context = ProcessContext::new(config.sample_rate as f32, config.frame_size);
        for slot in SlotIndex::ALL {
            self.ready[slot.index()].store(false, Ordering::Release);
        }
        self.frame_size.store(config.frame_size, Ordering::Release);
        Ok(())
    }

    /// RMS level of the active input slot, 0-100
    ///
    /// Returns 0 without touching the lock when stopped.
    pub fn level_percent(&self) -> f32 {
        if !self.is_processing() {
            return 0.0;
        }

        let mut acc = RmsAccumulator::new();
        {
            let state = self.state.lock();
            acc.accumulate(state.buffers.slot(state.active).input());
        }
        acc.percent()
    }

    /// Coarse band energies of the active input slot, each 0-100
    ///
    /// Returns `num_bands` zeros without touching the lock when stopped.
    pub fn band_energies(&self, num_bands: usize) -> Vec<f32> {
        let mut out = vec![0.0_f32; num_bands];
        if !self.is_processing() {
            return out;
        }

        let mut energies = vec![0.0_f64; num_bands];
        {
            let state = self.state.lock();
            accumulate_band_energies(state.buffers.slot(state.active).input(), &mut energies);
        }
        normalize_band_energies(&energies, &mut out);
        out
    }

    /// Copy the active slot's input, output and applied gain in one lock
    pub fn snapshot(&self) -> FrameSnapshot {
        let capacity = self.frame_size();
        let mut input = Vec::with_capacity(capacity);
        let mut output = Vec::with_capacity(capacity);

        let state = self.state.lock();
        let frame = state.buffers.slot(state.active);
        input.extend_from_slice(frame.input());
        output.extend_from_slice(frame.output());

        FrameSnapshot {
            slot: state.active,
            frame: state.frames_processed,
            gain: frame.applied_gain(),
            input,
            output,
        }
    }

    /// Block the calling consumer until a new frame is published
    ///
    /// Returns false if `timeout` elapsed first. Never call this from the
    /// realtime thread.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        // None: the timeout is past what an Instant can hold, so wait untimed
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        let seen = state.frames_processed;

        while state.frames_processed == seen {
            match deadline {
                Some(deadline) => {
                    if self
                        .frame_published
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        return state.frames_processed != seen;
                    }
                }
                None => self.frame_published.wait(&mut state),
            }
        }
        true
    }

    pub fn active_slot(&self) -> SlotIndex {
        self.state.lock().active
    }

    /// Whether `slot` holds a fully transformed frame
    pub fn is_slot_ready(&self, slot: SlotIndex) -> bool {
        self.ready[slot.index()].load(Ordering::Acquire)
    }

    pub fn frames_processed(&self) -> u64 {
        self.state.lock().frames_processed
    }

    /// Current frame size, readable without the lock
    pub fn frame_size(&self) -> usize {
        self.frame_size.load(Ordering::Acquire)
    }
}

/// Realtime-side handle handed to the driver
///
/// Exposes only what the delivery thread may call. Cloning is an `Arc`
/// bump; do it before the stream starts, not inside the callback.
#[derive(Clone)]
pub struct FrameHandle {
    exchange: Arc<Exchange>,
}

impl FrameHandle {
    pub(crate) fn new(exchange: Arc<Exchange>) -> Self {
        Self { exchange }
    }

    /// See [`Exchange::on_frame_ready`]
    #[inline]
    pub fn on_frame_ready(&self, slot: SlotIndex, input: &[f32], output: &mut [f32]) {
        self.exchange.on_frame_ready(slot, input, output);
    }

    pub fn frame_size(&self) -> usize {
        self.exchange.frame_size()
    }

    pub fn is_processing(&self) -> bool {
        self.exchange.is_processing()
    }
}
