//! Audio Processor Trait
//!
//! Defines the interface for processors that run inside the realtime
//! frame callback. The exchange drives exactly one processor per frame.

/// Context passed to processors containing stream metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: f32,
    pub frame_size: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: f32, frame_size: usize) -> Self {
        Self {
            sample_rate,
            frame_size,
        }
    }
}

/// Trait for audio processors driven by the frame callback
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - O(n) time complexity where n = frame size
///
/// The caller already holds the exchange lock while `process()` runs, so
/// any extra work here lengthens the critical section seen by readers.
pub trait AudioProcessor: Send {
    /// Read one frame of `input` and write one frame of `output`
    ///
    /// Both slices are mono and of equal length (the configured frame size).
    fn process(&mut self, input: &[f32], output: &mut [f32], context: &ProcessContext);

    /// Reset internal state (delay lines, envelopes, etc.)
    fn reset(&mut self);

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;
}
