//! Frame Buffers
//!
//! Two alternating slots, each holding one frame of input and the transformed
//! output. Storage is allocated once per configuration and never grows on the
//! realtime path.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One of the two alternating buffer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotIndex {
    Zero,
    One,
}

impl SlotIndex {
    pub const ALL: [SlotIndex; 2] = [SlotIndex::Zero, SlotIndex::One];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            SlotIndex::Zero => 0,
            SlotIndex::One => 1,
        }
    }

    /// The slot the driver fills next
    #[inline]
    pub fn other(self) -> Self {
        match self {
            SlotIndex::Zero => SlotIndex::One,
            SlotIndex::One => SlotIndex::Zero,
        }
    }
}

impl TryFrom<usize> for SlotIndex {
    type Error = EngineError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SlotIndex::Zero),
            1 => Ok(SlotIndex::One),
            other => Err(EngineError::InvalidSlot(other)),
        }
    }
}

/// One slot: a frame of input, a frame of output, and the gain that produced it
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    input: Vec<f32>,
    output: Vec<f32>,
    applied_gain: f32,
}

impl FrameBuffer {
    pub fn new(frame_size: usize) -> Self {
        Self {
            input: vec![0.0; frame_size],
            output: vec![0.0; frame_size],
            applied_gain: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn input(&self) -> &[f32] {
        &self.input
    }

    pub fn output(&self) -> &[f32] {
        &self.output
    }

    /// Gain the last transform of this slot ran with
    pub fn applied_gain(&self) -> f32 {
        self.applied_gain
    }

    /// Copy a driver block into the input frame
    ///
    /// Copies the common prefix and zero-fills whatever the block did not
    /// cover, so a short block never panics on the realtime path.
    #[inline]
    pub fn load_input(&mut self, samples: &[f32]) {
        let n = samples.len().min(self.input.len());
        self.input[..n].copy_from_slice(&samples[..n]);
        self.input[n..].fill(0.0);
    }

    /// Copy the output frame into a driver block (common prefix only)
    #[inline]
    pub fn store_output(&self, block: &mut [f32]) {
        let n = block.len().min(self.output.len());
        block[..n].copy_from_slice(&self.output[..n]);
    }

    /// Borrow input and output at once for the transform
    #[inline]
    pub fn split_mut(&mut self) -> (&[f32], &mut [f32]) {
        (&self.input, &mut self.output)
    }

    pub(crate) fn set_applied_gain(&mut self, gain: f32) {
        self.applied_gain = gain;
    }

    pub fn clear(&mut self) {
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.applied_gain = 0.0;
    }
}

/// The double buffer: slot 0 and slot 1
#[derive(Debug, Clone)]
pub struct FrameBufferPair {
    slots: [FrameBuffer; 2],
}

impl FrameBufferPair {
    pub fn new(frame_size: usize) -> Self {
        Self {
            slots: [FrameBuffer::new(frame_size), FrameBuffer::new(frame_size)],
        }
    }

    pub fn frame_size(&self) -> usize {
        self.slots[0].len()
    }

    #[inline]
    pub fn slot(&self, slot: SlotIndex) -> &FrameBuffer {
        &self.slots[slot.index()]
    }

    #[inline]
    pub fn slot_mut(&mut self, slot: SlotIndex) -> &mut FrameBuffer {
        &mut self.slots[slot.index()]
    }

    /// Reallocate both slots for a new frame size
    ///
    /// Note: This allocates. Only call while the session is stopped.
    pub fn resize(&mut self, frame_size: usize) {
        self.slots = [FrameBuffer::new(frame_size), FrameBuffer::new(frame_size)];
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}
