//! Timed render events.
//!
//! Hosts deliver events as a linked list ordered by sample offset. Format
//! layers decode that list lazily into [`RenderEvent`]s; the engine consumes
//! them as an iterator without ever materializing the list.
//!
//! # Event Kinds
//!
//! The set of kinds is closed:
//!
//! - [`RenderEventKind::ParameterValue`] - immediate change at the offset
//! - [`RenderEventKind::ParameterRamp`] - change toward a target; the target
//!   is stored at the offset and the ramp length is forwarded to the
//!   processor so it can glide
//! - [`RenderEventKind::Midi`] - short (up to three byte) MIDI message
//!
//! New kinds are added here as variants and handled in
//! `RenderEngine::process`. Host event types without a variant are
//! skipped by the decoder.

use crate::types::{ParameterAddress, ParameterValue};

/// A host event at a sample offset within the current block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderEvent {
    /// Offset from the start of the block. Negative offsets are treated as 0.
    pub sample_offset: i64,
    pub kind: RenderEventKind,
}

impl RenderEvent {
    pub const fn parameter(sample_offset: i64, address: ParameterAddress, value: ParameterValue) -> Self {
        Self {
            sample_offset,
            kind: RenderEventKind::ParameterValue { address, value },
        }
    }

    pub const fn ramp(
        sample_offset: i64,
        address: ParameterAddress,
        value: ParameterValue,
        duration_frames: u32,
    ) -> Self {
        Self {
            sample_offset,
            kind: RenderEventKind::ParameterRamp {
                address,
                value,
                duration_frames,
            },
        }
    }

    pub const fn midi(sample_offset: i64, message: MidiMessage) -> Self {
        Self {
            sample_offset,
            kind: RenderEventKind::Midi(message),
        }
    }
}

/// Payload of a [`RenderEvent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderEventKind {
    ParameterValue {
        address: ParameterAddress,
        value: ParameterValue,
    },
    ParameterRamp {
        address: ParameterAddress,
        value: ParameterValue,
        duration_frames: u32,
    },
    Midi(MidiMessage),
}

/// Short MIDI message as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    pub cable: u8,
    pub data: [u8; 3],
    /// Number of valid bytes in `data` (1 to 3).
    pub length: u8,
}

impl MidiMessage {
    pub fn bytes(&self) -> &[u8] {
        &self.data[..(self.length as usize).min(3)]
    }
}

/// A parameter value change delivered to the processor.
///
/// Carries the registry index rather than the address, so processors can
/// index their own per-parameter state directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub index: usize,
    /// Quantized normalized value now stored in the registry.
    pub value: ParameterValue,
    /// Frames over which the host asked for the change to glide. 0 = jump.
    pub ramp_frames: u32,
}

impl ParameterChange {
    pub const fn immediate(index: usize, value: ParameterValue) -> Self {
        Self {
            index,
            value,
            ramp_frames: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_bytes_respect_length() {
        let message = MidiMessage {
            cable: 0,
            data: [0xC0, 5, 0],
            length: 2,
        };
        assert_eq!(message.bytes(), &[0xC0, 5]);

        let oversized = MidiMessage { length: 9, ..message };
        assert_eq!(oversized.bytes().len(), 3);
    }
}
