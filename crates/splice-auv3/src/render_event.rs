//! AU render event list decoding.
//!
//! The host passes `realtimeEventListHead`, a singly linked list of
//! `AURenderEvent` unions ordered by sample time. [`EventIterator`] walks it
//! lazily and yields [`RenderEvent`]s, skipping event types the engine has no
//! variant for (SysEx, MIDI 2.0 event lists).

use splice_core::{MidiMessage, RenderEvent};

// =============================================================================
// AU Render Event Types (layouts match AudioToolbox/AUAudioUnit.h)
// =============================================================================

/// `AURenderEventType` discriminants.
pub mod event_type {
    pub const PARAMETER: u8 = 1;
    pub const PARAMETER_RAMP: u8 = 2;
    pub const MIDI: u8 = 8;
    pub const MIDI_SYSEX: u8 = 9;
    pub const MIDI_EVENT_LIST: u8 = 10;
}

/// Common prefix of every render event.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AURenderEventHeader {
    pub next: *const AURenderEvent,
    pub event_sample_time: i64,
    /// Kept as a raw byte; hosts may send types this crate doesn't know.
    pub event_type: u8,
    pub reserved: u8,
}

/// Parameter change, immediate or ramped.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AUParameterEvent {
    pub next: *const AURenderEvent,
    pub event_sample_time: i64,
    pub event_type: u8,
    pub reserved: [u8; 3],
    /// 0 for immediate changes.
    pub ramp_duration_sample_frames: u32,
    pub parameter_address: u64,
    pub value: f32,
}

/// MIDI 1.0 short message.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AUMIDIEvent {
    pub next: *const AURenderEvent,
    pub event_sample_time: i64,
    pub event_type: u8,
    pub reserved: u8,
    pub length: u16,
    pub cable: u8,
    pub data: [u8; 3],
}

/// AU render event union. Read `header.event_type` to pick the variant.
#[repr(C)]
#[derive(Clone, Copy)]
pub union AURenderEvent {
    pub header: AURenderEventHeader,
    pub parameter: AUParameterEvent,
    pub midi: AUMIDIEvent,
}

// =============================================================================
// Iterator
// =============================================================================

/// Lazy iterator over a host event list.
pub struct EventIterator {
    next_event: *const AURenderEvent,
}

impl EventIterator {
    /// # Safety
    ///
    /// `first_event` must be null or point to a valid, null-terminated event
    /// list that stays alive and unmodified while the iterator is used.
    pub unsafe fn new(first_event: *const AURenderEvent) -> Self {
        Self {
            next_event: first_event,
        }
    }
}

impl Iterator for EventIterator {
    type Item = RenderEvent;

    fn next(&mut self) -> Option<RenderEvent> {
        while !self.next_event.is_null() {
            // SAFETY: non-null and valid per the constructor contract; the
            // header prefix is shared by every variant.
            let event = unsafe { &*self.next_event };
            // SAFETY: every variant starts with the header layout.
            let header = unsafe { event.header };
            self.next_event = header.next;

            match header.event_type {
                event_type::PARAMETER => {
                    // SAFETY: the type tag selects the parameter layout.
                    let parameter = unsafe { event.parameter };
                    return Some(RenderEvent::parameter(
                        header.event_sample_time,
                        parameter.parameter_address,
                        parameter.value,
                    ));
                }
                event_type::PARAMETER_RAMP => {
                    // SAFETY: the type tag selects the parameter layout.
                    let parameter = unsafe { event.parameter };
                    return Some(RenderEvent::ramp(
                        header.event_sample_time,
                        parameter.parameter_address,
                        parameter.value,
                        parameter.ramp_duration_sample_frames,
                    ));
                }
                event_type::MIDI => {
                    // SAFETY: the type tag selects the MIDI layout.
                    let midi = unsafe { event.midi };
                    if midi.length == 0 {
                        continue;
                    }
                    return Some(RenderEvent::midi(
                        header.event_sample_time,
                        MidiMessage {
                            cable: midi.cable,
                            data: midi.data,
                            length: midi.length.min(3) as u8,
                        },
                    ));
                }
                _ => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::RenderEventKind;
    use std::ptr;

    fn parameter(event_type: u8, time: i64, address: u64, value: f32, ramp: u32) -> AURenderEvent {
        AURenderEvent {
            parameter: AUParameterEvent {
                next: ptr::null(),
                event_sample_time: time,
                event_type,
                reserved: [0; 3],
                ramp_duration_sample_frames: ramp,
                parameter_address: address,
                value,
            },
        }
    }

    fn midi(time: i64, data: [u8; 3], length: u16) -> AURenderEvent {
        AURenderEvent {
            midi: AUMIDIEvent {
                next: ptr::null(),
                event_sample_time: time,
                event_type: event_type::MIDI,
                reserved: 0,
                length,
                cable: 1,
                data,
            },
        }
    }

    /// Link events in order and return the head.
    fn link(events: &mut [AURenderEvent]) -> *const AURenderEvent {
        for i in (0..events.len().saturating_sub(1)).rev() {
            let next: *const AURenderEvent = &events[i + 1];
            unsafe { events[i].header.next = next };
        }
        events.first().map_or(ptr::null(), |e| e as *const _)
    }

    #[test]
    fn test_decodes_supported_kinds() {
        let mut events = [
            parameter(event_type::PARAMETER, 3, 10, 0.5, 0),
            parameter(event_type::PARAMETER_RAMP, 7, 11, 0.25, 32),
            midi(9, [0x90, 64, 127], 3),
        ];
        let head = link(&mut events);
        let decoded: Vec<_> = unsafe { EventIterator::new(head) }.collect();

        assert_eq!(
            decoded,
            vec![
                RenderEvent::parameter(3, 10, 0.5),
                RenderEvent::ramp(7, 11, 0.25, 32),
                RenderEvent::midi(
                    9,
                    MidiMessage {
                        cable: 1,
                        data: [0x90, 64, 127],
                        length: 3
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_skips_unsupported_kinds() {
        let mut sysex = midi(2, [0xF0, 0, 0], 3);
        unsafe { sysex.header.event_type = event_type::MIDI_SYSEX };
        let mut list = midi(3, [0; 3], 0);
        unsafe { list.header.event_type = event_type::MIDI_EVENT_LIST };

        let mut events = [
            sysex,
            list,
            midi(4, [0x80, 60, 0], 0),
            parameter(77, 5, 1, 1.0, 0),
            parameter(event_type::PARAMETER, 6, 1, 1.0, 0),
        ];
        let head = link(&mut events);
        let decoded: Vec<_> = unsafe { EventIterator::new(head) }.collect();

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].sample_offset, 6);
        assert!(matches!(decoded[0].kind, RenderEventKind::ParameterValue { address: 1, .. }));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(unsafe { EventIterator::new(ptr::null()) }.count(), 0);
    }
}
