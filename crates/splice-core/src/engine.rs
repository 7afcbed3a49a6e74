//! Render engine: lifecycle state machine and sample-accurate event dispatch.
//!
//! # State Transitions
//!
//! ```text
//! Created --[activate]--> Active --[deactivate]--> Deactivated
//!                           ^                           |
//!                           +--------[activate]---------+
//! ```
//!
//! `activate` while already active is rejected without touching the running
//! processor. `deactivate` in any non-active state is a no-op.
//!
//! # Sample Accuracy
//!
//! `process` walks the host's event stream once, lazily. Before applying an
//! event at offset `o` it renders `[cursor, o)` with the values in effect so
//! far, so samples before an offset hear the old value and samples at or
//! after it hear the new one:
//!
//! ```text
//! block:   |---- seg 0 ----|-- seg 1 --|------- seg 2 -------|
//! events:                  ^ gain=0.2  ^ gain=0.8
//! ```
//!
//! # Real-Time Safety
//!
//! `process` never allocates, locks, logs or panics. Contract violations
//! (inactive engine, oversized block, wrong channel count) silence the
//! output instead of failing.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::buffer::{AuxBuffer, Buffer};
use crate::error::{PluginError, PluginResult};
use crate::events::{ParameterChange, RenderEvent, RenderEventKind};
use crate::plugin::{ProcessStatus, Processor};
use crate::process_context::{ProcessContext, ProcessSetup, Transport};
use crate::registry::ParameterRegistry;

/// Capacity of the control/UI to render parameter queue.
pub const PARAMETER_QUEUE_CAPACITY: usize = 10 * 1024;

// =============================================================================
// Out-of-band parameter queue
// =============================================================================

/// Create the queue that carries control and editor writes to the processor.
pub fn parameter_queue(capacity: usize) -> (ParameterSender, ParameterReceiver) {
    let (producer, consumer) = rtrb::RingBuffer::new(capacity);
    (
        ParameterSender {
            producer: Mutex::new(producer),
        },
        ParameterReceiver { consumer },
    )
}

/// Sending half, shared by the control and UI contexts.
///
/// The mutex only serializes the non-real-time writers; the render thread
/// owns the receiving half and never touches this lock.
pub struct ParameterSender {
    producer: Mutex<rtrb::Producer<ParameterChange>>,
}

impl ParameterSender {
    /// Queue a change for the processor. Returns `false` if it was dropped.
    ///
    /// A dropped change is not lost for rendering: the value is already in
    /// the registry; only the processor's change notification is skipped.
    pub fn send(&self, change: ParameterChange) -> bool {
        let Ok(mut producer) = self.producer.lock() else {
            return false;
        };
        match producer.push(change) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("Parameter queue full, dropping notification for {}", change.index);
                false
            }
        }
    }
}

/// Receiving half, owned by the render engine.
pub struct ParameterReceiver {
    consumer: rtrb::Consumer<ParameterChange>,
}

impl ParameterReceiver {
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<ParameterChange> {
        self.consumer.pop().ok()
    }

    fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

// =============================================================================
// Tail length
// =============================================================================

/// Tail length in seconds, readable from any thread without the engine lock.
#[derive(Debug, Default)]
pub struct TailLength(AtomicU64);

impl TailLength {
    pub fn seconds(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, seconds: f64) {
        self.0.store(seconds.to_bits(), Ordering::Release);
    }

    fn store_status(&self, status: ProcessStatus, sample_rate: f64) {
        self.store(match status {
            ProcessStatus::Normal => 0.0,
            ProcessStatus::Tail(frames) => frames as f64 / sample_rate,
            ProcessStatus::KeepAlive => f64::INFINITY,
        });
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Lifecycle states.
enum EngineState<P> {
    Created,
    Active { processor: P, setup: ProcessSetup },
    Deactivated,
}

/// Owns the processor and drives it block by block.
pub struct RenderEngine<P: Processor> {
    state: EngineState<P>,
    registry: Arc<ParameterRegistry>,
    pending: ParameterReceiver,
    tail: Arc<TailLength>,
}

impl<P: Processor> RenderEngine<P> {
    pub fn new(
        registry: Arc<ParameterRegistry>,
        pending: ParameterReceiver,
        tail: Arc<TailLength>,
    ) -> Self {
        Self {
            state: EngineState::Created,
            registry,
            pending,
            tail,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EngineState::Active { .. })
    }

    /// Setup of the running session.
    pub fn setup(&self) -> Option<ProcessSetup> {
        match &self.state {
            EngineState::Active { setup, .. } => Some(*setup),
            _ => None,
        }
    }

    pub fn processor(&self) -> Option<&P> {
        match &self.state {
            EngineState::Active { processor, .. } => Some(processor),
            _ => None,
        }
    }

    /// Transition Created/Deactivated → Active.
    ///
    /// `create` is only called once the state and setup have been checked.
    pub fn activate(
        &mut self,
        setup: ProcessSetup,
        create: impl FnOnce(ProcessSetup) -> PluginResult<P>,
    ) -> PluginResult<()> {
        if self.is_active() {
            return Err(PluginError::InvalidState(
                "activate called while already active".to_string(),
            ));
        }
        if !setup.sample_rate.is_finite() || setup.sample_rate <= 0.0 {
            return Err(PluginError::InvalidConfiguration(format!(
                "sample rate must be positive, got {}",
                setup.sample_rate
            )));
        }
        if setup.max_block_size == 0 {
            return Err(PluginError::InvalidConfiguration(
                "maximum block size must be non-zero".to_string(),
            ));
        }

        let processor = create(setup)?;

        // The new processor reads current values from the registry, so
        // notifications queued while inactive are stale.
        self.pending.clear();
        self.tail.store(0.0);
        self.state = EngineState::Active { processor, setup };

        log::debug!(
            "Engine activated: {} Hz, max block {}, {} channels",
            setup.sample_rate,
            setup.max_block_size,
            setup.channels
        );
        Ok(())
    }

    /// Transition Active → Deactivated, dropping the processor. No-op otherwise.
    pub fn deactivate(&mut self) {
        if let EngineState::Active { .. } = self.state {
            self.state = EngineState::Deactivated;
            self.tail.store(0.0);
            log::debug!("Engine deactivated");
        }
    }

    /// Clear the processor's signal history.
    pub fn reset(&mut self) {
        if let EngineState::Active { processor, .. } = &mut self.state {
            processor.reset();
        }
    }

    /// Render one block in place, applying `events` at their offsets.
    ///
    /// `buffer` must already contain the input. Events are expected in
    /// non-decreasing offset order; offsets that go backwards are treated as
    /// the current position, negative offsets as 0 and offsets past the end
    /// as the end of the block.
    pub fn process<I>(
        &mut self,
        buffer: &mut Buffer,
        mut aux: Option<&mut AuxBuffer>,
        transport: Transport,
        events: I,
    ) where
        I: IntoIterator<Item = RenderEvent>,
    {
        let EngineState::Active { processor, setup } = &mut self.state else {
            buffer.silence();
            return;
        };

        let frames = buffer.block_frames();
        if frames > setup.max_block_size || buffer.num_channels() != setup.channels as usize {
            buffer.silence();
            return;
        }

        while let Some(change) = self.pending.pop() {
            processor.parameter_changed(change);
        }

        let context = ProcessContext {
            sample_rate: setup.sample_rate,
            transport,
            parameters: &self.registry,
        };

        let mut cursor = 0;
        let mut status = None;

        for event in events {
            let offset = usize::try_from(event.sample_offset.max(0))
                .unwrap_or(usize::MAX)
                .clamp(cursor, frames);

            if offset > cursor {
                status = Some(render_segment(
                    processor,
                    buffer,
                    aux.as_deref_mut(),
                    &context,
                    cursor..offset,
                ));
                cursor = offset;
            }

            match event.kind {
                RenderEventKind::ParameterValue { address, value } => {
                    if let Some((index, value)) = self.registry.set(address, value) {
                        processor.parameter_changed(ParameterChange::immediate(index, value));
                    }
                }
                RenderEventKind::ParameterRamp {
                    address,
                    value,
                    duration_frames,
                } => {
                    if let Some((index, value)) = self.registry.set(address, value) {
                        processor.parameter_changed(ParameterChange {
                            index,
                            value,
                            ramp_frames: duration_frames,
                        });
                    }
                }
                RenderEventKind::Midi(message) => processor.midi(offset, message),
            }
        }

        if cursor < frames {
            status = Some(render_segment(
                processor,
                buffer,
                aux.as_deref_mut(),
                &context,
                cursor..frames,
            ));
        }

        buffer.set_window(0..frames);
        if let Some(status) = status {
            self.tail.store_status(status, setup.sample_rate);
        }
    }
}

#[inline]
fn render_segment<P: Processor>(
    processor: &mut P,
    buffer: &mut Buffer,
    aux: Option<&mut AuxBuffer>,
    context: &ProcessContext,
    window: Range<usize>,
) -> ProcessStatus {
    buffer.set_window(window.clone());
    match aux {
        Some(aux) => {
            aux.set_window(window);
            processor.process(buffer, Some(aux), context)
        }
        None => processor.process(buffer, None, context),
    }
}
