//! Core plugin trait definitions.
//!
//! A plugin is split along execution contexts:
//!
//! - **[`Plugin`]** (control context): describes the parameter catalog,
//!   creates processors and editors, owns non-parameter state. It lives for
//!   the whole instance and is never touched by the render thread.
//!
//! - **[`Processor`]** (render context): created on `activate` with the real
//!   sample rate and block size, dropped on `deactivate`. Everything it does
//!   must be allocation-free and non-blocking.
//!
//! Parameter values are not owned by either side; both read them from the
//! shared [`ParameterRegistry`](crate::registry::ParameterRegistry).

use crate::buffer::{AuxBuffer, Buffer};
use crate::editor::Editor;
use crate::error::PluginResult;
use crate::events::{MidiMessage, ParameterChange};
use crate::process_context::{ProcessContext, ProcessSetup};
use crate::registry::RegistryBuilder;

// =============================================================================
// Processor
// =============================================================================

/// What the processor reports after rendering a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessStatus {
    /// Output stops as soon as input is silent.
    #[default]
    Normal,
    /// Output continues for this many frames after input silence.
    Tail(u32),
    /// Output may continue indefinitely (generators, self-oscillation).
    KeepAlive,
}

/// Real-time audio processor.
///
/// # Real-Time Safety
///
/// Every method runs on the render thread. Implementations must not
/// allocate, lock, perform I/O or panic.
pub trait Processor: Send + 'static {
    /// Render the current segment in place.
    ///
    /// `buffer` holds the input on entry and receives the output. Parameter
    /// values read through `context.parameters` are the values in effect for
    /// the whole segment; the engine splits the block wherever automation
    /// changes a value.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        aux: Option<&AuxBuffer>,
        context: &ProcessContext,
    ) -> ProcessStatus;

    /// A parameter changed at the current segment boundary, either by
    /// automation or, at the start of a block, by a control or editor write.
    fn parameter_changed(&mut self, _change: ParameterChange) {}

    /// A MIDI message at `sample_offset` within the block.
    fn midi(&mut self, _sample_offset: usize, _message: MidiMessage) {}

    /// Clear delay lines, envelopes and other signal history.
    fn reset(&mut self) {}
}

// =============================================================================
// Plugin
// =============================================================================

/// Control-side plugin definition.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// pub struct GainPlugin;
///
/// impl Plugin for GainPlugin {
///     type Processor = GainProcessor;
///
///     fn parameters(&self) -> RegistryBuilder {
///         ParameterRegistry::builder().parameter(GAIN_INFO)
///     }
///
///     fn create_processor(&mut self, setup: ProcessSetup) -> PluginResult<GainProcessor> {
///         Ok(GainProcessor::new(setup.sample_rate))
///     }
/// }
/// ```
pub trait Plugin: Default + Send + 'static {
    /// The render-side processor type.
    type Processor: Processor;

    /// Describe the parameter catalog.
    ///
    /// Called once per instance; the result must be identical across
    /// instances of the same plugin version, since addresses and identifiers
    /// are persisted by hosts.
    fn parameters(&self) -> RegistryBuilder;

    /// Create a processor for a newly activated session.
    fn create_processor(&mut self, setup: ProcessSetup) -> PluginResult<Self::Processor>;

    /// Create the editor surface, `None` for plugins without an editor.
    fn create_editor(&mut self) -> Option<Box<dyn Editor>> {
        None
    }

    /// Non-parameter state to persist alongside parameter values.
    fn save_extra(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore non-parameter state saved by [`Plugin::save_extra`].
    fn load_extra(&mut self, _extra: serde_json::Value) -> PluginResult<()> {
        Ok(())
    }
}
