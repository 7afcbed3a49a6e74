//! Type-erased plugin instance.
//!
//! The C surface is a fixed set of functions that must work for whatever
//! plugin the binary exports. [`BridgeInstance`] captures every operation
//! they need so instances can live in the handle table as
//! `Arc<dyn BridgeInstance>`.
//!
//! Implemented by [`PluginWrapper<P>`](crate::PluginWrapper) for any
//! `P: Plugin`; plugin authors don't implement it.
//!
//! Every method takes `&self`: one instance is reached concurrently from the
//! render, control and UI threads, each guarding its own state.

use std::io::{Read, Write};

use splice_core::{
    AuxBuffer, Buffer, GestureHost, ParameterAddress, ParameterRegistry, ParameterValue,
    ParentWindow, PluginResult, RenderEvent, Transport,
};

pub trait BridgeInstance: Send + Sync + 'static {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn activate(&self, sample_rate: f64, max_block_size: usize) -> PluginResult<()>;

    fn deactivate(&self);

    fn reset(&self);

    /// Tail length in seconds; `f64::INFINITY` for "never stops".
    fn tail_length(&self) -> f64;

    // =========================================================================
    // Rendering (render thread)
    // =========================================================================

    /// Render one block in place. Never blocks; silences `buffer` if the
    /// engine is unavailable.
    fn process(
        &self,
        buffer: &mut Buffer,
        aux: Option<&mut AuxBuffer>,
        transport: Transport,
        events: &mut dyn Iterator<Item = RenderEvent>,
    );

    // =========================================================================
    // Parameters
    // =========================================================================

    fn registry(&self) -> &ParameterRegistry;

    /// Host-originated write: stored, then queued for the processor.
    fn set_parameter_value(&self, address: ParameterAddress, value: ParameterValue);

    // =========================================================================
    // State
    // =========================================================================

    fn save_state(&self, writer: &mut dyn Write) -> PluginResult<()>;

    fn load_state(&self, reader: &mut dyn Read) -> PluginResult<()>;

    // =========================================================================
    // Editor
    // =========================================================================

    fn editor_open(
        &self,
        parent: ParentWindow,
        host: Box<dyn GestureHost>,
        scale: f64,
    ) -> PluginResult<()>;

    fn editor_set_scale(&self, scale: f64);

    fn editor_idle(&self);

    fn editor_close(&self);
}
