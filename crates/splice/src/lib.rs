//! # Splice
//!
//! AUv3 plugin bridge for Rust.
//!
//! Splice connects an Objective-C `AUAudioUnit` subclass to a plugin written
//! in Rust: the host talks to the Objective-C shell, the shell calls the
//! `splice_auv3_*` C functions, and those drive your [`Plugin`](prelude::Plugin).
//!
//! ## Architecture
//!
//! ```text
//! Your Plugin (implements Plugin + Processor)
//!        ↓
//! PluginWrapper<P> (registry, render engine, state, editor bridge)
//!        ↓
//! C-ABI bridge (splice_auv3.h)
//!        ↓
//! AUAudioUnit subclass
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use splice::prelude::*;
//!
//! const GAIN: ParameterAddress = 0;
//!
//! #[derive(Default)]
//! struct MyGain;
//!
//! struct MyGainProcessor;
//!
//! impl Processor for MyGainProcessor {
//!     fn process(&mut self, buffer: &mut Buffer, _aux: Option<&AuxBuffer>, context: &ProcessContext) -> ProcessStatus {
//!         let gain = context.parameters.get(GAIN);
//!         for channel in buffer.channels_mut() {
//!             channel.iter_mut().for_each(|s| *s *= gain);
//!         }
//!         ProcessStatus::Normal
//!     }
//! }
//!
//! impl Plugin for MyGain {
//!     type Processor = MyGainProcessor;
//!
//!     fn parameters(&self) -> RegistryBuilder {
//!         ParameterRegistry::builder().parameter(ParameterInfo::new(GAIN, "gain", "Gain"))
//!     }
//!
//!     fn create_processor(&mut self, _setup: ProcessSetup) -> PluginResult<MyGainProcessor> {
//!         Ok(MyGainProcessor)
//!     }
//! }
//!
//! static CONFIG: PluginConfig = PluginConfig::new("MyGain").with_vendor("My Company");
//! export_auv3!(CONFIG, MyGain);
//! ```

// Re-export sub-crates
pub use splice_auv3 as auv3;
pub use splice_core as core;

/// Prelude module for convenient imports.
///
/// Import everything you need to build a plugin:
/// ```rust,ignore
/// use splice::prelude::*;
/// ```
pub mod prelude {
    pub use splice_core::{
        // Buffer types
        AuxBuffer, Buffer,
        // Traits
        Editor, GestureHost, Plugin, Processor,
        // Configuration
        PluginConfig, ProcessSetup,
        // Editor types
        EditorContext, ParentWindow,
        // Parameter types
        Formatter, GroupIndex, GroupInfo, ParameterAddress, ParameterInfo, ParameterRange,
        ParameterRegistry, ParameterValue, RegistryBuilder,
        // Events
        MidiMessage, ParameterChange,
        // Process context and transport
        ProcessContext, ProcessStatus, Transport,
        // Error types
        PluginError, PluginResult,
        // Geometry
        Size,
    };

    // AUv3 export
    pub use splice_auv3::export_auv3;
}
