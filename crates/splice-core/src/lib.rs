//! # splice-core
//!
//! Format-agnostic core of the Splice plugin bridge.
//!
//! This crate holds everything a plugin format layer needs that is not tied
//! to a particular host API:
//!
//! - [`ParameterRegistry`] - parameter catalog and lock-free value store
//! - [`RenderEngine`] - activation lifecycle and sample-accurate rendering
//! - [`state`] - versioned save/load of parameter values and extra state
//! - [`EditorBridge`] - begin/change/end gesture protocol between a UI and
//!   the host
//!
//! ## Main Traits
//!
//! - [`Plugin`] - control-side definition (parameters, processor, editor)
//! - [`Processor`] - real-time DSP
//! - [`Editor`] - UI surface
//! - [`GestureHost`] - host receiver for edit gestures
//!
//! ## Threading
//!
//! Three contexts touch a plugin instance: the render thread (`process`),
//! the control thread (lifecycle, parameter get/set, state) and the UI
//! thread (editor). Parameter values are atomics shared by all three; the
//! render thread never blocks on the others.

pub mod buffer;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod events;
pub mod parameter_format;
pub mod parameter_groups;
pub mod parameter_info;
pub mod parameter_range;
pub mod plugin;
pub mod process_context;
pub mod registry;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use buffer::{AuxBuffer, Buffer, ChannelsMut};
pub use config::PluginConfig;
pub use editor::{EchoGuard, Editor, EditorBridge, EditorContext, GestureHost, ParentWindow};
pub use engine::{
    parameter_queue, ParameterReceiver, ParameterSender, RenderEngine, TailLength,
    PARAMETER_QUEUE_CAPACITY,
};
pub use error::{PluginError, PluginResult};
pub use events::{MidiMessage, ParameterChange, RenderEvent, RenderEventKind};
pub use parameter_format::Formatter;
pub use parameter_groups::{GroupIndex, GroupInfo};
pub use parameter_info::ParameterInfo;
pub use parameter_range::{IntMapper, LinearMapper, LogMapper, ParameterRange, PowerMapper, RangeMapper};
pub use plugin::{Plugin, ProcessStatus, Processor};
pub use process_context::{ProcessContext, ProcessSetup, Transport};
pub use registry::{ParameterRegistry, RegistryBuilder, UNKNOWN_PARAMETER_VALUE};
pub use state::DecodedState;
pub use types::{ParameterAddress, ParameterValue, Size, MAX_CHANNELS, MAX_STRING_LENGTH, PATH_SEPARATOR};
