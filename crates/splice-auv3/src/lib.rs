//! # splice-auv3
//!
//! AUv3 layer of the Splice bridge: a flat C ABI (`splice_auv3_*`, declared
//! in `include/splice_auv3.h`) that an Objective-C `AUAudioUnit` subclass
//! calls to drive a Rust plugin.
//!
//! It handles:
//!
//! - Factory registration (`export_auv3!`) and instance handles
//! - Decoding the host's `AURenderEvent` list
//! - Out-of-place buffer copies and sidechain input
//! - Parameter catalog queries and display strings
//! - State persistence over host stream callbacks
//! - Editor lifecycle and gesture callbacks
//!
//! ## Architecture
//!
//! ```text
//! User Plugin (implements splice_core::Plugin)
//!        ↓
//! PluginWrapper<P> (generic wrapper)
//!        ↓
//! Arc<dyn BridgeInstance> (type erasure, handle table)
//!        ↓
//! C-ABI bridge (src/bridge.rs ↔ include/splice_auv3.h)
//!        ↓
//! AUAudioUnit subclass (app extension)
//!        ↓
//! AU host
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splice_core::PluginConfig;
//! use splice_auv3::export_auv3;
//!
//! static CONFIG: PluginConfig = PluginConfig::new("My Plugin").with_vendor("My Company");
//!
//! export_auv3!(CONFIG, MyPlugin);
//! ```
//!
//! ## Real-Time Safety
//!
//! `splice_auv3_process` never allocates or blocks: the handle table is read
//! with `try_read`, the engine is taken with `try_lock`, and either failing
//! yields a silent block.
//!
//! The crate builds on every platform so the bridge can be tested off-device;
//! only the load-time registration is Apple specific.

pub mod bridge;
pub mod export;
pub mod factory;
pub mod handles;
pub mod host;
pub mod instance;
pub mod io;
pub mod render_event;
pub mod wrapper;

pub use bridge::{SpliceParameterGroupInfo, SpliceParameterInfo, SPLICE_AUV3_MAX_STRING_LENGTH};
pub use host::CallbackGestureHost;
pub use instance::BridgeInstance;
pub use io::{CallbackReader, CallbackWriter};
pub use render_event::{AUMIDIEvent, AUParameterEvent, AURenderEvent, AURenderEventHeader, EventIterator};
pub use wrapper::PluginWrapper;

// Re-export core types used by the export macro and plugin code
pub use splice_core::{Plugin, PluginConfig};
