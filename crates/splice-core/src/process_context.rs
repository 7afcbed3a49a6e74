//! Transport and process context for audio plugins.
//!
//! [`ProcessContext`] bundles the session setup, the host transport and a
//! view of the parameter registry for one `process` call.
//!
//! # Example: Tempo-Synced LFO
//!
//! ```ignore
//! fn process(&mut self, buffer: &mut Buffer, _aux: Option<&AuxBuffer>, context: &ProcessContext) -> ProcessStatus {
//!     let lfo_hz = match context.transport.tempo {
//!         Some(tempo) => tempo / 60.0 / 4.0, // one cycle per bar of 4/4
//!         None => 2.0,
//!     };
//!     let samples_per_cycle = context.sample_rate / lfo_hz;
//!     // ...
//!     ProcessStatus::Normal
//! }
//! ```

use crate::registry::ParameterRegistry;

/// Host transport and timing information.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transport {
    /// True if the host transport is playing.
    pub is_playing: bool,

    /// Current tempo in BPM, `None` when the host reports no usable tempo.
    pub tempo: Option<f64>,

    /// Timeline position of the first sample of the block.
    pub position_samples: i64,
}

impl Transport {
    /// Build from raw host values. Non-finite or non-positive tempos are dropped.
    pub fn new(is_playing: bool, tempo: f64, position_samples: i64) -> Self {
        Self {
            is_playing,
            tempo: (tempo.is_finite() && tempo > 0.0).then_some(tempo),
            position_samples,
        }
    }
}

/// Session setup fixed between `activate` and `deactivate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSetup {
    pub sample_rate: f64,
    pub max_block_size: usize,
    pub channels: u32,
}

/// Everything a processor can consult while rendering one segment.
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    pub sample_rate: f64,
    pub transport: Transport,
    /// Live parameter values. Reads are wait-free atomics.
    pub parameters: &'a ParameterRegistry,
}
