//! Common types used throughout the Splice bridge.

// =============================================================================
// Limits
// =============================================================================

/// Maximum number of audio channels per bus.
///
/// Buffers use fixed-size stack storage of this many channel slots, so the
/// render path never allocates. Channels beyond this limit are ignored.
pub const MAX_CHANNELS: usize = 32;

/// Maximum length of any string exchanged with the host, including the
/// null terminator.
pub const MAX_STRING_LENGTH: usize = 100;

/// Joins group and parameter identifiers in serialization paths, so it may
/// not appear inside an identifier.
pub const PATH_SEPARATOR: char = '/';

// =============================================================================
// Identity
// =============================================================================

/// Stable numeric parameter identity used on the real-time path.
pub type ParameterAddress = u64;

/// Normalized parameter value (0.0 to 1.0).
pub type ParameterValue = f32;

/// Editor size in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size multiplied by a display scale factor.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            width: self.width * scale,
            height: self.height * scale,
        }
    }
}
