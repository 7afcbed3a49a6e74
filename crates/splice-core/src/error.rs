//! Error types for the Splice bridge.
//!
//! Errors only ever travel on control paths (activation, state I/O, editor
//! setup, registry construction). The render path has no error channel: any
//! anomaly there degrades to silence or to the last known value.

use std::fmt;
use std::io;

/// Errors that can occur in Splice plugins.
#[derive(Debug)]
pub enum PluginError {
    /// Invalid plugin description or setup (duplicate addresses, bad sample rate).
    InvalidConfiguration(String),
    /// Operation not allowed in the current lifecycle state.
    InvalidState(String),
    /// Saved state could not be decoded.
    StateError(String),
    /// Byte stream failure while saving or loading state.
    Io(io::Error),
    /// Editor could not be opened.
    EditorError(String),
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::StateError(msg) => write!(f, "State error: {}", msg),
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::EditorError(msg) => write!(f, "Editor error: {}", msg),
        }
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PluginError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result type for Splice operations.
pub type PluginResult<T> = Result<T, PluginError>;
