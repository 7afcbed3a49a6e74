//! Shared plugin configuration.
//!
//! Static, process-wide plugin metadata. Capability queries that the host
//! makes without an instance (`has_aux_bus`, `preferred_editor_size`) are
//! answered from this struct, which is registered once together with the
//! plugin factory.
//!
//! # Example
//!
//! ```ignore
//! use splice_core::{PluginConfig, Size};
//!
//! pub static CONFIG: PluginConfig = PluginConfig::new("My Plugin")
//!     .with_vendor("My Company")
//!     .with_version("1.0.0")
//!     .with_aux_bus()
//!     .with_editor(Size::new(480.0, 320.0));
//! ```

use crate::types::{Size, MAX_CHANNELS};

/// Format-agnostic plugin configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Plugin name displayed in the DAW.
    pub name: &'static str,

    /// Vendor/company name.
    pub vendor: &'static str,

    /// Plugin version string.
    pub version: &'static str,

    /// Channel count of the main bus (input and output).
    pub channels: u32,

    /// Whether the plugin consumes an auxiliary (sidechain) input bus.
    pub has_aux_bus: bool,

    /// Preferred editor size. `None` for plugins without an editor.
    pub editor_size: Option<Size>,
}

impl PluginConfig {
    /// Create a new stereo plugin configuration with default values.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            vendor: "Unknown Vendor",
            version: "1.0.0",
            channels: 2,
            has_aux_bus: false,
            editor_size: None,
        }
    }

    /// Set the vendor name.
    pub const fn with_vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = vendor;
        self
    }

    /// Set the version string.
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Set the main bus channel count (clamped to `1..=MAX_CHANNELS`).
    pub const fn with_channels(mut self, channels: u32) -> Self {
        self.channels = if channels == 0 {
            1
        } else if channels as usize > MAX_CHANNELS {
            MAX_CHANNELS as u32
        } else {
            channels
        };
        self
    }

    /// Declare an auxiliary input bus.
    pub const fn with_aux_bus(mut self) -> Self {
        self.has_aux_bus = true;
        self
    }

    /// Enable the editor with a preferred size.
    pub const fn with_editor(mut self, size: Size) -> Self {
        self.editor_size = Some(size);
        self
    }

    /// Preferred editor size, `(0, 0)` when the plugin has no editor.
    pub const fn preferred_editor_size(&self) -> Size {
        match self.editor_size {
            Some(size) => size,
            None => Size::new(0.0, 0.0),
        }
    }
}
