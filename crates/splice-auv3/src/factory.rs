//! Plugin factory registration.
//!
//! The factory is registered at module initialization time via the
//! `export_auv3!` macro. One plugin per binary.

use std::sync::OnceLock;

use splice_core::{PluginConfig, PluginResult};

use crate::instance::BridgeInstance;

/// Factory function type for creating plugin instances.
pub type PluginFactory = fn(&'static PluginConfig) -> PluginResult<Box<dyn BridgeInstance>>;

struct Registration {
    factory: PluginFactory,
    config: &'static PluginConfig,
}

static REGISTRATION: OnceLock<Registration> = OnceLock::new();

/// Register the factory and configuration.
///
/// Only the first registration takes effect; later ones are logged and
/// ignored (test binaries call the manual initializer more than once).
pub fn register_factory(factory: PluginFactory, config: &'static PluginConfig) {
    if REGISTRATION.set(Registration { factory, config }).is_err() {
        log::warn!(
            "AUv3 factory already registered, ignoring registration of {}",
            config.name
        );
        return;
    }

    log::debug!("AUv3 factory registered: {} ({})", config.name, config.vendor);
}

/// Create a new plugin instance using the registered factory.
///
/// Returns `None` if no factory has been registered or creation failed.
pub fn create_instance() -> Option<Box<dyn BridgeInstance>> {
    let registration = REGISTRATION.get()?;
    match (registration.factory)(registration.config) {
        Ok(instance) => Some(instance),
        Err(e) => {
            log::error!("Failed to create {} instance: {}", registration.config.name, e);
            None
        }
    }
}

/// Get the plugin configuration.
pub fn plugin_config() -> Option<&'static PluginConfig> {
    REGISTRATION.get().map(|r| r.config)
}

/// Check if a factory has been registered.
pub fn is_registered() -> bool {
    REGISTRATION.get().is_some()
}
