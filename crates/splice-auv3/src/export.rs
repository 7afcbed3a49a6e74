//! Export macro for AUv3 plugins.

/// Register a plugin with the AUv3 bridge.
///
/// The Objective-C `AUAudioUnit` subclass shipped with the app extension
/// calls the `splice_auv3_*` functions; this macro makes them create
/// instances of `$plugin`.
///
/// # Arguments
///
/// * `$config` - a `static` [`splice_core::PluginConfig`]
/// * `$plugin` - the type implementing [`splice_core::Plugin`]
///
/// # Example
///
/// ```rust,ignore
/// use splice_core::PluginConfig;
/// use splice_auv3::export_auv3;
///
/// static CONFIG: PluginConfig = PluginConfig::new("My Plugin").with_vendor("My Company");
///
/// export_auv3!(CONFIG, MyPlugin);
/// ```
///
/// # Generated Symbols
///
/// ## `__SPLICE_AUV3_INIT` (static)
///
/// A function pointer placed in `__DATA,__mod_init_func` on Apple platforms,
/// so `dyld` registers the factory when the extension binary loads, before
/// the host can call `splice_auv3_create`.
///
/// ## `__splice_auv3_manual_init()` (public function)
///
/// Performs the same registration explicitly. Test binaries don't process
/// `__mod_init_func`, so tests call this instead. Calling it more than once
/// is harmless.
#[macro_export]
macro_rules! export_auv3 {
    ($config:expr, $plugin:ty) => {
        #[used]
        #[cfg_attr(
            any(target_os = "macos", target_os = "ios"),
            link_section = "__DATA,__mod_init_func"
        )]
        static __SPLICE_AUV3_INIT: extern "C" fn() = {
            extern "C" fn __splice_auv3_register() {
                __splice_auv3_manual_init();
            }
            __splice_auv3_register
        };

        #[doc(hidden)]
        pub fn __splice_auv3_manual_init() {
            $crate::factory::register_factory(
                |config| {
                    $crate::PluginWrapper::<$plugin>::new(config)
                        .map(|wrapper| Box::new(wrapper) as Box<dyn $crate::BridgeInstance>)
                },
                &$config,
            );
        }
    };
}
