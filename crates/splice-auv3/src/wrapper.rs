//! Generic plugin wrapper for type erasure.
//!
//! `PluginWrapper<P>` owns everything one AUv3 instance needs and implements
//! [`BridgeInstance`] for any `P: Plugin`.
//!
//! # Locking
//!
//! | field      | taken by                         | render thread   |
//! |------------|----------------------------------|-----------------|
//! | `registry` | nobody (atomics)                 | reads/writes    |
//! | `engine`   | activate, deactivate, reset      | `try_lock` only |
//! | `plugin`   | activate, state, editor creation | never           |
//! | `editor`   | editor calls                     | never           |
//!
//! Save and load never touch `engine`, so persisting state while audio is
//! running can't glitch the render thread.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use splice_core::state;
use splice_core::{
    parameter_queue, AuxBuffer, Buffer, EchoGuard, EditorBridge, GestureHost, ParameterAddress,
    ParameterChange, ParameterRegistry, ParameterSender, ParameterValue, ParentWindow, Plugin,
    PluginConfig, PluginError, PluginResult, ProcessSetup, RenderEngine, RenderEvent, TailLength,
    Transport, PARAMETER_QUEUE_CAPACITY,
};

use crate::instance::BridgeInstance;

pub struct PluginWrapper<P: Plugin> {
    plugin: Mutex<P>,
    registry: Arc<ParameterRegistry>,
    sender: Arc<ParameterSender>,
    engine: Mutex<RenderEngine<P::Processor>>,
    editor: Mutex<EditorBridge>,
    echo: Arc<EchoGuard>,
    tail: Arc<TailLength>,
    channels: u32,
}

impl<P: Plugin> PluginWrapper<P> {
    /// Create the plugin and build its parameter registry.
    pub fn new(config: &PluginConfig) -> PluginResult<Self> {
        let plugin = P::default();
        let registry = Arc::new(plugin.parameters().build()?);
        let (sender, receiver) = parameter_queue(PARAMETER_QUEUE_CAPACITY);
        let sender = Arc::new(sender);
        let tail = Arc::new(TailLength::default());

        log::debug!(
            "Created {} instance: {} parameters, {} channels",
            config.name,
            registry.parameter_count(),
            config.channels
        );

        let editor = EditorBridge::new(registry.clone(), sender.clone());
        Ok(Self {
            plugin: Mutex::new(plugin),
            engine: Mutex::new(RenderEngine::new(registry.clone(), receiver, tail.clone())),
            echo: editor.echo_guard(),
            editor: Mutex::new(editor),
            registry,
            sender,
            tail,
            channels: config.channels,
        })
    }

    /// Lock the plugin for control-thread access to its own settings.
    pub fn lock_plugin(&self) -> PluginResult<std::sync::MutexGuard<'_, P>> {
        self.plugin
            .lock()
            .map_err(|_| PluginError::InvalidState("plugin lock poisoned".to_string()))
    }
}

impl<P: Plugin> BridgeInstance for PluginWrapper<P> {
    fn activate(&self, sample_rate: f64, max_block_size: usize) -> PluginResult<()> {
        let setup = ProcessSetup {
            sample_rate,
            max_block_size,
            channels: self.channels,
        };
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| PluginError::InvalidState("engine lock poisoned".to_string()))?;
        engine.activate(setup, |setup| self.lock_plugin()?.create_processor(setup))
    }

    fn deactivate(&self) {
        if let Ok(mut engine) = self.engine.lock() {
            engine.deactivate();
        }
    }

    fn reset(&self) {
        if let Ok(mut engine) = self.engine.lock() {
            engine.reset();
        }
    }

    fn tail_length(&self) -> f64 {
        self.tail.seconds()
    }

    fn process(
        &self,
        buffer: &mut Buffer,
        aux: Option<&mut AuxBuffer>,
        transport: Transport,
        events: &mut dyn Iterator<Item = RenderEvent>,
    ) {
        // Contention means a lifecycle call is racing the render thread.
        let Ok(mut engine) = self.engine.try_lock() else {
            buffer.silence();
            return;
        };
        engine.process(buffer, aux, transport, events);
    }

    fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    fn set_parameter_value(&self, address: ParameterAddress, value: ParameterValue) {
        let Some(index) = self.registry.index_of(address) else {
            return;
        };
        // The host applying a change the editor is reporting right now:
        // already stored and queued.
        if self.echo.is_echo(index, value) {
            return;
        }
        if let Some(stored) = self.registry.set_at(index, value) {
            self.sender.send(ParameterChange::immediate(index, stored));
        }
    }

    fn save_state(&self, writer: &mut dyn Write) -> PluginResult<()> {
        let extra = self.lock_plugin()?.save_extra();
        state::save(&self.registry, extra.as_ref(), writer)
    }

    fn load_state(&self, reader: &mut dyn Read) -> PluginResult<()> {
        let decoded = state::decode(&self.registry, reader)?;

        if let Some(extra) = decoded.extra.clone() {
            self.lock_plugin()?.load_extra(extra)?;
        }

        let applied = decoded.apply(&self.registry);
        for &(index, value) in &applied {
            self.sender.send(ParameterChange::immediate(index, value));
        }
        log::debug!("Loaded state: {} parameters applied", applied.len());
        Ok(())
    }

    fn editor_open(
        &self,
        parent: ParentWindow,
        host: Box<dyn GestureHost>,
        scale: f64,
    ) -> PluginResult<()> {
        let surface = self
            .lock_plugin()?
            .create_editor()
            .ok_or_else(|| PluginError::EditorError("plugin has no editor".to_string()))?;
        let mut editor = self
            .editor
            .lock()
            .map_err(|_| PluginError::InvalidState("editor lock poisoned".to_string()))?;
        editor.open(surface, parent, host, scale)
    }

    fn editor_set_scale(&self, scale: f64) {
        if let Ok(mut editor) = self.editor.lock() {
            editor.set_scale(scale);
        }
    }

    fn editor_idle(&self) {
        if let Ok(mut editor) = self.editor.lock() {
            editor.idle();
        }
    }

    fn editor_close(&self) {
        if let Ok(mut editor) = self.editor.lock() {
            editor.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use splice_core::{
        Editor, EditorContext, ParameterInfo, ProcessContext, ProcessStatus, Processor,
        RegistryBuilder,
    };

    static CONFIG: PluginConfig = PluginConfig::new("Wrapper Test");

    const LEVEL: u64 = 7;
    const FRAMES: usize = 16;

    thread_local! {
        static SURFACE_CONTEXT: RefCell<Option<EditorContext>> = const { RefCell::new(None) };
        static SURFACE_UPDATES: RefCell<Vec<(usize, f32)>> = const { RefCell::new(Vec::new()) };
    }

    #[derive(Default)]
    struct MeterPlugin;

    /// Writes the current level to channel 0 and the number of change
    /// notifications received so far to channel 1.
    #[derive(Default)]
    struct MeterProcessor {
        notifications: u32,
    }

    impl Processor for MeterProcessor {
        fn process(
            &mut self,
            buffer: &mut Buffer,
            _aux: Option<&AuxBuffer>,
            context: &ProcessContext,
        ) -> ProcessStatus {
            let level = context.parameters.get(LEVEL);
            buffer.channel(0).fill(level);
            buffer.channel(1).fill(self.notifications as f32);
            ProcessStatus::KeepAlive
        }

        fn parameter_changed(&mut self, _change: ParameterChange) {
            self.notifications += 1;
        }
    }

    struct MeterSurface;

    impl Editor for MeterSurface {
        fn open(&mut self, _parent: ParentWindow, _scale: f64, context: EditorContext) -> PluginResult<()> {
            SURFACE_CONTEXT.with(|slot| *slot.borrow_mut() = Some(context));
            Ok(())
        }

        fn parameter_changed(&mut self, index: usize, value: f32) {
            SURFACE_UPDATES.with(|updates| updates.borrow_mut().push((index, value)));
        }

        fn close(&mut self) {}
    }

    impl Plugin for MeterPlugin {
        type Processor = MeterProcessor;

        fn parameters(&self) -> RegistryBuilder {
            ParameterRegistry::builder().parameter(ParameterInfo::new(LEVEL, "level", "Level"))
        }

        fn create_processor(&mut self, _setup: ProcessSetup) -> PluginResult<MeterProcessor> {
            Ok(MeterProcessor::default())
        }

        fn create_editor(&mut self) -> Option<Box<dyn Editor>> {
            Some(Box::new(MeterSurface))
        }
    }

    /// Applies reported values through the instance, as the AU parameter
    /// tree does when `setValue:originator:` fires its observer.
    struct ParameterTreeHost {
        instance: Arc<PluginWrapper<MeterPlugin>>,
        /// Value the host stores instead of the reported one.
        rewrite: Option<f32>,
    }

    impl GestureHost for ParameterTreeHost {
        fn begin_change(&mut self, _index: u32) {}

        fn change_value(&mut self, index: u32, value: f32) {
            let Some(info) = self.instance.registry().parameter_info(index as usize) else {
                return;
            };
            self.instance
                .set_parameter_value(info.address, self.rewrite.unwrap_or(value));
        }

        fn end_change(&mut self, _index: u32) {}
    }

    struct SilentHost;

    impl GestureHost for SilentHost {
        fn begin_change(&mut self, _index: u32) {}
        fn change_value(&mut self, _index: u32, _value: f32) {}
        fn end_change(&mut self, _index: u32) {}
    }

    fn create() -> Arc<PluginWrapper<MeterPlugin>> {
        let _ = env_logger::builder().is_test(true).try_init();
        SURFACE_UPDATES.with(|updates| updates.borrow_mut().clear());
        let instance = Arc::new(PluginWrapper::<MeterPlugin>::new(&CONFIG).unwrap());
        instance.activate(48000.0, FRAMES).unwrap();
        instance
    }

    fn open_editor(instance: &Arc<PluginWrapper<MeterPlugin>>, host: Box<dyn GestureHost>) -> EditorContext {
        instance
            .editor_open(ParentWindow(std::ptr::null_mut()), host, 1.0)
            .unwrap();
        SURFACE_CONTEXT.with(|slot| slot.borrow_mut().take()).unwrap()
    }

    /// Render one block and return `(level, notifications)`.
    fn render(instance: &PluginWrapper<MeterPlugin>) -> (f32, f32) {
        let mut left = [0.0f32; FRAMES];
        let mut right = [0.0f32; FRAMES];
        let mut buffer = Buffer::new([&mut left[..], &mut right[..]], FRAMES);
        instance.process(&mut buffer, None, Transport::default(), &mut std::iter::empty());
        (left[0], right[0])
    }

    fn surface_updates() -> Vec<(usize, f32)> {
        SURFACE_UPDATES.with(|updates| updates.borrow().clone())
    }

    #[test]
    fn test_host_write_back_of_editor_change_not_echoed() {
        let instance = create();
        let context = open_editor(
            &instance,
            Box::new(ParameterTreeHost {
                instance: instance.clone(),
                rewrite: None,
            }),
        );

        context.set_value(0, 0.3);
        instance.editor_idle();

        assert!(surface_updates().is_empty());
        assert_eq!(render(&instance), (0.3, 1.0));
        instance.editor_close();
    }

    #[test]
    fn test_host_rewriting_editor_change_reaches_editor() {
        let instance = create();
        let context = open_editor(
            &instance,
            Box::new(ParameterTreeHost {
                instance: instance.clone(),
                rewrite: Some(0.8),
            }),
        );

        context.set_value(0, 0.3);
        instance.editor_idle();

        assert_eq!(surface_updates(), vec![(0, 0.8)]);
        assert_eq!(render(&instance), (0.8, 2.0));
        instance.editor_close();
    }

    #[test]
    fn test_host_automation_reaches_editor() {
        let instance = create();
        let _context = open_editor(&instance, Box::new(SilentHost));

        instance.set_parameter_value(LEVEL, 0.6);
        instance.set_parameter_value(LEVEL + 1, 0.9);
        instance.editor_idle();

        assert_eq!(surface_updates(), vec![(0, 0.6)]);
        assert_eq!(render(&instance), (0.6, 1.0));
        instance.editor_close();
    }

    #[test]
    fn test_render_concurrent_with_control_and_editor_writes() {
        const BLOCKS: usize = 2000;
        const WRITES: usize = 500;

        let instance = create();
        let mut snapshot = Vec::new();
        instance.save_state(&mut snapshot).unwrap();
        let context = open_editor(&instance, Box::new(SilentHost));

        let levels = std::thread::scope(|scope| {
            let render_thread = scope.spawn(|| {
                (0..BLOCKS)
                    .map(|_| render(&instance).0)
                    .collect::<Vec<_>>()
            });
            scope.spawn(|| {
                for i in 0..WRITES {
                    instance.set_parameter_value(LEVEL, 0.75);
                    if i % 10 == 0 {
                        instance.load_state(&mut snapshot.as_slice()).unwrap();
                    }
                }
            });
            let context = context.clone();
            scope.spawn(move || {
                for _ in 0..WRITES {
                    context.set_value(0, 0.25);
                }
            });
            render_thread.join().unwrap()
        });

        assert_eq!(levels.len(), BLOCKS);
        for level in levels {
            assert!([0.25, 0.5, 0.75].contains(&level), "unexpected level {}", level);
        }

        instance.set_parameter_value(LEVEL, 0.75);
        assert_eq!(render(&instance).0, 0.75);
        instance.editor_close();
    }
}
