//! Editor bridge: parameter gestures from the plugin UI to the host.
//!
//! The host hands the format layer three callbacks when it opens the editor.
//! They are wrapped in a [`GestureHost`] and shared with the editor surface
//! through an [`EditorContext`]. A user edit looks like:
//!
//! ```text
//! editor: begin_change(i) --> host.begin(i)
//! editor: change_value(i, v) --> registry + processor queue + host.change(i, v)
//!   ... (any number of changes)
//! editor: end_change(i) --> host.end(i)
//! ```
//!
//! Host-side changes flow the other way on [`EditorBridge::idle`], which
//! pushes every parameter written since the last idle into the surface.
//!
//! Once the editor is closed, every [`EditorContext`] clone still held by
//! the surface goes inert: its calls touch neither the registry nor the host.
//!
//! # Echoes
//!
//! AU hosts apply a reported change by setting the `AUParameter`, which
//! calls straight back into the plugin with the same value. While a change
//! is being reported, the [`EchoGuard`] shared with the format layer
//! identifies that write so it is neither queued twice nor sent back to
//! the editor.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::ParameterSender;
use crate::error::PluginResult;
use crate::events::ParameterChange;
use crate::registry::ParameterRegistry;
use crate::types::ParameterValue;

/// Native parent view supplied by the host (an `NSView*` on macOS, a
/// `UIView*` on iOS).
#[derive(Debug, Clone, Copy)]
pub struct ParentWindow(pub *mut c_void);

// SAFETY: the pointer is only an opaque token; surfaces dereference it on
// the main thread that opened them.
unsafe impl Send for ParentWindow {}

/// A plugin's user interface.
pub trait Editor: Send {
    /// Attach to `parent`. Keep `context` to report parameter gestures.
    fn open(&mut self, parent: ParentWindow, scale: f64, context: EditorContext) -> PluginResult<()>;

    /// The host changed the UI scale factor.
    fn set_scale(&mut self, _scale: f64) {}

    /// A parameter changed outside the editor (automation, host UI, state load).
    fn parameter_changed(&mut self, _index: usize, _value: ParameterValue) {}

    /// Periodic main-thread tick.
    fn idle(&mut self) {}

    /// Detach from the parent and release the UI.
    fn close(&mut self);
}

/// Receiver of edit gestures, implemented by format layers over the host's
/// callbacks. Indices are registry indices.
pub trait GestureHost: Send {
    fn begin_change(&mut self, index: u32);
    fn change_value(&mut self, index: u32, value: ParameterValue);
    fn end_change(&mut self, index: u32);
}

// =============================================================================
// Echo guard
// =============================================================================

/// The editor change currently being reported to the host.
///
/// Packs `(index + 1) << 32 | value bits`; 0 when nothing is in flight.
#[derive(Debug, Default)]
pub struct EchoGuard {
    in_flight: AtomicU64,
}

impl EchoGuard {
    fn pack(index: usize, value: ParameterValue) -> u64 {
        ((index as u64 + 1) << 32) | value.to_bits() as u64
    }

    /// Mark `(index, value)` as in flight until the returned guard drops.
    fn reporting(&self, index: usize, value: ParameterValue) -> Reporting<'_> {
        self.in_flight.store(Self::pack(index, value), Ordering::Release);
        Reporting { guard: self }
    }

    /// Whether a host write of `value` to `index` is the editor's own change
    /// coming back.
    pub fn is_echo(&self, index: usize, value: ParameterValue) -> bool {
        self.in_flight.load(Ordering::Acquire) == Self::pack(index, value)
    }
}

struct Reporting<'a> {
    guard: &'a EchoGuard,
}

impl Drop for Reporting<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(0, Ordering::Release);
    }
}

// =============================================================================
// Gesture channel
// =============================================================================

struct GestureChannel {
    registry: Arc<ParameterRegistry>,
    sender: Arc<ParameterSender>,
    echo: Arc<EchoGuard>,
    /// `None` once the editor is closed.
    host: Mutex<Option<Box<dyn GestureHost>>>,
    /// Per-parameter "gesture in progress" marks.
    active: Box<[AtomicBool]>,
}

impl GestureChannel {
    fn detach(&self) {
        let Ok(mut host) = self.host.lock() else {
            return;
        };
        if let Some(host) = host.as_mut() {
            for (index, flag) in self.active.iter().enumerate() {
                if flag.swap(false, Ordering::AcqRel) {
                    log::debug!("Ending gesture on {} at editor close", index);
                    host.end_change(index as u32);
                }
            }
        }
        *host = None;
    }
}

/// Handle given to the editor surface for reporting edits.
#[derive(Clone)]
pub struct EditorContext {
    channel: Arc<GestureChannel>,
}

impl EditorContext {
    /// Live parameter values, for drawing the initial UI state.
    pub fn parameters(&self) -> &ParameterRegistry {
        &self.channel.registry
    }

    /// Start a user gesture on a parameter. Repeated begins are collapsed.
    pub fn begin_change(&self, index: usize) {
        let Some(flag) = self.channel.active.get(index) else {
            return;
        };
        let Ok(mut host) = self.channel.host.lock() else {
            return;
        };
        let Some(host) = host.as_mut() else {
            return;
        };
        if !flag.swap(true, Ordering::AcqRel) {
            host.begin_change(index as u32);
        }
    }

    /// Write a value during a gesture.
    ///
    /// The value is stored in the registry, queued for the processor and
    /// reported to the host as the quantized value actually stored.
    pub fn change_value(&self, index: usize, value: ParameterValue) {
        let Ok(mut host) = self.channel.host.lock() else {
            return;
        };
        let Some(host) = host.as_mut() else {
            return;
        };
        let Some(stored) = self.channel.registry.set_from_editor(index, value) else {
            return;
        };
        self.channel
            .sender
            .send(ParameterChange::immediate(index, stored));
        let _reporting = self.channel.echo.reporting(index, stored);
        host.change_value(index as u32, stored);
    }

    /// Finish a gesture. Ignored when no gesture is in progress.
    pub fn end_change(&self, index: usize) {
        let Some(flag) = self.channel.active.get(index) else {
            return;
        };
        let Ok(mut host) = self.channel.host.lock() else {
            return;
        };
        let Some(host) = host.as_mut() else {
            return;
        };
        if flag.swap(false, Ordering::AcqRel) {
            host.end_change(index as u32);
        }
    }

    /// Convenience for discrete controls: begin, change and end in one call.
    pub fn set_value(&self, index: usize, value: ParameterValue) {
        self.begin_change(index);
        self.change_value(index, value);
        self.end_change(index);
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Owns the open editor surface and its gesture channel.
pub struct EditorBridge {
    registry: Arc<ParameterRegistry>,
    sender: Arc<ParameterSender>,
    echo: Arc<EchoGuard>,
    surface: Option<Box<dyn Editor>>,
    channel: Option<Arc<GestureChannel>>,
    scale: f64,
}

impl EditorBridge {
    pub fn new(registry: Arc<ParameterRegistry>, sender: Arc<ParameterSender>) -> Self {
        Self {
            registry,
            sender,
            echo: Arc::new(EchoGuard::default()),
            surface: None,
            channel: None,
            scale: 1.0,
        }
    }

    /// Shared with the format layer's host write path.
    pub fn echo_guard(&self) -> Arc<EchoGuard> {
        self.echo.clone()
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    /// Last scale factor set by the host.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Open `surface` inside `parent`. An editor that is already open is
    /// closed first.
    pub fn open(
        &mut self,
        mut surface: Box<dyn Editor>,
        parent: ParentWindow,
        host: Box<dyn GestureHost>,
        scale: f64,
    ) -> PluginResult<()> {
        if self.is_open() {
            log::warn!("Editor opened while already open, closing the previous one");
            self.close();
        }

        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }

        // The surface draws from current values; older marks are moot.
        self.registry.drain_changed(|_, _| {});

        let channel = Arc::new(GestureChannel {
            registry: self.registry.clone(),
            sender: self.sender.clone(),
            echo: self.echo.clone(),
            host: Mutex::new(Some(host)),
            active: (0..self.registry.parameter_count())
                .map(|_| AtomicBool::new(false))
                .collect(),
        });
        let context = EditorContext {
            channel: channel.clone(),
        };

        if let Err(e) = surface.open(parent, self.scale, context) {
            log::error!("Failed to open editor: {}", e);
            channel.detach();
            return Err(e);
        }

        self.surface = Some(surface);
        self.channel = Some(channel);
        log::debug!("Editor opened at scale {}", self.scale);
        Ok(())
    }

    /// Forward a new scale factor. Non-positive factors are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        self.scale = scale;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_scale(scale);
        }
    }

    /// Push outside parameter changes into the surface and tick it.
    pub fn idle(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.registry
            .drain_changed(|index, value| surface.parameter_changed(index, value));
        surface.idle();
    }

    /// End in-flight gestures, detach the host callbacks and close the
    /// surface. No-op when nothing is open.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.detach();
        }
        if let Some(mut surface) = self.surface.take() {
            surface.close();
            log::debug!("Editor closed");
        }
    }
}

impl Drop for EditorBridge {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{parameter_queue, ParameterReceiver};
    use crate::error::PluginError;
    use crate::parameter_info::ParameterInfo;

    #[derive(Debug, Clone, PartialEq)]
    enum Gesture {
        Begin(u32),
        Change(u32, f32),
        End(u32),
    }

    #[derive(Clone, Default)]
    struct RecordingHost(Arc<Mutex<Vec<Gesture>>>);

    impl GestureHost for RecordingHost {
        fn begin_change(&mut self, index: u32) {
            self.0.lock().unwrap().push(Gesture::Begin(index));
        }
        fn change_value(&mut self, index: u32, value: f32) {
            self.0.lock().unwrap().push(Gesture::Change(index, value));
        }
        fn end_change(&mut self, index: u32) {
            self.0.lock().unwrap().push(Gesture::End(index));
        }
    }

    #[derive(Default)]
    struct SurfaceLog {
        context: Option<EditorContext>,
        changes: Vec<(usize, f32)>,
        scale: f64,
        idles: usize,
        closed: bool,
    }

    struct TestSurface {
        log: Arc<Mutex<SurfaceLog>>,
        fail: bool,
    }

    impl Editor for TestSurface {
        fn open(&mut self, _parent: ParentWindow, scale: f64, context: EditorContext) -> PluginResult<()> {
            if self.fail {
                return Err(PluginError::EditorError("no window".to_string()));
            }
            let mut log = self.log.lock().unwrap();
            log.context = Some(context);
            log.scale = scale;
            Ok(())
        }
        fn set_scale(&mut self, scale: f64) {
            self.log.lock().unwrap().scale = scale;
        }
        fn parameter_changed(&mut self, index: usize, value: f32) {
            self.log.lock().unwrap().changes.push((index, value));
        }
        fn idle(&mut self) {
            self.log.lock().unwrap().idles += 1;
        }
        fn close(&mut self) {
            self.log.lock().unwrap().closed = true;
        }
    }

    struct Fixture {
        bridge: EditorBridge,
        registry: Arc<ParameterRegistry>,
        receiver: ParameterReceiver,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(
            ParameterRegistry::builder()
                .parameter(ParameterInfo::new(1, "cutoff", "Cutoff"))
                .parameter(ParameterInfo::new(2, "mode", "Mode").with_steps(2))
                .build()
                .unwrap(),
        );
        let (sender, receiver) = parameter_queue(64);
        let bridge = EditorBridge::new(registry.clone(), Arc::new(sender));
        Fixture {
            bridge,
            registry,
            receiver,
        }
    }

    fn open(f: &mut Fixture) -> (Arc<Mutex<SurfaceLog>>, RecordingHost) {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        let host = RecordingHost::default();
        f.bridge
            .open(
                Box::new(TestSurface {
                    log: log.clone(),
                    fail: false,
                }),
                ParentWindow(std::ptr::null_mut()),
                Box::new(host.clone()),
                2.0,
            )
            .unwrap();
        (log, host)
    }

    fn context(log: &Arc<Mutex<SurfaceLog>>) -> EditorContext {
        log.lock().unwrap().context.clone().unwrap()
    }

    #[test]
    fn test_gesture_commits_last_value() {
        let mut f = fixture();
        let (log, host) = open(&mut f);
        let ctx = context(&log);

        ctx.begin_change(0);
        for value in [0.1, 0.4, 0.7] {
            ctx.change_value(0, value);
        }
        ctx.end_change(0);

        assert_eq!(f.registry.value_at(0), 0.7);
        assert_eq!(
            *host.0.lock().unwrap(),
            vec![
                Gesture::Begin(0),
                Gesture::Change(0, 0.1),
                Gesture::Change(0, 0.4),
                Gesture::Change(0, 0.7),
                Gesture::End(0),
            ]
        );

        let mut queued = Vec::new();
        while let Some(change) = f.receiver.pop() {
            queued.push(change.value);
        }
        assert_eq!(queued, vec![0.1, 0.4, 0.7]);
    }

    #[test]
    fn test_host_sees_quantized_value() {
        let mut f = fixture();
        let (log, host) = open(&mut f);
        context(&log).set_value(1, 0.4);

        assert_eq!(f.registry.value_at(1), 0.5);
        assert_eq!(host.0.lock().unwrap()[1], Gesture::Change(1, 0.5));
    }

    #[test]
    fn test_editor_writes_are_not_echoed() {
        let mut f = fixture();
        let (log, _host) = open(&mut f);
        context(&log).set_value(0, 0.9);
        f.registry.set(2, 1.0);

        f.bridge.idle();
        let log = log.lock().unwrap();
        assert_eq!(log.changes, vec![(1, 1.0)]);
        assert_eq!(log.idles, 1);
    }

    /// Host that applies every reported value back through the registry,
    /// the way an AU parameter tree observer calls into the instance.
    struct WriteBackHost {
        registry: Arc<ParameterRegistry>,
        sender: Arc<ParameterSender>,
        echo: Arc<EchoGuard>,
        echoes: Arc<Mutex<Vec<bool>>>,
    }

    impl GestureHost for WriteBackHost {
        fn begin_change(&mut self, _index: u32) {}
        fn change_value(&mut self, index: u32, value: f32) {
            let index = index as usize;
            let echo = self.echo.is_echo(index, value);
            self.echoes.lock().unwrap().push(echo);
            if echo {
                return;
            }
            if let Some(stored) = self.registry.set_at(index, value) {
                self.sender.send(ParameterChange::immediate(index, stored));
            }
        }
        fn end_change(&mut self, _index: u32) {}
    }

    #[test]
    fn test_host_write_back_recognised_as_echo() {
        let registry = Arc::new(
            ParameterRegistry::builder()
                .parameter(ParameterInfo::new(1, "cutoff", "Cutoff"))
                .build()
                .unwrap(),
        );
        let (sender, mut receiver) = parameter_queue(64);
        let sender = Arc::new(sender);
        let mut bridge = EditorBridge::new(registry.clone(), sender.clone());
        let echoes = Arc::new(Mutex::new(Vec::new()));
        let host = WriteBackHost {
            registry: registry.clone(),
            sender,
            echo: bridge.echo_guard(),
            echoes: echoes.clone(),
        };
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        bridge
            .open(
                Box::new(TestSurface {
                    log: log.clone(),
                    fail: false,
                }),
                ParentWindow(std::ptr::null_mut()),
                Box::new(host),
                1.0,
            )
            .unwrap();
        let context = log.lock().unwrap().context.clone().unwrap();

        context.set_value(0, 0.3);
        assert_eq!(*echoes.lock().unwrap(), vec![true]);
        assert!(!bridge.echo_guard().is_echo(0, 0.3));

        let first = receiver.pop().unwrap();
        assert_eq!((first.index, first.value), (0, 0.3));
        assert!(receiver.pop().is_none());

        bridge.idle();
        assert!(log.lock().unwrap().changes.is_empty());
        assert_eq!(registry.value_at(0), 0.3);
    }

    #[test]
    fn test_repeated_begin_and_stray_end_collapsed() {
        let mut f = fixture();
        let (log, host) = open(&mut f);
        let ctx = context(&log);

        ctx.end_change(0);
        ctx.begin_change(0);
        ctx.begin_change(0);
        ctx.end_change(0);
        ctx.end_change(0);
        ctx.begin_change(99);

        assert_eq!(*host.0.lock().unwrap(), vec![Gesture::Begin(0), Gesture::End(0)]);
    }

    #[test]
    fn test_close_ends_gestures_and_silences_context() {
        let mut f = fixture();
        let (log, host) = open(&mut f);
        let ctx = context(&log);

        ctx.begin_change(1);
        f.bridge.close();
        assert!(!f.bridge.is_open());
        assert!(log.lock().unwrap().closed);
        assert_eq!(*host.0.lock().unwrap(), vec![Gesture::Begin(1), Gesture::End(1)]);

        ctx.set_value(0, 0.9);
        assert_eq!(f.registry.value_at(0), 0.5);
        assert_eq!(host.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_close_without_editor_is_noop() {
        let mut f = fixture();
        f.bridge.close();
        f.bridge.close();
        f.bridge.idle();
        assert!(!f.bridge.is_open());
    }

    #[test]
    fn test_reopen_closes_previous() {
        let mut f = fixture();
        let (first, _) = open(&mut f);
        let (second, _) = open(&mut f);
        assert!(first.lock().unwrap().closed);
        assert!(!second.lock().unwrap().closed);
        assert!(f.bridge.is_open());
    }

    #[test]
    fn test_failed_open_leaves_bridge_closed() {
        let mut f = fixture();
        let result = f.bridge.open(
            Box::new(TestSurface {
                log: Arc::default(),
                fail: true,
            }),
            ParentWindow(std::ptr::null_mut()),
            Box::new(RecordingHost::default()),
            1.0,
        );
        assert!(matches!(result, Err(PluginError::EditorError(_))));
        assert!(!f.bridge.is_open());
    }

    #[test]
    fn test_scale_forwarded() {
        let mut f = fixture();
        f.bridge.set_scale(1.5);
        let (log, _) = open(&mut f);
        assert_eq!(log.lock().unwrap().scale, 2.0);

        f.bridge.set_scale(0.0);
        assert_eq!(f.bridge.scale(), 2.0);
        f.bridge.set_scale(3.0);
        assert_eq!(log.lock().unwrap().scale, 3.0);
    }
}
