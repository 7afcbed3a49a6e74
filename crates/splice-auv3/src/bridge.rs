//! C-ABI surface called by the Objective-C `AUAudioUnit` subclass.
//!
//! # Architecture
//!
//! ```text
//! AU Host (Logic Pro, GarageBand, AUM, ...)
//!        ↓
//! Objective-C AUAudioUnit subclass (app extension)
//!        ↓ (C-ABI calls, include/splice_auv3.h)
//! bridge.rs (this module)
//!        ↓
//! HandleTable → Arc<dyn BridgeInstance> → PluginWrapper<P>
//! ```
//!
//! # Safety
//!
//! Every entry point wraps its body in `catch_unwind` so panics never cross
//! the FFI boundary, and checks pointers for null before dereferencing.
//! Handles are table tokens: null, stale or foreign handles make calls
//! no-ops and queries return zero values.
//!
//! Errors are logged and swallowed; the C surface returns `void`.

// These are C-ABI entry points called from Objective-C. The caller is
// responsible for passing valid pointers; null is always checked.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::slice;
use std::sync::Arc;

use splice_core::{
    AuxBuffer, Buffer, ParentWindow, Transport, MAX_CHANNELS, MAX_STRING_LENGTH,
};
use splice_utils::{copy_str_to_char_array, StackString};

use crate::factory;
use crate::handles::HandleTable;
use crate::host::{BeginChangeCallback, CallbackGestureHost, ChangeValueCallback, EndChangeCallback};
use crate::instance::BridgeInstance;
use crate::io::{CallbackReader, CallbackWriter, ReadCallback, WriteCallback};
use crate::render_event::{AURenderEvent, EventIterator};

/// Capacity of every string buffer exchanged with the host, terminator
/// included (must match `SPLICE_AUV3_MAX_STRING_LENGTH`).
pub const SPLICE_AUV3_MAX_STRING_LENGTH: usize = MAX_STRING_LENGTH;

// =============================================================================
// C-ABI Structs (must match splice_auv3.h exactly)
// =============================================================================

/// Parameter metadata. The host owns both string buffers, each
/// [`SPLICE_AUV3_MAX_STRING_LENGTH`] bytes.
#[repr(C)]
#[derive(Debug)]
pub struct SpliceParameterInfo {
    pub identifier: *mut c_char,
    pub name: *mut c_char,
    /// `-1` for ungrouped parameters.
    pub parent_group_index: i64,
    pub address: u64,
    /// 0 = continuous, N = N + 1 discrete values.
    pub steps: u64,
}

/// Parameter group metadata, same string conventions as
/// [`SpliceParameterInfo`].
#[repr(C)]
#[derive(Debug)]
pub struct SpliceParameterGroupInfo {
    pub identifier: *mut c_char,
    pub name: *mut c_char,
    pub parent_group_index: i64,
}

/// Opaque instance handle.
pub type SpliceAuv3Handle = *mut c_void;

static INSTANCES: HandleTable<dyn BridgeInstance> = HandleTable::new();

// =============================================================================
// Helper Functions
// =============================================================================

/// Resolve `handle` and run `f` on a control thread, returning
/// `R::default()` if the handle is invalid or `f` panics.
fn with_instance<R: Default>(
    handle: SpliceAuv3Handle,
    function: &str,
    f: impl FnOnce(&dyn BridgeInstance) -> R,
) -> R {
    if handle.is_null() {
        return R::default();
    }
    let Some(instance) = INSTANCES.get(handle) else {
        log::warn!("{}: unknown instance handle {:p}", function, handle);
        return R::default();
    };
    catch_unwind(AssertUnwindSafe(|| f(instance.as_ref()))).unwrap_or_else(|_| {
        log::error!("{}: plugin panicked", function);
        R::default()
    })
}

/// View a host-owned string buffer.
///
/// # Safety
///
/// `ptr` must be null or point to [`SPLICE_AUV3_MAX_STRING_LENGTH`]
/// writable bytes.
unsafe fn string_buffer<'a>(ptr: *mut c_char) -> Option<&'a mut [c_char]> {
    // SAFETY: non-null and sized per the function contract.
    (!ptr.is_null()).then(|| unsafe { slice::from_raw_parts_mut(ptr, SPLICE_AUV3_MAX_STRING_LENGTH) })
}

/// # Safety
///
/// `ptr` must be null or point to `channels` readable pointers.
unsafe fn channel_pointers<'a, T>(ptr: *const *const T, channels: usize) -> Option<&'a [*const T]> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and sized per the function contract.
    let pointers = unsafe { slice::from_raw_parts(ptr, channels) };
    (!pointers.iter().any(|p| p.is_null())).then_some(pointers)
}

// =============================================================================
// Instance Lifecycle
// =============================================================================

/// Create a plugin instance. Null if no plugin is registered or creation
/// failed.
#[no_mangle]
pub extern "C" fn splice_auv3_create() -> SpliceAuv3Handle {
    let result = catch_unwind(|| {
        if !factory::is_registered() {
            log::error!("splice_auv3_create: no plugin registered");
            return None;
        }
        let instance: Arc<dyn BridgeInstance> = Arc::from(factory::create_instance()?);
        Some(INSTANCES.insert(instance))
    });

    match result {
        Ok(Some(handle)) => handle,
        Ok(None) | Err(_) => ptr::null_mut(),
    }
}

/// Destroy an instance. Null and stale handles are ignored.
#[no_mangle]
pub extern "C" fn splice_auv3_destroy(handle: SpliceAuv3Handle) {
    if handle.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| match INSTANCES.remove(handle) {
        // Dropping the last reference closes the editor and the engine.
        Some(instance) => drop(instance),
        None => log::warn!("splice_auv3_destroy: unknown instance handle {:p}", handle),
    }));
}

/// Prepare for rendering at `sample_rate` with blocks of at most
/// `max_block_size` frames.
#[no_mangle]
pub extern "C" fn splice_auv3_activate(handle: SpliceAuv3Handle, sample_rate: f64, max_block_size: u64) {
    with_instance(handle, "splice_auv3_activate", |instance| {
        let max_block_size = usize::try_from(max_block_size).unwrap_or(usize::MAX);
        if let Err(e) = instance.activate(sample_rate, max_block_size) {
            log::error!("Activation failed: {}", e);
        }
    });
}

/// Stop rendering and release the processor. Idempotent.
#[no_mangle]
pub extern "C" fn splice_auv3_deactivate(handle: SpliceAuv3Handle) {
    with_instance(handle, "splice_auv3_deactivate", |instance| instance.deactivate());
}

/// Clear the processor's signal history (delay lines, envelopes).
#[no_mangle]
pub extern "C" fn splice_auv3_reset(handle: SpliceAuv3Handle) {
    with_instance(handle, "splice_auv3_reset", |instance| instance.reset());
}

/// Whether the plugin consumes a sidechain input. Static.
#[no_mangle]
pub extern "C" fn splice_auv3_has_aux_bus() -> bool {
    factory::plugin_config().is_some_and(|config| config.has_aux_bus)
}

/// Tail length in seconds, `+inf` for plugins that never go silent.
#[no_mangle]
pub extern "C" fn splice_auv3_tail_length(handle: SpliceAuv3Handle) -> f64 {
    with_instance(handle, "splice_auv3_tail_length", |instance| instance.tail_length())
}

// =============================================================================
// Rendering
// =============================================================================

/// Render one block.
///
/// `input` and `aux` may be null (or contain null channels), in which case
/// the bus is absent; without input the output starts from silence. When an
/// input channel is not the same buffer as its output channel it is copied
/// to the output first. Events are applied at their sample offsets.
///
/// Never blocks: if the instance is busy with a lifecycle call, or the
/// handle is invalid, the output is silenced.
#[no_mangle]
pub extern "C" fn splice_auv3_process(
    handle: SpliceAuv3Handle,
    input: *const *const f32,
    aux: *const *const f32,
    output: *mut *mut f32,
    channels: u32,
    frames: u32,
    playing: bool,
    tempo: f64,
    position_samples: i64,
    first_event: *const AURenderEvent,
) {
    if output.is_null() {
        return;
    }
    let channels = (channels as usize).min(MAX_CHANNELS);
    let frames = frames as usize;

    // SAFETY: every non-null channel pointer addresses `frames` samples for
    // the duration of the call; buses with null channels are treated as
    // absent by `channel_pointers`.
    let _ = catch_unwind(AssertUnwindSafe(|| unsafe {
        let Some(outputs) = channel_pointers(output as *const *const f32, channels) else {
            return;
        };
        let outputs = outputs.iter().map(|&p| p as *mut f32);

        match channel_pointers(input, channels) {
            Some(inputs) => {
                for (&source, target) in inputs.iter().zip(outputs.clone()) {
                    if source != target as *const f32 {
                        ptr::copy(source, target, frames);
                    }
                }
            }
            None => {
                for target in outputs.clone() {
                    ptr::write_bytes(target, 0, frames);
                }
            }
        }

        let mut buffer = Buffer::new(outputs.map(|p| slice::from_raw_parts_mut(p, frames)), frames);
        let mut aux = channel_pointers(aux, channels).map(|pointers| {
            AuxBuffer::new(
                pointers.iter().map(|&p| slice::from_raw_parts(p, frames)),
                frames,
            )
        });
        let transport = Transport::new(playing, tempo, position_samples);
        let mut events = EventIterator::new(first_event);

        let rendered = INSTANCES.try_with(handle, |instance| {
            instance.process(&mut buffer, aux.as_mut(), transport, &mut events)
        });
        if rendered.is_none() {
            buffer.silence();
        }
    }));
}

// =============================================================================
// Parameters
// =============================================================================

#[no_mangle]
pub extern "C" fn splice_auv3_group_count(handle: SpliceAuv3Handle) -> usize {
    with_instance(handle, "splice_auv3_group_count", |instance| {
        instance.registry().group_count()
    })
}

/// Fill `info` for the group at `index`. An out-of-range index is a caller
/// bug: debug builds assert, release builds leave `info` untouched.
#[no_mangle]
pub extern "C" fn splice_auv3_group_info(
    handle: SpliceAuv3Handle,
    index: usize,
    info: *mut SpliceParameterGroupInfo,
) {
    if info.is_null() {
        return;
    }
    with_instance(handle, "splice_auv3_group_info", |instance| {
        let Some(group) = instance.registry().group_info(index) else {
            debug_assert!(false, "group index {} out of range", index);
            return;
        };
        // SAFETY: `info` was checked for null and its strings are
        // caller-owned buffers of SPLICE_AUV3_MAX_STRING_LENGTH bytes.
        let info = unsafe { &mut *info };
        // SAFETY: as above.
        if let Some(buffer) = unsafe { string_buffer(info.identifier) } {
            copy_str_to_char_array(group.identifier, buffer);
        }
        // SAFETY: as above.
        if let Some(buffer) = unsafe { string_buffer(info.name) } {
            copy_str_to_char_array(group.name, buffer);
        }
        info.parent_group_index = group.parent_index();
    });
}

#[no_mangle]
pub extern "C" fn splice_auv3_parameter_count(handle: SpliceAuv3Handle) -> usize {
    with_instance(handle, "splice_auv3_parameter_count", |instance| {
        instance.registry().parameter_count()
    })
}

/// Fill `info` for the parameter at `index`. Same out-of-range contract as
/// [`splice_auv3_group_info`].
#[no_mangle]
pub extern "C" fn splice_auv3_parameter_info(
    handle: SpliceAuv3Handle,
    index: usize,
    info: *mut SpliceParameterInfo,
) {
    if info.is_null() {
        return;
    }
    with_instance(handle, "splice_auv3_parameter_info", |instance| {
        let Some(parameter) = instance.registry().parameter_info(index) else {
            debug_assert!(false, "parameter index {} out of range", index);
            return;
        };
        // SAFETY: `info` was checked for null and its strings are
        // caller-owned buffers of SPLICE_AUV3_MAX_STRING_LENGTH bytes.
        let info = unsafe { &mut *info };
        // SAFETY: as above.
        if let Some(buffer) = unsafe { string_buffer(info.identifier) } {
            copy_str_to_char_array(parameter.identifier, buffer);
        }
        // SAFETY: as above.
        if let Some(buffer) = unsafe { string_buffer(info.name) } {
            copy_str_to_char_array(parameter.name, buffer);
        }
        info.parent_group_index = parameter.parent_index();
        info.address = parameter.address;
        info.steps = parameter.steps as u64;
    });
}

/// Current normalized value; 0 for unknown addresses.
#[no_mangle]
pub extern "C" fn splice_auv3_get_parameter_value(handle: SpliceAuv3Handle, address: u64) -> f32 {
    with_instance(handle, "splice_auv3_get_parameter_value", |instance| {
        instance.registry().get(address)
    })
}

/// Set a normalized value. Unknown addresses are ignored.
#[no_mangle]
pub extern "C" fn splice_auv3_set_parameter_value(handle: SpliceAuv3Handle, address: u64, value: f32) {
    with_instance(handle, "splice_auv3_set_parameter_value", |instance| {
        instance.set_parameter_value(address, value)
    });
}

/// Format a normalized value into `string`
/// ([`SPLICE_AUV3_MAX_STRING_LENGTH`] bytes). Unknown addresses produce an
/// empty string.
#[no_mangle]
pub extern "C" fn splice_auv3_parameter_normalized_to_string(
    handle: SpliceAuv3Handle,
    address: u64,
    value: f32,
    string: *mut c_char,
) {
    // SAFETY: the caller passes null or a buffer of
    // SPLICE_AUV3_MAX_STRING_LENGTH bytes.
    let Some(buffer) = (unsafe { string_buffer(string) }) else {
        return;
    };
    buffer[0] = 0;
    with_instance(handle, "splice_auv3_parameter_normalized_to_string", |instance| {
        let mut text = StackString::<SPLICE_AUV3_MAX_STRING_LENGTH>::new();
        // StackString truncates instead of failing
        let _ = instance.registry().normalized_to_string(address, value, &mut text);
        copy_str_to_char_array(text.as_str(), buffer);
    });
}

/// Parse display text into a normalized value. Returns `false` (leaving
/// `value` untouched) if the text doesn't parse or the address is unknown.
#[no_mangle]
pub extern "C" fn splice_auv3_parameter_string_to_normalized(
    handle: SpliceAuv3Handle,
    address: u64,
    string: *const c_char,
    value: *mut f32,
) -> bool {
    if string.is_null() || value.is_null() {
        return false;
    }
    with_instance(handle, "splice_auv3_parameter_string_to_normalized", |instance| {
        // SAFETY: checked non-null; the caller passes a terminated string.
        let Ok(text) = unsafe { CStr::from_ptr(string) }.to_str() else {
            return false;
        };
        match instance.registry().string_to_normalized(address, text) {
            Some(normalized) => {
                // SAFETY: checked non-null above.
                unsafe { *value = normalized };
                true
            }
            None => false,
        }
    })
}

// =============================================================================
// State
// =============================================================================

/// Restore state by pulling bytes through `read` until it returns 0.
/// A malformed stream leaves the instance unchanged.
#[no_mangle]
pub extern "C" fn splice_auv3_load_state(
    handle: SpliceAuv3Handle,
    context: *mut c_void,
    read: Option<ReadCallback>,
) {
    let Some(read) = read else {
        return;
    };
    with_instance(handle, "splice_auv3_load_state", |instance| {
        // SAFETY: the host keeps `context` valid for `read` during this call.
        let mut reader = unsafe { CallbackReader::new(context, read) };
        if let Err(e) = instance.load_state(&mut reader) {
            log::error!("Failed to load state: {}", e);
        }
    });
}

/// Save state by pushing bytes through `write`.
#[no_mangle]
pub extern "C" fn splice_auv3_save_state(
    handle: SpliceAuv3Handle,
    context: *mut c_void,
    write: Option<WriteCallback>,
) {
    let Some(write) = write else {
        return;
    };
    with_instance(handle, "splice_auv3_save_state", |instance| {
        // SAFETY: the host keeps `context` valid for `write` during this call.
        let mut writer = unsafe { CallbackWriter::new(context, write) };
        if let Err(e) = instance.save_state(&mut writer) {
            log::error!("Failed to save state: {}", e);
        }
    });
}

// =============================================================================
// Editor
// =============================================================================

/// Preferred editor size in points; `0 x 0` for plugins without an editor.
#[no_mangle]
pub extern "C" fn splice_auv3_preferred_editor_size(width: *mut f64, height: *mut f64) {
    let size = factory::plugin_config()
        .map(|config| config.preferred_editor_size())
        .unwrap_or_default();
    // SAFETY: each pointer is checked for null before the write.
    unsafe {
        if !width.is_null() {
            *width = size.width;
        }
        if !height.is_null() {
            *height = size.height;
        }
    }
}

#[no_mangle]
pub extern "C" fn splice_auv3_editor_set_scale(handle: SpliceAuv3Handle, scale: f64) {
    with_instance(handle, "splice_auv3_editor_set_scale", |instance| {
        instance.editor_set_scale(scale)
    });
}

/// Open the editor inside `parent`. Gesture callbacks receive
/// `editor_context` and the parameter index.
#[no_mangle]
pub extern "C" fn splice_auv3_editor_open(
    handle: SpliceAuv3Handle,
    parent: *mut c_void,
    editor_context: *mut c_void,
    start_parameter_change: Option<BeginChangeCallback>,
    change_parameter_value: Option<ChangeValueCallback>,
    end_parameter_change: Option<EndChangeCallback>,
    scale: f64,
) {
    let (Some(begin), Some(change), Some(end)) =
        (start_parameter_change, change_parameter_value, end_parameter_change)
    else {
        log::error!("splice_auv3_editor_open: missing gesture callback");
        return;
    };
    with_instance(handle, "splice_auv3_editor_open", |instance| {
        // SAFETY: the host keeps the callbacks and `editor_context` valid
        // until `splice_auv3_editor_close` or `splice_auv3_destroy`.
        let host = unsafe { CallbackGestureHost::new(editor_context, begin, change, end) };
        if let Err(e) = instance.editor_open(ParentWindow(parent), Box::new(host), scale) {
            log::error!("Failed to open editor: {}", e);
        }
    });
}

/// Periodic main-thread tick: pushes outside parameter changes into the
/// editor.
#[no_mangle]
pub extern "C" fn splice_auv3_editor_idle(handle: SpliceAuv3Handle) {
    with_instance(handle, "splice_auv3_editor_idle", |instance| instance.editor_idle());
}

/// Close the editor, ending any gesture still in progress. No-op when no
/// editor is open.
#[no_mangle]
pub extern "C" fn splice_auv3_editor_close(handle: SpliceAuv3Handle) {
    with_instance(handle, "splice_auv3_editor_close", |instance| instance.editor_close());
}
