//! [`GestureHost`] over the gesture callbacks passed to `splice_auv3_editor_open`.

use std::ffi::c_void;

use splice_core::{GestureHost, ParameterValue};

pub type BeginChangeCallback = unsafe extern "C" fn(context: *mut c_void, index: u32);
pub type ChangeValueCallback = unsafe extern "C" fn(context: *mut c_void, index: u32, value: f32);
pub type EndChangeCallback = unsafe extern "C" fn(context: *mut c_void, index: u32);

pub struct CallbackGestureHost {
    context: *mut c_void,
    begin: BeginChangeCallback,
    change: ChangeValueCallback,
    end: EndChangeCallback,
}

impl CallbackGestureHost {
    /// # Safety
    ///
    /// The callbacks must be safe to call with `context`, from the thread
    /// that drives the editor, until the editor is closed.
    pub unsafe fn new(
        context: *mut c_void,
        begin: BeginChangeCallback,
        change: ChangeValueCallback,
        end: EndChangeCallback,
    ) -> Self {
        Self {
            context,
            begin,
            change,
            end,
        }
    }
}

// SAFETY: the host guarantees the callbacks and their context stay valid
// while the editor is open; they are only invoked from editor calls.
unsafe impl Send for CallbackGestureHost {}

impl GestureHost for CallbackGestureHost {
    fn begin_change(&mut self, index: u32) {
        // SAFETY: valid until the editor closes, per `new`.
        unsafe { (self.begin)(self.context, index) }
    }

    fn change_value(&mut self, index: u32, value: ParameterValue) {
        // SAFETY: as above.
        unsafe { (self.change)(self.context, index, value) }
    }

    fn end_change(&mut self, index: u32) {
        // SAFETY: as above.
        unsafe { (self.end)(self.context, index) }
    }
}
