//! `std::io` adapters over the host's state stream callbacks.

use std::ffi::c_void;
use std::io;

/// Pull callback: fill up to `len` bytes at `data`, return the count.
/// Returning 0 marks the end of the stream.
pub type ReadCallback = unsafe extern "C" fn(context: *mut c_void, data: *mut u8, len: usize) -> usize;

/// Push callback: consume up to `len` bytes from `data`, return the count.
/// Returning 0 means the sink cannot take more.
pub type WriteCallback = unsafe extern "C" fn(context: *mut c_void, data: *const u8, len: usize) -> usize;

pub struct CallbackReader {
    context: *mut c_void,
    read: ReadCallback,
}

impl CallbackReader {
    /// # Safety
    ///
    /// `read` must be safe to call with `context` for the reader's lifetime.
    pub unsafe fn new(context: *mut c_void, read: ReadCallback) -> Self {
        Self { context, read }
    }
}

impl io::Read for CallbackReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // SAFETY: `buf` is writable for `buf.len()` bytes; the callback and
        // context are valid per the constructor contract.
        let count = unsafe { (self.read)(self.context, buf.as_mut_ptr(), buf.len()) };
        // A misbehaving host must not make us read past the buffer.
        Ok(count.min(buf.len()))
    }
}

pub struct CallbackWriter {
    context: *mut c_void,
    write: WriteCallback,
}

impl CallbackWriter {
    /// # Safety
    ///
    /// `write` must be safe to call with `context` for the writer's lifetime.
    pub unsafe fn new(context: *mut c_void, write: WriteCallback) -> Self {
        Self { context, write }
    }
}

impl io::Write for CallbackWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // SAFETY: `buf` is readable for `buf.len()` bytes; the callback and
        // context are valid per the constructor contract.
        let count = unsafe { (self.write)(self.context, buf.as_ptr(), buf.len()) };
        Ok(count.min(buf.len()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
