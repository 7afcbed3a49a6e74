//! Bounded strings for C interop and allocation-free formatting.
//!
//! Every string that crosses the C boundary lives in a caller-owned buffer
//! of fixed capacity. Copies truncate on a UTF-8 character boundary and are
//! always null-terminated, so a host never sees a split code point.

use std::ffi::c_char;
use std::fmt;

/// Largest index `<= max` that falls on a character boundary of `s`.
#[inline]
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Copy a Rust string into a fixed-size C char array.
///
/// Truncates to `dest.len() - 1` bytes (on a character boundary) and
/// null-terminates. An empty `dest` is left untouched.
pub fn copy_str_to_char_array(s: &str, dest: &mut [c_char]) {
    if dest.is_empty() {
        return;
    }

    let copy_len = floor_char_boundary(s, dest.len() - 1);
    for (d, &b) in dest.iter_mut().zip(&s.as_bytes()[..copy_len]) {
        *d = b as c_char;
    }
    dest[copy_len] = 0;
}

/// Fixed-capacity string living on the stack.
///
/// Implements [`fmt::Write`] so values can be formatted with `write!`
/// without touching the heap. Text that does not fit is dropped at the last
/// complete character; formatting never fails because of truncation.
#[derive(Clone)]
pub struct StackString<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> StackString<N> {
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // Only whole characters are ever appended.
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once an append had to drop text.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for StackString<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for StackString<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let take = floor_char_boundary(s, N - self.len);
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for StackString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for StackString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
