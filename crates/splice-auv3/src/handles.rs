//! Instance handle table.
//!
//! Handles given to the host are tokens, not pointers: the low 32 bits hold
//! the slot index plus one (so 0 is never valid) and the high 32 bits the
//! slot's generation. Destroying an instance bumps the generation, so a
//! stale or double-freed handle resolves to nothing instead of freed memory.
//!
//! Control paths clone the instance `Arc` under a short read lock. The
//! render path uses [`HandleTable::try_with`], which never waits: if the
//! table is being written (an instance created or destroyed) the block is
//! skipped.

use std::ffi::c_void;
use std::sync::{Arc, RwLock};

struct Slot<T: ?Sized> {
    generation: u32,
    value: Option<Arc<T>>,
}

/// Generation-checked table of shared instances.
pub struct HandleTable<T: ?Sized> {
    slots: RwLock<Vec<Slot<T>>>,
}

impl<T: ?Sized> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Store `value` and return its handle.
    pub fn insert(&self, value: Arc<T>) -> *mut c_void {
        let Ok(mut slots) = self.slots.write() else {
            return std::ptr::null_mut();
        };

        let index = match slots.iter().position(|slot| slot.value.is_none()) {
            Some(index) => {
                slots[index].value = Some(value);
                index
            }
            None => {
                slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                slots.len() - 1
            }
        };

        encode(index, slots[index].generation)
    }

    /// Remove and return the value behind `handle`.
    pub fn remove(&self, handle: *mut c_void) -> Option<Arc<T>> {
        let (index, generation) = decode(handle)?;
        let mut slots = self.slots.write().ok()?;
        let slot = slots.get_mut(index)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(value)
    }

    /// Resolve a handle for a control-context call.
    pub fn get(&self, handle: *mut c_void) -> Option<Arc<T>> {
        let (index, generation) = decode(handle)?;
        let slots = self.slots.read().ok()?;
        let slot = slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.clone()
    }

    /// Run `f` on the value without blocking. `None` when the handle is
    /// invalid or the table is busy.
    #[inline]
    pub fn try_with<R>(&self, handle: *mut c_void, f: impl FnOnce(&T) -> R) -> Option<R> {
        let (index, generation) = decode(handle)?;
        let slots = self.slots.try_read().ok()?;
        let slot = slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_deref().map(f)
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .map(|slots| slots.iter().filter(|slot| slot.value.is_some()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(index: usize, generation: u32) -> *mut c_void {
    let token = ((generation as u64) << 32) | (index as u64 + 1);
    token as usize as *mut c_void
}

fn decode(handle: *mut c_void) -> Option<(usize, u32)> {
    let token = handle as usize as u64;
    let index = (token & 0xFFFF_FFFF).checked_sub(1)?;
    Some((index as usize, (token >> 32) as u32))
}
