//! load-once caches
//!
//! Image sets and catalogs are read at most once per [LoadOnce]. The lock is held across the
//! "check, load if absent" sequence so concurrent resolutions never load the same data twice.
//! A failed load leaves the slot empty, so the next caller tries again.
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug)]
pub struct LoadOnce<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Default for LoadOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LoadOnce<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value, running `load` first if nothing is cached yet
    pub fn get_or_try_load<E>(&self, load: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(load()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
