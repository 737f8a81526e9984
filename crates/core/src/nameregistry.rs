//! Fixed-capacity name -> id registry with freelist-based fragmentation handling
//!
//! `freelist[0..used]` enumerates the currently occupied ids; `freelist[used..capacity]`
//! enumerates the free ones. `add` consumes `freelist[used]`; `remove` swaps the hit
//! with `freelist[used - 1]` and shrinks `used`, so the freelist stays a permutation
//! of `0..capacity` at every observable point.

use std::sync::Mutex;
use thiserror::Error;

/// Largest registry size this implementation supports: a prime just below
/// 2^20. Beyond this a different indexing strategy (e.g. a hash map) is
/// required, so construction fails rather than silently degrading.
pub const MAX_CAPACITY: usize = 1_048_573;

/// Byte used to overwrite cleared name slots; invalid in any internet name.
const CLEAR_BYTE: u8 = b'.';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry capacity {0} exceeds the maximum of {MAX_CAPACITY}")]
    CapacityTooLarge(usize),
    #[error("registry capacity must be non-zero")]
    ZeroCapacity,
    #[error("name length {got} does not match registry name length {expected}")]
    NameLengthMismatch { expected: usize, got: usize },
}

struct Inner {
    namelen: usize,
    capacity: usize,
    used: usize,
    freelist: Vec<usize>,
    registry: Vec<u8>,
}

/// Thread-safe name registry. All operations take the internal mutex for
/// their own duration; callers needing registry-plus-status-entry atomicity
/// must additionally hold a coarser lock of their own (see the collector's
/// `global_addremove_lock`).
pub struct NameRegistry {
    inner: Mutex<Inner>,
}

impl NameRegistry {
    pub fn new(capacity: usize, namelen: usize) -> Result<Self, RegistryError> {
        if capacity == 0 {
            return Err(RegistryError::ZeroCapacity);
        }
        if capacity > MAX_CAPACITY {
            return Err(RegistryError::CapacityTooLarge(capacity));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                namelen,
                capacity,
                used: 0,
                freelist: (0..capacity).collect(),
                registry: vec![CLEAR_BYTE; namelen * capacity],
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().capacity
    }

    pub fn used(&self) -> usize {
        self.inner.lock().unwrap().used
    }

    fn check_len(inner: &Inner, name: &[u8]) -> Result<(), RegistryError> {
        if name.len() != inner.namelen {
            return Err(RegistryError::NameLengthMismatch {
                expected: inner.namelen,
                got: name.len(),
            });
        }
        Ok(())
    }

    /// Scan the occupied ids for `name`; `None` if not present.
    pub fn find(&self, name: &[u8]) -> Result<Option<usize>, RegistryError> {
        let inner = self.inner.lock().unwrap();
        Self::check_len(&inner, name)?;
        Ok(Self::scan(&inner, name))
    }

    fn scan(inner: &Inner, name: &[u8]) -> Option<usize> {
        for i in 0..inner.used {
            let id = inner.freelist[i];
            let slot = &inner.registry[id * inner.namelen..(id + 1) * inner.namelen];
            if slot == name {
                return Some(id);
            }
        }
        None
    }

    /// Insert `name` without checking for duplicates. `None` if the
    /// registry is full.
    pub fn add(&self, name: &[u8]) -> Result<Option<usize>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_len(&inner, name)?;
        Ok(Self::insert(&mut inner, name))
    }

    fn insert(inner: &mut Inner, name: &[u8]) -> Option<usize> {
        if inner.used == inner.capacity {
            return None;
        }
        let id = inner.freelist[inner.used];
        inner.registry[id * inner.namelen..(id + 1) * inner.namelen].copy_from_slice(name);
        inner.used += 1;
        Some(id)
    }

    /// `find`, inserting if absent. `None` only if the registry is full.
    pub fn findadd(&self, name: &[u8]) -> Result<Option<usize>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_len(&inner, name)?;
        if let Some(id) = Self::scan(&inner, name) {
            return Ok(Some(id));
        }
        Ok(Self::insert(&mut inner, name))
    }

    /// Remove by name. `None` if not present.
    pub fn remove(&self, name: &[u8]) -> Result<Option<usize>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_len(&inner, name)?;
        for i in 0..inner.used {
            let id = inner.freelist[i];
            let slot_range = id * inner.namelen..(id + 1) * inner.namelen;
            if inner.registry[slot_range.clone()] == *name {
                inner.registry[slot_range].fill(CLEAR_BYTE);
                inner.used -= 1;
                inner.freelist[i] = inner.freelist[inner.used];
                inner.freelist[inner.used] = id;
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Remove by id. `None` if `id` is not currently occupied.
    pub fn removebyid(&self, id: usize) -> Option<usize> {
        let mut inner = self.inner.lock().unwrap();
        for i in 0..inner.used {
            if inner.freelist[i] == id {
                let namelen = inner.namelen;
                inner.registry[id * namelen..(id + 1) * namelen].fill(CLEAR_BYTE);
                inner.used -= 1;
                inner.freelist[i] = inner.freelist[inner.used];
                inner.freelist[inner.used] = id;
                return Some(id);
            }
        }
        None
    }

    /// Copy the name stored at `id` into a fresh `Vec`, `None` if not occupied.
    pub fn getbyid(&self, id: usize) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        for i in 0..inner.used {
            if inner.freelist[i] == id {
                return Some(inner.registry[id * inner.namelen..(id + 1) * inner.namelen].to_vec());
            }
        }
        None
    }
}
