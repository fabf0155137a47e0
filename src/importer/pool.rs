//! Resolver handle allocation.
//!
//! Handles cross the native boundary as LibSass importer cookies. Values below
//! [`MIN_HANDLE`] are never issued, so a handle can't be mistaken for a null or
//! a small sentinel. Free handles are kept in a pool that is refilled a block
//! at a time.

use std::collections::VecDeque;
use std::ffi::c_void;

/// Smallest handle value ever issued
pub const MIN_HANDLE: usize = 4096;

/// Number of handles added to the free list per refill
pub const HANDLE_BLOCK_SIZE: usize = 32;

/// Identifies one registered resolver for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    /// The raw handle value
    pub fn get(self) -> usize {
        self.0
    }

    /// Encode as a native cookie pointer. The pointer is never dereferenced.
    pub fn as_cookie(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    /// Decode a native cookie; values below [`MIN_HANDLE`] are rejected.
    pub fn from_cookie(cookie: *mut c_void) -> Option<Self> {
        let value = cookie as usize;
        (value >= MIN_HANDLE).then_some(Handle(value))
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Pool of free handles
#[derive(Debug)]
pub struct HandlePool {
    /// Free handles, oldest release first
    free: VecDeque<Handle>,
    /// Next value never handed out
    next: usize,
    /// Handles currently checked out
    in_use: usize,
}

impl HandlePool {
    /// Create an empty pool starting at [`MIN_HANDLE`]
    pub fn new() -> Self {
        Self {
            free: VecDeque::with_capacity(HANDLE_BLOCK_SIZE),
            next: MIN_HANDLE,
            in_use: 0,
        }
    }

    /// Take a free handle, refilling the pool if it is empty
    pub fn acquire(&mut self) -> Handle {
        loop {
            // FIFO: a released handle is reissued only after every older one.
            if let Some(handle) = self.free.pop_front() {
                self.in_use += 1;
                return handle;
            }
            self.refill();
        }
    }

    /// Return a handle to the pool
    pub fn release(&mut self, handle: Handle) {
        debug_assert!(handle.0 >= MIN_HANDLE && handle.0 < self.next);
        self.in_use = self.in_use.saturating_sub(1);
        self.free.push_back(handle);
    }

    /// Number of handles checked out
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Number of handles ready for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total handle values ever allocated
    pub fn allocated(&self) -> usize {
        self.next - MIN_HANDLE
    }

    fn refill(&mut self) {
        let start = self.next;
        self.next += HANDLE_BLOCK_SIZE;
        self.free.extend((start..self.next).map(Handle));
        tracing::trace!(start, count = HANDLE_BLOCK_SIZE, "Refilled handle pool");
    }
}

impl Default for HandlePool {
    fn default() -> Self {
        Self::new()
    }
}
