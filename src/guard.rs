use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering::*};

pub struct TasGuard<'a> { locked: &'a AtomicBool }

impl<'a> TasGuard<'a> {
    pub fn new(locked: &'a AtomicBool) -> Self {
        Self { locked }
    }
}

impl Drop for TasGuard<'_> {
    fn drop(&mut self) {
        self.locked.store(false, Release);
    }
}

pub struct ArrayGuard<'a> {
    ticket: usize,
    curr_slot: &'a AtomicBool,
    next_slot: &'a AtomicBool,
}

impl<'a> ArrayGuard<'a> {
    pub fn new(ticket: usize, curr_slot: &'a AtomicBool, next_slot: &'a AtomicBool) -> Self {
        Self { ticket, curr_slot, next_slot }
    }
    pub fn ticket(&self) -> usize { self.ticket }
}

impl Drop for ArrayGuard<'_> {
    fn drop(&mut self) {
        // the slot must be closed again before its next owner, `capacity`
        // tickets later, can be let through
        self.curr_slot.store(false, Relaxed);
        self.next_slot.store(true, Release);
    }
}

/// Write access to a `SeqLock`. The version is odd for the guard's lifetime.
pub struct SeqGuard<'a> {
    version: &'a AtomicUsize,
    inner: ArrayGuard<'a>,
}

impl<'a> SeqGuard<'a> {
    pub fn new(version: &'a AtomicUsize, inner: ArrayGuard<'a>) -> Self {
        Self { version, inner }
    }
    pub fn ticket(&self) -> usize { self.inner.ticket() }
}

impl Drop for SeqGuard<'_> {
    fn drop(&mut self) {
        // back to even while still holding the queue lock; `inner` is
        // released right after this
        self.version.fetch_add(1, Release);
    }
}
