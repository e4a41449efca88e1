use std::sync::atomic::{fence, AtomicUsize, Ordering::*};

use crate::guard::SeqGuard;
use crate::lock::BorrowError;

use super::{ArrayLock, ArrayRef, BoundedLock, Lock, LockRef, DEFAULT_CAPACITY};

/// Writers queue on the array lock and keep `version` odd while they hold it.
pub struct SeqLock {
    version: AtomicUsize,
    lock: ArrayLock,
}

pub struct SeqRef<'a> {
    version: &'a AtomicUsize,
    inner: ArrayRef<'a>,
}

impl SeqLock {
    pub fn read_version(&self) -> usize {
        self.version.load(Acquire)
    }

    pub fn is_writing(&self) -> bool {
        self.read_version() % 2 == 1
    }

    /// Whether whatever was read since `start` was sampled is consistent.
    pub fn validate(&self, start: usize) -> bool {
        fence(Acquire);
        start % 2 == 0 && self.version.load(Relaxed) == start
    }
}

impl Default for SeqLock {
    fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl Lock for SeqLock {
    type Ref<'a> = SeqRef<'a>;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        let inner = self.lock.borrow()?;
        Ok(SeqRef { version: &self.version, inner })
    }
}

impl BoundedLock for SeqLock {
    fn with_capacity(max_threads: usize) -> Self {
        SeqLock {
            version: AtomicUsize::new(0),
            lock: ArrayLock::with_capacity(max_threads),
        }
    }
    fn capacity(&self) -> usize { self.lock.capacity() }
    fn refs_left(&self) -> usize { self.lock.refs_left() }
}

impl SeqRef<'_> {
    pub fn read_version(&self) -> usize {
        self.version.load(Acquire)
    }
}

impl<'a> LockRef<'a> for SeqRef<'a> {
    type Guard<'g> = SeqGuard<'g> where Self: 'g;
    fn acquire(&mut self) -> Self::Guard<'_> {
        // bump only once the queue lock is ours, so two writers can't cancel
        // out each other's odd version
        let inner = self.inner.acquire();
        self.version.fetch_add(1, Relaxed);
        fence(Release);
        SeqGuard::new(self.version, inner)
    }
}
