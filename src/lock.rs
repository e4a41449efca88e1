use thiserror::Error;

mod array;
mod seq;
mod tas;

pub use array::{ArrayLock, ArrayRef, DEFAULT_CAPACITY};
pub use seq::{SeqLock, SeqRef};
pub use tas::TasLock;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BorrowError {
    #[error("thread capacity exceeded")]
    ThreadCapacityExceeded,
}

pub trait Lock: Sized {
    type Ref<'a>: LockRef<'a> where Self: 'a;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError>;
}

/// A lock that can only be shared by a fixed number of threads at once.
pub trait BoundedLock: Lock {
    fn with_capacity(max_threads: usize) -> Self;
    fn capacity(&self) -> usize;
    fn refs_left(&self) -> usize;
}

pub trait UnboundedLock: Lock {
    fn new() -> Self;
}

/// A thread's handle on a lock.
///
/// The guard borrows the handle, so a handle holds at most one ticket at a
/// time:
///
/// ```compile_fail
/// use frisbee::lock::{ArrayLock, BoundedLock, Lock, LockRef};
///
/// let lock = ArrayLock::with_capacity(1);
/// let mut r = lock.borrow().unwrap();
/// let first = r.acquire();
/// let second = r.acquire();
/// drop((first, second));
/// ```
pub trait LockRef<'a>: Send {
    // the guard's drop method should release the lock
    type Guard<'g>: Drop where Self: 'g;
    fn acquire(&mut self) -> Self::Guard<'_>;
}
