use std::hint;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering::*};

use crate::guard::ArrayGuard;
use crate::lock::BorrowError::{self, *};

use super::{BoundedLock, Lock, LockRef};

pub const DEFAULT_CAPACITY: usize = 50;

/// Anderson array lock. A slot is reused `capacity` tickets later, so at most
/// `capacity` refs may be borrowed at once.
pub struct ArrayLock {
    slots: Box<[AtomicBool]>,
    next_ticket: AtomicUsize,
    refs_left: AtomicIsize,
}

pub struct ArrayRef<'a>(&'a ArrayLock);

impl ArrayLock {
    fn slot(&self, ticket: usize) -> &AtomicBool {
        // index is always in bounds because of the modulo
        unsafe { self.slots.get_unchecked(ticket % self.capacity()) }
    }

    /// The ticket the next acquirer will draw.
    pub fn next_ticket(&self) -> usize {
        self.next_ticket.load(Relaxed)
    }

    pub fn is_available(&self, ticket: usize) -> bool {
        self.slot(ticket).load(Relaxed)
    }
}

impl Default for ArrayLock {
    fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl Lock for ArrayLock {
    type Ref<'a> = ArrayRef<'a>;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        let refs_left = self.refs_left.fetch_sub(1, Relaxed);
        if refs_left > 0 {
            Ok(ArrayRef(self))
        } else {
            self.refs_left.fetch_add(1, Relaxed);
            Err(ThreadCapacityExceeded)
        }
    }
}

impl BoundedLock for ArrayLock {
    fn with_capacity(max_threads: usize) -> Self {
        assert!(max_threads > 0, "array lock needs at least one slot");
        let mut slots: Vec<AtomicBool> = Vec::with_capacity(max_threads);
        slots.push(AtomicBool::new(true));
        for _ in 1..max_threads { slots.push(AtomicBool::new(false)); }
        ArrayLock {
            slots: slots.into_boxed_slice(),
            next_ticket: AtomicUsize::new(0),
            refs_left: AtomicIsize::new(max_threads as isize),
        }
    }
    fn capacity(&self) -> usize { self.slots.len() }
    fn refs_left(&self) -> usize {
        let refs_left = self.refs_left.load(Relaxed);
        if refs_left < 0 { 0 } else { refs_left as usize }
    }
}

impl Drop for ArrayRef<'_> {
    fn drop(&mut self) {
        self.0.refs_left.fetch_add(1, Relaxed);
    }
}

impl<'a> LockRef<'a> for ArrayRef<'a> {
    type Guard<'g> = ArrayGuard<'g> where Self: 'g;
    fn acquire(&mut self) -> Self::Guard<'_> {
        let lock = self.0;
        let ticket = lock.next_ticket.fetch_add(1, Relaxed);
        let curr_slot = lock.slot(ticket);
        let next_slot = lock.slot(ticket.wrapping_add(1));
        while !curr_slot.load(Acquire) { hint::spin_loop(); }
        ArrayGuard::new(ticket, curr_slot, next_slot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn only_first_slot_starts_available() {
        let lock = ArrayLock::with_capacity(4);
        assert!(lock.is_available(0));
        assert!((1..4).all(|t| !lock.is_available(t)));
        assert_eq!(lock.next_ticket(), 0);
    }

    #[test]
    fn release_hands_over_to_next_slot() {
        let lock = ArrayLock::with_capacity(3);
        let mut r = lock.borrow().unwrap();
        for ticket in 0..7 {
            let guard = r.acquire();
            assert_eq!(guard.ticket(), ticket);
            drop(guard);
            assert!(!lock.is_available(ticket));
            assert!(lock.is_available(ticket + 1));
        }
    }

    #[test]
    fn borrow_enforces_capacity() {
        let lock = ArrayLock::with_capacity(2);
        let a = lock.borrow().unwrap();
        let b = lock.borrow().unwrap();
        assert_eq!(lock.refs_left(), 0);
        assert_eq!(lock.borrow().err(), Some(ThreadCapacityExceeded));
        assert_eq!(lock.refs_left(), 0);
        drop(a);
        assert_eq!(lock.refs_left(), 1);
        let _c = lock.borrow().unwrap();
        drop(b);
        assert_eq!(lock.refs_left(), 1);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        let _ = ArrayLock::with_capacity(0);
    }

    #[test]
    fn mutual_exclusion() {
        let lock = ArrayLock::with_capacity(4);
        let inside = AtomicUsize::new(0);
        let total = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut r = lock.borrow().unwrap();
                    for _ in 0..500 {
                        let _guard = r.acquire();
                        assert_eq!(inside.fetch_add(1, Relaxed), 0);
                        for _ in 0..rand::random::<u8>() % 32 { hint::spin_loop(); }
                        total.fetch_add(1, Relaxed);
                        inside.fetch_sub(1, Relaxed);
                    }
                });
            }
        });
        assert_eq!(total.load(Relaxed), 2000);
    }

    #[test]
    fn held_ticket_blocks_the_next_ref() {
        let lock = ArrayLock::with_capacity(2);
        let mut a = lock.borrow().unwrap();
        let mut b = lock.borrow().unwrap();
        let released = AtomicBool::new(false);
        thread::scope(|s| {
            let first = a.acquire();
            assert_eq!(first.ticket(), 0);
            let released = &released;
            s.spawn(move || {
                thread::sleep(Duration::from_millis(20));
                released.store(true, Relaxed);
                drop(first);
            });
            let second = b.acquire();
            assert!(released.load(Relaxed));
            assert_eq!(second.ticket(), 1);
        });
        // `a` is free again only now that its guard is gone
        assert_eq!(a.acquire().ticket(), 2);
    }

    #[test]
    fn grants_in_ticket_order() {
        let lock = ArrayLock::with_capacity(4);
        let granted = Mutex::new(Vec::new());
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut r = lock.borrow().unwrap();
                    for _ in 0..200 {
                        let guard = r.acquire();
                        granted.lock().unwrap().push(guard.ticket());
                        for _ in 0..rand::random::<u8>() % 16 { hint::spin_loop(); }
                    }
                });
            }
        });
        let granted = granted.into_inner().unwrap();
        assert_eq!(granted, (0..800).collect::<Vec<_>>());
    }

    #[test]
    fn full_queue_keeps_fifo_order() {
        const CAPACITY: usize = 4;
        let lock = ArrayLock::with_capacity(CAPACITY);
        let granted = Mutex::new(Vec::new());
        let mut holder = lock.borrow().unwrap();
        let guard = holder.acquire();
        thread::scope(|s| {
            for _ in 1..CAPACITY {
                let mut r = lock.borrow().unwrap();
                let granted = &granted;
                s.spawn(move || {
                    let guard = r.acquire();
                    granted.lock().unwrap().push(guard.ticket());
                });
            }
            // every other seat is queued behind the holder before it lets go
            while lock.next_ticket() < CAPACITY { hint::spin_loop(); }
            assert!(lock.borrow().is_err());
            drop(guard);
        });
        assert_eq!(granted.into_inner().unwrap(), vec![1, 2, 3]);
        assert!(lock.is_available(CAPACITY));
    }
}
