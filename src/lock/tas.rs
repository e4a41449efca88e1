use std::hint;
use std::sync::atomic::{AtomicBool, Ordering::*};

use crate::guard::TasGuard;
use crate::lock::BorrowError;

use super::{Lock, LockRef, UnboundedLock};

pub struct TasLock { locked: AtomicBool }

impl TasLock {
    pub fn is_locked(&self) -> bool {
        self.locked.load(Relaxed)
    }
}

impl Default for TasLock {
    fn default() -> Self { Self::new() }
}

impl Lock for TasLock {
    type Ref<'a> = &'a TasLock;
    fn borrow(&self) -> Result<Self::Ref<'_>, BorrowError> {
        Ok(self)
    }
}

impl UnboundedLock for TasLock {
    fn new() -> Self {
        TasLock { locked: AtomicBool::new(false) }
    }
}

impl<'a> LockRef<'a> for &'a TasLock {
    type Guard<'g> = TasGuard<'g> where Self: 'g;
    fn acquire(&mut self) -> Self::Guard<'_> {
        let locked = &self.locked;
        // every attempt is a full exchange, never a plain load first
        while locked.swap(true, Acquire) { hint::spin_loop(); }
        TasGuard::new(locked)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use super::*;

    #[test]
    fn starts_unlocked() {
        let lock = TasLock::new();
        assert!(!lock.is_locked());
    }

    #[test]
    fn guard_drop_releases() {
        let lock = TasLock::new();
        let mut r = lock.borrow().unwrap();
        let guard = r.acquire();
        assert!(lock.is_locked());
        drop(guard);
        assert!(!lock.is_locked());
        let _again = r.acquire();
        assert!(lock.is_locked());
    }

    #[test]
    fn mutual_exclusion() {
        let lock = TasLock::new();
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
}
