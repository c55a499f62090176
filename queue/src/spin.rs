//! A minimal busy-wait lock for very short critical sections.
//!
//! `SpinLock` never parks or yields: a waiting thread burns CPU until the
//! holder releases. Use it only where the protected work is a handful of
//! instructions and parking overhead would dominate. There is no fairness
//! guarantee; under a hostile scheduler a waiter can starve.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Emits a CPU instruction that signals the processor that it is in a spin loop.
#[inline(always)]
fn spin_hint() {
  std::hint::spin_loop();
}

/// A test-and-set spin lock that protects no data of its own.
///
/// Pair it with [`LockCell`](crate::LockCell) to guard a value, or drive it
/// manually with [`lock`](SpinLock::lock) / [`unlock`](SpinLock::unlock).
pub struct SpinLock {
  locked: AtomicBool,
}

/// RAII guard returned by [`SpinLock::guard`]; releases the lock on drop.
#[must_use = "if unused the SpinLock will immediately unlock"]
pub struct SpinGuard<'a> {
  lock: &'a SpinLock,
}

impl SpinLock {
  /// Creates a new, unlocked spin lock.
  #[inline]
  pub const fn new() -> Self {
    Self {
      locked: AtomicBool::new(false),
    }
  }

  /// Spins until the lock transitions from free to locked.
  ///
  /// The successful transition has acquire ordering, so everything the
  /// previous holder wrote before `unlock` is visible afterwards.
  #[inline]
  pub fn lock(&self) {
    while self
      .locked
      .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
      .is_err()
    {
      // Wait on a plain load so contended cores don't bounce the cache line
      // with failed CAS writes.
      while self.locked.load(Ordering::Relaxed) {
        spin_hint();
      }
    }
  }

  /// Attempts to take the lock once without spinning.
  #[inline]
  pub fn try_lock(&self) -> bool {
    self
      .locked
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .is_ok()
  }

  /// Releases the lock with release ordering.
  ///
  /// Calling this without holding the lock is a caller contract violation
  /// and is not detected: it frees the lock out from under the real holder.
  #[inline]
  pub fn unlock(&self) {
    self.locked.store(false, Ordering::Release);
  }

  /// Returns `true` if some thread currently holds the lock.
  ///
  /// This is a snapshot and may be stale by the time it is observed.
  #[inline]
  pub fn is_locked(&self) -> bool {
    self.locked.load(Ordering::Relaxed)
  }

  /// Spins until the lock is acquired and returns a guard that releases it
  /// when dropped.
  #[inline]
  pub fn guard(&self) -> SpinGuard<'_> {
    self.lock();
    SpinGuard { lock: self }
  }
}

impl Default for SpinLock {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for SpinLock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SpinLock")
      .field("locked", &self.is_locked())
      .finish()
  }
}

impl Drop for SpinGuard<'_> {
  #[inline]
  fn drop(&mut self) {
    self.lock.unlock();
  }
}

impl fmt::Debug for SpinGuard<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SpinGuard").finish_non_exhaustive()
  }
}
