//! Capability traits for raw lock types, and a data-carrying cell generic over them.
//!
//! Generic code that only needs "something that can be acquired and released"
//! is written against [`Lockable`]; code that additionally wants reader
//! sharing asks for [`SharedLockable`]. Both are static-dispatch `unsafe`
//! traits: [`LockCell`] hands out `&mut T` on the strength of an
//! implementation's exclusion guarantee, so implementing them is a promise.
//!
//! Implementations are provided for [`SpinLock`] and for `parking_lot`'s raw
//! mutex and reader-writer lock.

use crate::spin::SpinLock;

use core::cell::UnsafeCell;
use core::fmt;
use core::ops::{Deref, DerefMut};

use parking_lot::lock_api::{RawMutex as _, RawRwLock as _};

/// A raw lock offering exclusive acquisition.
///
/// # Safety
///
/// Implementations must guarantee mutual exclusion: between a return from
/// [`acquire_exclusive`](Lockable::acquire_exclusive) and the matching
/// [`release_exclusive`](Lockable::release_exclusive), no other call to
/// `acquire_exclusive` (or, for [`SharedLockable`] types, `acquire_shared`)
/// on the same lock may return. Acquisition must have acquire ordering and
/// release must have release ordering.
///
/// A lock that does not actually exclude cannot be plugged in from safe code:
///
/// ```compile_fail
/// use fibre_queue::Lockable;
///
/// struct NoLock;
///
/// impl Lockable for NoLock {
///   fn acquire_exclusive(&self) {}
///   unsafe fn release_exclusive(&self) {}
/// }
/// ```
pub unsafe trait Lockable {
  /// Blocks (by whatever means the lock uses) until exclusive access is held.
  fn acquire_exclusive(&self);

  /// Releases exclusive access.
  ///
  /// # Safety
  ///
  /// The caller must currently hold exclusive access acquired through
  /// [`acquire_exclusive`](Lockable::acquire_exclusive) on this same lock.
  unsafe fn release_exclusive(&self);
}

/// A raw lock that additionally supports shared (reader) acquisition.
///
/// # Safety
///
/// While any shared holder exists, no call to
/// [`acquire_exclusive`](Lockable::acquire_exclusive) on the same lock may
/// return, and [`acquire_shared`](SharedLockable::acquire_shared) must not
/// return while an exclusive holder exists. Ordering requirements are the
/// same as for [`Lockable`].
pub unsafe trait SharedLockable: Lockable {
  /// Blocks until shared access is held. Any number of shared holders may
  /// coexist, but never alongside an exclusive holder.
  fn acquire_shared(&self);

  /// Releases one unit of shared access.
  ///
  /// # Safety
  ///
  /// The caller must currently hold shared access acquired through
  /// [`acquire_shared`](SharedLockable::acquire_shared) on this same lock.
  unsafe fn release_shared(&self);
}

// SAFETY: the CAS loop admits one holder at a time with acquire/release ordering.
unsafe impl Lockable for SpinLock {
  #[inline]
  fn acquire_exclusive(&self) {
    self.lock();
  }

  #[inline]
  unsafe fn release_exclusive(&self) {
    self.unlock();
  }
}

// SAFETY: `lock_api::RawMutex` carries the same exclusion contract.
unsafe impl Lockable for parking_lot::RawMutex {
  #[inline]
  fn acquire_exclusive(&self) {
    self.lock();
  }

  #[inline]
  unsafe fn release_exclusive(&self) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { self.unlock() }
  }
}

// SAFETY: `lock_api::RawRwLock` carries the same exclusion contract.
unsafe impl Lockable for parking_lot::RawRwLock {
  #[inline]
  fn acquire_exclusive(&self) {
    self.lock_exclusive();
  }

  #[inline]
  unsafe fn release_exclusive(&self) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { self.unlock_exclusive() }
  }
}

// SAFETY: `lock_api::RawRwLock` keeps readers and the writer apart.
unsafe impl SharedLockable for parking_lot::RawRwLock {
  #[inline]
  fn acquire_shared(&self) {
    self.lock_shared();
  }

  #[inline]
  unsafe fn release_shared(&self) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { self.unlock_shared() }
  }
}

/// A value protected by a raw lock of type `L`.
///
/// `LockCell<SpinLock, T>` is a spin-mutex, `LockCell<parking_lot::RawRwLock, T>`
/// a reader-writer lock, and so on for any [`Lockable`] type.
pub struct LockCell<L, T: ?Sized> {
  raw: L,
  data: UnsafeCell<T>,
}

// SAFETY: the cell only hands out `&mut T` under exclusive acquisition, so
// moving it between threads requires exactly what moving `T` requires.
unsafe impl<L: Send, T: ?Sized + Send> Send for LockCell<L, T> {}
// SAFETY: exclusive guards give `&mut T` to one thread at a time (needs
// `T: Send`); shared guards give `&T` to many threads at once (needs `T: Sync`).
unsafe impl<L: Sync, T: ?Sized + Send + Sync> Sync for LockCell<L, T> {}

impl<L: Lockable, T> LockCell<L, T> {
  /// Wraps `value` behind the given raw lock.
  #[inline]
  pub const fn with_lock(raw: L, value: T) -> Self {
    Self {
      raw,
      data: UnsafeCell::new(value),
    }
  }

  /// Consumes the cell, returning the protected value.
  #[inline]
  pub fn into_inner(self) -> T {
    self.data.into_inner()
  }
}

impl<L: Lockable + Default, T> LockCell<L, T> {
  /// Wraps `value` behind a freshly constructed raw lock.
  #[inline]
  pub fn new(value: T) -> Self {
    Self::with_lock(L::default(), value)
  }
}

impl<L: Lockable, T: ?Sized> LockCell<L, T> {
  /// Acquires exclusive access and returns a guard dereferencing to `&mut T`.
  #[inline]
  pub fn lock(&self) -> ExclusiveGuard<'_, L, T> {
    self.raw.acquire_exclusive();
    ExclusiveGuard { cell: self }
  }

  /// Returns a mutable reference without locking; the borrow checker
  /// already guarantees there are no other users.
  #[inline]
  pub fn get_mut(&mut self) -> &mut T {
    self.data.get_mut()
  }

  /// Returns the underlying raw lock.
  #[inline]
  pub fn raw(&self) -> &L {
    &self.raw
  }
}

impl<L: SharedLockable, T: ?Sized> LockCell<L, T> {
  /// Acquires shared access and returns a guard dereferencing to `&T`.
  #[inline]
  pub fn read(&self) -> SharedGuard<'_, L, T> {
    self.raw.acquire_shared();
    SharedGuard { cell: self }
  }
}

impl<L: Lockable + Default, T: Default> Default for LockCell<L, T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

impl<L, T: ?Sized> fmt::Debug for LockCell<L, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LockCell").finish_non_exhaustive()
  }
}

/// Exclusive access to the contents of a [`LockCell`]; released on drop.
#[must_use = "if unused the LockCell will immediately unlock"]
pub struct ExclusiveGuard<'a, L: Lockable, T: ?Sized> {
  cell: &'a LockCell<L, T>,
}

impl<L: Lockable, T: ?Sized> Deref for ExclusiveGuard<'_, L, T> {
  type Target = T;
  #[inline]
  fn deref(&self) -> &T {
    // SAFETY: exclusive access is held for the guard's lifetime.
    unsafe { &*self.cell.data.get() }
  }
}

impl<L: Lockable, T: ?Sized> DerefMut for ExclusiveGuard<'_, L, T> {
  #[inline]
  fn deref_mut(&mut self) -> &mut T {
    // SAFETY: exclusive access is held for the guard's lifetime.
    unsafe { &mut *self.cell.data.get() }
  }
}

impl<L: Lockable, T: ?Sized> Drop for ExclusiveGuard<'_, L, T> {
  #[inline]
  fn drop(&mut self) {
    // SAFETY: acquired in `LockCell::lock`.
    unsafe { self.cell.raw.release_exclusive() }
  }
}

impl<L: Lockable, T: ?Sized + fmt::Debug> fmt::Debug for ExclusiveGuard<'_, L, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&**self, f)
  }
}

/// Shared access to the contents of a [`LockCell`]; released on drop.
#[must_use = "if unused the LockCell will immediately unlock"]
pub struct SharedGuard<'a, L: SharedLockable, T: ?Sized> {
  cell: &'a LockCell<L, T>,
}

impl<L: SharedLockable, T: ?Sized> Deref for SharedGuard<'_, L, T> {
  type Target = T;
  #[inline]
  fn deref(&self) -> &T {
    // SAFETY: shared access is held, so no exclusive guard exists.
    unsafe { &*self.cell.data.get() }
  }
}

impl<L: SharedLockable, T: ?Sized> Drop for SharedGuard<'_, L, T> {
  #[inline]
  fn drop(&mut self) {
    // SAFETY: acquired in `LockCell::read`.
    unsafe { self.cell.raw.release_shared() }
  }
}

impl<L: SharedLockable, T: ?Sized + fmt::Debug> fmt::Debug for SharedGuard<'_, L, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&**self, f)
  }
}
