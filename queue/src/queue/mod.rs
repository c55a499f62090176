// src/queue/mod.rs

//! A bounded, closeable, lock-based MPMC blocking queue.
//!
//! [`BoundedBlockingQueue`] is the hand-off point between producers and a
//! fixed set of workers. It is deliberately coarse: one `parking_lot::Mutex`
//! guards both the buffer and the closed flag, and two condition variables
//! park producers waiting for space and consumers waiting for items. Every
//! operation, including the read-only inspectors, goes through that mutex, so
//! all of them are linearizable with respect to each other.
//!
//! ### Shutdown
//!
//! [`close`](BoundedBlockingQueue::close) is one-way. After it:
//!
//! - every push fails immediately with [`QueueClosed`], including pushers
//!   that were already parked waiting for space;
//! - pops keep returning buffered items in FIFO order, then return `None`
//!   once the buffer is drained.
//!
//! A worker loop therefore reads `while let Some(job) = queue.pop() { .. }`
//! and exits exactly when the queue is closed and empty.
//!
//! ### Backpressure override
//!
//! [`push_with`](BoundedBlockingQueue::push_with) can bypass the capacity wait
//! and reports whether the queue sits at or above its high-water mark, so a
//! producer can decide between slowing down and pushing through. Oversize
//! pushes are not bounded; the nominal capacity may be exceeded by any amount.

mod builder;
mod sync_impl;


pub use builder::{QueueBuilder, DEFAULT_CAPACITY};

use core::fmt;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{
  BuildError, PopTimeoutError, PushTimeoutError, QueueClosed, TryPopError, TryPushError,
};

/// State protected by the queue mutex.
pub(crate) struct QueueState<T> {
  pub(crate) buffer: VecDeque<T>,
  pub(crate) closed: bool,
}

/// Outcome of a successful [`push_with`](BoundedBlockingQueue::push_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushStatus {
  len: usize,
  high_water: bool,
}

impl PushStatus {
  /// `true` if the queue length right after the insertion was at or above
  /// the high-water mark (half the capacity unless configured otherwise).
  #[inline]
  pub fn is_high_water(&self) -> bool {
    self.high_water
  }

  /// The queue length right after the insertion.
  #[inline]
  pub fn queue_len(&self) -> usize {
    self.len
  }
}

/// A capacity-limited FIFO queue shared by any number of producer and
/// consumer threads.
///
/// Share it behind an `Arc`. Items are owned by the queue from the moment a
/// push accepts them until a pop hands them to the caller. Items still
/// buffered when the queue is dropped are dropped with it.
pub struct BoundedBlockingQueue<T> {
  pub(crate) state: Mutex<QueueState<T>>,
  /// Consumers park here while the buffer is empty.
  pub(crate) not_empty: Condvar,
  /// Producers park here while the buffer is full.
  pub(crate) not_full: Condvar,
  pub(crate) capacity: usize,
  pub(crate) high_water_mark: usize,
}

impl<T> BoundedBlockingQueue<T> {
  /// Creates an open, empty queue holding at most `capacity` items.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::ZeroCapacity`] if `capacity` is zero.
  pub fn new(capacity: usize) -> Result<Self, BuildError> {
    QueueBuilder::new().capacity(capacity).build()
  }

  /// Returns a builder for configuring a queue.
  pub fn builder() -> QueueBuilder {
    QueueBuilder::new()
  }

  pub(crate) fn from_parts(capacity: usize, high_water_mark: usize) -> Self {
    Self {
      state: Mutex::new(QueueState {
        // Grow on demand; capacity may be far larger than what is ever buffered.
        buffer: VecDeque::new(),
        closed: false,
      }),
      not_empty: Condvar::new(),
      not_full: Condvar::new(),
      capacity,
      high_water_mark,
    }
  }

  // --- Push ---

  /// Appends `item` to the tail, blocking while the queue is full.
  ///
  /// # Errors
  ///
  /// Returns [`QueueClosed`] holding the item if the queue is closed, either
  /// on entry or while this call was waiting for space. Production must stop.
  pub fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
    sync_impl::push_sync(self, item, false).map(|_| ())
  }

  /// Appends `item`, optionally bypassing the capacity wait, and reports
  /// whether the queue is now at or above its high-water mark.
  ///
  /// With `allow_oversize` set, the item is appended even if the queue is
  /// already at or beyond capacity; the queue then transiently holds more
  /// than its nominal bound.
  ///
  /// # Errors
  ///
  /// Returns [`QueueClosed`] holding the item if the queue is closed.
  pub fn push_with(&self, item: T, allow_oversize: bool) -> Result<PushStatus, QueueClosed<T>> {
    sync_impl::push_sync(self, item, allow_oversize)
  }

  /// Appends `item` without blocking.
  ///
  /// # Errors
  ///
  /// [`TryPushError::Full`] if the queue is at capacity, [`TryPushError::Closed`]
  /// if it has been closed. The item is returned either way.
  pub fn try_push(&self, item: T) -> Result<(), TryPushError<T>> {
    let mut state = self.state.lock();
    if state.closed {
      return Err(TryPushError::Closed(item));
    }
    if state.buffer.len() >= self.capacity {
      return Err(TryPushError::Full(item));
    }
    state.buffer.push_back(item);
    drop(state);
    self.not_empty.notify_one();
    Ok(())
  }

  /// Like [`push`](Self::push), but gives up once `timeout` has elapsed.
  ///
  /// # Errors
  ///
  /// [`PushTimeoutError::Timeout`] if no slot freed up in time,
  /// [`PushTimeoutError::Closed`] if the queue is or becomes closed.
  pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<(), PushTimeoutError<T>> {
    sync_impl::push_deadline_sync(self, item, deadline_after(timeout))
  }

  // --- Pop ---

  /// Removes and returns the head item, blocking while the queue is empty
  /// and open.
  ///
  /// Returns `None` only once the queue is closed and drained.
  pub fn pop(&self) -> Option<T> {
    sync_impl::pop_sync(self)
  }

  /// Removes and returns the head item without blocking.
  ///
  /// # Errors
  ///
  /// [`TryPopError::Empty`] if the queue is empty but open (retry or back
  /// off), [`TryPopError::Closed`] if it is empty and closed (terminal).
  pub fn try_pop(&self) -> Result<T, TryPopError> {
    let mut state = self.state.lock();
    match state.buffer.pop_front() {
      Some(item) => {
        drop(state);
        self.not_full.notify_one();
        Ok(item)
      }
      None if state.closed => Err(TryPopError::Closed),
      None => Err(TryPopError::Empty),
    }
  }

  /// Like [`pop`](Self::pop), but gives up once `timeout` has elapsed.
  ///
  /// # Errors
  ///
  /// [`PopTimeoutError::Timeout`] if nothing arrived in time,
  /// [`PopTimeoutError::Closed`] if the queue is closed and drained.
  pub fn pop_timeout(&self, timeout: Duration) -> Result<T, PopTimeoutError> {
    sync_impl::pop_deadline_sync(self, deadline_after(timeout))
  }

  // --- Lifecycle ---

  /// Closes the queue permanently.
  ///
  /// Wakes every parked consumer and producer: consumers drain what is left
  /// and then see `None`, producers fail with [`QueueClosed`]. Closing an
  /// already closed queue does nothing. Returns `true` only for the call
  /// that performed the transition.
  pub fn close(&self) -> bool {
    let pending = {
      let mut state = self.state.lock();
      if state.closed {
        return false;
      }
      state.closed = true;
      state.buffer.len()
    };
    tracing::debug!(capacity = self.capacity, pending, "queue closed");
    self.not_empty.notify_all();
    self.not_full.notify_all();
    true
  }

  /// Reopens the queue and discards every buffered item.
  ///
  /// Takes `&mut self`, so no other thread can be pushing or popping while
  /// it runs. Reuse between runs through `Arc::get_mut` once all workers
  /// have been joined.
  pub fn reset(&mut self) {
    let state = self.state.get_mut();
    let discarded = state.buffer.len();
    state.buffer.clear();
    state.closed = false;
    tracing::debug!(capacity = self.capacity, discarded, "queue reset");
  }

  // --- Inspectors ---
  // Point-in-time snapshots; concurrent operations may invalidate them
  // before the caller looks. Use for hints and metrics only.

  /// Number of buffered items.
  pub fn len(&self) -> usize {
    self.state.lock().buffer.len()
  }

  /// `true` if no items are buffered.
  pub fn is_empty(&self) -> bool {
    self.state.lock().buffer.is_empty()
  }

  /// `true` if the buffer holds at least `capacity` items.
  pub fn is_full(&self) -> bool {
    self.state.lock().buffer.len() >= self.capacity
  }

  /// `true` once [`close`](Self::close) has been called.
  pub fn is_closed(&self) -> bool {
    self.state.lock().closed
  }

  /// The nominal capacity.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// The length at or above which [`push_with`](Self::push_with) reports high water.
  #[inline]
  pub fn high_water_mark(&self) -> usize {
    self.high_water_mark
  }
}

impl<T> Default for BoundedBlockingQueue<T> {
  fn default() -> Self {
    Self::from_parts(DEFAULT_CAPACITY, DEFAULT_CAPACITY / 2)
  }
}

impl<T> fmt::Debug for BoundedBlockingQueue<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut d = f.debug_struct("BoundedBlockingQueue");
    d.field("capacity", &self.capacity)
      .field("high_water_mark", &self.high_water_mark);
    // Never block inside Debug; a held lock just hides the live fields.
    match self.state.try_lock() {
      Some(state) => d
        .field("len", &state.buffer.len())
        .field("closed", &state.closed)
        .finish(),
      None => d.finish_non_exhaustive(),
    }
  }
}

/// Deadlines far enough out to overflow `Instant` behave as an unbounded wait.
fn deadline_after(timeout: Duration) -> Option<Instant> {
  Instant::now().checked_add(timeout)
}
