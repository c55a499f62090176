//! Guarded-wait implementations of the blocking push and pop operations.
//!
//! Every wait follows the same shape: take the mutex, test the predicate,
//! park on the matching condition variable (which releases the mutex), and
//! re-test after waking. Spurious wakeups and stolen slots simply loop.

use super::{BoundedBlockingQueue, PushStatus};
use crate::error::{PopTimeoutError, PushTimeoutError, QueueClosed};

use std::time::Instant;

/// The blocking push. With `allow_oversize` the capacity wait is skipped.
pub(crate) fn push_sync<T>(
  queue: &BoundedBlockingQueue<T>,
  item: T,
  allow_oversize: bool,
) -> Result<PushStatus, QueueClosed<T>> {
  let mut state = queue.state.lock();

  if !allow_oversize {
    // Closed is part of the predicate so `close()` releases parked producers.
    while !state.closed && state.buffer.len() >= queue.capacity {
      queue.not_full.wait(&mut state);
    }
  }
  if state.closed {
    return Err(QueueClosed(item));
  }

  state.buffer.push_back(item);
  let len = state.buffer.len();
  drop(state);

  if len > queue.capacity {
    tracing::trace!(len, capacity = queue.capacity, "oversize push exceeded nominal capacity");
  }

  // Wake one consumer outside the lock to reduce contention.
  queue.not_empty.notify_one();
  Ok(PushStatus {
    len,
    high_water: len >= queue.high_water_mark,
  })
}

/// The blocking push with an optional deadline. `None` waits without bound.
pub(crate) fn push_deadline_sync<T>(
  queue: &BoundedBlockingQueue<T>,
  item: T,
  deadline: Option<Instant>,
) -> Result<(), PushTimeoutError<T>> {
  let Some(deadline) = deadline else {
    return push_sync(queue, item, false)
      .map(|_| ())
      .map_err(PushTimeoutError::from);
  };

  let mut state = queue.state.lock();
  while !state.closed && state.buffer.len() >= queue.capacity {
    if queue.not_full.wait_until(&mut state, deadline).timed_out() {
      // One last look under the lock: a slot may have opened as we timed out.
      if !state.closed && state.buffer.len() >= queue.capacity {
        return Err(PushTimeoutError::Timeout(item));
      }
      break;
    }
  }
  if state.closed {
    return Err(PushTimeoutError::Closed(item));
  }

  state.buffer.push_back(item);
  drop(state);
  queue.not_empty.notify_one();
  Ok(())
}

/// The blocking pop. Returns `None` once the queue is closed and drained.
pub(crate) fn pop_sync<T>(queue: &BoundedBlockingQueue<T>) -> Option<T> {
  let mut state = queue.state.lock();
  loop {
    if let Some(item) = state.buffer.pop_front() {
      drop(state);
      queue.not_full.notify_one();
      return Some(item);
    }
    if state.closed {
      return None;
    }
    queue.not_empty.wait(&mut state);
  }
}

/// The blocking pop with an optional deadline. `None` waits without bound.
pub(crate) fn pop_deadline_sync<T>(
  queue: &BoundedBlockingQueue<T>,
  deadline: Option<Instant>,
) -> Result<T, PopTimeoutError> {
  let Some(deadline) = deadline else {
    return pop_sync(queue).ok_or(PopTimeoutError::Closed);
  };

  let mut state = queue.state.lock();
  loop {
    if let Some(item) = state.buffer.pop_front() {
      drop(state);
      queue.not_full.notify_one();
      return Ok(item);
    }
    if state.closed {
      return Err(PopTimeoutError::Closed);
    }
    if queue.not_empty.wait_until(&mut state, deadline).timed_out() {
      // Same final re-check as the push side before reporting a timeout.
      return match state.buffer.pop_front() {
        Some(item) => {
          drop(state);
          queue.not_full.notify_one();
          Ok(item)
        }
        None if state.closed => Err(PopTimeoutError::Closed),
        None => Err(PopTimeoutError::Timeout),
      };
    }
  }
}
