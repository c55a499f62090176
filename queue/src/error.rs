// src/error.rs

use core::fmt;

// Item-carrying errors hand the rejected value back to the caller. `Debug` is
// written by hand so that `T` does not need to be `Debug` itself.
macro_rules! impl_item_error {
  (
    $enum_name:ident < $generic_param:ident >,
    $($variant:ident),+
    $(,)?
  ) => {
    impl<$generic_param> $enum_name<$generic_param> {
      /// Consumes the error, returning the item that could not be pushed.
      #[inline]
      pub fn into_inner(self) -> $generic_param {
        match self {
          $( $enum_name::$variant(v) => v, )+
        }
      }

      /// Returns `true` if the push failed because the queue was closed.
      #[inline]
      pub fn is_closed(&self) -> bool {
        matches!(self, $enum_name::Closed(_))
      }
    }

    impl<$generic_param> fmt::Debug for $enum_name<$generic_param> {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
          $( $enum_name::$variant(_) => {
            write!(f, concat!(stringify!($enum_name), "::", stringify!($variant), "(..)"))
          } )+
        }
      }
    }
  };
}

/// Error returned by blocking pushes when the queue has been closed.
///
/// Production must stop once this is observed: every later push fails the
/// same way. The rejected item is returned.
#[derive(thiserror::Error, PartialEq, Eq, Clone)]
#[error("push to closed queue is prohibited")]
pub struct QueueClosed<T>(pub T);

impl<T> QueueClosed<T> {
  /// Consumes the error, returning the item that could not be pushed.
  #[inline]
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> fmt::Debug for QueueClosed<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("QueueClosed(..)")
  }
}

/// Error returned by `try_push` when the item could not be enqueued
/// immediately.
#[derive(thiserror::Error, PartialEq, Eq, Clone)]
pub enum TryPushError<T> {
  /// The queue is at capacity. The item is returned.
  #[error("queue full")]
  Full(T),
  /// The queue has been closed. The item is returned.
  #[error("queue closed")]
  Closed(T),
}

impl_item_error!(TryPushError<T>, Full, Closed);

/// Error returned by `push_timeout`.
#[derive(thiserror::Error, PartialEq, Eq, Clone)]
pub enum PushTimeoutError<T> {
  /// No slot became free before the deadline. The item is returned.
  #[error("push operation timed out")]
  Timeout(T),
  /// The queue has been closed. The item is returned.
  #[error("queue closed")]
  Closed(T),
}

impl_item_error!(PushTimeoutError<T>, Timeout, Closed);

impl<T> From<QueueClosed<T>> for TryPushError<T> {
  fn from(err: QueueClosed<T>) -> Self {
    TryPushError::Closed(err.0)
  }
}

impl<T> From<QueueClosed<T>> for PushTimeoutError<T> {
  fn from(err: QueueClosed<T>) -> Self {
    PushTimeoutError::Closed(err.0)
  }
}

/// Error returned by `try_pop` when no item could be taken immediately.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryPopError {
  /// The queue is empty but still open; retry or back off.
  #[error("queue empty")]
  Empty,
  /// The queue is empty and closed. No item will ever arrive.
  #[error("queue closed and drained")]
  Closed,
}

/// Error returned by `pop_timeout`.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PopTimeoutError {
  /// The deadline elapsed before an item was pushed.
  #[error("pop operation timed out")]
  Timeout,
  /// The queue is empty and closed.
  #[error("queue closed and drained")]
  Closed,
}

/// Errors that can occur when building a queue.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
  /// The queue was configured with a capacity of zero. A bounded blocking
  /// queue needs at least one slot.
  #[error("bounded queue capacity cannot be zero")]
  ZeroCapacity,
}
