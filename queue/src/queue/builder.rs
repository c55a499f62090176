use super::BoundedBlockingQueue;
use crate::error::BuildError;

use core::fmt;

/// Capacity used by [`QueueBuilder::default`] and `BoundedBlockingQueue::default`.
pub const DEFAULT_CAPACITY: usize = 100;

/// A builder for [`BoundedBlockingQueue`].
///
/// With the `serde` feature the builder doubles as a configuration record:
/// every field has a default, so a partial document like `{"capacity": 64}`
/// deserializes into a valid builder.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueBuilder {
  pub(crate) capacity: usize,
  pub(crate) high_water_mark: Option<usize>,
}

impl fmt::Debug for QueueBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("QueueBuilder")
      .field("capacity", &self.capacity)
      .field("high_water_mark", &self.effective_high_water_mark())
      .finish()
  }
}

impl Default for QueueBuilder {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      high_water_mark: None,
    }
  }
}

impl QueueBuilder {
  /// Creates a builder with the default capacity.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the nominal number of items the queue holds before blocking pushes.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the length at or above which `push_with` reports high water.
  ///
  /// Defaults to half the capacity, rounded down.
  pub fn high_water_mark(mut self, mark: usize) -> Self {
    self.high_water_mark = Some(mark);
    self
  }

  fn effective_high_water_mark(&self) -> usize {
    self.high_water_mark.unwrap_or(self.capacity / 2)
  }

  /// Builds the queue.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::ZeroCapacity`] if the capacity is zero.
  pub fn build<T>(self) -> Result<BoundedBlockingQueue<T>, BuildError> {
    if self.capacity == 0 {
      tracing::warn!("refusing to build a bounded queue with zero capacity");
      return Err(BuildError::ZeroCapacity);
    }
    Ok(BoundedBlockingQueue::from_parts(
      self.capacity,
      self.effective_high_water_mark(),
    ))
  }
}
