//! Blocking work-queue primitives for fixed-size worker pools.
//!
//! `fibre_queue` provides the synchronization substrate a thread pool sits on:
//!
//! - [`BoundedBlockingQueue`]: a capacity-limited MPMC FIFO with blocking and
//!   non-blocking push/pop, an explicit one-way [`close`](BoundedBlockingQueue::close)
//!   for graceful shutdown, and a backpressure override for producers.
//! - [`SpinLock`]: a minimal busy-wait lock for very short critical sections.
//! - [`Lockable`] / [`SharedLockable`]: capability traits for raw lock types,
//!   with [`LockCell`] to guard a value behind any of them.
//!
//! ```
//! use fibre_queue::BoundedBlockingQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(BoundedBlockingQueue::new(4).unwrap());
//!
//! let worker = {
//!   let queue = Arc::clone(&queue);
//!   thread::spawn(move || {
//!     let mut sum = 0;
//!     while let Some(n) = queue.pop() {
//!       sum += n;
//!     }
//!     sum
//!   })
//! };
//!
//! for n in 1..=10 {
//!   queue.push(n).unwrap();
//! }
//! queue.close();
//! assert_eq!(worker.join().unwrap(), 55);
//! ```

pub mod error;
pub mod lockable;
pub mod queue;
pub mod spin;

pub use error::{BuildError, PopTimeoutError, PushTimeoutError, QueueClosed, TryPopError, TryPushError};
pub use lockable::{ExclusiveGuard, LockCell, Lockable, SharedGuard, SharedLockable};
pub use queue::{BoundedBlockingQueue, PushStatus, QueueBuilder};
pub use spin::{SpinGuard, SpinLock};
