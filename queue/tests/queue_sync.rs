// tests/queue_sync.rs

mod common;
use common::*;

use fibre_queue::error::{QueueClosed, TryPopError};
use fibre_queue::BoundedBlockingQueue;
use pretty_assertions::assert_eq;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

// --- Helper Function for MPMC Queue Tests ---
fn run_queue_test(num_producers: usize, num_consumers: usize, items_per_producer: usize, capacity: usize) {
  let queue = Arc::new(BoundedBlockingQueue::new(capacity).unwrap());
  let total_items_expected = num_producers * items_per_producer;
  let received_items_set = Arc::new(Mutex::new(HashSet::new()));
  let received_count = Arc::new(AtomicUsize::new(0));

  let mut consumer_handles = Vec::new();
  for _ in 0..num_consumers {
    let queue = Arc::clone(&queue);
    let received_set_clone = Arc::clone(&received_items_set);
    let received_count_clone = Arc::clone(&received_count);

    consumer_handles.push(thread::spawn(move || {
      while let Some(item) = queue.pop() {
        assert!(
          received_set_clone.lock().unwrap().insert(item),
          "Duplicate item received!"
        );
        received_count_clone.fetch_add(1, AtomicOrdering::Relaxed);
      }
    }));
  }

  let mut producer_handles = Vec::new();
  for p_id in 0..num_producers {
    let queue = Arc::clone(&queue);
    producer_handles.push(thread::spawn(move || {
      for i in 0..items_per_producer {
        queue.push(p_id * items_per_producer + i).unwrap();
      }
    }));
  }

  for handle in producer_handles {
    handle.join().expect("Producer thread panicked");
  }
  // Every push has completed; closing now lets consumers drain and exit.
  queue.close();
  for handle in consumer_handles {
    handle.join().expect("Consumer thread panicked");
  }

  assert_eq!(received_count.load(AtomicOrdering::Relaxed), total_items_expected);
  assert_eq!(received_items_set.lock().unwrap().len(), total_items_expected);
  assert!(queue.is_empty());
}

#[test]
fn queue_1p_1c_basic() {
  run_queue_test(1, 1, ITEMS_HIGH, 16);
}

#[test]
fn queue_mp_1c_basic() {
  run_queue_test(4, 1, ITEMS_MEDIUM, 16);
}

#[test]
fn queue_1p_mc_basic() {
  run_queue_test(1, 4, ITEMS_HIGH, 16);
}

#[test]
fn queue_capacity_one_contention() {
  run_queue_test(4, 4, ITEMS_MEDIUM, 1);
}

#[test]
fn single_producer_single_consumer_preserves_order() {
  let queue = Arc::new(BoundedBlockingQueue::new(3).unwrap());
  let total_items = 10_000;

  let producer = {
    let queue = Arc::clone(&queue);
    thread::spawn(move || {
      for i in 0..total_items {
        queue.push(i).unwrap();
      }
      queue.close();
    })
  };

  let mut expected = 0;
  while let Some(item) = queue.pop() {
    assert_eq!(item, expected, "Received item out of order!");
    expected += 1;
  }
  producer.join().unwrap();
  assert_eq!(expected, total_items);
}

#[test]
fn capacity_bound_holds_without_oversize() {
  let capacity = 4;
  let queue = Arc::new(BoundedBlockingQueue::new(capacity).unwrap());
  let done = Arc::new(AtomicBool::new(false));

  let producers: Vec<_> = (0..4)
    .map(|_| {
      let queue = Arc::clone(&queue);
      thread::spawn(move || {
        for i in 0..ITEMS_HIGH {
          queue.push(i).unwrap();
        }
      })
    })
    .collect();

  let observer = {
    let queue = Arc::clone(&queue);
    let done = Arc::clone(&done);
    thread::spawn(move || {
      let mut max_seen = 0;
      while !done.load(AtomicOrdering::Acquire) {
        max_seen = max_seen.max(queue.len());
      }
      max_seen
    })
  };

  let mut popped = 0;
  while popped < 4 * ITEMS_HIGH {
    if queue.pop().is_some() {
      popped += 1;
    }
  }
  for producer in producers {
    producer.join().unwrap();
  }
  done.store(true, AtomicOrdering::Release);

  let max_seen = observer.join().unwrap();
  assert!(max_seen <= capacity, "observed len {} above capacity {}", max_seen, capacity);
}

#[test]
fn producers_stop_once_closed() {
  let queue = Arc::new(BoundedBlockingQueue::new(2).unwrap());
  let accepted = Arc::new(AtomicUsize::new(0));

  let producers: Vec<_> = (0..4)
    .map(|p_id| {
      let queue = Arc::clone(&queue);
      let accepted = Arc::clone(&accepted);
      thread::spawn(move || {
        let mut i = 0usize;
        loop {
          match queue.push((p_id, i)) {
            Ok(()) => {
              accepted.fetch_add(1, AtomicOrdering::Relaxed);
              i += 1;
            }
            Err(QueueClosed((rejected_p, rejected_i))) => {
              assert_eq!((rejected_p, rejected_i), (p_id, i));
              return;
            }
          }
        }
      })
    })
    .collect();

  // Let producers fill the queue and park, then consume a little and close.
  let mut drained = 0;
  for _ in 0..ITEMS_LOW {
    if queue.pop().is_some() {
      drained += 1;
    }
  }
  queue.close();

  for producer in producers {
    producer.join().expect("Producer did not observe close");
  }
  while queue.pop().is_some() {
    drained += 1;
  }
  assert_eq!(drained, accepted.load(AtomicOrdering::Relaxed));
  assert_eq!(queue.try_pop(), Err(TryPopError::Closed));
}

#[test]
fn concurrent_close_calls_are_harmless() {
  let queue = Arc::new(BoundedBlockingQueue::<u8>::new(4).unwrap());
  let transitions = Arc::new(AtomicUsize::new(0));

  let closers: Vec<_> = (0..8)
    .map(|_| {
      let queue = Arc::clone(&queue);
      let transitions = Arc::clone(&transitions);
      thread::spawn(move || {
        if queue.close() {
          transitions.fetch_add(1, AtomicOrdering::Relaxed);
        }
      })
    })
    .collect();
  for closer in closers {
    closer.join().unwrap();
  }

  assert_eq!(transitions.load(AtomicOrdering::Relaxed), 1);
  assert!(queue.is_closed());
  assert_eq!(queue.pop(), None);
}

#[test]
fn non_blocking_pop_returns_promptly() {
  let queue = BoundedBlockingQueue::<u64>::new(8).unwrap();
  let start = Instant::now();
  for _ in 0..ITEMS_HIGH {
    assert_eq!(queue.try_pop(), Err(TryPopError::Empty));
  }
  assert!(start.elapsed() < SHORT_TIMEOUT);
}

#[test]
fn oversize_producer_backs_off_on_high_water() {
  let queue = Arc::new(BoundedBlockingQueue::new(8).unwrap());
  let consumer = {
    let queue = Arc::clone(&queue);
    thread::spawn(move || {
      let mut count = 0;
      while queue.pop().is_some() {
        count += 1;
      }
      count
    })
  };

  for i in 0..ITEMS_HIGH {
    let status = queue.push_with(i, true).unwrap();
    if status.is_high_water() {
      thread::yield_now();
    }
  }
  queue.close();

  assert_eq!(consumer.join().unwrap(), ITEMS_HIGH);
  assert!(queue.is_empty());
}
