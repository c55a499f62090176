mod common;
use common::*;

use fibre_queue::BoundedBlockingQueue;
use pretty_assertions::assert_eq;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PRODUCERS: usize = 8;
const CONSUMERS: usize = 8;
const CAPACITY: usize = 4;

#[test]
fn eight_by_eight_no_loss_no_duplicates() {
  let queue = Arc::new(BoundedBlockingQueue::new(CAPACITY).unwrap());
  let finished = Arc::new(AtomicBool::new(false));

  let consumers: Vec<_> = (0..CONSUMERS)
    .map(|_| {
      let queue = Arc::clone(&queue);
      thread::spawn(move || {
        let mut received = Vec::new();
        while let Some(item) = queue.pop() {
          received.push(item);
          if received.len() % 64 == 0 {
            thread::yield_now();
          }
        }
        received
      })
    })
    .collect();

  let producers: Vec<_> = (0..PRODUCERS)
    .map(|p_id| {
      let queue = Arc::clone(&queue);
      thread::spawn(move || {
        for i in 0..ITEMS_HIGH {
          queue.push(p_id * ITEMS_HIGH + i).unwrap();
        }
      })
    })
    .collect();

  // Watchdog: fail loudly instead of hanging the suite on a deadlock.
  let watchdog = {
    let finished = Arc::clone(&finished);
    thread::spawn(move || {
      let start = Instant::now();
      while !finished.load(Ordering::SeqCst) {
        assert!(
          start.elapsed() < STRESS_TIMEOUT,
          "stress test exceeded {:?}; likely deadlock",
          STRESS_TIMEOUT
        );
        thread::sleep(Duration::from_millis(50));
      }
    })
  };

  for producer in producers {
    producer.join().expect("Producer thread panicked");
  }
  queue.close();

  let mut all: Vec<usize> = consumers
    .into_iter()
    .flat_map(|c| c.join().expect("Consumer thread panicked"))
    .collect();
  finished.store(true, Ordering::SeqCst);
  watchdog.join().expect("watchdog fired");

  all.sort_unstable();
  let expected: Vec<usize> = (0..PRODUCERS * ITEMS_HIGH).collect();
  assert_eq!(all, expected);
}

#[test]
fn per_producer_order_is_preserved() {
  let queue = Arc::new(BoundedBlockingQueue::new(CAPACITY).unwrap());

  let producers: Vec<_> = (0..PRODUCERS)
    .map(|p_id| {
      let queue = Arc::clone(&queue);
      thread::spawn(move || {
        for seq in 0..ITEMS_MEDIUM {
          queue.push((p_id, seq)).unwrap();
        }
      })
    })
    .collect();

  let closer = {
    let queue = Arc::clone(&queue);
    thread::spawn(move || {
      for producer in producers {
        producer.join().unwrap();
      }
      queue.close();
    })
  };

  // A single consumer sees each producer's items in push order.
  let mut next_seq = vec![0usize; PRODUCERS];
  while let Some((p_id, seq)) = queue.pop() {
    assert_eq!(seq, next_seq[p_id]);
    next_seq[p_id] += 1;
  }
  closer.join().unwrap();
  assert_eq!(next_seq, vec![ITEMS_MEDIUM; PRODUCERS]);
}
