// examples/worker_pool.rs
//
// A fixed-size worker pool built on BoundedBlockingQueue. Run with
// `RUST_LOG=debug cargo run -p fibre_queue --example worker_pool`.

use fibre_queue::{BoundedBlockingQueue, LockCell, QueueClosed, SpinLock};
use std::{
  sync::Arc,
  thread::{self, JoinHandle},
  time::Duration,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type Job = Box<dyn FnOnce() -> u64 + Send + 'static>;

#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
  jobs: u64,
  total: u64,
}

struct WorkerPool {
  queue: Arc<BoundedBlockingQueue<Job>>,
  workers: Vec<JoinHandle<()>>,
  stats: Arc<Vec<LockCell<SpinLock, WorkerStats>>>,
}

impl WorkerPool {
  fn new(num_workers: usize, capacity: usize) -> Self {
    let queue: Arc<BoundedBlockingQueue<Job>> = Arc::new(
      BoundedBlockingQueue::<Job>::builder()
        .capacity(capacity)
        .build()
        .expect("pool capacity must be non-zero"),
    );
    let stats: Arc<Vec<LockCell<SpinLock, WorkerStats>>> =
      Arc::new((0..num_workers).map(|_| LockCell::default()).collect());

    let workers = (0..num_workers)
      .map(|id| {
        let queue = Arc::clone(&queue);
        let stats = Arc::clone(&stats);
        thread::spawn(move || {
          debug!(worker = id, "worker started");
          // Runs until the queue is closed and drained.
          while let Some(job) = queue.pop() {
            let result = job();
            let mut slot = stats[id].lock();
            slot.jobs += 1;
            slot.total += result;
          }
          debug!(worker = id, "worker exiting");
        })
      })
      .collect();

    info!(num_workers, capacity, "worker pool started");
    Self { queue, workers, stats }
  }

  /// Submits a job, yielding when the queue reports high water.
  fn submit(&self, job: Job) -> Result<(), QueueClosed<Job>> {
    let status = self.queue.push_with(job, false)?;
    if status.is_high_water() {
      thread::yield_now();
    }
    Ok(())
  }

  fn shutdown(self) -> Vec<WorkerStats> {
    self.queue.close();
    for worker in self.workers {
      if worker.join().is_err() {
        warn!("worker panicked during shutdown");
      }
    }
    self.stats.iter().map(|cell| *cell.lock()).collect()
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let pool = WorkerPool::new(4, 16);

  for n in 1..=200u64 {
    let job: Job = Box::new(move || {
      thread::sleep(Duration::from_micros(50));
      n * n
    });
    if let Err(rejected) = pool.submit(job) {
      warn!(error = %rejected, "pool closed, dropping job");
      break;
    }
  }

  let stats = pool.shutdown();
  let jobs: u64 = stats.iter().map(|s| s.jobs).sum();
  let total: u64 = stats.iter().map(|s| s.total).sum();
  for (id, s) in stats.iter().enumerate() {
    info!(worker = id, jobs = s.jobs, "worker summary");
  }
  println!("processed {} jobs, sum of squares = {}", jobs, total);
  assert_eq!(total, (1..=200u64).map(|n| n * n).sum::<u64>());
}
