// SPDX-License-Identifier: BSD-3-Clause
//! Work-partitioned intra-procedural Andersen analysis.
//!
//! Every defined function is one task. Tasks sit in a max-heap keyed by
//! basic-block count so big functions start early, and a fixed pool of
//! workers drains the heap under a mutex. Each task runs a private
//! solver, so there is no shared analysis state and nothing to
//! synchronize beyond the queue itself.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::ir::{FuncId, Module};

use super::andersen::{self, Analysis};

/// One unit of work: a defined function plus its scheduling hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub func: FuncId,
    /// Basic-block count; bigger tasks are popped first.
    pub size: usize,
    pub index: usize,
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size
            .cmp(&other.size)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Streaming mean/variance over a sample sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct Accumulator {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl Accumulator {
    pub fn record(&mut self, sample: f64) {
        self.count += 1;
        self.sum += sample;
        self.sum_sq += sample * sample;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        // Guard the subtraction against floating-point drift.
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Per-worker runtime summary, collected under `--stats`.
#[derive(Clone, Debug)]
pub struct WorkerStats {
    pub worker: usize,
    pub elapsed: Duration,
    pub tasks: usize,
    pub max_task_time: Duration,
    /// Size of the task behind `max_task_time`.
    pub max_task_size: usize,
    /// Task sizes, in basic blocks.
    pub size: Accumulator,
    /// Task times, in microseconds.
    pub time: Accumulator,
}

/// Analyze every defined function on `threads` workers. Results come
/// back merged and ordered by function; the per-function analyses are
/// identical to [`andersen::intra`]'s.
pub fn analyze(
    module: &Module,
    threads: usize,
    collect_stats: bool,
) -> (Vec<(FuncId, Analysis)>, Vec<WorkerStats>) {
    let mut heap = BinaryHeap::new();
    for (index, (func, function)) in module.functions().enumerate() {
        heap.push(Task {
            func,
            size: function.size(),
            index,
        });
    }
    let queue = Mutex::new(heap);

    let workers = threads.max(1);
    let mut results = Vec::new();
    let mut stats = Vec::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let queue = &queue;
                scope.spawn(move || worker_loop(module, queue, worker, collect_stats))
            })
            .collect();
        for handle in handles {
            let (mut worker_results, worker_stats) =
                handle.join().expect("analysis worker panicked");
            results.append(&mut worker_results);
            stats.extend(worker_stats);
        }
    });
    results.sort_by_key(|(f, _)| *f);
    stats.sort_by_key(|s| s.worker);
    (results, stats)
}

fn worker_loop(
    module: &Module,
    queue: &Mutex<BinaryHeap<Task>>,
    worker: usize,
    collect_stats: bool,
) -> (Vec<(FuncId, Analysis)>, Option<WorkerStats>) {
    let start = Instant::now();
    let mut results = Vec::new();
    let mut tasks = 0usize;
    let mut max_task_time = Duration::ZERO;
    let mut max_task_size = 0usize;
    let mut size = Accumulator::default();
    let mut time = Accumulator::default();

    loop {
        // Keep the critical section to the pop itself.
        let task = queue.lock().expect("task queue poisoned").pop();
        let Some(task) = task else { break };

        let task_start = Instant::now();
        let analysis = andersen::intra_function(module, task.func);
        results.push((task.func, analysis));
        tasks += 1;

        if collect_stats {
            let took = task_start.elapsed();
            if took > max_task_time {
                max_task_time = took;
                max_task_size = task.size;
            }
            size.record(task.size as f64);
            time.record(took.as_secs_f64() * 1e6);
        }
    }
    debug!(worker, tasks, "queue drained");

    let stats = collect_stats.then(|| WorkerStats {
        worker,
        elapsed: start.elapsed(),
        tasks,
        max_task_time,
        max_task_size,
        size,
        time,
    });
    (results, stats)
}
