//! Single-threaded task queue standing in for the host's main thread.
//!
//! Background work never calls back into the caller directly. It posts a
//! task through a [`LoopHandle`], and the task runs later on whichever thread
//! drives the [`EventLoop`]. Timers are just tasks with a due time, which is
//! how the progress reporter reschedules itself.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable, thread-safe entry point for scheduling work on an [`EventLoop`]
#[derive(Clone)]
pub struct LoopHandle {
    tx: Sender<(Instant, Task)>,
}

impl LoopHandle {
    /// Queues `task` to run as soon as the loop gets to it
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.set_timeout(Duration::ZERO, task);
    }

    /// Queues `task` to run once `delay` has elapsed
    pub fn set_timeout<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send((Instant::now() + delay, Box::new(task))).is_err() {
            debug!("Event loop is gone, dropping scheduled task");
        }
    }
}

struct Scheduled {
    due: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// reversed: BinaryHeap is a max-heap, the earliest task must surface first
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Runs posted tasks in due-time order on the thread that drives it
pub struct EventLoop {
    tx: Sender<(Instant, Task)>,
    rx: Receiver<(Instant, Task)>,
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            tx: self.tx.clone(),
        }
    }

    /// Runs tasks until none are queued or scheduled.
    ///
    /// A task that reschedules itself keeps the loop alive, so callers that
    /// wait on a background worker keep a watcher (such as the progress
    /// reporter) ticking until the worker has posted its result.
    pub fn run_until_idle(&mut self) {
        loop {
            self.drain_incoming();

            let Some(due) = self.queue.peek().map(|s| s.due) else {
                trace!("Event loop idle");
                return;
            };

            let now = Instant::now();
            if due > now {
                match self.rx.recv_timeout(due - now) {
                    Ok(item) => self.enqueue(item),
                    Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
                }
                continue;
            }

            if let Some(scheduled) = self.queue.pop() {
                (scheduled.task)();
            }
        }
    }

    fn drain_incoming(&mut self) {
        while let Ok(item) = self.rx.try_recv() {
            self.enqueue(item);
        }
    }

    fn enqueue(&mut self, (due, task): (Instant, Task)) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { due, seq, task });
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
