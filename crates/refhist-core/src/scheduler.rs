//! Deferred flush scheduling.
//!
//! Watchers registered with [`FlushMode::Pre`](crate::FlushMode::Pre) do not
//! run inline with the write that triggered them. Instead they queue a job
//! on a [`Scheduler`], and the job runs at the next flush boundary.
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce()>;

/// Decides when deferred watcher callbacks run.
///
/// Implementations only need to guarantee that queued jobs eventually run
/// in FIFO order. Coalescing (at most one pending job per watcher) is done
/// by the caller.
pub trait Scheduler {
    /// Queues `job` to run at the next flush boundary.
    fn schedule_flush(&self, job: Job);
}

/// A manually driven scheduler: jobs run when the owner calls [`tick`].
///
/// Cloning yields another handle to the same queue.
///
/// [`tick`]: TickScheduler::tick
#[derive(Clone, Default)]
pub struct TickScheduler {
    inner: Rc<TickQueue>,
}

#[derive(Default)]
struct TickQueue {
    /// Jobs waiting for the next tick, oldest first.
    jobs: RefCell<VecDeque<Job>>,
    /// Number of ticks run so far.
    ticks: Cell<u64>,
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("pending", &self.pending())
            .field("ticks", &self.ticks())
            .finish()
    }
}

impl TickScheduler {
    /// Creates a scheduler with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every job that was queued before this call.
    ///
    /// Jobs queued while the tick is running wait for the next tick.
    /// Returns the number of jobs that ran.
    pub fn tick(&self) -> usize {
        let jobs = std::mem::take(&mut *self.inner.jobs.borrow_mut());
        let tick = self.inner.ticks.get() + 1;
        self.inner.ticks.set(tick);

        let ran = jobs.len();
        for job in jobs {
            job();
        }
        tracing::trace!(tick, ran, "scheduler tick");
        ran
    }

    /// Ticks until the queue is empty or `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks that ran.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.pending() > 0 {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Number of jobs waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.inner.jobs.borrow().len()
    }

    /// Number of ticks run since creation.
    pub fn ticks(&self) -> u64 {
        self.inner.ticks.get()
    }
}

impl Scheduler for TickScheduler {
    fn schedule_flush(&self, job: Job) {
        self.inner.jobs.borrow_mut().push_back(job);
    }
}
