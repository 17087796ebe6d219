//! A single-threaded observable cell.
//!
//! `Signal` is the concrete [`Watchable`] used throughout the workspace.
//! Writes come in two flavours: [`Signal::set`] replaces the value and is
//! seen by every watcher, [`Signal::update`] mutates in place and is only
//! seen by deep watchers.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::scheduler::Scheduler;
use crate::watch::{ChangeKind, FlushMode, Subscription, WatchOptions, Watchable};

type Callback = Rc<RefCell<Box<dyn FnMut()>>>;

/// Shared observable value.
///
/// Cloning yields another handle to the same value and watcher list.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    value: RefCell<T>,
    watchers: RefCell<Vec<Watcher>>,
    scheduler: Rc<dyn Scheduler>,
    /// Incremented on every write.
    version: Cell<u64>,
}

struct Watcher {
    callback: Callback,
    options: WatchOptions,
    active: Rc<Cell<bool>>,
    /// Set while a deferred invocation is queued.
    pending: Rc<Cell<bool>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("watchers", &self.inner.watchers.borrow().len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a signal whose deferred watchers run on `scheduler`.
    pub fn new(value: T, scheduler: impl Scheduler + 'static) -> Self {
        Self::with_scheduler(value, Rc::new(scheduler))
    }

    /// Creates a signal sharing an already boxed scheduler.
    pub fn with_scheduler(value: T, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                watchers: RefCell::new(Vec::new()),
                scheduler,
                version: Cell::new(0),
            }),
        }
    }

    /// Reads the value without copying it.
    ///
    /// `f` must not write to this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replaces the value and notifies all watchers.
    ///
    /// # Errors
    ///
    /// Returns an error if a synchronous watcher was reached again while it
    /// was still running, i.e. the watch graph is cyclic. The new value is
    /// stored regardless; only the cyclic notification is dropped.
    pub fn try_set(&self, value: T) -> Result<()> {
        let previous = self.inner.value.replace(value);
        drop(previous);
        self.notify(ChangeKind::Replaced)
    }

    /// Mutates the value in place and notifies deep watchers.
    ///
    /// `f` must not access this signal.
    ///
    /// # Errors
    ///
    /// Same as [`try_set`](Self::try_set).
    pub fn try_update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let out = f(&mut self.inner.value.borrow_mut());
        self.notify(ChangeKind::Mutated)?;
        Ok(out)
    }

    /// Mutates the value in place and notifies deep watchers.
    ///
    /// A cyclic notification is logged, not propagated.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut self.inner.value.borrow_mut());
        if let Err(e) = self.notify(ChangeKind::Mutated) {
            tracing::error!("{e:#}");
        }
        out
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of attached watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner
            .watchers
            .borrow()
            .iter()
            .filter(|w| w.active.get())
            .count()
    }

    fn notify(&self, kind: ChangeKind) -> Result<()> {
        self.inner.version.set(self.inner.version.get() + 1);

        // Snapshot the interested watchers so callbacks may subscribe or
        // unsubscribe without hitting a live borrow.
        let targets: Vec<(Callback, FlushMode, Rc<Cell<bool>>, Rc<Cell<bool>>)> = {
            let mut watchers = self.inner.watchers.borrow_mut();
            watchers.retain(|w| w.active.get());
            watchers
                .iter()
                .filter(|w| w.options.observes(kind))
                .map(|w| {
                    (
                        Rc::clone(&w.callback),
                        w.options.flush,
                        Rc::clone(&w.active),
                        Rc::clone(&w.pending),
                    )
                })
                .collect()
        };

        let mut reentered = 0usize;
        for (callback, flush, active, pending) in targets {
            if !active.get() {
                continue;
            }
            match flush {
                FlushMode::Sync => {
                    if !invoke(&callback) {
                        reentered += 1;
                    }
                }
                FlushMode::Pre => {
                    if pending.replace(true) {
                        continue;
                    }
                    self.inner.scheduler.schedule_flush(Box::new(move || {
                        pending.set(false);
                        if active.get() && !invoke(&callback) {
                            tracing::error!("Deferred watcher re-entered itself during flush");
                        }
                    }));
                }
            }
        }

        if reentered > 0 {
            bail!(
                "{reentered} watcher(s) were notified while still running; \
                 the watch graph is cyclic"
            );
        }
        Ok(())
    }
}

/// Runs a watcher callback. Returns `false` if it is already running.
fn invoke(callback: &RefCell<Box<dyn FnMut()>>) -> bool {
    match callback.try_borrow_mut() {
        Ok(mut f) => {
            (*f)();
            true
        }
        Err(_) => false,
    }
}

impl<T: Clone + 'static> Watchable<T> for Signal<T> {
    fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    fn set(&self, value: T) {
        if let Err(e) = self.try_set(value) {
            tracing::error!("{e:#}");
        }
    }

    fn subscribe(&self, callback: Box<dyn FnMut()>, options: WatchOptions) -> Subscription {
        let active = Rc::new(Cell::new(true));
        self.inner.watchers.borrow_mut().push(Watcher {
            callback: Rc::new(RefCell::new(callback)),
            options,
            active: Rc::clone(&active),
            pending: Rc::new(Cell::new(false)),
        });
        Subscription::new(active)
    }
}
