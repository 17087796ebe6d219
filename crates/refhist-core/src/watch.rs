//! The observation contract between a live value and its watchers.
use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// When a watcher callback runs relative to the write that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// Inline, before the write returns.
    Sync,
    /// Once per scheduler tick, after all writes of that tick.
    #[default]
    Pre,
}

/// What kind of change a write made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The whole value was replaced.
    Replaced,
    /// The value was mutated in place.
    Mutated,
}

/// Options for [`Watchable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchOptions {
    /// Also fire on in-place mutation, not only on replacement.
    pub deep: bool,
    pub flush: FlushMode,
}

impl WatchOptions {
    /// Shallow, inline watcher.
    pub fn sync() -> Self {
        Self {
            deep: false,
            flush: FlushMode::Sync,
        }
    }

    /// Shallow, deferred watcher.
    pub fn pre() -> Self {
        Self {
            deep: false,
            flush: FlushMode::Pre,
        }
    }

    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn with_flush(mut self, flush: FlushMode) -> Self {
        self.flush = flush;
        self
    }

    /// Whether a watcher with these options observes `kind`.
    pub fn observes(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Replaced => true,
            ChangeKind::Mutated => self.deep,
        }
    }
}

/// Handle returned by [`Watchable::subscribe`].
///
/// Dropping the handle does not detach the watcher; call
/// [`unsubscribe`](Subscription::unsubscribe).
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Wraps the shared liveness flag of a watcher.
    pub fn new(active: Rc<Cell<bool>>) -> Self {
        Self { active }
    }

    /// Detaches the watcher. Pending deferred invocations are dropped.
    /// Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        self.active.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// A live value that can be read, written and observed.
///
/// The history engine depends only on this capability, never on a
/// concrete reactive implementation.
pub trait Watchable<T> {
    /// Returns a copy of the current value.
    fn get(&self) -> T;

    /// Replaces the current value and notifies watchers.
    fn set(&self, value: T);

    /// Registers `callback` to run whenever the value changes, according to
    /// `options`.
    fn subscribe(&self, callback: Box<dyn FnMut()>, options: WatchOptions) -> Subscription;
}
