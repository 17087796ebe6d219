/// Tracked undo/redo history.
///
/// `RefHistory` watches a [`Watchable`] source and commits a snapshot every
/// time the source changes, either inline (`FlushMode::Sync`) or once per
/// scheduler tick (`FlushMode::Pre`). Undo, redo and reset write back into
/// the source with tracking suppressed, so their own writes never show up
/// as new history points.
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use anyhow::Result;
use refhist_core::{FlushMode, WatchOptions, Watchable};

use crate::batch::{BatchCancel, BatchDepth};
use crate::gate::CommitGate;
use crate::manager::ManualHistory;
use crate::observer::ChangeObserver;
use crate::options::HistoryOptions;
use crate::record::HistoryRecord;

/// Undo/redo history that follows a live value.
///
/// Dropping the history detaches it from the source.
pub struct RefHistory<T, S = T> {
    inner: Rc<Tracked<T, S>>,
}

struct Tracked<T, S> {
    manual: ManualHistory<T, S>,
    gate: CommitGate<T>,
    observer: ChangeObserver,
    /// Last raw value that passed the gate or was written back.
    last_raw: RefCell<Option<T>>,
    batch_depth: Cell<usize>,
    disposed: Cell<bool>,
    watch_options: WatchOptions,
}

impl<T, S> std::fmt::Debug for RefHistory<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefHistory")
            .field("history", &self.inner.manual)
            .field("watch", &self.inner.watch_options)
            .field("batch_depth", &self.inner.batch_depth.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl<T, S> Drop for Tracked<T, S> {
    fn drop(&mut self) {
        self.observer.stop();
    }
}

impl<T: Clone + 'static, S: 'static> RefHistory<T, S> {
    /// Starts tracking `source`, seeding the history with its current value.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be captured.
    pub fn new(source: impl Watchable<T> + 'static, options: HistoryOptions<T, S>) -> Result<Self> {
        let watch_options = options.watch_options();
        let HistoryOptions {
            capacity,
            codec,
            gate,
            ..
        } = options;

        let source: Rc<dyn Watchable<T>> = Rc::new(source);
        let manual = ManualHistory::from_parts(Rc::clone(&source), codec, capacity)?;

        let inner = Rc::new_cyclic(|weak: &Weak<Tracked<T, S>>| {
            let weak = weak.clone();
            let observer = ChangeObserver::watch(source.as_ref(), watch_options, move || {
                if let Some(tracked) = weak.upgrade() {
                    tracked.commit();
                }
            });
            Tracked {
                manual,
                gate,
                observer,
                last_raw: RefCell::new(None),
                batch_depth: Cell::new(0),
                disposed: Cell::new(false),
                watch_options,
            }
        });

        tracing::debug!(
            flush = ?watch_options.flush,
            deep = watch_options.deep,
            ?capacity,
            gated = inner.gate.is_custom(),
            "Tracking history"
        );
        Ok(Self { inner })
    }

    /// Commits the current source value now, regardless of flush timing.
    ///
    /// Any pending deferred flush is discarded. Subject to the commit gate.
    pub fn commit(&self) {
        self.inner.commit();
    }

    /// Reverts the source to the previous history point.
    ///
    /// No-op (returns `false`) if there is nothing to revert to.
    pub fn undo(&self) -> bool {
        if self.inner.is_frozen("undo") {
            return false;
        }
        self.inner
            .manual
            .undo_with(|value| self.inner.write_source(value))
    }

    /// Reapplies the most recently undone history point.
    ///
    /// No-op (returns `false`) if the redo stack is empty.
    pub fn redo(&self) -> bool {
        if self.inner.is_frozen("redo") {
            return false;
        }
        self.inner
            .manual
            .redo_with(|value| self.inner.write_source(value))
    }

    /// Writes the head snapshot back into the source without touching
    /// either stack.
    ///
    /// No-op (returns `false`) if the source has not changed since the last
    /// commit or write-back, so a second reset in a row never touches the
    /// source.
    pub fn reset(&self) -> bool {
        if self.inner.is_frozen("reset") {
            return false;
        }
        if !self.inner.observer.is_dirty() {
            tracing::debug!("Nothing to reset, source has not drifted");
            return false;
        }
        self.inner
            .manual
            .reset_with(|value| self.inner.write_source(value))
    }

    /// Empties both stacks.
    pub fn clear(&self) {
        if self.inner.is_frozen("clear") {
            return;
        }
        self.inner.manual.clear();
    }

    /// Stops recording changes. The source may drift from the history head
    /// until tracking resumes.
    pub fn pause(&self) {
        self.inner.observer.pause();
        tracing::debug!("Paused history tracking");
    }

    /// Resumes recording. With `commit_now`, the current (possibly drifted)
    /// value is committed immediately.
    pub fn resume(&self, commit_now: bool) {
        if self.inner.is_frozen("resume") {
            return;
        }
        self.inner.observer.resume();
        tracing::debug!(commit_now, "Resumed history tracking");
        if commit_now {
            self.inner.commit();
        }
    }

    /// Runs `f` as one unit: its writes produce at most one commit, made
    /// when `f` returns, and none if `f` called [`BatchCancel::cancel`].
    ///
    /// The source keeps whatever `f` wrote either way.
    pub fn batch<R>(&self, f: impl FnOnce(&BatchCancel) -> R) -> R {
        let cancel = BatchCancel::new();
        let out = {
            let _depth = BatchDepth::enter(&self.inner.batch_depth);
            self.inner.observer.ignore_updates(|| f(&cancel))
        };

        if cancel.is_cancelled() {
            tracing::debug!("Batch cancelled, nothing committed");
        } else {
            self.inner.commit();
        }
        out
    }

    /// Stops tracking for good. The stacks stay readable but frozen.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.observer.stop();
        tracing::debug!("Disposed history");
    }

    pub fn can_undo(&self) -> bool {
        self.inner.manual.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.manual.can_redo()
    }

    /// Whether changes are currently being recorded.
    pub fn is_tracking(&self) -> bool {
        self.inner.observer.is_active()
    }

    pub fn is_batching(&self) -> bool {
        self.inner.batch_depth.get() > 0
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn flush_mode(&self) -> FlushMode {
        self.inner.watch_options.flush
    }

    pub fn is_deep(&self) -> bool {
        self.inner.watch_options.deep
    }

    pub fn undo_len(&self) -> usize {
        self.inner.manual.undo_len()
    }

    pub fn redo_len(&self) -> usize {
        self.inner.manual.redo_len()
    }
}

impl<T: Clone + 'static, S: Clone + 'static> RefHistory<T, S> {
    /// The last committed record.
    pub fn last(&self) -> Option<HistoryRecord<S>> {
        self.inner.manual.last()
    }

    /// All committed records, most recent first.
    pub fn history(&self) -> Vec<HistoryRecord<S>> {
        self.inner.manual.history()
    }

    pub fn undo_stack(&self) -> Vec<HistoryRecord<S>> {
        self.inner.manual.undo_stack()
    }

    pub fn redo_stack(&self) -> Vec<HistoryRecord<S>> {
        self.inner.manual.redo_stack()
    }

    /// Snapshots of the history, most recent first.
    pub fn snapshots(&self) -> Vec<S> {
        self.inner.manual.snapshots()
    }
}

impl<T: Clone + 'static, S: 'static> Tracked<T, S> {
    fn is_frozen(&self, op: &str) -> bool {
        if self.disposed.get() {
            tracing::debug!(op, "Ignoring operation on a disposed history");
            return true;
        }
        false
    }

    fn commit(&self) {
        if self.is_frozen("commit") {
            return;
        }
        self.observer.ignore_prev_async_updates();

        let value = self.manual.source().get();
        let admitted = {
            let previous = self.last_raw.borrow();
            self.gate.admit(previous.as_ref(), &value)
        };
        if !admitted {
            tracing::trace!("Commit rejected by gate");
            return;
        }

        match self.manual.commit_value(&value) {
            Ok(()) => {
                self.observer.mark_clean();
                *self.last_raw.borrow_mut() = Some(value);
            }
            Err(e) => tracing::warn!("Failed to commit history record: {e:#}"),
        }
    }

    /// Writes a restored value into the source without recording it.
    fn write_source(&self, value: T) {
        let source = self.manual.source();
        self.observer.ignore_prev_async_updates();
        self.observer.write_back(|| source.set(value.clone()));
        self.observer.mark_clean();
        *self.last_raw.borrow_mut() = Some(value);
    }
}
