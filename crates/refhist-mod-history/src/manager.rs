/// Core undo/redo stack machine over a watchable source.
///
/// `ManualHistory` only records when `commit()` is called. `RefHistory`
/// builds on the same machine and adds change tracking on top.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::{Context, Result};
use refhist_core::Watchable;

use crate::codec::SnapshotCodec;
use crate::record::HistoryRecord;

/// Undo/redo history for a single value, committed by hand.
///
/// Both stacks are ordered most recent first. The head of the undo stack
/// mirrors the last committed value; the stack is seeded with the initial
/// value on construction and is only ever empty after `clear()`.
pub struct ManualHistory<T, S = T> {
    source: Rc<dyn Watchable<T>>,
    codec: Box<dyn SnapshotCodec<T, S>>,
    /// Max undoable steps; the undo stack holds at most `capacity + 1`
    /// records. `None` = unbounded.
    capacity: Option<usize>,
    stacks: RefCell<Stacks<S>>,
}

struct Stacks<S> {
    undo: VecDeque<HistoryRecord<S>>,
    redo: VecDeque<HistoryRecord<S>>,
}

impl<T, S> std::fmt::Debug for ManualHistory<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stacks = self.stacks.borrow();
        f.debug_struct("ManualHistory")
            .field("undo_len", &stacks.undo.len())
            .field("redo_len", &stacks.redo.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T: 'static, S: 'static> ManualHistory<T, S> {
    /// Creates a history and commits the current value of `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be captured.
    pub fn new(
        source: impl Watchable<T> + 'static,
        codec: impl SnapshotCodec<T, S> + 'static,
        capacity: Option<usize>,
    ) -> Result<Self> {
        Self::from_parts(Rc::new(source), Box::new(codec), capacity)
    }

    pub(crate) fn from_parts(
        source: Rc<dyn Watchable<T>>,
        codec: Box<dyn SnapshotCodec<T, S>>,
        capacity: Option<usize>,
    ) -> Result<Self> {
        let history = Self {
            source,
            codec,
            capacity,
            stacks: RefCell::new(Stacks {
                undo: VecDeque::new(),
                redo: VecDeque::new(),
            }),
        };
        let initial = history.source.get();
        history
            .commit_value(&initial)
            .context("Failed to capture initial snapshot")?;
        Ok(history)
    }

    /// Records the current source value as a new history point.
    ///
    /// Clears the redo stack. A snapshot that cannot be captured is logged
    /// and leaves both stacks untouched.
    pub fn commit(&self) {
        let value = self.source.get();
        if let Err(e) = self.commit_value(&value) {
            tracing::warn!("Failed to commit history record: {e:#}");
        }
    }

    pub(crate) fn commit_value(&self, value: &T) -> Result<()> {
        let snapshot = self
            .codec
            .capture(value)
            .context("Failed to capture snapshot")?;
        let record = HistoryRecord::new(snapshot);

        let mut stacks = self.stacks.borrow_mut();
        stacks.undo.push_front(record);
        if let Some(capacity) = self.capacity {
            let limit = capacity.saturating_add(1);
            if stacks.undo.len() > limit {
                let evicted = stacks.undo.len() - limit;
                stacks.undo.truncate(limit);
                tracing::debug!(evicted, "Evicted oldest history records");
            }
        }
        stacks.redo.clear();
        tracing::debug!(depth = stacks.undo.len(), "Committed history record");
        Ok(())
    }

    /// Reverts the source to the previous history point.
    ///
    /// Returns `false` (and does nothing) if there is nothing to revert to.
    pub fn undo(&self) -> bool {
        self.undo_with(|value| self.source.set(value))
    }

    /// Reapplies the most recently undone history point.
    ///
    /// Returns `false` (and does nothing) if the redo stack is empty.
    pub fn redo(&self) -> bool {
        self.redo_with(|value| self.source.set(value))
    }

    /// Writes the head snapshot back into the source, discarding drift.
    ///
    /// Neither stack changes. Returns `false` if the undo stack is empty.
    pub fn reset(&self) -> bool {
        self.reset_with(|value| self.source.set(value))
    }

    /// Moves the head record to the redo stack and hands the restored
    /// value of the new head to `write`.
    ///
    /// The stacks are not borrowed while `write` runs.
    pub(crate) fn undo_with(&self, write: impl FnOnce(T)) -> bool {
        let value = {
            let stacks = self.stacks.borrow();
            let Some(target) = stacks.undo.get(1) else {
                return false;
            };
            match self.codec.restore(&target.snapshot) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Failed to restore snapshot for undo: {e:#}");
                    return false;
                }
            }
        };

        {
            let mut stacks = self.stacks.borrow_mut();
            if let Some(head) = stacks.undo.pop_front() {
                stacks.redo.push_front(head);
            }
            tracing::debug!(
                undo_len = stacks.undo.len(),
                redo_len = stacks.redo.len(),
                "Undo"
            );
        }
        write(value);
        true
    }

    pub(crate) fn redo_with(&self, write: impl FnOnce(T)) -> bool {
        let value = {
            let stacks = self.stacks.borrow();
            let Some(target) = stacks.redo.front() else {
                return false;
            };
            match self.codec.restore(&target.snapshot) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Failed to restore snapshot for redo: {e:#}");
                    return false;
                }
            }
        };

        {
            let mut stacks = self.stacks.borrow_mut();
            if let Some(record) = stacks.redo.pop_front() {
                stacks.undo.push_front(record);
            }
            tracing::debug!(
                undo_len = stacks.undo.len(),
                redo_len = stacks.redo.len(),
                "Redo"
            );
        }
        write(value);
        true
    }

    pub(crate) fn reset_with(&self, write: impl FnOnce(T)) -> bool {
        let value = {
            let stacks = self.stacks.borrow();
            let Some(head) = stacks.undo.front() else {
                return false;
            };
            match self.codec.restore(&head.snapshot) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Failed to restore snapshot for reset: {e:#}");
                    return false;
                }
            }
        };
        write(value);
        true
    }

    /// Empties both stacks. The next commit re-seeds the undo stack.
    pub fn clear(&self) {
        let mut stacks = self.stacks.borrow_mut();
        stacks.undo.clear();
        stacks.redo.clear();
        tracing::debug!("Cleared history");
    }

    /// Whether there is an earlier history point to revert to.
    pub fn can_undo(&self) -> bool {
        self.stacks.borrow().undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.stacks.borrow().redo.is_empty()
    }

    /// Number of records on the undo stack, head included.
    pub fn undo_len(&self) -> usize {
        self.stacks.borrow().undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.stacks.borrow().redo.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub(crate) fn source(&self) -> &Rc<dyn Watchable<T>> {
        &self.source
    }
}

impl<T: 'static, S: Clone + 'static> ManualHistory<T, S> {
    /// The head of the undo stack: the last committed record.
    pub fn last(&self) -> Option<HistoryRecord<S>> {
        self.stacks.borrow().undo.front().cloned()
    }

    /// All committed records, most recent first. Same as the undo stack.
    pub fn history(&self) -> Vec<HistoryRecord<S>> {
        self.undo_stack()
    }

    pub fn undo_stack(&self) -> Vec<HistoryRecord<S>> {
        self.stacks.borrow().undo.iter().cloned().collect()
    }

    /// Undone records, most recently undone first.
    pub fn redo_stack(&self) -> Vec<HistoryRecord<S>> {
        self.stacks.borrow().redo.iter().cloned().collect()
    }

    /// Snapshots of the undo stack, most recent first.
    pub fn snapshots(&self) -> Vec<S> {
        self.stacks
            .borrow()
            .undo
            .iter()
            .map(|r| r.snapshot.clone())
            .collect()
    }
}
