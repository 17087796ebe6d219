/// Change observer with ignorable writes and pausing.
///
/// Wraps a [`Watchable`] subscription so the history engine can write back
/// into the source (undo, redo, reset, batches) without those writes being
/// recorded as new changes.
///
/// In `Sync` mode a plain flag is enough: the callback runs inline, so it
/// can check whether a write is being ignored at that moment.
///
/// In `Pre` mode the callback runs later, after the ignored and
/// non-ignored writes of a tick have been mixed together. A second, inline
/// watcher counts every change and how many of them were ignored; at flush
/// time the callback is skipped iff all changes since the previous flush
/// were ignored.
///
/// Independently of both modes, a deep inline watcher tracks drift: whether
/// the source changed since the engine last committed or wrote it back.
use std::cell::Cell;
use std::rc::Rc;

use refhist_core::{FlushMode, Subscription, WatchOptions, Watchable};

#[derive(Default)]
struct ObserverState {
    /// Nesting depth of `ignore_updates` calls.
    ignoring: Cell<usize>,
    /// Nesting depth of `write_back` calls.
    writing_back: Cell<usize>,
    /// Source changed since the last `mark_clean`.
    dirty: Cell<bool>,
    paused: Cell<bool>,
    stopped: Cell<bool>,
    /// Changes seen since the last deferred flush.
    sync_counter: Cell<u64>,
    /// How many of those changes are to be ignored.
    ignore_counter: Cell<u64>,
}

impl ObserverState {
    fn is_active(&self) -> bool {
        !self.paused.get() && !self.stopped.get()
    }

    fn is_ignoring(&self) -> bool {
        self.ignoring.get() > 0
    }
}

/// Watches a source and forwards changes that were neither ignored nor
/// made while paused.
pub struct ChangeObserver {
    state: Rc<ObserverState>,
    subscriptions: Vec<Subscription>,
    options: WatchOptions,
}

impl std::fmt::Debug for ChangeObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeObserver")
            .field("options", &self.options)
            .field("paused", &self.state.paused.get())
            .field("stopped", &self.state.stopped.get())
            .field("ignoring", &self.state.ignoring.get())
            .finish()
    }
}

impl ChangeObserver {
    /// Subscribes to `source` and calls `on_change` for every observed
    /// change, according to `options`.
    pub fn watch<T>(
        source: &dyn Watchable<T>,
        options: WatchOptions,
        on_change: impl FnMut() + 'static,
    ) -> Self {
        let state = Rc::new(ObserverState::default());
        let mut on_change = on_change;

        // Registered first so drift is recorded before any commit clears it.
        let st = Rc::clone(&state);
        let drift = source.subscribe(
            Box::new(move || {
                if !st.stopped.get() && st.writing_back.get() == 0 {
                    st.dirty.set(true);
                }
            }),
            WatchOptions::sync().with_deep(true),
        );

        let mut subscriptions = vec![drift];
        subscriptions.extend(match options.flush {
            FlushMode::Sync => {
                let st = Rc::clone(&state);
                let sub = source.subscribe(
                    Box::new(move || {
                        if st.is_active() && !st.is_ignoring() {
                            on_change();
                        }
                    }),
                    options,
                );
                vec![sub]
            }
            FlushMode::Pre => {
                let st = Rc::clone(&state);
                let counter = source.subscribe(
                    Box::new(move || {
                        if st.stopped.get() {
                            return;
                        }
                        st.sync_counter.set(st.sync_counter.get() + 1);
                        if st.is_ignoring() || st.paused.get() {
                            st.ignore_counter.set(st.ignore_counter.get() + 1);
                        }
                    }),
                    options.with_flush(FlushMode::Sync),
                );

                let st = Rc::clone(&state);
                let flusher = source.subscribe(
                    Box::new(move || {
                        let ignored = st.ignore_counter.get();
                        let skip = ignored > 0 && ignored == st.sync_counter.get();
                        st.ignore_counter.set(0);
                        st.sync_counter.set(0);
                        if skip {
                            tracing::trace!("Skipping flush of ignored changes");
                            return;
                        }
                        if st.is_active() {
                            on_change();
                        }
                    }),
                    options,
                );
                vec![counter, flusher]
            }
        });

        Self {
            state,
            subscriptions,
            options,
        }
    }

    /// Runs `f`; changes it makes to the source are not forwarded.
    pub fn ignore_updates<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = IgnoreGuard::enter(&self.state.ignoring);
        f()
    }

    /// Runs `f` as an engine write-back: ignored, and not counted as drift.
    pub fn write_back<R>(&self, f: impl FnOnce() -> R) -> R {
        let _writing = IgnoreGuard::enter(&self.state.writing_back);
        self.ignore_updates(f)
    }

    /// Whether the source changed since the last [`mark_clean`](Self::mark_clean).
    ///
    /// Writes made inside [`write_back`](Self::write_back) do not count;
    /// writes made while paused or inside `ignore_updates` do.
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.get()
    }

    /// Records that the source now matches the history head.
    pub fn mark_clean(&self) {
        self.state.dirty.set(false);
    }

    /// Marks every change observed so far as ignored, so a pending deferred
    /// flush does nothing unless new changes arrive first.
    pub fn ignore_prev_async_updates(&self) {
        self.state
            .ignore_counter
            .set(self.state.sync_counter.get());
    }

    pub fn pause(&self) {
        self.state.paused.set(true);
    }

    pub fn resume(&self) {
        self.state.paused.set(false);
    }

    /// Detaches from the source for good.
    pub fn stop(&self) {
        if self.state.stopped.replace(true) {
            return;
        }
        for sub in &self.subscriptions {
            sub.unsubscribe();
        }
    }

    /// Whether changes are currently forwarded.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped.get()
    }

    pub fn options(&self) -> WatchOptions {
        self.options
    }
}

/// Keeps a nesting depth balanced even if the guarded closure panics.
struct IgnoreGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> IgnoreGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for IgnoreGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
