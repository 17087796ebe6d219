/// Batch cancellation handle.
use std::cell::Cell;

/// Passed to the closure given to [`RefHistory::batch`](crate::RefHistory::batch).
///
/// Calling [`cancel`](BatchCancel::cancel) anywhere in the batch suppresses
/// its commit. The value itself keeps whatever the batch wrote.
#[derive(Debug, Default)]
pub struct BatchCancel {
    cancelled: Cell<bool>,
}

impl BatchCancel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Keeps the batch depth counter balanced even if the batch panics.
pub(crate) struct BatchDepth<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> BatchDepth<'a> {
    pub(crate) fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for BatchDepth<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
