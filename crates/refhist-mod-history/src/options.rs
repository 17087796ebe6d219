/// Construction options for `RefHistory`.
use refhist_core::{FlushMode, WatchOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{CloneWith, Identity, JsonClone, JsonString, Serialized, SnapshotCodec};
use crate::config::HistoryConfig;
use crate::gate::CommitGate;

/// Builder for a tracked history over values of type `T` stored as `S`.
///
/// Defaults: deferred (`Pre`) flush, shallow watching, `Identity` codec,
/// no commit gate, unbounded capacity.
pub struct HistoryOptions<T, S = T> {
    pub(crate) flush: FlushMode,
    pub(crate) deep: bool,
    pub(crate) capacity: Option<usize>,
    pub(crate) codec: Box<dyn SnapshotCodec<T, S>>,
    pub(crate) gate: CommitGate<T>,
}

impl<T, S> std::fmt::Debug for HistoryOptions<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryOptions")
            .field("flush", &self.flush)
            .field("deep", &self.deep)
            .field("capacity", &self.capacity)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Default for HistoryOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> HistoryOptions<T> {
    pub fn new() -> Self {
        Self {
            flush: FlushMode::default(),
            deep: false,
            capacity: None,
            codec: Box::new(Identity),
            gate: CommitGate::always(),
        }
    }

    /// Deep-copies snapshots with `clone` on capture and on restore.
    pub fn clone_with(self, clone: impl Fn(&T) -> T + 'static) -> Self {
        self.codec(CloneWith(clone))
    }

    /// Stores `dump(value)` and restores with `parse(snapshot)`.
    ///
    /// `parse` must be the lossless inverse of `dump`.
    pub fn serialize<S: 'static>(
        self,
        dump: impl Fn(&T) -> S + 'static,
        parse: impl Fn(&S) -> T + 'static,
    ) -> HistoryOptions<T, S> {
        self.codec(Serialized::new(dump, parse))
    }
}

impl<T> HistoryOptions<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    /// Deep-copies snapshots through a JSON round trip.
    pub fn json_clone(self) -> Self {
        self.codec(JsonClone)
    }

    /// Stores snapshots as JSON strings.
    pub fn json_string(self) -> HistoryOptions<T, String> {
        self.codec(JsonString)
    }

    /// Builds options from a loaded configuration file.
    ///
    /// `clone = true` selects the JSON deep-copy codec.
    pub fn from_config(config: &HistoryConfig) -> Self {
        let mut options = Self::new().flush(config.flush).deep(config.deep);
        options.capacity = config.capacity;
        if config.clone {
            options = options.json_clone();
        }
        options
    }
}

impl<T: 'static, S: 'static> HistoryOptions<T, S> {
    pub fn flush(mut self, flush: FlushMode) -> Self {
        self.flush = flush;
        self
    }

    /// Shorthand for `flush(FlushMode::Sync)`.
    pub fn sync(self) -> Self {
        self.flush(FlushMode::Sync)
    }

    /// Also record in-place mutations, not only replacements.
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Keep at most `capacity` undoable steps.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Only record changes for which `predicate(previous, candidate)` holds.
    pub fn should_commit(mut self, predicate: impl Fn(Option<&T>, &T) -> bool + 'static) -> Self {
        self.gate = CommitGate::new(predicate);
        self
    }

    /// Replaces the snapshot codec.
    pub fn codec<S2>(self, codec: impl SnapshotCodec<T, S2> + 'static) -> HistoryOptions<T, S2> {
        HistoryOptions {
            flush: self.flush,
            deep: self.deep,
            capacity: self.capacity,
            codec: Box::new(codec),
            gate: self.gate,
        }
    }

    pub(crate) fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            deep: self.deep,
            flush: self.flush,
        }
    }
}
