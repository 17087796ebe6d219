/// History records stored on the undo and redo stacks.
use serde::{Deserialize, Serialize};

/// A snapshot of the tracked value and the time it was taken.
///
/// Records are never mutated after creation. Each one lives on exactly one
/// stack at a time and moves between the undo and redo stacks as the user
/// navigates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord<S> {
    /// Codec output for the value at commit time.
    pub snapshot: S,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl<S> HistoryRecord<S> {
    /// Creates a record stamped with the current time.
    pub fn new(snapshot: S) -> Self {
        Self::at(snapshot, now_millis())
    }

    /// Creates a record with an explicit timestamp.
    pub fn at(snapshot: S, timestamp: i64) -> Self {
        Self {
            snapshot,
            timestamp,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
