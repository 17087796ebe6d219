/// Undo/redo history for an observable value.
///
/// Provides a `RefHistory` that watches a `Watchable` source and records
/// snapshots of it as the value changes, and a `ManualHistory` that only
/// records on explicit commit. Both keep an undo stack and a redo stack of
/// timestamped `HistoryRecord`s, most recent first.
pub mod batch;
pub mod codec;
pub mod config;
pub mod gate;
pub mod history;
pub mod manager;
pub mod observer;
pub mod options;
pub mod record;

pub use batch::BatchCancel;
pub use codec::{CloneWith, Identity, JsonClone, JsonString, Serialized, SnapshotCodec};
pub use config::HistoryConfig;
pub use gate::CommitGate;
pub use history::RefHistory;
pub use manager::ManualHistory;
pub use observer::ChangeObserver;
pub use options::HistoryOptions;
pub use record::HistoryRecord;
pub use refhist_core::FlushMode;
