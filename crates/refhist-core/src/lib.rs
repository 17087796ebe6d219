//! Reactive substrate for `refhist`.
//!
//! Provides the [`Watchable`] capability the history engine depends on, a
//! concrete single-threaded [`Signal`] implementing it, and the
//! [`Scheduler`] abstraction that decides when deferred watchers run.
pub mod scheduler;
pub mod signal;
pub mod watch;

pub use scheduler::{Job, Scheduler, TickScheduler};
pub use signal::Signal;
pub use watch::{ChangeKind, FlushMode, Subscription, WatchOptions, Watchable};
