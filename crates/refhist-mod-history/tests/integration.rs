// Integration tests for tracked histories.
//
// These tests drive a `RefHistory` through a `Signal` the way an
// application would, in both inline (`Sync`) and deferred (`Pre`) modes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use refhist_core::{Signal, TickScheduler, WatchOptions, Watchable};
use refhist_mod_history::{HistoryOptions, ManualHistory, RefHistory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Pair {
    foo: i32,
    bar: String,
}

fn pair(foo: i32, bar: &str) -> Pair {
    Pair {
        foo,
        bar: bar.to_string(),
    }
}

fn sync_signal<T: 'static>(value: T) -> Signal<T> {
    Signal::new(value, TickScheduler::new())
}

fn pre_signal<T: 'static>(value: T) -> (TickScheduler, Signal<T>) {
    let scheduler = TickScheduler::new();
    let signal = Signal::new(value, scheduler.clone());
    (scheduler, signal)
}

// ── Sync ───────────────────────────────────────────────────────────────

#[test]
fn test_sync_should_record() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    assert_eq!(history.snapshots(), vec![0]);

    v.set(2);

    assert_eq!(history.snapshots(), vec![2, 0]);
    assert!(history.can_undo());
}

#[test]
fn test_sync_undo_and_redo() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    assert!(!history.can_undo());
    assert!(!history.can_redo());

    v.set(2);
    v.set(3);
    v.set(4);

    assert!(history.can_undo());
    assert!(!history.can_redo());
    assert_eq!(history.history().len(), 4);
    assert_eq!(history.last().unwrap().snapshot, 4);

    history.undo();
    assert!(history.can_undo());
    assert!(history.can_redo());
    assert_eq!(v.get(), 3);
    assert_eq!(history.last().unwrap().snapshot, 3);

    history.undo();
    assert_eq!(v.get(), 2);
    history.redo();
    assert_eq!(v.get(), 3);
    history.redo();
    assert_eq!(v.get(), 4);
    assert_eq!(history.last().unwrap().snapshot, 4);
    assert!(!history.can_redo());

    // Nothing left to redo.
    assert!(!history.redo());
    assert_eq!(v.get(), 4);

    history.clear();
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}

#[test]
fn test_sync_undo_scenario_from_zero() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    v.set(2);
    assert_eq!(history.snapshots(), vec![2, 0]);
    assert!(history.can_undo());

    history.undo();
    assert_eq!(v.get(), 0);
    assert_eq!(history.last().unwrap().snapshot, 0);
    assert!(history.can_redo());
}

#[test]
fn test_sync_deep_records_in_place_mutation() {
    let v = sync_signal(pair(1, "bar"));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().deep(true)).unwrap();

    v.update(|p| p.bar = "foo".to_string());

    let snapshots = history.snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].bar, "foo");
    assert_eq!(snapshots[1].bar, "bar");

    history.undo();
    assert_eq!(v.get().bar, "bar");
}

#[test]
fn test_sync_shallow_with_clone_ignores_in_place_mutation() {
    let v = sync_signal(pair(1, "bar"));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().json_clone()).unwrap();

    v.update(|p| p.bar = "foo".to_string());
    assert_eq!(history.snapshots(), vec![pair(1, "bar")]);

    v.set(pair(1, "foo"));
    assert_eq!(history.snapshots(), vec![pair(1, "foo"), pair(1, "bar")]);

    history.undo();
    assert_eq!(v.get(), pair(1, "bar"));
}

#[test]
fn test_sync_dump_and_parse() {
    let v = sync_signal(serde_json::json!({ "a": "bar" }));
    let history = RefHistory::new(
        v.clone(),
        HistoryOptions::new()
            .sync()
            .deep(true)
            .serialize(
                |value: &serde_json::Value| value.to_string(),
                |text: &String| serde_json::from_str(text).unwrap_or_default(),
            ),
    )
    .unwrap();

    assert_eq!(history.snapshots(), vec![r#"{"a":"bar"}"#.to_string()]);

    v.update(|value| value["a"] = "foo".into());

    assert_eq!(
        history.snapshots(),
        vec![r#"{"a":"foo"}"#.to_string(), r#"{"a":"bar"}"#.to_string()]
    );

    history.undo();
    assert_eq!(v.get()["a"], "bar");
}

#[test]
fn test_sync_json_string_codec() {
    let v = sync_signal(pair(1, "one"));
    let history: RefHistory<Pair, String> =
        RefHistory::new(v.clone(), HistoryOptions::new().sync().deep(true).json_string()).unwrap();

    v.update(|p| p.foo = 2);
    assert_eq!(history.last().unwrap().snapshot, r#"{"foo":2,"bar":"one"}"#);

    history.undo();
    assert_eq!(v.get(), pair(1, "one"));
}

#[test]
fn test_sync_commit_twice_gives_equal_entries() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    history.commit();

    assert_eq!(history.snapshots(), vec![0, 0]);
    let records = history.history();
    assert!(records[0].timestamp >= records[1].timestamp);
}

#[test]
fn test_sync_without_batch() {
    let v = sync_signal(pair(1, "one"));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().deep(true)).unwrap();

    v.update(|p| p.foo = 2);
    v.update(|p| p.bar = "two".to_string());

    assert_eq!(
        history.snapshots(),
        vec![pair(2, "two"), pair(2, "one"), pair(1, "one")]
    );
}

#[test]
fn test_sync_with_batch() {
    let v = sync_signal(pair(1, "one"));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().deep(true)).unwrap();

    history.batch(|_| {
        v.update(|p| p.foo = 2);
        v.update(|p| p.bar = "two".to_string());
    });

    assert_eq!(history.snapshots(), vec![pair(2, "two"), pair(1, "one")]);

    history.batch(|cancel| {
        v.update(|p| p.foo = 3);
        v.update(|p| p.bar = "three".to_string());
        cancel.cancel();
    });

    assert_eq!(history.snapshots(), vec![pair(2, "two"), pair(1, "one")]);
    // The value is not rolled back.
    assert_eq!(v.get(), pair(3, "three"));
}

#[test]
fn test_sync_nested_batches() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    history.batch(|outer| {
        v.set(1);
        history.batch(|_| v.set(2));
        v.set(3);
        outer.cancel();
    });

    // Only the inner batch committed.
    assert_eq!(history.snapshots(), vec![2, 0]);
    assert_eq!(v.get(), 3);
}

#[test]
fn test_sync_pause_and_resume() {
    let v = sync_signal(1);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    history.pause();
    v.set(2);

    assert_eq!(history.history().len(), 1);
    assert_eq!(history.last().unwrap().snapshot, 1);

    history.resume(false);

    assert_eq!(history.history().len(), 1);
    assert_eq!(history.last().unwrap().snapshot, 1);

    v.set(3);

    assert_eq!(history.snapshots(), vec![3, 1]);

    history.pause();
    v.set(4);

    assert_eq!(history.last().unwrap().snapshot, 3);

    history.resume(true);

    assert_eq!(history.snapshots(), vec![4, 3, 1]);
}

#[test]
fn test_sync_reset() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    v.set(1);
    history.pause();
    v.set(2);

    assert_eq!(history.snapshots(), vec![1, 0]);

    assert!(history.reset());

    // The value goes back to the head, the history is unchanged.
    assert_eq!(v.get(), 1);
    assert_eq!(history.snapshots(), vec![1, 0]);

    let version = v.version();
    assert!(!history.reset());

    // A second reset does not touch the source at all.
    assert_eq!(v.get(), 1);
    assert_eq!(history.snapshots(), vec![1, 0]);
    assert_eq!(history.redo_len(), 0);
    assert_eq!(v.version(), version);

    // Same again, with a non-empty redo stack.
    v.set(3);
    history.commit();
    history.undo();
    v.set(2);
    history.reset();

    assert_eq!(v.get(), 1);
    assert_eq!(history.snapshots(), vec![1, 0]);
    let redo: Vec<i32> = history.redo_stack().into_iter().map(|r| r.snapshot).collect();
    assert_eq!(redo, vec![3]);
}

#[test]
fn test_sync_reset_without_drift_leaves_other_watchers_alone() {
    let v = sync_signal(0);
    let a = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();
    let b = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    v.subscribe(
        Box::new(move || counter.set(counter.get() + 1)),
        WatchOptions::sync(),
    );

    v.set(1);
    let version = v.version();

    assert!(!a.reset());
    assert!(!a.reset());

    assert_eq!(v.version(), version);
    assert_eq!(hits.get(), 1);
    assert_eq!(b.snapshots(), vec![1, 0]);

    // With drift, the write-back is an ordinary change to everyone else.
    a.pause();
    v.set(2);
    assert!(a.reset());
    assert!(!a.reset());

    assert_eq!(v.get(), 1);
    assert_eq!(a.snapshots(), vec![1, 0]);
    assert_eq!(b.snapshots(), vec![1, 2, 1, 0]);
    assert_eq!(hits.get(), 3);
}

#[test]
fn test_sync_reset_after_cancelled_batch() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    history.batch(|cancel| {
        v.set(5);
        cancel.cancel();
    });

    assert!(history.reset());
    assert_eq!(v.get(), 0);
}

#[test]
fn test_sync_dispose() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    v.set(1);
    v.set(2);

    history.dispose();

    v.set(3);

    assert_eq!(history.snapshots(), vec![2, 1, 0]);
    assert_eq!(history.last().unwrap().snapshot, 2);
    assert_eq!(v.watcher_count(), 0);

    // Frozen: nothing changes the stacks any more.
    history.commit();
    assert!(!history.undo());
    assert!(!history.reset());
    history.clear();
    history.dispose();
    assert_eq!(history.snapshots(), vec![2, 1, 0]);
    assert_eq!(v.get(), 3);
}

#[test]
fn test_sync_should_commit() {
    let v = sync_signal(0);
    let history = RefHistory::new(
        v.clone(),
        HistoryOptions::new()
            .sync()
            .should_commit(|_old: Option<&i32>, new: &i32| *new > 0),
    )
    .unwrap();

    assert_eq!(history.snapshots(), vec![0]);

    v.set(-1);
    assert_eq!(history.history().len(), 1);

    v.set(2);
    assert_eq!(history.snapshots(), vec![2, 0]);

    v.set(-3);
    assert_eq!(history.history().len(), 2);

    v.set(4);
    assert_eq!(history.snapshots(), vec![4, 2, 0]);
}

#[test]
fn test_sync_capacity() {
    let v = sync_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().capacity(3)).unwrap();

    for i in 1..=10 {
        v.set(i);
    }

    assert_eq!(history.snapshots(), vec![10, 9, 8, 7]);
    while history.undo() {}
    assert_eq!(v.get(), 7);
    assert_eq!(history.undo_len() + history.redo_len(), 4);
}

#[test]
fn test_sync_commit_after_clear_reseeds() {
    let v = sync_signal(5);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync()).unwrap();

    history.clear();
    assert!(history.last().is_none());

    v.set(6);
    assert_eq!(history.snapshots(), vec![6]);
    assert!(!history.can_undo());
}

// ── Pre ────────────────────────────────────────────────────────────────

#[test]
fn test_pre_should_record() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    assert_eq!(history.snapshots(), vec![0]);

    v.set(2);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![2, 0]);
}

#[test]
fn test_pre_undo_and_redo() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    v.set(2);
    scheduler.tick();
    v.set(3);
    scheduler.tick();
    v.set(4);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![4, 3, 2, 0]);
    assert!(history.can_undo());
    assert!(!history.can_redo());

    history.undo();
    scheduler.tick();
    assert_eq!(v.get(), 3);
    assert_eq!(history.last().unwrap().snapshot, 3);

    history.undo();
    scheduler.tick();
    assert_eq!(v.get(), 2);

    history.redo();
    scheduler.tick();
    assert!(history.can_undo());
    assert!(history.can_redo());
    assert_eq!(v.get(), 3);

    history.redo();
    scheduler.tick();
    assert_eq!(v.get(), 4);

    history.redo();
    scheduler.tick();
    assert_eq!(v.get(), 4);
    assert!(!history.can_redo());
    assert_eq!(history.snapshots(), vec![4, 3, 2, 0]);

    history.clear();
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}

#[test]
fn test_pre_deep() {
    let (scheduler, v) = pre_signal(pair(0, "bar"));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().deep(true)).unwrap();

    v.update(|p| p.bar = "foo".to_string());
    scheduler.tick();

    let snapshots = history.snapshots();
    assert_eq!(snapshots[0].bar, "foo");
    assert_eq!(snapshots[1].bar, "bar");
}

#[test]
fn test_pre_dump_and_parse() {
    let (scheduler, v) = pre_signal(pair(0, "bar"));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().deep(true).json_string()).unwrap();

    v.update(|p| p.bar = "foo".to_string());
    scheduler.tick();

    assert_eq!(
        history.snapshots(),
        vec![
            r#"{"foo":0,"bar":"foo"}"#.to_string(),
            r#"{"foo":0,"bar":"bar"}"#.to_string()
        ]
    );

    history.undo();
    scheduler.tick();

    assert_eq!(v.get().bar, "bar");
    assert_eq!(history.history().len(), 1);
}

#[test]
fn test_pre_commit_discards_pending_flush() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    history.commit();
    assert_eq!(history.snapshots(), vec![0, 0]);

    history.undo();
    v.set(2);
    history.commit();
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![2, 0]);
}

#[test]
fn test_pre_pause_and_resume() {
    let (scheduler, v) = pre_signal(1);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    history.pause();
    v.set(2);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![1]);

    history.resume(false);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![1]);

    v.set(3);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![3, 1]);

    history.pause();
    v.set(4);
    scheduler.tick();

    assert_eq!(history.last().unwrap().snapshot, 3);

    history.resume(true);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![4, 3, 1]);
}

#[test]
fn test_pre_resume_before_flush_drops_paused_writes() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    history.pause();
    v.set(9);
    history.resume(false);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![0]);
    assert_eq!(v.get(), 9);
}

#[test]
fn test_pre_reset() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    v.set(1);
    scheduler.tick();

    history.pause();

    v.set(2);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![1, 0]);

    assert!(history.reset());
    assert_eq!(v.get(), 1);
    assert_eq!(history.snapshots(), vec![1, 0]);

    let version = v.version();
    assert!(!history.reset());
    assert_eq!(v.get(), 1);
    assert_eq!(v.version(), version);
    assert_eq!(history.snapshots(), vec![1, 0]);

    v.set(3);
    history.commit();

    history.undo();
    scheduler.tick();

    v.set(2);
    scheduler.tick();

    history.reset();
    scheduler.tick();

    assert_eq!(v.get(), 1);
    assert_eq!(history.snapshots(), vec![1, 0]);
    let redo: Vec<i32> = history.redo_stack().into_iter().map(|r| r.snapshot).collect();
    assert_eq!(redo, vec![3]);
}

#[test]
fn test_pre_auto_batching() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    v.set(1);

    assert_eq!(history.history().len(), 1);
    scheduler.tick();
    assert_eq!(history.history().len(), 2);

    v.set(v.get() + 1);
    v.set(v.get() + 1);

    assert_eq!(history.history().len(), 2);
    scheduler.tick();
    assert_eq!(history.snapshots(), vec![3, 1, 0]);

    scheduler.tick();
    assert_eq!(history.history().len(), 3);
}

#[test]
fn test_pre_batch_spans_ticks() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    history.batch(|_| {
        v.set(1);
        scheduler.tick();
        v.set(2);
        scheduler.tick();
    });
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![2, 0]);

    history.batch(|cancel| {
        v.set(3);
        scheduler.tick();
        v.set(4);
        cancel.cancel();
    });
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![2, 0]);
    assert_eq!(v.get(), 4);
}

#[test]
fn test_pre_dispose() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    v.set(1);
    scheduler.tick();
    v.set(2);
    scheduler.tick();

    history.dispose();

    v.set(3);
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![2, 1, 0]);
    assert_eq!(history.last().unwrap().snapshot, 2);
}

#[test]
fn test_pre_dispose_drops_pending_flush() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();

    v.set(1);
    history.dispose();
    scheduler.tick();

    assert_eq!(history.snapshots(), vec![0]);
}

#[test]
fn test_pre_should_commit() {
    let (scheduler, v) = pre_signal(0);
    let history = RefHistory::new(
        v.clone(),
        HistoryOptions::new().should_commit(|_old: Option<&i32>, new: &i32| *new > 0),
    )
    .unwrap();

    for value in [-1, 2, -3, 4] {
        v.set(value);
        scheduler.tick();
    }

    assert_eq!(history.snapshots(), vec![4, 2, 0]);
}

// ── Gate ───────────────────────────────────────────────────────────────

type GateLog = Rc<RefCell<Vec<(Option<i32>, i32)>>>;

fn logging_gate(admit: fn(i32) -> bool) -> (GateLog, impl Fn(Option<&i32>, &i32) -> bool) {
    let log: GateLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let gate = move |previous: Option<&i32>, candidate: &i32| {
        sink.borrow_mut().push((previous.copied(), *candidate));
        admit(*candidate)
    };
    (log, gate)
}

#[test]
fn test_gate_applies_to_every_commit_path() {
    let v = sync_signal(0);
    let history = RefHistory::new(
        v.clone(),
        HistoryOptions::new()
            .sync()
            .should_commit(|_old: Option<&i32>, new: &i32| *new >= 0),
    )
    .unwrap();

    history.pause();
    v.set(-1);
    history.resume(true);
    assert_eq!(history.snapshots(), vec![0]);

    history.commit();
    assert_eq!(history.snapshots(), vec![0]);

    history.batch(|_| v.set(-2));
    assert_eq!(history.snapshots(), vec![0]);

    history.batch(|_| v.set(5));
    assert_eq!(history.snapshots(), vec![5, 0]);
}

#[test]
fn test_gate_previous_follows_undo_and_redo() {
    let v = sync_signal(0);
    let (log, gate) = logging_gate(|_| true);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().should_commit(gate)).unwrap();

    v.set(1);
    v.set(2);
    history.undo();
    v.set(3);
    history.undo();
    history.redo();
    v.set(4);

    assert_eq!(
        *log.borrow(),
        vec![(None, 1), (Some(1), 2), (Some(1), 3), (Some(3), 4)]
    );
}

#[test]
fn test_pre_gate_rejected_candidate_is_not_previous() {
    let (scheduler, v) = pre_signal(0);
    let (log, gate) = logging_gate(|n| n % 2 == 0);
    let history = RefHistory::new(v.clone(), HistoryOptions::new().should_commit(gate)).unwrap();

    for value in [2, 3, 4] {
        v.set(value);
        scheduler.tick();
    }

    assert_eq!(*log.borrow(), vec![(None, 2), (Some(2), 3), (Some(2), 4)]);
    assert_eq!(history.snapshots(), vec![4, 2, 0]);
}

// ── Isolation ──────────────────────────────────────────────────────────

type Shared = Rc<RefCell<Vec<i32>>>;

fn shared(items: &[i32]) -> Shared {
    Rc::new(RefCell::new(items.to_vec()))
}

fn contents(snapshots: &[Shared]) -> Vec<Vec<i32>> {
    snapshots.iter().map(|s| s.borrow().clone()).collect()
}

#[test]
fn test_identity_snapshots_alias_shared_value() {
    let v = sync_signal(shared(&[1]));
    let history = RefHistory::new(v.clone(), HistoryOptions::new().sync().deep(true)).unwrap();

    v.update(|cell| cell.borrow_mut().push(2));

    let snapshots = history.snapshots();
    assert_eq!(contents(&snapshots), vec![vec![1, 2], vec![1, 2]]);
    assert!(Rc::ptr_eq(&snapshots[0], &snapshots[1]));
}

#[test]
fn test_clone_with_isolates_shared_value() {
    let v = sync_signal(shared(&[1]));
    let history = RefHistory::new(
        v.clone(),
        HistoryOptions::new()
            .sync()
            .deep(true)
            .clone_with(|cell: &Shared| Rc::new(RefCell::new(cell.borrow().clone()))),
    )
    .unwrap();

    v.update(|cell| cell.borrow_mut().push(2));
    assert_eq!(contents(&history.snapshots()), vec![vec![1, 2], vec![1]]);

    assert!(history.undo());
    assert_eq!(*v.get().borrow(), vec![1]);

    // The restored value is a copy too.
    history.pause();
    v.update(|cell| cell.borrow_mut().push(9));
    assert_eq!(contents(&history.snapshots()), vec![vec![1]]);
    let redo: Vec<Shared> = history.redo_stack().into_iter().map(|r| r.snapshot).collect();
    assert_eq!(contents(&redo), vec![vec![1, 2]]);
}

// ── Manual ─────────────────────────────────────────────────────────────

#[test]
fn test_manual_history_alongside_tracked() {
    let (scheduler, v) = pre_signal(0);
    let tracked = RefHistory::new(v.clone(), HistoryOptions::new()).unwrap();
    let manual = ManualHistory::new(v.clone(), refhist_mod_history::Identity, None).unwrap();

    v.set(1);
    scheduler.tick();
    v.set(2);
    scheduler.tick();
    manual.commit();

    assert_eq!(tracked.snapshots(), vec![2, 1, 0]);
    assert_eq!(manual.snapshots(), vec![2, 0]);

    // The manual history's write-back is an ordinary change to the tracker.
    manual.undo();
    scheduler.tick();
    assert_eq!(v.get(), 0);
    assert_eq!(tracked.snapshots(), vec![0, 2, 1, 0]);
}
