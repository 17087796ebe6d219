/// Scripted sessions: a JSON value, its history, and the steps run on it.
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use refhist_core::{Signal, TickScheduler, Watchable};
use refhist_mod_history::{HistoryOptions, HistoryRecord, RefHistory};
use serde::Serialize;
use serde_json::Value;

/// Ticks run after the last step so deferred commits are not lost.
const FINAL_FLUSH_TICKS: usize = 16;

/// A single scripted action.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace the whole value.
    Set(Value),
    /// Replace the node at a JSON pointer, in place.
    Patch { pointer: String, value: Value },
    Commit,
    Undo,
    Redo,
    /// Run one scheduler tick.
    Tick,
    Pause,
    Resume { commit_now: bool },
    Reset,
    Clear,
    Dispose,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(json) = s.strip_prefix("set=") {
            let value = serde_json::from_str(json).context("Failed to parse set value")?;
            return Ok(Self::Set(value));
        }
        if let Some(rest) = s.strip_prefix("patch=") {
            let Some((pointer, json)) = rest.split_once('=') else {
                bail!("Expected patch=<pointer>=<json>");
            };
            if !pointer.is_empty() && !pointer.starts_with('/') {
                bail!("JSON pointer must be empty or start with '/': {pointer}");
            }
            let value = serde_json::from_str(json).context("Failed to parse patch value")?;
            return Ok(Self::Patch {
                pointer: pointer.to_string(),
                value,
            });
        }

        Ok(match s {
            "commit" => Self::Commit,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "tick" => Self::Tick,
            "pause" => Self::Pause,
            "resume" => Self::Resume { commit_now: false },
            "resume!" => Self::Resume { commit_now: true },
            "reset" => Self::Reset,
            "clear" => Self::Clear,
            "dispose" => Self::Dispose,
            other => bail!("Unknown step: {other}"),
        })
    }
}

/// Parses every raw step, reporting the first invalid one.
pub fn parse_steps(raw: &[String]) -> Result<Vec<Step>> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            s.parse()
                .with_context(|| format!("Invalid step #{}: {s}", i + 1))
        })
        .collect()
}

/// Final state printed by the CLI.
#[derive(Debug, Serialize)]
pub struct Report {
    pub value: Value,
    pub history: Vec<HistoryRecord<Value>>,
    pub redo: Vec<HistoryRecord<Value>>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub tracking: bool,
    pub disposed: bool,
}

/// A tracked JSON value driven by a manual scheduler.
pub struct Session {
    scheduler: TickScheduler,
    value: Signal<Value>,
    history: RefHistory<Value>,
}

impl Session {
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be captured.
    pub fn new(initial: Value, options: HistoryOptions<Value>) -> Result<Self> {
        let scheduler = TickScheduler::new();
        let value = Signal::new(initial, scheduler.clone());
        let history = RefHistory::new(value.clone(), options)?;
        Ok(Self {
            scheduler,
            value,
            history,
        })
    }

    /// Applies one step.
    ///
    /// # Errors
    ///
    /// Returns an error if a patch pointer does not resolve. History
    /// operations in an invalid state are no-ops, not errors.
    pub fn apply(&self, step: &Step) -> Result<()> {
        tracing::debug!(?step, "Applying step");
        match step {
            Step::Set(value) => self.value.set(value.clone()),
            Step::Patch { pointer, value } => {
                // Checked up front so a bad pointer never notifies watchers.
                if !self.value.with(|root| root.pointer(pointer).is_some()) {
                    bail!("Nothing at JSON pointer '{pointer}'");
                }
                self.value.update(|root| {
                    if let Some(slot) = root.pointer_mut(pointer) {
                        *slot = value.clone();
                    }
                });
            }
            Step::Commit => self.history.commit(),
            Step::Undo => {
                if !self.history.undo() {
                    tracing::info!("Nothing to undo");
                }
            }
            Step::Redo => {
                if !self.history.redo() {
                    tracing::info!("Nothing to redo");
                }
            }
            Step::Tick => {
                self.scheduler.tick();
            }
            Step::Pause => self.history.pause(),
            Step::Resume { commit_now } => self.history.resume(*commit_now),
            Step::Reset => {
                self.history.reset();
            }
            Step::Clear => self.history.clear(),
            Step::Dispose => self.history.dispose(),
        }
        Ok(())
    }

    /// Flushes pending deferred work and reports the final state.
    pub fn finish(&self) -> Report {
        let ran = self.scheduler.run_until_idle(FINAL_FLUSH_TICKS);
        if self.scheduler.pending() > 0 {
            tracing::warn!(
                "Scheduler still busy after {ran} ticks, {} job(s) dropped",
                self.scheduler.pending()
            );
        }
        Report {
            value: self.value.get(),
            history: self.history.history(),
            redo: self.history.redo_stack(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            tracking: self.history.is_tracking(),
            disposed: self.history.is_disposed(),
        }
    }
}

/// Runs `steps` against `initial` and returns the final state.
///
/// # Errors
///
/// Returns an error on the first step that fails.
pub fn run(initial: Value, options: HistoryOptions<Value>, steps: &[Step]) -> Result<Report> {
    let session = Session::new(initial, options)?;
    for (i, step) in steps.iter().enumerate() {
        session
            .apply(step)
            .with_context(|| format!("Step #{} failed", i + 1))?;
    }
    Ok(session.finish())
}
