//! Progress reporting from the worker to whoever is watching.

use std::fmt;

use serde::Serialize;

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Parsing,
    LookingUp,
    Publishing,
    Persisting,
    Done,
}

impl Stage {
    pub const fn label(&self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::Parsing => "Parsing workbook",
            Stage::LookingUp => "Looking up samples",
            Stage::Publishing => "Publishing to QBench",
            Stage::Persisting => "Saving audit record",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub message: String,
}

impl Progress {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Receives progress updates. Implemented for any `Fn(Progress)` closure,
/// so a channel sender can be wrapped as `|p| { let _ = tx.send(p); }`.
pub trait ProgressSink {
    fn report(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress),
{
    fn report(&self, progress: Progress) {
        self(progress);
    }
}

/// Discards every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: Progress) {}
}
