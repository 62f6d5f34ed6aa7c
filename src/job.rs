//! Job and job-kind domain types.
//!
//! A [`Job`] is created once by ingress, consumed exactly once by a worker,
//! and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Closed enumeration of the supported statistical computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    StatesMean,
    StateMean,
    Best5,
    Worst5,
    GlobalMean,
    DiffFromMean,
    StateDiffFromMean,
    MeanByCategory,
    StateMeanByCategory,
}

/// Request payload threaded from ingress through to the compute dispatcher.
///
/// `state` is `None` for one-argument job kinds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobArgs {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// A single unit of work dequeued by exactly one worker.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub kind: JobKind,
    pub args: JobArgs,
}
