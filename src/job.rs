//! Verification Job
//!
//! Lifecycle of one submitted job:
//!
//! ```text
//!   submit ──→ Pending ──→ Polling ──→ Completed(outcome)
//!                 │           │
//!                 │           ├──→ Failed(reason)
//!                 │           │
//!                 └───────────┴──→ Cancelled
//! ```
//!
//! Transitions only move forward and the three terminal states are final.

use crate::classifier::Outcome;
use std::fmt::Display;

/// Opaque request identifier issued by the checker backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by a successful submission.
pub type JobHandle = JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Polling,
    Completed(Outcome),
    Cancelled,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed(_) | JobStatus::Cancelled | JobStatus::Failed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    status: JobStatus,
}

impl Job {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    /// Pending → Polling. Returns false if the job already left `Pending`.
    pub fn start_polling(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Polling;
        true
    }

    /// Records the final outcome. Only the first completion signal counts;
    /// later ones (and completions of cancelled jobs) return false.
    pub fn complete(&mut self, outcome: Outcome) -> bool {
        self.finish(JobStatus::Completed(outcome))
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.finish(JobStatus::Failed(reason.into()))
    }

    pub fn cancel(&mut self) -> bool {
        self.finish(JobStatus::Cancelled)
    }

    fn finish(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }
}
