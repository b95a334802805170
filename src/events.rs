//! Events emitted by a session to whatever presents it.

use crate::backend::types::LogEntry;
use crate::classifier::Outcome;
use crate::job::JobId;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The displayed log of a job was replaced.
    LogUpdated { job_id: JobId, entries: Vec<LogEntry> },
    /// A status poll failed; polling carries on.
    PollFailed { job_id: JobId, message: String },
    /// The job reached its final outcome. Sent once per job.
    Completed {
        job_id: JobId,
        outcome: Outcome,
        unsafe_markings: usize,
    },
    /// One search epoch finished its match test.
    EpochFinished { epoch: u32, matched: bool, steps: usize },
}

impl Event {
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::LogUpdated { job_id, .. }
            | Event::PollFailed { job_id, .. }
            | Event::Completed { job_id, .. } => Some(job_id),
            Event::EpochFinished { .. } => None,
        }
    }
}
