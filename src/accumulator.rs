//! Log Accumulator
//!
//! The authoritative view of a job's output. Every poll carries the complete
//! cumulative log, so the view is replaced wholesale instead of appended to.

use crate::backend::types::{LogEntry, PollResult};
use crate::classifier::Outcome;

/// Terminal classification as seen by presentation consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Safe,
    Unsafe,
    Error(String),
}

impl From<&Outcome> for Verdict {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Safe => Verdict::Safe,
            Outcome::Unsafe => Verdict::Unsafe,
            Outcome::Error(message) => Verdict::Error(message.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSnapshot {
    pub entries: Vec<LogEntry>,
    pub verdict: Verdict,
}

#[derive(Debug, Default)]
pub struct LogAccumulator {
    entries: Vec<LogEntry>,
    outcome: Option<Outcome>,
}

impl LogAccumulator {
    /// Replace the log with the poll's updates. An empty update list means
    /// "nothing new yet" and leaves the log untouched. Returns whether the
    /// log changed.
    pub fn apply(&mut self, poll: &PollResult) -> bool {
        if poll.updates.is_empty() || poll.updates == self.entries {
            return false;
        }
        self.entries = poll.updates.clone();
        true
    }

    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            entries: self.entries.clone(),
            verdict: self
                .outcome
                .as_ref()
                .map(Verdict::from)
                .unwrap_or(Verdict::Pending),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.outcome = None;
    }
}
