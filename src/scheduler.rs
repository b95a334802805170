//! Polling Scheduler
//!
//! Drives the status polls of one active job:
//! - a fixed-period timer per job, stopped through a [`CancellationToken`]
//! - the owner discards the job through a parent token; completion only
//!   cancels the child token that drives the timer
//! - at most one poll in flight per job; ticks that find one running are skipped
//! - every result is checked against the token before it touches shared state

use crate::accumulator::LogAccumulator;
use crate::backend::types::PollResult;
use crate::backend::{Backend, BackendError};
use crate::classifier::{Outcome, ResultClassifier};
use crate::events::Event;
use crate::job::{Job, JobId};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// The active-job slot and its log, owned by the session.
#[derive(Debug, Default)]
pub struct JobState {
    pub job: Option<Job>,
    pub log: LogAccumulator,
}

pub type SharedJobState = Arc<Mutex<JobState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A poll for this job was still in flight.
    Skipped,
    /// The poll was applied; the job is still running.
    Updated,
    /// The poll failed; the schedule carries on.
    Failed,
    /// The job reached a terminal state and the timer was stopped.
    Completed,
    /// The token was cancelled while the poll was in flight.
    Discarded,
    /// The token was already cancelled; nothing was sent.
    Stopped,
}

/// Clears the in-flight flag when the poll ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PollingScheduler {
    backend: Arc<dyn Backend>,
    job_id: JobId,
    state: SharedJobState,
    events: mpsc::Sender<Event>,
    /// Cancelled when the owner drops the job; nothing is delivered after that.
    discard: CancellationToken,
    /// Child of `discard`; also cancelled when the job finishes.
    token: CancellationToken,
    in_flight: AtomicBool,
}

impl PollingScheduler {
    pub fn new(
        backend: Arc<dyn Backend>,
        job_id: JobId,
        state: SharedJobState,
        events: mpsc::Sender<Event>,
    ) -> Self {
        let discard = CancellationToken::new();
        Self {
            backend,
            job_id,
            state,
            events,
            token: discard.child_token(),
            discard,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Moves the job to `Polling` and spawns the timer loop.
    pub fn start(self, period: Duration) -> ActivePoll {
        {
            let mut state = self.state.lock();
            if let Some(job) = state.job.as_mut().filter(|job| job.id() == &self.job_id) {
                job.start_polling();
            }
        }
        let discard = self.discard.clone();
        let scheduler = Arc::new(self);
        let handle = tokio::spawn(scheduler.run(period));
        ActivePoll { discard, handle }
    }

    async fn run(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Polling job {} every {:?}", self.job_id, period);

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {
                    // Polls run beside the timer so a slow one makes later ticks skip.
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        scheduler.tick().await;
                    });
                }
            }
        }
        debug!("Stopped polling job {}", self.job_id);
    }

    /// One timer tick: poll unless a poll is in flight, then apply the result.
    pub async fn tick(&self) -> TickOutcome {
        if self.token.is_cancelled() {
            return TickOutcome::Stopped;
        }
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("Poll for job {} still in flight, skipping tick", self.job_id);
            return TickOutcome::Skipped;
        };

        let response = tokio::select! {
            biased;
            _ = self.token.cancelled() => return TickOutcome::Discarded,
            response = self.backend.updates(self.job_id.as_str()) => response,
        };

        let (outcome, events) = self.apply(response);
        self.deliver(events).await;
        outcome
    }

    /// Send events produced under the lock, unless the job was discarded meanwhile.
    async fn deliver(&self, events: Vec<Event>) {
        for event in events {
            if self.discard.is_cancelled() {
                debug!("Job {} was discarded, dropping pending events", self.job_id);
                return;
            }
            let _ = self.events.send(event).await;
        }
    }

    fn apply(&self, response: Result<PollResult, BackendError>) -> (TickOutcome, Vec<Event>) {
        let mut state = self.state.lock();
        // Checked under the lock: clearing the session cancels while holding it.
        if self.token.is_cancelled() {
            return (TickOutcome::Discarded, vec![]);
        }

        let poll = match response {
            Ok(poll) => poll,
            Err(e) => {
                if e.is_timeout() {
                    warn!("Updates request for job {} timed out", self.job_id);
                } else {
                    warn!("Failed to fetch updates for job {}: {}", self.job_id, e);
                }
                let event = Event::PollFailed {
                    job_id: self.job_id.clone(),
                    message: e.to_string(),
                };
                return (TickOutcome::Failed, vec![event]);
            }
        };

        let JobState { job, log } = &mut *state;
        let Some(job) = job.as_mut().filter(|job| job.id() == &self.job_id) else {
            return (TickOutcome::Discarded, vec![]);
        };

        let mut events = Vec::new();
        if log.apply(&poll) {
            events.push(Event::LogUpdated {
                job_id: self.job_id.clone(),
                entries: log.entries().to_vec(),
            });
        }

        let finished = if poll.completed {
            let outcome = ResultClassifier::classify_completion(poll.result.as_ref());
            job.complete(outcome.clone()).then_some(outcome)
        } else if let Some(error) = poll.result.as_ref().and_then(|r| r.error.clone()) {
            // The checker reports processing failures without ever completing the job.
            job.fail(error.clone()).then_some(Outcome::Error(error))
        } else {
            None
        };

        match finished {
            Some(outcome) => {
                self.token.cancel();
                log.set_outcome(outcome.clone());
                info!("Job {} finished: {}", self.job_id, outcome);
                let unsafe_markings = poll
                    .result
                    .as_ref()
                    .map(|r| r.unsafe_markings.len())
                    .unwrap_or(0);
                events.push(Event::Completed {
                    job_id: self.job_id.clone(),
                    outcome,
                    unsafe_markings,
                });
                (TickOutcome::Completed, events)
            }
            None if poll.completed => (TickOutcome::Completed, events),
            None => (TickOutcome::Updated, events),
        }
    }
}

/// A running poll loop. Dropping it discards the job.
#[derive(Debug)]
pub struct ActivePoll {
    discard: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActivePoll {
    /// Stop polling and drop any result or event still in flight.
    pub fn stop(&self) {
        self.discard.cancel();
    }

    /// Wait for the loop to end, either by completion or by [`stop`](Self::stop).
    pub async fn join(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for ActivePoll {
    fn drop(&mut self) {
        self.discard.cancel();
    }
}
