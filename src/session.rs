//! Session
//!
//! Owns the single active-job slot. Submitting, clearing and dropping all go
//! through here, and each of them stops the previous poll loop before the
//! slot changes hands.

use crate::accumulator::LogSnapshot;
use crate::backend::Backend;
use crate::events::Event;
use crate::job::{Job, JobId, JobStatus};
use crate::scheduler::{ActivePoll, JobState, PollingScheduler, SharedJobState};
use crate::search::{EpochicSearchController, MatchPolicy, SearchError, SearchOutcome, SearchRequest};
use crate::submitter::{JobSubmitter, SubmissionError};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct Session {
    checker: Arc<dyn Backend>,
    simulator: Arc<dyn Backend>,
    submitter: JobSubmitter,
    state: SharedJobState,
    active: Option<ActivePoll>,
    events: mpsc::Sender<Event>,
    poll_interval: Duration,
    match_policy: MatchPolicy,
}

impl Session {
    /// `checker` serves `/process` and `/updates`; `simulator` serves `/simulate`.
    pub fn new(
        checker: Arc<dyn Backend>,
        simulator: Arc<dyn Backend>,
        events: mpsc::Sender<Event>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            submitter: JobSubmitter::new(checker.clone()),
            checker,
            simulator,
            state: Arc::new(Mutex::new(JobState::default())),
            active: None,
            events,
            poll_interval,
            match_policy: MatchPolicy::default(),
        }
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Submit a new job, replacing whatever job was active.
    ///
    /// Invalid input is rejected before the active job is touched.
    pub async fn submit_job(&mut self, input_text: &str) -> Result<JobId, SubmissionError> {
        JobSubmitter::validate(input_text)?;
        self.reset();

        let job_id = self.submitter.submit(input_text).await?;
        self.state.lock().job = Some(Job::new(job_id.clone()));

        let scheduler = PollingScheduler::new(
            self.checker.clone(),
            job_id.clone(),
            self.state.clone(),
            self.events.clone(),
        );
        self.active = Some(scheduler.start(self.poll_interval));
        info!("Processing started. Updates will appear as job {} runs.", job_id);
        Ok(job_id)
    }

    /// Forget the current job and its log, stopping its polling.
    pub fn clear(&mut self) {
        self.reset();
        debug!("Session cleared");
    }

    fn reset(&mut self) {
        let mut state = self.state.lock();
        if let Some(active) = self.active.take() {
            // Cancelled under the state lock so no in-flight poll can apply afterwards.
            active.stop();
        }
        if let Some(job) = state.job.as_mut() {
            if job.cancel() {
                debug!("Cancelled job {}", job.id());
            }
        }
        state.job = None;
        state.log.clear();
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.state.lock().log.snapshot()
    }

    pub fn job_status(&self) -> Option<JobStatus> {
        self.state.lock().job.as_ref().map(|job| job.status().clone())
    }

    /// Wait until the active poll loop ends, by completion or by [`clear`](Self::clear).
    pub async fn wait(&mut self) {
        if let Some(active) = self.active.take() {
            active.join().await;
        }
    }

    /// Run a reachability search against the simulator.
    pub async fn run_search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        EpochicSearchController::new(self.simulator.clone())
            .with_policy(self.match_policy)
            .with_events(self.events.clone())
            .run(request)
            .await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop();
        }
    }
}
