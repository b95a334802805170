//! Epochic Reachability Search
//!
//! Asks the simulator for random executions, one epoch at a time, until one
//! of them passes through a state matching the target assignment. Running out
//! of epochs only means no sampled execution reached the target; it is not a
//! proof of unreachability.

use crate::backend::types::{Assignment, SimulationRequest, Trace};
use crate::backend::{Backend, BackendError};
use crate::events::Event;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Which states of a trace are tested against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Any state along the trace.
    #[default]
    AnyState,
    /// Only the state the trace ends in.
    FinalState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub input_text: String,
    pub target: Assignment,
    pub branch_count: u32,
    pub epoch_limit: u32,
}

/// Result of one epoch's match test.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochOutcome {
    /// 1-based.
    pub epoch: u32,
    pub matched: bool,
    pub trace: Trace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The target was witnessed in `epoch`; `trace` is that epoch's execution.
    Matched { epoch: u32, trace: Trace },
    /// No epoch witnessed the target. `last_trace` is the final attempt.
    Exhausted {
        epoch_limit: u32,
        last_trace: Option<Trace>,
    },
}

impl SearchOutcome {
    /// The retained trace, for display.
    pub fn trace(&self) -> Option<&Trace> {
        match self {
            SearchOutcome::Matched { trace, .. } => Some(trace),
            SearchOutcome::Exhausted { last_trace, .. } => last_trace.as_ref(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Simulation failed in epoch {epoch}: {source}")]
pub struct SearchError {
    pub epoch: u32,
    #[source]
    pub source: BackendError,
}

/// True when every target variable has exactly its target value in `state`.
/// Variables not in the target are ignored; a missing one fails the match.
pub fn state_matches(state: &Assignment, target: &Assignment) -> bool {
    target
        .iter()
        .all(|(name, value)| state.get(name) == Some(value))
}

pub fn trace_matches(trace: &Trace, target: &Assignment, policy: MatchPolicy) -> bool {
    match policy {
        MatchPolicy::AnyState => trace.iter().any(|(_, state)| state_matches(state, target)),
        MatchPolicy::FinalState => trace
            .last()
            .map(|(_, state)| state_matches(state, target))
            .unwrap_or(false),
    }
}

pub struct EpochicSearchController {
    backend: Arc<dyn Backend>,
    policy: MatchPolicy,
    events: Option<mpsc::Sender<Event>>,
}

impl EpochicSearchController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            policy: MatchPolicy::default(),
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Report every finished epoch on `events`.
    pub fn with_events(mut self, events: mpsc::Sender<Event>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run up to `epoch_limit` sequential epochs, stopping at the first match.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let simulation = SimulationRequest {
            input_text: request.input_text.clone(),
            final_values: request.target.clone(),
            no_of_branches: request.branch_count,
        };
        let mut last_trace = None;

        for epoch in 1..=request.epoch_limit {
            debug!("Epoch {}/{}: requesting simulation", epoch, request.epoch_limit);
            let trace = self
                .backend
                .simulate(&simulation)
                .await
                .map_err(|source| SearchError { epoch, source })?;

            let outcome = self.evaluate(epoch, trace, &request.target);
            self.report(&outcome).await;

            if outcome.matched {
                info!("Reachability property holds, witnessed in epoch {}", epoch);
                return Ok(SearchOutcome::Matched {
                    epoch,
                    trace: outcome.trace,
                });
            }
            info!("Reachability property does not hold in epoch {}", epoch);
            // Only the final attempt is kept around.
            last_trace = Some(outcome.trace);
        }

        Ok(SearchOutcome::Exhausted {
            epoch_limit: request.epoch_limit,
            last_trace,
        })
    }

    fn evaluate(&self, epoch: u32, trace: Trace, target: &Assignment) -> EpochOutcome {
        let matched = trace_matches(&trace, target, self.policy);
        EpochOutcome {
            epoch,
            matched,
            trace,
        }
    }

    async fn report(&self, outcome: &EpochOutcome) {
        if let Some(events) = &self.events {
            let _ = events
                .send(Event::EpochFinished {
                    epoch: outcome.epoch,
                    matched: outcome.matched,
                    steps: outcome.trace.len(),
                })
                .await;
        }
    }
}
