//! Wire types of the checker and simulator backends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable name to integer value, as used by traces and target assignments.
pub type Assignment = BTreeMap<String, i64>;

/// One `(transition, resulting state)` step of a simulated execution.
pub type TraceStep = (String, Assignment);

/// Ordered steps of one simulation; the first step is labelled `initial`.
pub type Trace = Vec<TraceStep>;

#[derive(Debug, Serialize, Clone)]
pub struct ProcessRequest {
    pub input_text: String,
}

/// Response of `POST /process`.
///
/// The checker backend answers asynchronously with a `request_id`; the
/// simulator backend answers synchronously with the generated `gal_code`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProcessResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub gal_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Success,
    Warning,
    Error,
    /// Also used for any level this client does not know.
    #[serde(other)]
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub content: String,
    /// Seconds since the Unix epoch, as stamped by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Final result attached to a job by the checker backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub r#unsafe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "unsafeMarkings", default)]
    pub unsafe_markings: Vec<Assignment>,
}

/// Response of `GET /updates/{id}`.
///
/// `updates` is always the complete cumulative log of the job, never a
/// delta: clients replace what they display with it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PollResult {
    #[serde(default)]
    pub updates: Vec<LogEntry>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub result: Option<ResultPayload>,
}

/// Response of `GET /status/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SimulationRequest {
    pub input_text: String,
    pub final_values: Assignment,
    pub no_of_branches: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationResponse {
    pub trace: Option<Trace>,
}
