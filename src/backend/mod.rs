//! Backend
//!
//! Access to the remote checker and simulator services. Everything that goes
//! over the wire passes through the [`Backend`] trait so that the job and
//! search logic can be driven by a test double.

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::BackendClient;
pub use error::BackendError;

use crate::backend::types::{PollResult, ProcessResponse, SimulationRequest, StatusResponse, Trace};

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Base URL requests are sent to.
    fn base_url(&self) -> &str;

    /// `POST /process`, bounded by the submission timeout.
    async fn process(&self, input_text: &str) -> Result<ProcessResponse, BackendError>;

    /// `GET /updates/{id}`: cumulative log and completion state of a job.
    async fn updates(&self, request_id: &str) -> Result<PollResult, BackendError>;

    /// `GET /status/{id}`.
    async fn status(&self, request_id: &str) -> Result<StatusResponse, BackendError>;

    /// `POST /complete/{id}`: force a job into the completed state.
    async fn complete(&self, request_id: &str) -> Result<(), BackendError>;

    /// `POST /simulate`: one random walk of the synthesised model.
    async fn simulate(&self, request: &SimulationRequest) -> Result<Trace, BackendError>;
}
