//! Job submission to the checker backend.

use crate::backend::{Backend, BackendError};
use crate::job::{JobHandle, JobId};
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Nothing but whitespace was given; no request was made.
    #[error("Please enter input text or upload a file")]
    Validation,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Server error with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    MalformedResponse(String),
}

impl From<BackendError> for SubmissionError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Network(e) => SubmissionError::Network(e),
            BackendError::Http { status, message, .. } => SubmissionError::Server { status, message },
            BackendError::Malformed(message) => SubmissionError::MalformedResponse(message),
        }
    }
}

pub struct JobSubmitter {
    backend: Arc<dyn Backend>,
}

impl JobSubmitter {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Rejects input that is empty after trimming.
    pub fn validate(input_text: &str) -> Result<(), SubmissionError> {
        if input_text.trim().is_empty() {
            return Err(SubmissionError::Validation);
        }
        Ok(())
    }

    /// Submit a system description for a safety check.
    pub async fn submit(&self, input_text: &str) -> Result<JobHandle, SubmissionError> {
        Self::validate(input_text)?;

        let response = self.backend.process(input_text).await?;
        let request_id = response
            .request_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SubmissionError::MalformedResponse("missing request_id".to_string()))?;

        if let Some(message) = &response.message {
            debug!("Backend says: {}", message);
        }
        info!("Submitted job {} to {}", request_id, self.backend.base_url());
        Ok(JobId::new(request_id))
    }
}
