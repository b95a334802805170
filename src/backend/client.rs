//! Backend Client
//!
//! HTTP client for the checker (`/process`, `/updates`, `/status`, `/complete`)
//! and simulator (`/process`, `/simulate`) services.

use crate::backend::error::BackendError;
use crate::backend::types::{
    PollResult, ProcessRequest, ProcessResponse, SimulationRequest, SimulationResponse,
    StatusResponse, Trace,
};
use crate::backend::Backend;
use crate::consts::transport::{REQUEST_TIMEOUT_SECS, SUBMIT_TIMEOUT_SECS};
use log::debug;
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    submit_timeout: Duration,
}

impl BackendClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            submit_timeout: Duration::from_secs(SUBMIT_TIMEOUT_SECS),
        })
    }

    /// Override the timeout applied to `POST /process`.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn job_url(&self, endpoint: &str, request_id: &str) -> String {
        let id = urlencoding::encode(request_id).into_owned();
        self.build_url(&format!("{}/{}", endpoint, id))
    }

    async fn handle_response_status(response: Response) -> Result<Response, BackendError> {
        if !response.status().is_success() {
            return Err(BackendError::from_response(response).await);
        }
        Ok(response)
    }

    async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::handle_response_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Backend for BackendClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn process(&self, input_text: &str) -> Result<ProcessResponse, BackendError> {
        let url = self.build_url("process");
        debug!("POST {} ({} bytes of input)", url, input_text.len());
        let request = ProcessRequest {
            input_text: input_text.to_string(),
        };
        let response = self
            .client
            .post(url)
            .timeout(self.submit_timeout)
            .json(&request)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    async fn updates(&self, request_id: &str) -> Result<PollResult, BackendError> {
        let response = self.client.get(self.job_url("updates", request_id)).send().await?;
        Self::decode_response(response).await
    }

    async fn status(&self, request_id: &str) -> Result<StatusResponse, BackendError> {
        let response = self.client.get(self.job_url("status", request_id)).send().await?;
        Self::decode_response(response).await
    }

    async fn complete(&self, request_id: &str) -> Result<(), BackendError> {
        let response = self.client.post(self.job_url("complete", request_id)).send().await?;
        Self::handle_response_status(response).await?;
        Ok(())
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<Trace, BackendError> {
        let url = self.build_url("simulate");
        debug!("POST {} (branches: {})", url, request.no_of_branches);
        let response = self.client.post(url).json(request).send().await?;
        let SimulationResponse { trace } = Self::decode_response(response).await?;
        trace.ok_or_else(|| BackendError::Malformed("missing trace".to_string()))
    }
}

#[cfg(test)]
/// Exercises the client against a local responder speaking just enough HTTP/1.1.
mod wire_tests {
    use super::*;
    use crate::backend::testing::CannedServer;
    use crate::backend::types::LogLevel;

    #[tokio::test]
    // Submitting posts the input text and returns the request id.
    async fn test_process_returns_request_id() {
        let server = CannedServer::start(vec![(
            200,
            r#"{"message": "Processing started", "request_id": "1712.25"}"#.to_string(),
        )])
        .await;
        let client = BackendClient::new(server.url()).unwrap();

        let response = client.process("l0: 1").await.unwrap();
        assert_eq!(response.request_id.as_deref(), Some("1712.25"));

        let requests = server.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].head.starts_with("POST /process "));
        assert_eq!(requests[0].body, r#"{"input_text":"l0: 1"}"#);
    }

    #[tokio::test]
    // Polling hits the per-job updates path and decodes the log.
    async fn test_updates_decodes_log() {
        let server = CannedServer::start(vec![(
            200,
            r#"{"updates": [{"type": "success", "content": "done"}], "completed": true, "result": {"unsafe": false}}"#
                .to_string(),
        )])
        .await;
        let client = BackendClient::new(server.url()).unwrap();

        let poll = client.updates("1712.25").await.unwrap();
        assert!(poll.completed);
        assert_eq!(poll.updates[0].level, LogLevel::Success);

        let requests = server.requests().await;
        assert!(requests[0].head.starts_with("GET /updates/1712.25 "));
    }

    #[tokio::test]
    // A 404 with a JSON error body becomes an HTTP error carrying the message.
    async fn test_unknown_request_id_is_http_error() {
        let server =
            CannedServer::start(vec![(404, r#"{"error": "Invalid request ID"}"#.to_string())]).await;
        let client = BackendClient::new(server.url()).unwrap();

        match client.updates("missing").await {
            Err(BackendError::Http { status, message, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Invalid request ID");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    // A simulate response without a trace is malformed.
    async fn test_simulate_without_trace_is_malformed() {
        let server = CannedServer::start(vec![(200, r#"{"steps": []}"#.to_string())]).await;
        let client = BackendClient::new(server.url()).unwrap();
        let request = SimulationRequest {
            input_text: "sys".to_string(),
            final_values: Default::default(),
            no_of_branches: 10,
        };

        let result = client.simulate(&request).await;
        assert!(matches!(result, Err(BackendError::Malformed(_))));
    }

    #[tokio::test]
    // Nothing listening on the port is a network error.
    async fn test_connection_refused_is_network_error() {
        let url = CannedServer::unused_url().await;
        let client = BackendClient::new(url).unwrap();

        let result = client.status("1").await;
        assert!(matches!(result, Err(BackendError::Network(_))));
    }
}
