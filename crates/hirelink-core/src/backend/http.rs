use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::backend::wire::{RawPollResponse, RawSubmitAck};
use crate::backend::{
    AvailabilityBackend, BackendResult, PollRequest, PollUpdate, SubmitAck, SubmitRequest,
};
use crate::models::{SearchError, SearchErrorKind};

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);
// Headroom on top of the long-poll budget so a server that holds the
// connection for the full wait never trips the client-side timeout.
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct HttpAvailabilityBackend {
    client: Client,
    base_url: String,
}

impl HttpAvailabilityBackend {
    pub fn new(base_url: impl Into<String>) -> BackendResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| SearchError {
                request_id: None,
                kind: SearchErrorKind::Internal,
                message: format!("failed to build http client: {error}"),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn submit_url(&self) -> String {
        format!("{}/availability/submit", self.base_url)
    }

    fn poll_url(&self) -> String {
        format!("{}/availability/poll", self.base_url)
    }
}

#[async_trait]
impl AvailabilityBackend for HttpAvailabilityBackend {
    async fn submit(&self, request: &SubmitRequest) -> BackendResult<SubmitAck> {
        let response = self
            .client
            .post(self.submit_url())
            .timeout(SUBMIT_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|error| transport_error(SearchErrorKind::Submission, None, &error))?
            .error_for_status()
            .map_err(|error| transport_error(SearchErrorKind::Submission, None, &error))?;

        let raw: RawSubmitAck = response.json().await.map_err(|error| SearchError {
            request_id: None,
            kind: SearchErrorKind::Decode,
            message: format!("failed to decode submit response: {error}"),
        })?;
        raw.into_ack()
    }

    async fn poll(&self, request: &PollRequest) -> BackendResult<PollUpdate> {
        let wait_ms = u64::try_from(request.wait.as_millis()).unwrap_or(u64::MAX);
        let response = self
            .client
            .get(self.poll_url())
            .timeout(request.wait + POLL_TIMEOUT_MARGIN)
            .query(&[
                ("requestId", request.request_id.clone()),
                ("sinceSeq", request.since_seq.to_string()),
                ("waitMs", wait_ms.to_string()),
            ])
            .send()
            .await
            .map_err(|error| {
                transport_error(SearchErrorKind::Poll, Some(&request.request_id), &error)
            })?
            .error_for_status()
            .map_err(|error| {
                transport_error(SearchErrorKind::Poll, Some(&request.request_id), &error)
            })?;

        let raw: RawPollResponse = response.json().await.map_err(|error| SearchError {
            request_id: Some(request.request_id.clone()),
            kind: SearchErrorKind::Decode,
            message: format!("failed to decode poll response: {error}"),
        })?;
        Ok(raw.into_update())
    }
}

fn transport_error(
    kind: SearchErrorKind,
    request_id: Option<&str>,
    error: &reqwest::Error,
) -> SearchError {
    SearchError {
        request_id: request_id.map(str::to_string),
        kind,
        message: error.to_string(),
    }
}
