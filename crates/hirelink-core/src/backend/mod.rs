pub mod http;
pub mod wire;

pub use http::HttpAvailabilityBackend;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Offer, SearchCriteria, SearchError, SearchErrorKind, SearchStatus};

pub type BackendResult<T> = Result<T, SearchError>;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SubmitRequest {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_at: DateTime<Utc>,
    pub dropoff_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_age: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agreement_refs: Vec<String>,
}

impl SubmitRequest {
    pub fn from_criteria(criteria: &SearchCriteria) -> BackendResult<Self> {
        if criteria.pickup_location.trim().is_empty() {
            return Err(invalid_criteria("pickup location code is required"));
        }
        if criteria.dropoff_location.trim().is_empty() {
            return Err(invalid_criteria("dropoff location code is required"));
        }
        let pickup_at = criteria
            .pickup_at
            .ok_or_else(|| invalid_criteria("pickup time is required"))?;
        let dropoff_at = criteria
            .dropoff_at
            .ok_or_else(|| invalid_criteria("dropoff time is required"))?;
        if dropoff_at <= pickup_at {
            return Err(invalid_criteria("dropoff time must be after pickup time"));
        }

        Ok(Self {
            pickup_location: criteria.pickup_location.trim().to_string(),
            dropoff_location: criteria.dropoff_location.trim().to_string(),
            pickup_at,
            dropoff_at,
            driver_age: criteria.driver_age,
            agreement_refs: criteria
                .agreement_ref
                .iter()
                .filter(|reference| !reference.trim().is_empty())
                .map(|reference| reference.trim().to_string())
                .collect(),
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitAck {
    pub request_id: String,
    pub recommended_poll: Option<Duration>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PollRequest {
    pub request_id: String,
    pub since_seq: u64,
    pub wait: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollUpdate {
    pub request_id: Option<String>,
    pub status: Option<SearchStatus>,
    pub last_seq: u64,
    pub offers: Vec<Offer>,
    pub complete: bool,
    pub error: Option<String>,
    pub total_expected: Option<u64>,
    pub timed_out_sources: u32,
}

#[async_trait]
pub trait AvailabilityBackend: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> BackendResult<SubmitAck>;

    async fn poll(&self, request: &PollRequest) -> BackendResult<PollUpdate>;
}

fn invalid_criteria(message: &str) -> SearchError {
    SearchError {
        request_id: None,
        kind: SearchErrorKind::InvalidCriteria,
        message: message.to_string(),
    }
}
