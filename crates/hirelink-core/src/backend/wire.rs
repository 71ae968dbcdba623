use std::time::Duration;

use serde::Deserialize;

use crate::backend::{BackendResult, PollUpdate, SubmitAck};
use crate::models::{AvailabilityStatus, FALLBACK_CURRENCY, Offer, SearchError, SearchErrorKind, SearchStatus};

// The backend emits inconsistent key casing across deployments. Every field
// accepts both spellings; normalization into the canonical model happens here
// and nowhere else.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSubmitAck {
    #[serde(alias = "requestId")]
    pub request_id: Option<String>,
    #[serde(alias = "recommendedPollMs")]
    pub recommended_poll_ms: Option<u64>,
    pub status: Option<String>,
}

impl RawSubmitAck {
    pub fn into_ack(self) -> BackendResult<SubmitAck> {
        let request_id = self
            .request_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| SearchError {
                request_id: None,
                kind: SearchErrorKind::Decode,
                message: "submit response is missing a request id".to_string(),
            })?;

        Ok(SubmitAck {
            request_id,
            recommended_poll: self.recommended_poll_ms.map(Duration::from_millis),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPollResponse {
    #[serde(alias = "requestId")]
    pub request_id: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "lastSeq")]
    pub last_seq: Option<u64>,
    pub offers: Vec<RawOffer>,
    pub complete: Option<bool>,
    pub error: Option<String>,
    #[serde(alias = "totalExpected")]
    pub total_expected: Option<u64>,
    #[serde(alias = "timedOutSources")]
    pub timed_out_sources: Option<u32>,
}

impl RawPollResponse {
    pub fn into_update(self) -> PollUpdate {
        PollUpdate {
            request_id: self.request_id,
            status: self.status.as_deref().and_then(SearchStatus::from_wire),
            last_seq: self.last_seq.unwrap_or(0),
            offers: self.offers.into_iter().map(RawOffer::normalize).collect(),
            complete: self.complete.unwrap_or(false),
            error: self.error,
            total_expected: self.total_expected,
            timed_out_sources: self.timed_out_sources.unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawOffer {
    #[serde(alias = "supplierOfferRef")]
    pub supplier_offer_ref: Option<String>,
    #[serde(alias = "sourceId")]
    pub source_id: Option<String>,
    #[serde(alias = "agreementRef")]
    pub agreement_ref: Option<String>,
    #[serde(alias = "pickupLocation")]
    pub pickup_location: Option<String>,
    #[serde(alias = "dropoffLocation")]
    pub dropoff_location: Option<String>,
    #[serde(alias = "vehicleClass")]
    pub vehicle_class: Option<String>,
    #[serde(alias = "vehicleMakeModel")]
    pub vehicle_make_model: Option<String>,
    #[serde(alias = "ratePlanCode")]
    pub rate_plan_code: Option<String>,
    #[serde(alias = "totalPrice")]
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    #[serde(alias = "availabilityStatus")]
    pub availability_status: Option<String>,
    #[serde(alias = "supplierName")]
    pub supplier_name: Option<String>,
}

impl RawOffer {
    // A partially populated offer normalizes to defaults rather than failing:
    // rendering downstream must never depend on the backend filling every key.
    pub fn normalize(self) -> Offer {
        Offer {
            supplier_offer_ref: self.supplier_offer_ref.unwrap_or_default(),
            source_id: self.source_id.unwrap_or_default(),
            agreement_ref: self.agreement_ref.unwrap_or_default(),
            pickup_location: self.pickup_location.unwrap_or_default(),
            dropoff_location: self.dropoff_location.unwrap_or_default(),
            vehicle_class: self.vehicle_class.unwrap_or_default(),
            vehicle_make_model: self.vehicle_make_model.unwrap_or_default(),
            rate_plan_code: self.rate_plan_code.unwrap_or_default(),
            total_price: self.total_price.unwrap_or(0.0),
            currency: self
                .currency
                .filter(|code| !code.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_CURRENCY.to_string()),
            availability_status: self
                .availability_status
                .as_deref()
                .map(AvailabilityStatus::from_wire)
                .unwrap_or(AvailabilityStatus::Unknown),
            supplier_name: self.supplier_name.unwrap_or_default(),
        }
    }
}
