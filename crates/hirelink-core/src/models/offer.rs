use serde::Serialize;

pub const FALLBACK_CURRENCY: &str = "USD";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
    Unknown,
}

impl AvailabilityStatus {
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Self::Available,
            "UNAVAILABLE" | "SOLD_OUT" | "ON_STOP" => Self::Unavailable,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Offer {
    pub supplier_offer_ref: String,
    pub source_id: String,
    pub agreement_ref: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub vehicle_class: String,
    pub vehicle_make_model: String,
    pub rate_plan_code: String,
    pub total_price: f64,
    pub currency: String,
    pub availability_status: AvailabilityStatus,
    pub supplier_name: String,
}
