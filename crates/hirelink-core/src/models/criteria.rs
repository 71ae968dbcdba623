use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchCriteria {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_at: Option<DateTime<Utc>>,
    pub dropoff_at: Option<DateTime<Utc>>,
    pub driver_age: Option<u8>,
    pub agreement_ref: Option<String>,
}
