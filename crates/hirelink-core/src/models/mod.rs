pub mod criteria;
pub mod error;
pub mod offer;
pub mod request;
pub mod snapshot;

pub use criteria::SearchCriteria;
pub use error::{SearchError, SearchErrorKind};
pub use offer::{AvailabilityStatus, FALLBACK_CURRENCY, Offer};
pub use request::{SearchRequest, SearchStatus};
pub use snapshot::PollSnapshot;
