use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SearchErrorKind {
    InvalidCriteria,
    Submission,
    Poll,
    Decode,
    Cancelled,
    Timeout,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct SearchError {
    pub request_id: Option<String>,
    pub kind: SearchErrorKind,
    pub message: String,
}
