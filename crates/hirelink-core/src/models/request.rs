#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SearchStatus {
    Pending,
    InProgress,
    Complete,
    Error,
}

impl SearchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" | "IN-PROGRESS" | "INPROGRESS" | "RUNNING" => Some(Self::InProgress),
            "COMPLETE" | "COMPLETED" | "DONE" => Some(Self::Complete),
            "ERROR" | "FAILED" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchRequest {
    pub request_id: String,
    pub sequence_number: u64,
    pub status: SearchStatus,
}
