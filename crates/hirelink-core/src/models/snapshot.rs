use crate::models::SearchStatus;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSnapshot {
    pub offers_received: usize,
    pub total_expected: Option<u64>,
    pub timed_out_sources: u32,
    pub status: SearchStatus,
}
