use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hirelink_core::backend::{
    AvailabilityBackend, BackendResult, PollRequest, PollUpdate, SubmitAck, SubmitRequest,
};
use hirelink_core::models::{AvailabilityStatus, Offer, SearchCriteria, SearchStatus};
use hirelink_core::search::{SearchConfig, SearchCoordinator};
use tokio::sync::Mutex;

struct ScriptedBackend {
    request_id: String,
    poll_calls: AtomicUsize,
    seen_since: Mutex<Vec<u64>>,
    updates: Mutex<VecDeque<BackendResult<PollUpdate>>>,
}

impl ScriptedBackend {
    fn new(request_id: &str, updates: Vec<BackendResult<PollUpdate>>) -> Self {
        Self {
            request_id: request_id.to_string(),
            poll_calls: AtomicUsize::new(0),
            seen_since: Mutex::new(Vec::new()),
            updates: Mutex::new(updates.into()),
        }
    }
}

#[async_trait]
impl AvailabilityBackend for ScriptedBackend {
    async fn submit(&self, _request: &SubmitRequest) -> BackendResult<SubmitAck> {
        Ok(SubmitAck {
            request_id: self.request_id.clone(),
            recommended_poll: Some(Duration::from_millis(20)),
        })
    }

    async fn poll(&self, request: &PollRequest) -> BackendResult<PollUpdate> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_since.lock().await.push(request.since_seq);
        let mut updates = self.updates.lock().await;
        updates
            .pop_front()
            .unwrap_or_else(|| Ok(in_progress(&self.request_id, request.since_seq, Vec::new())))
    }
}

fn fast_config() -> SearchConfig {
    SearchConfig {
        poll_interval: Duration::from_millis(20),
        min_poll_interval: Duration::from_millis(5),
        max_poll_interval: Duration::from_millis(100),
        wait_budget: Duration::from_millis(10),
    }
}

fn timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}

fn criteria() -> SearchCriteria {
    SearchCriteria {
        pickup_location: "PKKHI".to_string(),
        dropoff_location: "PKLHE".to_string(),
        pickup_at: Some(timestamp("2025-11-03T10:00:00Z")),
        dropoff_at: Some(timestamp("2025-11-05T10:00:00Z")),
        driver_age: None,
        agreement_ref: None,
    }
}

fn offer(reference: &str) -> Offer {
    Offer {
        supplier_offer_ref: reference.to_string(),
        source_id: "src-1".to_string(),
        agreement_ref: "agr-1".to_string(),
        pickup_location: "Karachi".to_string(),
        dropoff_location: "Lahore".to_string(),
        vehicle_class: "Compact".to_string(),
        vehicle_make_model: "Suzuki Cultus".to_string(),
        rate_plan_code: "STD".to_string(),
        total_price: 112.5,
        currency: "USD".to_string(),
        availability_status: AvailabilityStatus::Available,
        supplier_name: "Metro Cars".to_string(),
    }
}

fn in_progress(request_id: &str, last_seq: u64, offers: Vec<Offer>) -> PollUpdate {
    PollUpdate {
        request_id: Some(request_id.to_string()),
        status: Some(SearchStatus::InProgress),
        last_seq,
        offers,
        complete: false,
        error: None,
        total_expected: None,
        timed_out_sources: 0,
    }
}

fn complete(request_id: &str, last_seq: u64) -> PollUpdate {
    PollUpdate {
        request_id: Some(request_id.to_string()),
        status: Some(SearchStatus::Complete),
        last_seq,
        offers: Vec::new(),
        complete: true,
        error: None,
        total_expected: None,
        timed_out_sources: 0,
    }
}

// The concrete scenario from the wire contract: two offers at seq 2, then an
// empty completing response at the same seq.
#[tokio::test]
async fn two_offers_then_completion_leaves_two_offers_at_seq_two() {
    let backend = Arc::new(ScriptedBackend::new(
        "req-1",
        vec![
            Ok(in_progress("req-1", 2, vec![offer("offer-a"), offer("offer-b")])),
            Ok(complete("req-1", 2)),
        ],
    ));
    let coordinator = SearchCoordinator::with_config(backend.clone(), fast_config());

    let request = coordinator.submit(&criteria()).await.unwrap();
    assert_eq!(request.request_id, "req-1");
    assert_eq!(request.sequence_number, 0);
    assert_eq!(request.status, SearchStatus::Pending);

    let terminal = coordinator
        .wait_for_terminal(Some(Duration::from_secs(2)))
        .await
        .unwrap();
    assert_eq!(terminal.status, SearchStatus::Complete);
    assert_eq!(terminal.sequence_number, 2);

    let refs: Vec<String> = coordinator
        .offers()
        .await
        .into_iter()
        .map(|offer| offer.supplier_offer_ref)
        .collect();
    assert_eq!(refs, vec!["offer-a".to_string(), "offer-b".to_string()]);

    assert_eq!(*backend.seen_since.lock().await, vec![0, 2]);
}

#[tokio::test]
async fn sequence_numbers_advance_monotonically_across_batches() {
    let mut third = complete("req-2", 7);
    third.offers = vec![offer("offer-d")];
    third.total_expected = Some(4);
    third.timed_out_sources = 1;

    let backend = Arc::new(ScriptedBackend::new(
        "req-2",
        vec![
            Ok(in_progress("req-2", 1, vec![offer("offer-a")])),
            Ok(in_progress("req-2", 3, vec![offer("offer-b"), offer("offer-c")])),
            Ok(third),
        ],
    ));
    let coordinator = SearchCoordinator::with_config(backend.clone(), fast_config());

    coordinator.submit(&criteria()).await.unwrap();
    let terminal = coordinator
        .wait_for_terminal(Some(Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(terminal.sequence_number, 7);
    assert_eq!(*backend.seen_since.lock().await, vec![0, 1, 3]);

    let refs: Vec<String> = coordinator
        .offers()
        .await
        .into_iter()
        .map(|offer| offer.supplier_offer_ref)
        .collect();
    assert_eq!(
        refs,
        vec![
            "offer-a".to_string(),
            "offer-b".to_string(),
            "offer-c".to_string(),
            "offer-d".to_string(),
        ]
    );

    let snapshot = coordinator.snapshot().await.unwrap();
    assert_eq!(snapshot.offers_received, 4);
    assert_eq!(snapshot.total_expected, Some(4));
    assert_eq!(snapshot.timed_out_sources, 1);
    assert_eq!(snapshot.status, SearchStatus::Complete);
}

#[tokio::test]
async fn a_new_submission_clears_accumulated_offers() {
    let mut first_complete = complete("req-3", 2);
    first_complete.offers = vec![offer("from-first-search")];

    let backend = Arc::new(ScriptedBackend::new(
        "req-3",
        vec![Ok(first_complete), Ok(complete("req-3", 1))],
    ));
    let coordinator = SearchCoordinator::with_config(backend.clone(), fast_config());

    coordinator.submit(&criteria()).await.unwrap();
    coordinator
        .wait_for_terminal(Some(Duration::from_secs(2)))
        .await
        .unwrap();
    assert_eq!(coordinator.offers().await.len(), 1);

    coordinator.submit(&criteria()).await.unwrap();
    let terminal = coordinator
        .wait_for_terminal(Some(Duration::from_secs(2)))
        .await
        .unwrap();
    assert_eq!(terminal.sequence_number, 1);
    assert!(coordinator.offers().await.is_empty());
}
