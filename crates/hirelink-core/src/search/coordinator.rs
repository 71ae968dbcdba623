use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout_at};

use crate::backend::{AvailabilityBackend, PollRequest, PollUpdate, SubmitRequest};
use crate::models::{
    Offer, PollSnapshot, SearchCriteria, SearchError, SearchErrorKind, SearchRequest, SearchStatus,
};
use crate::search::{OfferAccumulator, SearchConfig};

#[derive(Clone, Debug)]
pub struct PollCancellationToken {
    flag: Arc<AtomicBool>,
}

impl PollCancellationToken {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// The loop's own identity. Every scheduled poll carries the epoch and request
// id that were active when it was spawned; state is only touched while both
// still match the coordinator's active search.
struct LoopIdentity {
    epoch: u64,
    request_id: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LoopDirective {
    Continue,
    Stop,
}

#[derive(Default)]
struct CoordinatorState {
    epoch: u64,
    request: Option<SearchRequest>,
    accumulator: OfferAccumulator,
    total_expected: Option<u64>,
    timed_out_sources: u32,
    last_error: Option<String>,
    loop_token: Option<PollCancellationToken>,
    loop_abort: Option<AbortHandle>,
}

#[derive(Clone)]
pub struct SearchCoordinator {
    backend: Arc<dyn AvailabilityBackend>,
    config: SearchConfig,
    inner: Arc<Mutex<CoordinatorState>>,
    terminal_notify: Arc<Notify>,
}

impl SearchCoordinator {
    pub fn new(backend: Arc<dyn AvailabilityBackend>) -> Self {
        Self::with_config(backend, SearchConfig::default())
    }

    pub fn with_config(backend: Arc<dyn AvailabilityBackend>, config: SearchConfig) -> Self {
        Self {
            backend,
            config,
            inner: Arc::new(Mutex::new(CoordinatorState::default())),
            terminal_notify: Arc::new(Notify::new()),
        }
    }

    pub async fn submit(&self, criteria: &SearchCriteria) -> Result<SearchRequest, SearchError> {
        let submit_request = SubmitRequest::from_criteria(criteria)?;

        let epoch = {
            let mut state = self.inner.lock().await;
            supersede_active_loop(&mut state);
            state.epoch += 1;
            state.request = None;
            state.accumulator.clear();
            state.total_expected = None;
            state.timed_out_sources = 0;
            state.last_error = None;
            state.epoch
        };
        self.terminal_notify.notify_waiters();

        let ack = self.backend.submit(&submit_request).await?;

        let mut state = self.inner.lock().await;
        if state.epoch != epoch {
            return Err(SearchError {
                request_id: Some(ack.request_id),
                kind: SearchErrorKind::Cancelled,
                message: "search superseded before submission completed".to_string(),
            });
        }

        let request = SearchRequest {
            request_id: ack.request_id.clone(),
            sequence_number: 0,
            status: SearchStatus::Pending,
        };
        state.request = Some(request.clone());

        let token = PollCancellationToken::new();
        state.loop_token = Some(token.clone());

        let poll_interval = self.config.effective_interval(ack.recommended_poll);
        tracing::info!(
            request_id = %ack.request_id,
            poll_interval_ms = u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
            "availability search submitted"
        );

        let handle = tokio::spawn(run_poll_loop(
            self.backend.clone(),
            self.inner.clone(),
            self.terminal_notify.clone(),
            LoopIdentity {
                epoch,
                request_id: ack.request_id,
            },
            token,
            poll_interval,
            self.config.wait_budget,
        ));
        state.loop_abort = Some(handle.abort_handle());

        Ok(request)
    }

    pub async fn stop(&self) {
        {
            let mut state = self.inner.lock().await;
            supersede_active_loop(&mut state);
            // Bumping the epoch rejects the ack of any submit still awaiting
            // the backend, so a stopped coordinator never spawns a new loop.
            state.epoch += 1;
            state.request = None;
        }
        self.terminal_notify.notify_waiters();
    }

    pub async fn active_request(&self) -> Option<SearchRequest> {
        self.inner.lock().await.request.clone()
    }

    pub async fn offers(&self) -> Vec<Offer> {
        self.inner.lock().await.accumulator.to_vec()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> Option<PollSnapshot> {
        let state = self.inner.lock().await;
        state.request.as_ref().map(|request| PollSnapshot {
            offers_received: state.accumulator.len(),
            total_expected: state.total_expected,
            timed_out_sources: state.timed_out_sources,
            status: request.status,
        })
    }

    pub async fn wait_for_terminal(
        &self,
        timeout_duration: Option<Duration>,
    ) -> Result<SearchRequest, SearchError> {
        let deadline = timeout_duration.map(|duration| Instant::now() + duration);
        let mut request_id = None;

        loop {
            let notified = self.terminal_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.inner.lock().await;
                // A missing request after at least one submission means the
                // watched search was stopped or superseded, not misuse.
                let request = state.request.clone().ok_or_else(|| {
                    if state.epoch > 0 {
                        SearchError {
                            request_id: request_id.clone(),
                            kind: SearchErrorKind::Cancelled,
                            message: "availability search was stopped or superseded".to_string(),
                        }
                    } else {
                        SearchError {
                            request_id: None,
                            kind: SearchErrorKind::Internal,
                            message: "no active availability search".to_string(),
                        }
                    }
                })?;
                if request.status.is_terminal() {
                    return Ok(request);
                }
                request_id = Some(request.request_id);
            }

            match deadline {
                Some(deadline) => {
                    if timeout_at(deadline, notified).await.is_err() {
                        return Err(SearchError {
                            request_id,
                            kind: SearchErrorKind::Timeout,
                            message: "timed out waiting for availability search to finish"
                                .to_string(),
                        });
                    }
                }
                None => notified.await,
            }
        }
    }
}

async fn run_poll_loop(
    backend: Arc<dyn AvailabilityBackend>,
    inner: Arc<Mutex<CoordinatorState>>,
    terminal_notify: Arc<Notify>,
    identity: LoopIdentity,
    token: PollCancellationToken,
    poll_interval: Duration,
    wait_budget: Duration,
) {
    // First tick resolves immediately, so the first poll fires on submission.
    // Delayed missed-tick behavior keeps at most one poll in flight even when
    // a long poll consumes most of the interval.
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if token.is_cancelled() {
            return;
        }

        let since_seq = {
            let state = inner.lock().await;
            match active_sequence(&state, &identity) {
                Some(seq) => seq,
                None => return,
            }
        };

        let outcome = backend
            .poll(&PollRequest {
                request_id: identity.request_id.clone(),
                since_seq,
                wait: wait_budget,
            })
            .await;

        let mut state = inner.lock().await;
        if token.is_cancelled() || active_sequence(&state, &identity).is_none() {
            tracing::debug!(
                request_id = %identity.request_id,
                "discarding poll response for superseded availability search"
            );
            return;
        }

        match outcome {
            Ok(update) => {
                let directive = apply_poll_update(&mut state, &identity, update);
                drop(state);
                if directive == LoopDirective::Stop {
                    terminal_notify.notify_waiters();
                    return;
                }
            }
            Err(error) => {
                mark_poll_failure(&mut state, &identity, &error);
                drop(state);
                terminal_notify.notify_waiters();
                return;
            }
        }
    }
}

fn active_sequence(state: &CoordinatorState, identity: &LoopIdentity) -> Option<u64> {
    let request = state.request.as_ref()?;
    if state.epoch != identity.epoch || request.request_id != identity.request_id {
        return None;
    }
    if request.status.is_terminal() {
        return None;
    }
    Some(request.sequence_number)
}

fn apply_poll_update(
    state: &mut CoordinatorState,
    identity: &LoopIdentity,
    update: PollUpdate,
) -> LoopDirective {
    if let Some(echoed) = update.request_id.as_deref()
        && echoed != identity.request_id
    {
        tracing::debug!(
            request_id = %identity.request_id,
            echoed = %echoed,
            "discarding poll response echoing a different request id"
        );
        return LoopDirective::Continue;
    }

    let Some(request) = state.request.as_mut() else {
        return LoopDirective::Stop;
    };

    if let Some(message) = update.error {
        request.status = SearchStatus::Error;
        tracing::warn!(
            request_id = %identity.request_id,
            message = %message,
            "availability poll reported a backend error"
        );
        state.last_error = Some(message);
        return LoopDirective::Stop;
    }
    if update.status == Some(SearchStatus::Error) {
        request.status = SearchStatus::Error;
        state.last_error = Some("backend reported search error".to_string());
        return LoopDirective::Stop;
    }

    state.accumulator.append(update.offers);
    request.sequence_number = request.sequence_number.max(update.last_seq);
    if update.total_expected.is_some() {
        state.total_expected = update.total_expected;
    }
    state.timed_out_sources = state.timed_out_sources.max(update.timed_out_sources);

    let complete = update.complete || update.status == Some(SearchStatus::Complete);
    if complete {
        request.status = SearchStatus::Complete;
        tracing::debug!(
            request_id = %identity.request_id,
            last_seq = request.sequence_number,
            offers = state.accumulator.len(),
            "availability search complete"
        );
        LoopDirective::Stop
    } else {
        request.status = SearchStatus::InProgress;
        LoopDirective::Continue
    }
}

fn mark_poll_failure(state: &mut CoordinatorState, identity: &LoopIdentity, error: &SearchError) {
    if let Some(request) = state.request.as_mut() {
        request.status = SearchStatus::Error;
    }
    state.last_error = Some(error.to_string());
    tracing::warn!(
        request_id = %identity.request_id,
        kind = ?error.kind,
        message = %error.message,
        "availability poll failed"
    );
}

fn supersede_active_loop(state: &mut CoordinatorState) {
    if let Some(token) = state.loop_token.take() {
        token.cancel();
    }
    if let Some(abort) = state.loop_abort.take() {
        abort.abort();
    }
}
