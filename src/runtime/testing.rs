//! Mock implementations for testing
//!
//! These mocks drive a full session without a real backend.

use super::{SessionHandle, SessionSnapshot};
use crate::backend::{BackendClient, ChatReply, ConnectivityError, ModelStatus};
use crate::config::DEFAULT_PROBE_INTERVAL_SECS;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const READY: ModelStatus = ModelStatus {
    sentence_model_loaded: true,
    chat_model_loaded: true,
    chat_pipeline_loaded: true,
};

pub const LOADING: ModelStatus = ModelStatus {
    sentence_model_loaded: true,
    chat_model_loaded: false,
    chat_pipeline_loaded: false,
};

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued outcomes
pub struct MockBackend {
    base_url: String,
    statuses: Mutex<VecDeque<Result<ModelStatus, ConnectivityError>>>,
    /// Answer once the status queue is empty; `None` means unreachable
    fallback_status: Mutex<Option<ModelStatus>>,
    replies: Mutex<VecDeque<Result<ChatReply, ConnectivityError>>>,
    /// Record of all chat texts sent
    pub chat_requests: Mutex<Vec<String>>,
    probes: AtomicUsize,
}

impl MockBackend {
    /// Backend that never answers a probe
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            statuses: Mutex::new(VecDeque::new()),
            fallback_status: Mutex::new(None),
            replies: Mutex::new(VecDeque::new()),
            chat_requests: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
        }
    }

    /// Backend whose probes report fully loaded models
    pub fn ready() -> Self {
        let backend = Self::new();
        backend.set_status(Some(READY));
        backend
    }

    pub fn set_status(&self, status: Option<ModelStatus>) {
        *self.fallback_status.lock().unwrap() = status;
    }

    pub fn queue_probe_error(&self, error: ConnectivityError) {
        self.statuses.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_chat_error(&self, error: ConnectivityError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_chat_requests(&self) -> Vec<String> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<ChatReply, ConnectivityError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ConnectivityError::connect("No mock reply queued")))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn probe_status(&self) -> Result<ModelStatus, ConnectivityError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(outcome) = self.statuses.lock().unwrap().pop_front() {
            return outcome;
        }
        self.fallback_status
            .lock()
            .unwrap()
            .ok_or_else(|| ConnectivityError::connect("Connection refused"))
    }

    async fn send_chat_turn(&self, text: &str) -> Result<ChatReply, ConnectivityError> {
        self.chat_requests.lock().unwrap().push(text.to_string());
        self.next_reply()
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ============================================================================
// Delayed Mock Backend (for in-flight turn testing)
// ============================================================================

/// Mock backend whose chat replies take `delay`; probes stay instant
pub struct DelayedMockBackend {
    inner: MockBackend,
    delay: Duration,
    /// Notified when a chat request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::ready(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_chat_requests(&self) -> Vec<String> {
        self.inner.recorded_chat_requests()
    }

    pub fn probe_count(&self) -> usize {
        self.inner.probe_count()
    }
}

#[async_trait]
impl BackendClient for DelayedMockBackend {
    async fn probe_status(&self) -> Result<ModelStatus, ConnectivityError> {
        self.inner.probe_status().await
    }

    async fn send_chat_turn(&self, text: &str) -> Result<ChatReply, ConnectivityError> {
        self.inner.chat_requests.lock().unwrap().push(text.to_string());
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }

    fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}

// ============================================================================
// Test Session Builder
// ============================================================================

/// A running session plus the backend it talks to
pub struct TestSession<B: BackendClient + 'static> {
    pub handle: SessionHandle,
    pub backend: Arc<B>,
}

impl TestSession<MockBackend> {
    /// Session against an instant, fully loaded mock backend
    pub fn new() -> TestSessionBuilder<MockBackend> {
        TestSessionBuilder::new(MockBackend::ready())
    }
}

pub struct TestSessionBuilder<B> {
    backend: B,
    probe_interval: Duration,
}

impl<B: BackendClient + 'static> TestSessionBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            probe_interval: Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS),
        }
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn build(self) -> TestSession<B> {
        let backend = Arc::new(self.backend);
        let handle = SessionHandle::start(backend.clone(), self.probe_interval);
        TestSession { handle, backend }
    }
}

impl<B: BackendClient + 'static> TestSession<B> {
    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        timeout: Duration,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> bool {
        let mut rx = self.handle.subscribe();
        let satisfied = matches!(
            tokio::time::timeout(timeout, rx.wait_for(predicate)).await,
            Ok(Ok(_))
        );
        satisfied
    }

    /// Wait until no probe is in flight and at least one has resolved
    pub async fn wait_for_probe_settled(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |s| {
            let health = &s.state.health;
            health.probes_in_flight == 0 && (health.model_status.is_some() || health.disconnected)
        })
        .await
    }

    /// Wait until the session is idle with `count` transcript entries
    pub async fn wait_for_idle_with(&self, count: usize, timeout: Duration) -> bool {
        self.wait_for(timeout, |s| !s.is_busy() && s.messages.len() == count)
            .await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.handle.subscribe().borrow().clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Origin;
    use crate::runtime::SubmitError;
    use crate::state_machine::{HealthState, TransitionError};

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_successful_turn_appends_user_then_assistant() {
        let session = TestSession::new().build();
        session.backend.queue_reply(
            ChatReply::text("Found the trades you asked about.").with_stock("0148.HK", 125_000.50),
        );
        assert!(session.wait_for_probe_settled(WAIT).await);

        session.handle.submit("  show 0148.HK trades  ").await.unwrap();
        assert!(session.wait_for_idle_with(2, WAIT).await);

        let snapshot = session.snapshot();
        let user = &snapshot.messages[0];
        let assistant = &snapshot.messages[1];

        assert_eq!(user.origin, Origin::User);
        assert_eq!(user.text, "  show 0148.HK trades  ");
        assert_eq!(assistant.origin, Origin::Assistant);
        assert_eq!(assistant.text, "Found the trades you asked about.");
        assert_eq!(assistant.stock_code.as_deref(), Some("0148.HK"));
        assert!((assistant.notional_amount.unwrap() - 125_000.50).abs() < f64::EPSILON);
        assert!(user.id < assistant.id);
        assert!(user.created_at <= assistant.created_at);

        assert_eq!(
            session.backend.recorded_chat_requests(),
            vec!["  show 0148.HK trades  ".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_turn_appends_notice_and_disconnects() {
        let session = TestSession::new().build();
        session
            .backend
            .queue_chat_error(ConnectivityError::connect("Connection refused"));
        assert!(session.wait_for_probe_settled(WAIT).await);

        session.handle.submit("hello").await.unwrap();
        assert!(session.wait_for_idle_with(2, WAIT).await);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.messages[1].origin, Origin::Assistant);
        assert_eq!(
            snapshot.messages[1].text,
            "Sorry, I encountered an error. \
             Please make sure the backend server is running on http://localhost:8000"
        );
        assert!(snapshot.messages[1].stock_code.is_none());
        assert_eq!(snapshot.health(), HealthState::Disconnected);
        // The last known model status survives the failure
        assert_eq!(snapshot.model_status(), Some(READY));
    }

    #[tokio::test]
    async fn test_blank_submit_is_rejected_without_a_call() {
        let session = TestSession::new().build();
        assert!(session.wait_for_probe_settled(WAIT).await);

        for text in ["", "   ", "\n\t"] {
            let err = session.handle.submit(text).await.unwrap_err();
            assert_eq!(err, SubmitError::Rejected(TransitionError::EmptyInput));
        }

        let snapshot = session.snapshot();
        assert!(snapshot.is_empty());
        // Validation failures say nothing about connectivity
        assert_ne!(snapshot.health(), HealthState::Disconnected);
        assert!(session.backend.recorded_chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_rejected() {
        let backend = DelayedMockBackend::new(Duration::from_millis(200));
        backend.queue_reply(ChatReply::text("first answer"));
        let session = TestSessionBuilder::new(backend).build();
        assert!(session.wait_for_probe_settled(WAIT).await);

        let started = session.backend.request_started.clone();
        let notified = started.notified();
        session.handle.submit("first").await.unwrap();
        notified.await;

        let err = session.handle.submit("second").await.unwrap_err();
        assert_eq!(err, SubmitError::Rejected(TransitionError::Busy));

        // Rejected submit leaves the transcript alone
        let snapshot = session.snapshot();
        assert!(snapshot.is_busy());
        assert!(!snapshot.can_submit());
        assert_eq!(snapshot.messages.len(), 1);

        assert!(session.wait_for_idle_with(2, WAIT).await);
        assert_eq!(
            session.backend.recorded_chat_requests(),
            vec!["first".to_string()]
        );
    }

    #[tokio::test]
    async fn test_submit_while_disconnected_is_rejected() {
        let session = TestSessionBuilder::new(MockBackend::new()).build();
        assert!(session.wait_for_probe_settled(WAIT).await);
        assert_eq!(session.snapshot().health(), HealthState::Disconnected);

        let err = session.handle.submit("anyone there?").await.unwrap_err();
        assert_eq!(err, SubmitError::Rejected(TransitionError::Disconnected));
        assert!(session.snapshot().is_empty());
        assert!(session.backend.recorded_chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_retry_probe_reconnects() {
        let backend = MockBackend::new();
        backend.queue_probe_error(ConnectivityError::timeout("timed out"));
        let session = TestSessionBuilder::new(backend).build();

        assert!(session.wait_for_probe_settled(WAIT).await);
        assert_eq!(session.snapshot().health(), HealthState::Disconnected);

        session.backend.set_status(Some(LOADING));
        session.handle.retry_probe().await.unwrap();
        assert!(
            session
                .wait_for(WAIT, |s| s.health() == HealthState::ConnectedLoading)
                .await
        );

        // Same resulting health as a session whose periodic probe saw LOADING
        let periodic = MockBackend::new();
        periodic.set_status(Some(LOADING));
        let other = TestSessionBuilder::new(periodic).build();
        assert!(other.wait_for_probe_settled(WAIT).await);

        assert_eq!(session.snapshot().state.health, other.snapshot().state.health);
        assert!(session.snapshot().can_submit());
    }

    #[tokio::test]
    async fn test_retry_probe_twice_is_harmless() {
        let session = TestSession::new().build();
        assert!(session.wait_for_probe_settled(WAIT).await);
        let before = session.snapshot();

        session.handle.retry_probe().await.unwrap();
        session.handle.retry_probe().await.unwrap();

        let backend = session.backend.clone();
        assert!(
            session
                .wait_for(WAIT, |s| backend.probe_count() >= 3
                    && s.state.health.probes_in_flight == 0)
                .await
        );

        let after = session.snapshot();
        assert_eq!(after.state, before.state);
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_probe_mid_turn_does_not_disturb_the_turn() {
        let backend = DelayedMockBackend::new(Duration::from_millis(200));
        backend.queue_reply(ChatReply::text("late but fine"));
        let session = TestSessionBuilder::new(backend).build();
        assert!(session.wait_for_probe_settled(WAIT).await);

        let started = session.backend.request_started.clone();
        let notified = started.notified();
        session.handle.submit("question").await.unwrap();
        notified.await;

        session.handle.retry_probe().await.unwrap();
        let backend = session.backend.clone();
        assert!(
            session
                .wait_for(WAIT, |s| backend.probe_count() >= 2
                    && s.state.health.probes_in_flight == 0)
                .await
        );
        assert!(session.snapshot().is_busy());

        assert!(session.wait_for_idle_with(2, WAIT).await);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.messages[1].text, "late but fine");
        assert_eq!(snapshot.health(), HealthState::ConnectedReady);
    }

    #[tokio::test]
    async fn test_duplicate_texts_are_separate_turns() {
        let session = TestSession::new().build();
        session.backend.queue_reply(ChatReply::text("one"));
        session.backend.queue_reply(ChatReply::text("two"));
        assert!(session.wait_for_probe_settled(WAIT).await);

        session.handle.submit("same").await.unwrap();
        assert!(session.wait_for_idle_with(2, WAIT).await);
        session.handle.submit("same").await.unwrap();
        assert!(session.wait_for_idle_with(4, WAIT).await);

        let snapshot = session.snapshot();
        let origins: Vec<_> = snapshot.messages.iter().map(|m| m.origin).collect();
        assert_eq!(
            origins,
            vec![Origin::User, Origin::Assistant, Origin::User, Origin::Assistant]
        );
        assert!(snapshot.messages.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(snapshot.messages[3].text, "two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_probes_on_interval_and_stops_on_shutdown() {
        let session = TestSession::new()
            .probe_interval(Duration::from_secs(30))
            .build();

        // First probe runs immediately
        assert!(session.wait_for_probe_settled(WAIT).await);
        assert_eq!(session.backend.probe_count(), 1);
        assert_eq!(session.snapshot().health(), HealthState::ConnectedReady);

        let backend = session.backend.clone();
        assert!(
            session
                .wait_for(Duration::from_secs(31), |s| backend.probe_count() >= 2
                    && s.state.health.probes_in_flight == 0)
                .await
        );

        let TestSession { handle, backend } = session;
        handle.shutdown().await;
        let probes = backend.probe_count();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.probe_count(), probes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_handle_stops_the_monitor() {
        let session = TestSession::new()
            .probe_interval(Duration::from_secs(30))
            .build();
        assert!(session.wait_for_probe_settled(WAIT).await);

        let TestSession { handle, backend } = session;
        drop(handle);
        let probes = backend.probe_count();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.probe_count(), probes);
    }

    #[tokio::test]
    async fn test_shutdown_closes_snapshot_channel() {
        let session = TestSession::new().build();
        let rx = session.handle.subscribe();
        session.handle.shutdown().await;

        // Runtime is gone, so the snapshot channel is closed
        assert!(rx.has_changed().is_err());
    }

    #[tokio::test]
    async fn test_mock_backend_queues() {
        let mock = MockBackend::new();
        mock.queue_probe_error(ConnectivityError::status(503, "unavailable"));
        mock.set_status(Some(LOADING));

        assert!(mock.probe_status().await.is_err());
        assert_eq!(mock.probe_status().await.unwrap(), LOADING);
        assert!(mock.send_chat_turn("hi").await.is_err());
        assert_eq!(mock.probe_count(), 2);
        assert_eq!(mock.recorded_chat_requests(), vec!["hi".to_string()]);
    }
}
