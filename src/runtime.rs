//! Runtime for a single chat session
//!
//! One task owns the transcript and the session state. Everything else talks
//! to it through a channel and observes it through a `watch` snapshot:
//!
//! - the UI submits turns and asks for manual probes via [`SessionHandle`]
//! - the health monitor feeds periodic probe outcomes in
//! - background chat calls report their outcome back

mod executor;
mod monitor;

#[cfg(test)]
pub mod testing;

use executor::SessionRuntime;
use monitor::{HealthMonitor, MonitorHandle};

use crate::backend::{BackendClient, ModelStatus};
use crate::conversation::Message;
use crate::state_machine::{Event, HealthState, SessionContext, SessionState, TransitionError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const INBOUND_CAPACITY: usize = 32;

/// Input to the session runtime
#[derive(Debug)]
pub enum Inbound {
    /// A new user turn; the runtime allocates its message id and reports
    /// acceptance or the rejection reason.
    Submit {
        text: String,
        ack: oneshot::Sender<Result<(), TransitionError>>,
    },
    Event(Event),
}

/// Read-only view of the session published after every state change
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub messages: Arc<[Message]>,
    pub state: SessionState,
}

impl SessionSnapshot {
    pub fn empty() -> Self {
        Self {
            messages: Arc::from(Vec::new()),
            state: SessionState::default(),
        }
    }

    pub fn health(&self) -> HealthState {
        self.state.health.state()
    }

    #[allow(dead_code)] // State query utility
    pub fn model_status(&self) -> Option<ModelStatus> {
        self.state.health.model_status
    }

    pub fn is_busy(&self) -> bool {
        self.state.turn.is_busy()
    }

    pub fn can_submit(&self) -> bool {
        self.state.can_submit()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Why a submit did not start a turn
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session has shut down")]
    SessionClosed,
}

/// Handle to interact with a running session
pub struct SessionHandle {
    inbound_tx: mpsc::Sender<Inbound>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    monitor: Option<MonitorHandle>,
    shutdown: CancellationToken,
    runtime_task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start the runtime and the health monitor. The first probe runs
    /// immediately.
    pub fn start<B>(backend: B, probe_interval: Duration) -> Self
    where
        B: BackendClient + 'static,
    {
        let backend = Arc::new(backend);
        let context = SessionContext::new(backend.base_url());

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::empty());
        let shutdown = CancellationToken::new();

        let runtime = SessionRuntime::new(
            context,
            backend.clone(),
            inbound_rx,
            inbound_tx.clone(),
            snapshot_tx,
            shutdown.clone(),
        );
        let runtime_task = tokio::spawn(runtime.run());

        let monitor = HealthMonitor::spawn(backend, inbound_tx.clone(), probe_interval);

        Self {
            inbound_tx,
            snapshot_rx,
            monitor: Some(monitor),
            shutdown,
            runtime_task: Some(runtime_task),
        }
    }

    /// Submit a user turn. Resolves once the runtime has accepted or
    /// rejected it; the reply itself arrives later through the snapshot.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SubmitError> {
        let (ack, ack_rx) = oneshot::channel();
        self.inbound_tx
            .send(Inbound::Submit {
                text: text.into(),
                ack,
            })
            .await
            .map_err(|_| SubmitError::SessionClosed)?;

        ack_rx.await.map_err(|_| SubmitError::SessionClosed)??;
        Ok(())
    }

    /// Probe the backend now, outside the periodic schedule
    pub async fn retry_probe(&self) -> Result<(), SubmitError> {
        self.inbound_tx
            .send(Inbound::Event(Event::RetryProbe))
            .await
            .map_err(|_| SubmitError::SessionClosed)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop the health monitor first, then the runtime. No probe outcome is
    /// applied once this returns.
    pub async fn shutdown(mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown().await;
        }

        self.shutdown.cancel();
        if let Some(task) = self.runtime_task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Session runtime ended abnormally");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // MonitorHandle stops itself on drop
        self.monitor.take();
        self.shutdown.cancel();
    }
}
