//! Periodic backend health probe

use super::Inbound;
use crate::backend::BackendClient;
use crate::state_machine::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(1);

/// Probe the backend once and turn the outcome into an event
pub async fn probe_once<B: BackendClient + ?Sized>(backend: &B) -> Event {
    match backend.probe_status().await {
        Ok(status) => Event::ProbeSucceeded { status },
        Err(error) => Event::ProbeFailed { error },
    }
}

/// Full probe cycle as seen by the runtime: started, then the outcome.
///
/// Shared by the periodic monitor and manual retries so both have the same
/// observable effect.
pub(crate) async fn run_probe<B: BackendClient + ?Sized>(
    backend: &B,
    inbound_tx: &mpsc::Sender<Inbound>,
) {
    if inbound_tx
        .send(Inbound::Event(Event::ProbeStarted))
        .await
        .is_err()
    {
        return;
    }
    let event = probe_once(backend).await;
    let _ = inbound_tx.send(Inbound::Event(event)).await;
}

/// Spawns the periodic probe loop
pub struct HealthMonitor;

impl HealthMonitor {
    /// Probe immediately, then every `period` until the handle is shut down
    /// or dropped.
    pub fn spawn<B: BackendClient + 'static>(
        backend: Arc<B>,
        inbound_tx: mpsc::Sender<Inbound>,
        period: Duration,
    ) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = period.max(MIN_PROBE_INTERVAL);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(period_secs = period.as_secs_f64(), "Health monitor started");

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // A probe cut short by teardown never reports its outcome
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    () = run_probe(&*backend, &inbound_tx) => {}
                }
            }

            tracing::info!("Health monitor stopped");
        });

        MonitorHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owns the monitor task; stopping is guaranteed on drop
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop the loop and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
