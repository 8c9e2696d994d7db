//! Session runtime executor

use super::monitor::run_probe;
use super::{Inbound, SessionSnapshot};

use crate::backend::BackendClient;
use crate::conversation::{ConversationStore, Message};
use crate::state_machine::{
    transition, Effect, Event, SessionContext, SessionState, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Owns all mutable session state; runs on a single task
pub struct SessionRuntime<B>
where
    B: BackendClient + 'static,
{
    context: SessionContext,
    state: SessionState,
    store: ConversationStore,
    backend: Arc<B>,
    inbound_rx: mpsc::Receiver<Inbound>,
    /// Handed to background tasks so they can report back
    inbound_tx: mpsc::Sender<Inbound>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    shutdown: CancellationToken,
}

impl<B> SessionRuntime<B>
where
    B: BackendClient + 'static,
{
    pub fn new(
        context: SessionContext,
        backend: Arc<B>,
        inbound_rx: mpsc::Receiver<Inbound>,
        inbound_tx: mpsc::Sender<Inbound>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            context,
            state: SessionState::default(),
            store: ConversationStore::new(),
            backend,
            inbound_rx,
            inbound_tx,
            snapshot_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(backend = %self.backend.base_url(), "Starting session runtime");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                Some(inbound) = self.inbound_rx.recv() => {
                    self.handle_inbound(inbound);
                }

                else => break,
            }
        }

        tracing::info!(messages = self.store.len(), "Session runtime stopped");
    }

    fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Submit { text, ack } => self.handle_submit(text, ack),
            Inbound::Event(event) => {
                if let Err(e) = self.process_event(event) {
                    tracing::warn!(error = %e, "Dropped event");
                }
            }
        }
    }

    fn handle_submit(&mut self, text: String, ack: oneshot::Sender<Result<(), TransitionError>>) {
        let message_id = self.store.next_id();
        let result = self.process_event(Event::UserSubmit { text, message_id });

        if let Err(e) = &result {
            tracing::debug!(error = %e, "Submit rejected");
        }
        // Caller may have given up waiting; the outcome stands either way
        let _ = ack.send(result);
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();
        if let Event::ChatFailed { error } | Event::ProbeFailed { error } = &event {
            tracing::debug!(
                event = event_name,
                kind = ?error.kind,
                error = %error,
                "Backend unreachable"
            );
        }

        // Pure state transition
        let result = transition(&self.state, &self.context, event)?;

        if result.new_state != self.state {
            tracing::debug!(
                event = event_name,
                turn = ?result.new_state.turn,
                health = ?result.new_state.health.state(),
                "State transition"
            );
        }
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    /// Execute an effect. Network effects spawn background tasks that report
    /// back through the inbound channel.
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendUserMessage { id, text } => {
                self.store.append(Message::user(id, text));
            }

            Effect::AppendAssistantMessage { reply } => {
                let id = self.store.next_id();
                self.store.append(Message::assistant(id, reply));
            }

            Effect::AppendNotice { text } => {
                let id = self.store.next_id();
                self.store.append(Message::notice(id, text));
            }

            Effect::SendChatTurn { text } => {
                let backend = self.backend.clone();
                let inbound_tx = self.inbound_tx.clone();

                tokio::spawn(async move {
                    tracing::info!("Sending chat turn (background)");
                    let event = match backend.send_chat_turn(&text).await {
                        Ok(reply) => Event::ChatReplied { reply },
                        Err(error) => Event::ChatFailed { error },
                    };
                    let _ = inbound_tx.send(Inbound::Event(event)).await;
                });
            }

            Effect::Probe => {
                let backend = self.backend.clone();
                let inbound_tx = self.inbound_tx.clone();
                let shutdown = self.shutdown.clone();

                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        () = shutdown.cancelled() => {}
                        () = run_probe(&*backend, &inbound_tx) => {}
                    }
                });
            }

            Effect::Publish => {
                self.snapshot_tx.send_replace(SessionSnapshot {
                    messages: self.store.snapshot(),
                    state: self.state,
                });
            }
        }
    }
}
