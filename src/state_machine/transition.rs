//! Pure state transition function
//!
//! Given the same state and event this always produces the same result and
//! performs no I/O. The runtime executes the returned effects.

use super::{Effect, Event, SessionContext, SessionState, TurnState};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
///
/// Rejections leave state and transcript untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Input is empty")]
    EmptyInput,
    #[error("A reply is still pending, wait for it before sending another message")]
    Busy,
    #[error("Backend is not connected")]
    Disconnected,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state.turn, event) {
        // ============================================================
        // User Submit
        // ============================================================

        (_, Event::UserSubmit { text, .. }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyInput)
        }

        (TurnState::AwaitingResponse { .. }, Event::UserSubmit { .. }) => {
            Err(TransitionError::Busy)
        }

        (TurnState::Idle, Event::UserSubmit { .. }) if state.health.disconnected => {
            Err(TransitionError::Disconnected)
        }

        // Idle + UserSubmit -> AwaitingResponse
        (TurnState::Idle, Event::UserSubmit { text, message_id }) => {
            let mut next = *state;
            next.turn = TurnState::AwaitingResponse {
                user_message: message_id,
            };
            next.health.disconnected = false;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::append_user(message_id, text.clone()))
                .with_effect(Effect::Publish)
                .with_effect(Effect::send_chat(text)))
        }

        // ============================================================
        // Chat Outcome
        // ============================================================

        // AwaitingResponse + ChatReplied -> Idle
        (TurnState::AwaitingResponse { .. }, Event::ChatReplied { reply }) => {
            let mut next = *state;
            next.turn = TurnState::Idle;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::AppendAssistantMessage { reply })
                .with_effect(Effect::Publish))
        }

        // AwaitingResponse + ChatFailed -> Idle, disconnected
        (TurnState::AwaitingResponse { .. }, Event::ChatFailed { .. }) => {
            let mut next = *state;
            next.turn = TurnState::Idle;
            next.health.disconnected = true;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::AppendNotice {
                    text: context.failure_notice.clone(),
                })
                .with_effect(Effect::Publish))
        }

        (TurnState::Idle, event @ (Event::ChatReplied { .. } | Event::ChatFailed { .. })) => {
            Err(TransitionError::InvalidTransition(format!(
                "{} while idle",
                event.name()
            )))
        }

        // ============================================================
        // Health (independent of the turn state)
        // ============================================================

        (_, Event::RetryProbe) => Ok(TransitionResult::new(*state).with_effect(Effect::Probe)),

        (_, Event::ProbeStarted) => {
            let mut next = *state;
            next.health.probes_in_flight = next.health.probes_in_flight.saturating_add(1);
            Ok(TransitionResult::new(next).with_effect(Effect::Publish))
        }

        (_, Event::ProbeSucceeded { status }) => {
            let mut next = *state;
            next.health.model_status = Some(status);
            next.health.disconnected = false;
            next.health.probes_in_flight = next.health.probes_in_flight.saturating_sub(1);
            Ok(TransitionResult::new(next).with_effect(Effect::Publish))
        }

        (_, Event::ProbeFailed { .. }) => {
            let mut next = *state;
            next.health.disconnected = true;
            next.health.probes_in_flight = next.health.probes_in_flight.saturating_sub(1);
            Ok(TransitionResult::new(next).with_effect(Effect::Publish))
        }
    }
}
