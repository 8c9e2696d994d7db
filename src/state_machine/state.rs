//! Session state types

use crate::backend::ModelStatus;
use crate::conversation::MessageId;

// ============================================================================
// Turn State
// ============================================================================

/// Single-flight turn state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Ready for user input
    #[default]
    Idle,

    /// Chat request in flight for the given user message
    AwaitingResponse { user_message: MessageId },
}

impl TurnState {
    pub fn is_busy(&self) -> bool {
        matches!(self, TurnState::AwaitingResponse { .. })
    }
}

// ============================================================================
// Health
// ============================================================================

/// Backend health as last observed
///
/// `model_status` and `disconnected` are independent: a failed probe flips
/// `disconnected` but keeps the last known status around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthSignal {
    /// `None` until the first successful probe
    pub model_status: Option<ModelStatus>,
    /// Last probe or chat call failed to reach the backend
    pub disconnected: bool,
    /// Probes started but not yet finished
    pub probes_in_flight: u32,
}

impl HealthSignal {
    /// Derived display state
    pub fn state(&self) -> HealthState {
        if self.disconnected {
            return HealthState::Disconnected;
        }
        match self.model_status {
            None if self.probes_in_flight > 0 => HealthState::Checking,
            None => HealthState::Unknown,
            Some(status) if status.is_ready() => HealthState::ConnectedReady,
            Some(_) => HealthState::ConnectedLoading,
        }
    }
}

/// What the status bar shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// No probe has run yet
    Unknown,
    /// First probe in flight, nothing known yet
    Checking,
    ConnectedReady,
    /// Reachable, models still loading
    ConnectedLoading,
    Disconnected,
}

// ============================================================================
// Session State
// ============================================================================

/// Everything the transition function reasons about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub turn: TurnState,
    pub health: HealthSignal,
}

impl SessionState {
    /// Whether a new turn would be accepted right now (ignoring input text)
    pub fn can_submit(&self) -> bool {
        !self.turn.is_busy() && !self.health.disconnected
    }
}

/// Immutable configuration for a session
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Synthesized assistant text shown when a chat turn fails
    pub failure_notice: String,
}

impl SessionContext {
    pub fn new(backend_base_url: &str) -> Self {
        Self {
            failure_notice: format!(
                "Sorry, I encountered an error. \
                 Please make sure the backend server is running on {backend_base_url}"
            ),
        }
    }
}
