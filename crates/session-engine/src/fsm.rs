//! Session state machine using rust-fsm.
//!
//! The machine tracks which of the three logical session phases currently
//! holds; the error message that turns `Unauthenticated` into the error
//! sub-state travels on [`crate::SessionState`], not here.
//!
//! ## State Diagram
//!
//! ```text
//!                ActionStarted
//!      ┌────────────────────────────────┐
//!      │                                ▼
//! ┌────┴────────────┐          ┌─────────────────┐
//! │ Unauthenticated │◄─────────│  Authenticating │◄──┐ ActionStarted
//! └─────────────────┘ Auth-    │    (initial)    │───┘ (re-entry)
//!                     Cleared  └────────┬────────┘
//!                                       │ AuthEstablished
//!      ┌─────────────────┐              │
//!      │  Authenticated  │◄─────────────┘
//!      └────────┬────────┘
//!               │ ActionStarted
//!               ▼
//!          Authenticating
//! ```
//!
//! The initial state is `Authenticating`: the process boots loading, pending
//! the first `check_auth`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Authenticating)

    Unauthenticated => {
        ActionStarted => Authenticating
    },
    Authenticating => {
        // Re-entry: check_auth at boot starts from the initial loading state
        ActionStarted => Authenticating,
        AuthEstablished => Authenticated,
        AuthCleared => Unauthenticated
    },
    Authenticated => {
        ActionStarted => Authenticating
    }
}

// Re-export the generated types with clearer names
pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Logical session phase for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No confirmed identity.
    Unauthenticated,
    /// A public action is in flight.
    Authenticating,
    /// Identity confirmed; credentials stored.
    Authenticated,
}

impl SessionPhase {
    /// Returns true if the user has a confirmed session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    /// Returns true if an action is still in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionPhase::Authenticating)
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unauthenticated => SessionPhase::Unauthenticated,
            SessionMachineState::Authenticating => SessionPhase::Authenticating,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
        }
    }
}
