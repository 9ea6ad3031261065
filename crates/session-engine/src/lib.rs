//! Session state management for the bugdrill client.
//!
//! This crate provides:
//! - An explicit FSM for the logical session phase
//! - A [`SessionState`] snapshot broadcast over a watch channel so the UI
//!   layer reacts to transitions instead of polling
//! - A [`SessionManager`] exposing `login`, `signup`, `logout`, and
//!   `check_auth` as the only mutators of "who is the current user"

mod error;
mod fsm;
mod manager;
mod state;

pub use error::{SessionError, SessionResult};
pub use fsm::session_machine;
pub use fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase};
pub use manager::{CheckAuthPolicy, SessionManager};
pub use state::SessionState;
