//! Session state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Gating -> Active <-> Advancing -> Terminal
//! ```
//!
//! `Active` carries an overlay flag for the "left full-screen" sub-state;
//! `Advancing` is the re-entrancy guard for the progression protocol.

mod machine;
mod state;

pub use machine::SessionMachine;
pub use state::{Phase, Session, SessionConfig, SessionView};
