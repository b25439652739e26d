//! # quizguard Core Library
//!
//! Proctoring and progression engine for a timed, multi-question assessment.
//! The session only proceeds in exclusive full-screen, detected attempts to
//! leave or inspect the page are counted and reported, and every question is
//! time-boxed with forced submission on expiry.
//!
//! ## Architecture
//!
//! - **Session Machine**: a synchronous state machine (`Gating -> Active ->
//!   Advancing -> Terminal`) that turns events into effects
//! - **Probes**: independent monitors that turn raw environment signals into
//!   typed probe events
//! - **Timer**: a per-question countdown ticked by its owner
//! - **Protocol**: submit, then next, against the remote grading service
//! - **Runtime**: the tokio loop that feeds the machine and executes effects
//!
//! ## Key Components
//!
//! - [`SessionMachine`]: Core session state machine
//! - [`SessionRuntime`]: Async driver and input bus
//! - [`ProbeSet`]: Violation probes
//! - [`GradingService`]: Trait for the remote authority
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod probes;
pub mod protocol;
pub mod question;
pub mod reporter;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ProtocolError, TransportError};
pub use events::{AdvanceTrigger, Effect, ProbeEvent, ProbeKind, SessionEvent, ViolationCategory};
pub use probes::{KeyChord, Probe, ProbeSet, Signal, ViewportSample};
pub use protocol::{AdvanceOutcome, GradingService, HttpGradingService, NextResponse, ProgressionProtocol};
pub use question::{HeadlessRenderer, QuestionKind, QuestionPayload, QuestionRenderer, SelectionSet};
pub use reporter::ViolationReporter;
pub use runtime::{Input, Presenter, SessionHandle, SessionRuntime, SessionSummary, ViewportSource};
pub use session::{Phase, Session, SessionConfig, SessionMachine, SessionView};
pub use storage::{Config, ProbeConfig, ServiceConfig, SessionSettings};
pub use timer::{QuestionTimer, Urgency};
