//! Async driver for a session.
//!
//! Everything happens on one task: inputs, timer ticks, viewport samples and
//! protocol completions are all funnelled through a single `select!` loop and
//! handed to the machine one at a time. Remote calls run on spawned tasks and
//! come back as bus events, so the machine never awaits.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::events::{Effect, SessionEvent};
use crate::probes::{ProbeSet, Signal, ViewportSample};
use crate::protocol::{AdvanceOutcome, GradingService, ProgressionProtocol};
use crate::question::QuestionRenderer;
use crate::reporter::ViolationReporter;
use crate::session::{Phase, SessionConfig, SessionMachine};
use crate::storage::ProbeConfig;

const TICK: Duration = Duration::from_secs(1);
const INPUT_BUFFER: usize = 64;

/// Something from outside the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Signal(Signal),
    Select(usize),
    Next,
    Acknowledge,
}

/// Receives every effect, in order.
pub trait Presenter: Send {
    fn present(&mut self, effect: &Effect);
}

impl<F> Presenter for F
where
    F: FnMut(&Effect) + Send,
{
    fn present(&mut self, effect: &Effect) {
        self(effect)
    }
}

/// Polled by the viewport heuristic.
pub trait ViewportSource: Send + Sync {
    fn sample(&self) -> Option<ViewportSample>;
}

/// Sending half of the input bus.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Input>,
}

impl SessionHandle {
    /// # Errors
    ///
    /// Returns [`CoreError::SessionClosed`] once the session has ended.
    pub async fn send(&self, input: Input) -> Result<()> {
        self.tx.send(input).await.map_err(|_| CoreError::SessionClosed)
    }

    pub async fn signal(&self, signal: Signal) -> Result<()> {
        self.send(Input::Signal(signal)).await
    }

    pub async fn select(&self, option: usize) -> Result<()> {
        self.send(Input::Select(option)).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(Input::Next).await
    }

    pub async fn acknowledge(&self) -> Result<()> {
        self.send(Input::Acknowledge).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// How a session run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub violations: u32,
    pub last_question: u32,
    pub total_questions: u32,
    /// Results destination; `None` if the input bus closed first.
    pub redirect: Option<String>,
}

enum Wake {
    Input(Option<Input>),
    Tick,
    Sample,
    Advanced(AdvanceOutcome),
}

pub struct SessionRuntime<R: QuestionRenderer, P: Presenter> {
    id: Uuid,
    machine: SessionMachine<R>,
    probes: ProbeSet,
    protocol: ProgressionProtocol,
    reporter: ViolationReporter,
    presenter: P,
    viewport: Option<Box<dyn ViewportSource>>,
    viewport_period: Duration,
    inputs: mpsc::Receiver<Input>,
    redirect: Option<String>,
}

impl<R: QuestionRenderer, P: Presenter> SessionRuntime<R, P> {
    pub fn new(
        config: SessionConfig,
        probe_config: &ProbeConfig,
        service: Arc<dyn GradingService>,
        renderer: R,
        presenter: P,
    ) -> (Self, SessionHandle) {
        let (tx, inputs) = mpsc::channel(INPUT_BUFFER);
        let runtime = Self {
            id: Uuid::new_v4(),
            machine: SessionMachine::new(config, renderer),
            probes: ProbeSet::standard(probe_config),
            protocol: ProgressionProtocol::new(service.clone()),
            reporter: ViolationReporter::new(service),
            presenter,
            viewport: None,
            viewport_period: probe_config.viewport_poll_period(),
            inputs,
            redirect: None,
        };
        (runtime, SessionHandle { tx })
    }

    /// Replace the default probe set.
    pub fn with_probes(mut self, probes: ProbeSet) -> Self {
        self.probes = probes;
        self
    }

    /// Poll `source` for the viewport heuristic.
    pub fn with_viewport_source(mut self, source: impl ViewportSource + 'static) -> Self {
        self.viewport = Some(Box::new(source));
        self
    }

    /// Run until the assessment finishes or every [`SessionHandle`] is
    /// dropped.
    pub async fn run(self, initial_fullscreen: bool) -> SessionSummary {
        let span = info_span!("session", id = %self.id);
        self.run_inner(initial_fullscreen).instrument(span).await
    }

    async fn run_inner(mut self, initial_fullscreen: bool) -> SessionSummary {
        let (done_tx, mut done_rx) = mpsc::channel::<AdvanceOutcome>(1);

        let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sampler = time::interval_at(
            Instant::now() + self.viewport_period,
            self.viewport_period,
        );
        sampler.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let sampling = self.viewport.is_some();

        info!(initial_fullscreen, "session loaded");
        let effects = self.machine.bootstrap(initial_fullscreen);
        self.dispatch(effects, &mut ticker, &done_tx);

        let mut inputs_open = true;
        while !self.machine.is_terminal() {
            let wake = tokio::select! {
                input = self.inputs.recv(), if inputs_open => Wake::Input(input),
                _ = ticker.tick() => Wake::Tick,
                _ = sampler.tick(), if sampling => Wake::Sample,
                Some(outcome) = done_rx.recv() => Wake::Advanced(outcome),
            };

            let effects = match wake {
                Wake::Input(None) => {
                    inputs_open = false;
                    if self.machine.phase() != Phase::Advancing {
                        debug!("input bus closed");
                        break;
                    }
                    // The server may already have moved on; apply its answer.
                    debug!("input bus closed, waiting for advance in flight");
                    Vec::new()
                }
                Wake::Input(Some(input)) => self.on_input(input),
                Wake::Tick => self.machine.handle(SessionEvent::TimerTick),
                Wake::Sample => match self.viewport.as_ref().and_then(|v| v.sample()) {
                    Some(sample) => self.on_signal(Signal::ViewportSampled(sample)),
                    None => Vec::new(),
                },
                Wake::Advanced(outcome) => {
                    self.machine.handle(SessionEvent::AdvanceCompleted(outcome))
                }
            };
            self.dispatch(effects, &mut ticker, &done_tx);
            if !inputs_open && self.machine.phase() != Phase::Advancing {
                break;
            }
        }

        let session = self.machine.session();
        SessionSummary {
            session_id: self.id,
            violations: session.violation_count,
            last_question: session.current_question_index,
            total_questions: session.total_questions,
            redirect: self.redirect,
        }
    }

    fn on_input(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Signal(signal) => self.on_signal(signal),
            Input::Select(option) => self
                .machine
                .handle(SessionEvent::OptionSelected { option }),
            Input::Next => self.machine.handle(SessionEvent::NextRequested),
            Input::Acknowledge => self.machine.handle(SessionEvent::WarningAcknowledged),
        }
    }

    fn on_signal(&mut self, signal: Signal) -> Vec<Effect> {
        let view = self.machine.view();
        self.probes
            .observe(&signal, &view)
            .into_iter()
            .flat_map(|event| self.machine.handle(SessionEvent::Probe(event)))
            .collect()
    }

    fn dispatch(
        &mut self,
        effects: Vec<Effect>,
        ticker: &mut Interval,
        done_tx: &mpsc::Sender<AdvanceOutcome>,
    ) {
        for effect in effects {
            match &effect {
                Effect::Violation { category, .. } => {
                    self.reporter.report(*category);
                }
                Effect::TimerArmed { .. } => ticker.reset(),
                Effect::StartAdvance {
                    question_index,
                    selection,
                    trigger,
                } => {
                    debug!(question_index, ?trigger, "starting advance");
                    let protocol = self.protocol.clone();
                    let selection = selection.clone();
                    let question_index = *question_index;
                    let done_tx = done_tx.clone();
                    tokio::spawn(
                        async move {
                            let outcome = protocol.run(question_index, selection).await;
                            let _ = done_tx.send(outcome).await;
                        }
                        .in_current_span(),
                    );
                }
                Effect::Navigate { redirect } => self.redirect = Some(redirect.clone()),
                _ => {}
            }
            self.presenter.present(&effect);
        }
    }
}
