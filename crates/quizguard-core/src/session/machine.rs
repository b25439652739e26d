//! The session state machine.
//!
//! Pure and synchronous: [`SessionMachine::handle`] takes one event and
//! returns the effects it caused. I/O (reports, remote calls, drawing) is the
//! runtime's job, so every ordering rule here holds in a headless test.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::state::{Phase, Session, SessionConfig, SessionView};
use crate::events::{
    AdvanceTrigger, Effect, ProbeEvent, ProbeKind, SessionEvent, ViolationCategory,
};
use crate::protocol::AdvanceOutcome;
use crate::question::{QuestionPayload, QuestionRenderer, SelectionSet};
use crate::timer::{QuestionTimer, TimerTick};

const NEXT_LABEL: &str = "Next Question";
const FINISH_LABEL: &str = "Finish Quiz";
const LOADING_LABEL: &str = "Loading...";

pub struct SessionMachine<R: QuestionRenderer> {
    session: Session,
    phase: Phase,
    timer: QuestionTimer,
    renderer: R,
    overlay_shown: bool,
    tab_warning_shown: bool,
}

impl<R: QuestionRenderer> SessionMachine<R> {
    /// Create a machine in `Gating`, with the blocking overlay asserted.
    pub fn new(config: SessionConfig, mut renderer: R) -> Self {
        if let Some(question) = config.initial_question.as_ref() {
            renderer.render(question);
        }
        let mut session = Session::default();
        if let Some(question) = renderer.current() {
            session.adopt(question);
        }
        Self {
            session,
            phase: Phase::Gating,
            timer: QuestionTimer::new(config.time_limit_secs),
            renderer,
            overlay_shown: true,
            tab_warning_shown: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            started: self.session.started,
            fullscreen_active: self.session.fullscreen_active,
            terminal: self.phase == Phase::Terminal,
        }
    }

    pub fn timer(&self) -> &QuestionTimer {
        &self.timer
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn selection(&self) -> SelectionSet {
        self.renderer.selection()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }

    pub fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }

    pub fn tab_warning_shown(&self) -> bool {
        self.tab_warning_shown
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Effects for page load. Starts immediately if the page is already in
    /// full-screen, otherwise shows the gate.
    pub fn bootstrap(&mut self, fullscreen_active: bool) -> Vec<Effect> {
        let mut fx = Vec::new();
        if let Some(question) = self.renderer.current() {
            fx.push(rendered(question));
        }
        if fullscreen_active {
            self.on_fullscreen(true, &mut fx);
        } else {
            fx.push(Effect::OverlayShown);
        }
        fx
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        if self.phase == Phase::Terminal {
            debug!(?event, "session terminal, event ignored");
            return Vec::new();
        }

        let mut fx = Vec::new();
        match event {
            SessionEvent::Probe(ProbeEvent::Violation { probe, category }) => {
                self.count_violation(probe, category, &mut fx);
            }
            SessionEvent::Probe(ProbeEvent::FullscreenChanged { active }) => {
                self.on_fullscreen(active, &mut fx);
            }
            SessionEvent::TimerTick => self.on_tick(&mut fx),
            SessionEvent::OptionSelected { option } => {
                if self.accepts_input() {
                    self.renderer.select(option);
                } else {
                    debug!(option, phase = ?self.phase, "selection ignored");
                }
            }
            SessionEvent::NextRequested => {
                if self.accepts_input() {
                    self.begin_advance(AdvanceTrigger::User, &mut fx);
                } else {
                    debug!(phase = ?self.phase, "next ignored");
                }
            }
            SessionEvent::WarningAcknowledged => {
                if self.tab_warning_shown {
                    self.tab_warning_shown = false;
                    fx.push(Effect::TabWarningHidden);
                    if !self.session.fullscreen_active {
                        fx.push(Effect::FullscreenRequested);
                    }
                }
            }
            SessionEvent::AdvanceCompleted(outcome) => self.complete_advance(outcome, &mut fx),
        }
        fx
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn accepts_input(&self) -> bool {
        self.phase == Phase::Active && !self.overlay_shown && !self.tab_warning_shown
    }

    fn on_fullscreen(&mut self, active: bool, fx: &mut Vec<Effect>) {
        let was = self.session.fullscreen_active;
        self.session.fullscreen_active = active;

        if active {
            if self.overlay_shown {
                self.overlay_shown = false;
                fx.push(Effect::OverlayHidden);
            }
            if self.phase == Phase::Gating {
                self.start(fx);
            }
        } else if was && self.session.started {
            self.count_violation(ProbeKind::Fullscreen, ViolationCategory::FullscreenExit, fx);
            if !self.overlay_shown {
                self.overlay_shown = true;
                fx.push(Effect::OverlayShown);
            }
        }
    }

    fn start(&mut self, fx: &mut Vec<Effect>) {
        self.session.started = true;
        self.phase = Phase::Active;
        info!(
            time_limit_secs = self.timer.limit_secs(),
            question = self.session.current_question_index,
            "session started"
        );
        fx.push(Effect::SessionStarted { at: Utc::now() });
        self.arm_timer(fx);
        fx.push(self.next_affordance());
    }

    fn count_violation(
        &mut self,
        probe: ProbeKind,
        category: ViolationCategory,
        fx: &mut Vec<Effect>,
    ) {
        self.session.violation_count = self.session.violation_count.saturating_add(1);
        info!(?probe, %category, total = self.session.violation_count, "violation detected");
        fx.push(Effect::Violation {
            category,
            probe,
            total: self.session.violation_count,
            at: Utc::now(),
        });
        if probe.raises_tab_warning() {
            self.tab_warning_shown = true;
            fx.push(Effect::TabWarningShown {
                violations: self.session.violation_count,
            });
        }
    }

    fn on_tick(&mut self, fx: &mut Vec<Effect>) {
        match self.timer.tick() {
            None => {}
            Some(TimerTick::Counting { remaining_secs }) => fx.push(Effect::TimerUpdated {
                remaining_secs,
                urgency: self.timer.urgency(),
            }),
            Some(TimerTick::Expired) => {
                fx.push(Effect::TimerUpdated {
                    remaining_secs: 0,
                    urgency: self.timer.urgency(),
                });
                fx.push(Effect::TimerExpired);
                info!(question = self.session.current_question_index, "time expired");
                self.begin_advance(AdvanceTrigger::Timer, fx);
            }
        }
    }

    fn arm_timer(&mut self, fx: &mut Vec<Effect>) {
        if self.timer.arm() {
            fx.push(Effect::TimerArmed {
                limit_secs: self.timer.limit_secs(),
            });
            fx.push(Effect::TimerUpdated {
                remaining_secs: self.timer.remaining_secs(),
                urgency: self.timer.urgency(),
            });
        }
    }

    fn begin_advance(&mut self, trigger: AdvanceTrigger, fx: &mut Vec<Effect>) {
        if self.phase != Phase::Active {
            debug!(?trigger, phase = ?self.phase, "advance already in flight");
            return;
        }
        if self.timer.is_running() {
            self.timer.cancel();
            fx.push(Effect::TimerCancelled);
        }
        self.phase = Phase::Advancing;
        fx.push(Effect::NextAffordance {
            enabled: false,
            label: LOADING_LABEL,
        });
        fx.push(Effect::StartAdvance {
            question_index: self.session.current_question_index,
            selection: self.renderer.selection(),
            trigger,
        });
    }

    fn complete_advance(&mut self, outcome: AdvanceOutcome, fx: &mut Vec<Effect>) {
        if self.phase != Phase::Advancing {
            warn!(phase = ?self.phase, "advance completion without advance in flight");
            return;
        }
        match outcome {
            AdvanceOutcome::Question(payload) => {
                self.renderer.render(&payload);
                self.session.adopt(&payload);
                self.phase = Phase::Active;
                fx.push(rendered(&payload));
                self.arm_timer(fx);
                fx.push(self.next_affordance());
            }
            AdvanceOutcome::Finished { redirect } => {
                self.phase = Phase::Terminal;
                self.timer.cancel();
                info!(
                    %redirect,
                    violations = self.session.violation_count,
                    "session terminal"
                );
                fx.push(Effect::Navigate { redirect });
            }
            AdvanceOutcome::Aborted { reason } => {
                // Timer stays cancelled until the next successful render.
                self.phase = Phase::Active;
                fx.push(Effect::AdvanceAborted { reason });
                fx.push(self.next_affordance());
            }
        }
    }

    fn next_affordance(&self) -> Effect {
        Effect::NextAffordance {
            enabled: true,
            label: if self.session.is_last_question {
                FINISH_LABEL
            } else {
                NEXT_LABEL
            },
        }
    }
}

fn rendered(question: &QuestionPayload) -> Effect {
    Effect::QuestionRendered {
        question: question.clone(),
        progress: question.progress_text(),
        progress_pct: question.progress_pct(),
        badge: question.kind.badge(),
    }
}
