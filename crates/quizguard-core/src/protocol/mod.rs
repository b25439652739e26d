//! Progression protocol: submit, then next, then render or terminate.
//!
//! [`ProgressionProtocol::run`] performs the two remote steps and reports an
//! [`AdvanceOutcome`]; the session machine applies the third step when the
//! outcome comes back on the bus.

mod http;
mod traits;
pub mod wire;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::question::{QuestionPayload, SelectionSet};

pub use http::HttpGradingService;
pub use traits::GradingService;
pub use wire::{NextResponse, ViolationReport};

/// How an advance attempt ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// A new question to render.
    Question(QuestionPayload),
    /// The attempt is over.
    Finished { redirect: String },
    /// Next failed; nothing changed on the client.
    Aborted { reason: String },
}

#[derive(Clone)]
pub struct ProgressionProtocol {
    service: Arc<dyn GradingService>,
}

impl ProgressionProtocol {
    pub fn new(service: Arc<dyn GradingService>) -> Self {
        Self { service }
    }

    /// Submit `selection` for question `question_index`, then request the
    /// next question regardless of how the submission went.
    pub async fn run(&self, question_index: u32, selection: SelectionSet) -> AdvanceOutcome {
        if let Err(e) = self.service.submit_answer(&selection).await {
            warn!(question_index, error = %e, "answer submission failed, advancing anyway");
        }

        match self.service.next_question().await {
            Ok(NextResponse::Question(payload)) => {
                info!(
                    from = question_index,
                    to = payload.index,
                    total = payload.total_count,
                    "advanced to next question"
                );
                AdvanceOutcome::Question(payload)
            }
            Ok(NextResponse::Finished { redirect }) => {
                info!(question_index, %redirect, "assessment finished");
                AdvanceOutcome::Finished { redirect }
            }
            Err(e) => {
                warn!(question_index, error = %e, "advance aborted");
                AdvanceOutcome::Aborted {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory grading service.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{CoreError, Result, TransportError};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Report(crate::events::ViolationCategory),
        Submit(Vec<usize>),
        Next,
    }

    #[derive(Default)]
    pub struct ScriptedService {
        pub calls: Mutex<Vec<Call>>,
        pub next: Mutex<VecDeque<Option<NextResponse>>>,
        pub fail_submit: Mutex<bool>,
        pub fail_report: Mutex<bool>,
    }

    impl ScriptedService {
        pub fn push_next(&self, response: Option<NextResponse>) {
            self.next.lock().unwrap().push_back(response);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn down(endpoint: &str) -> CoreError {
        TransportError::Status {
            endpoint: endpoint.into(),
            status: 503,
        }
        .into()
    }

    #[async_trait]
    impl GradingService for ScriptedService {
        async fn report_violation(&self, report: &ViolationReport) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Report(report.category));
            if *self.fail_report.lock().unwrap() {
                return Err(down("/api/cheat"));
            }
            Ok(())
        }

        async fn submit_answer(&self, selection: &SelectionSet) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Submit(selection.to_vec()));
            if *self.fail_submit.lock().unwrap() {
                return Err(down("/api/answer"));
            }
            Ok(())
        }

        async fn next_question(&self) -> Result<NextResponse> {
            self.calls.lock().unwrap().push(Call::Next);
            self.next
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or_else(|| down("/api/next"))
        }
    }
}
