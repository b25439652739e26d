use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::wire::{NextResponse, ViolationReport};
use crate::question::SelectionSet;

/// The remote grading authority.
///
/// Implementations carry their own identification of the attempt (a
/// session cookie for the HTTP service); calls carry only the payload.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// Tell the authority a monitored event happened. Response is ignored.
    async fn report_violation(&self, report: &ViolationReport) -> Result<()>;

    /// Record the selection for the current question.
    async fn submit_answer(&self, selection: &SelectionSet) -> Result<()>;

    /// Move the attempt forward and return what comes next.
    async fn next_question(&self) -> Result<NextResponse>;
}
