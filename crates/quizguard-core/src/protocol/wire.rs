//! JSON bodies exchanged with the grading service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::events::ViolationCategory;
use crate::question::{QuestionKind, QuestionPayload, SelectionSet};

/// Body of the violation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    #[serde(rename = "type")]
    pub category: ViolationCategory,
    pub at: DateTime<Utc>,
}

/// Body of the answer submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub answer: SelectionSet,
}

/// Decoded advance response.
#[derive(Debug, Clone, PartialEq)]
pub enum NextResponse {
    Question(QuestionPayload),
    Finished { redirect: String },
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(rename = "type")]
    kind: QuestionKind,
    question: String,
    options: Vec<String>,
}

/// Advance response as the server sends it, every field optional so that
/// missing ones are reported by name instead of as a serde error.
#[derive(Debug, Deserialize)]
pub struct RawNextResponse {
    finished: Option<bool>,
    redirect: Option<String>,
    question_num: Option<u32>,
    total_questions: Option<u32>,
    is_last: Option<bool>,
    question: Option<RawQuestion>,
}

impl RawNextResponse {
    /// Validate and convert.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when a field required by the response
    /// variant is absent or out of range.
    pub fn into_response(self, endpoint: &str) -> Result<NextResponse, ProtocolError> {
        let missing = |field| ProtocolError::MissingField {
            endpoint: endpoint.to_string(),
            field,
        };

        if self.finished.ok_or_else(|| missing("finished"))? {
            let redirect = self.redirect.ok_or_else(|| missing("redirect"))?;
            return Ok(NextResponse::Finished { redirect });
        }

        let index = self.question_num.ok_or_else(|| missing("question_num"))?;
        let total_count = self.total_questions.ok_or_else(|| missing("total_questions"))?;
        let is_last = self.is_last.ok_or_else(|| missing("is_last"))?;
        let question = self.question.ok_or_else(|| missing("question"))?;

        if index == 0 || index > total_count {
            return Err(ProtocolError::InvalidField {
                endpoint: endpoint.to_string(),
                field: "question_num",
                message: format!("{index} is not within 1..={total_count}"),
            });
        }

        Ok(NextResponse::Question(QuestionPayload {
            index,
            total_count,
            is_last,
            kind: question.kind,
            prompt: question.question,
            options: question.options,
        }))
    }
}

/// Parse an advance response body.
///
/// # Errors
///
/// Non-JSON bodies are [`ProtocolError::Malformed`]; structural problems are
/// reported by [`RawNextResponse::into_response`].
pub fn decode_next(endpoint: &str, body: &[u8]) -> Result<NextResponse, ProtocolError> {
    let raw: RawNextResponse =
        serde_json::from_slice(body).map_err(|e| ProtocolError::Malformed {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
    raw.into_response(endpoint)
}
