use crate::config::types::{CaseOutcome, DispatchError, Language, TestCase};
use serde::{Deserialize, Serialize};

/// Body posted to the execution service for one submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeRequest {
    pub code: String,
    /// Visible cases first, then hidden
    #[serde(rename = "testCases")]
    pub test_cases: Vec<TestCase>,
    /// Tracing id, `sub_<uuid>`
    #[serde(rename = "submissionid")]
    pub submission_id: String,
}

/// Execution service reply. Error bodies use the same shape with `results`
/// absent and one of the diagnostic fields set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JudgeResponse {
    #[serde(default)]
    pub results: Vec<CaseOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JudgeResponse {
    /// First present of compilerMessage, details, message, error
    pub fn diagnostic(&self) -> Option<&str> {
        [
            &self.compiler_message,
            &self.details,
            &self.message,
            &self.error,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|d| !d.trim().is_empty())
    }
}

/// Code execution service contract. Implementations block for the duration
/// of one judging round trip and never mutate participant state.
pub trait ExecutionService: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        language: Language,
        request: &JudgeRequest,
    ) -> Result<JudgeResponse, DispatchError>;
}
