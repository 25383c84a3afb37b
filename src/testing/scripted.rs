use crate::config::types::{DispatchError, Language};
use crate::judge::adapter::{ExecutionService, JudgeRequest, JudgeResponse};
use crate::testing::fixtures::outcomes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer from the fake execution service
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Every case passes
    PassAll,
    /// Cases at these positions fail, the rest pass
    FailCases(Vec<usize>),
    /// Sleep, then pass every case
    Delay(Duration),
    Error(DispatchError),
    /// Returned verbatim
    Raw(JudgeResponse),
}

impl ScriptedReply {
    pub fn response_for(&self, request: &JudgeRequest) -> JudgeResponse {
        match self {
            ScriptedReply::FailCases(failing) => JudgeResponse {
                results: outcomes(&request.test_cases, failing),
                ..Default::default()
            },
            ScriptedReply::Raw(response) => response.clone(),
            _ => JudgeResponse {
                results: outcomes(&request.test_cases, &[]),
                ..Default::default()
            },
        }
    }
}

#[derive(Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    default: Option<ScriptedReply>,
    requests: Vec<JudgeRequest>,
}

/// Execution service answering from a queue of scripted replies.
/// Clones share the queue and the request log.
#[derive(Clone, Default)]
pub struct ScriptedExecutionService {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedExecutionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply used whenever the queue is empty
    pub fn with_default(reply: ScriptedReply) -> Self {
        let service = Self::new();
        if let Ok(mut state) = service.state.lock() {
            state.default = Some(reply);
        }
        service
    }

    pub fn push(&self, reply: ScriptedReply) {
        if let Ok(mut state) = self.state.lock() {
            state.replies.push_back(reply);
        }
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<JudgeRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }
}

impl ExecutionService for ScriptedExecutionService {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn execute(
        &self,
        _language: Language,
        request: &JudgeRequest,
    ) -> Result<JudgeResponse, DispatchError> {
        let reply = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| DispatchError::ServiceUnavailable("script poisoned".to_string()))?;
            state.requests.push(request.clone());
            state.replies.pop_front().or_else(|| state.default.clone())
        };

        match reply {
            None => Err(DispatchError::ServiceUnavailable(
                "no scripted reply".to_string(),
            )),
            Some(ScriptedReply::Error(e)) => Err(e),
            Some(ScriptedReply::Delay(delay)) => {
                std::thread::sleep(delay);
                Ok(ScriptedReply::PassAll.response_for(request))
            }
            Some(reply) => Ok(reply.response_for(request)),
        }
    }
}
