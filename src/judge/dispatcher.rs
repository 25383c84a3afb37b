use crate::config::config::JudgeServiceConfig;
use crate::config::types::{DispatchError, Language, Puzzle, SubmissionResult};
use crate::judge::adapter::{ExecutionService, JudgeRequest, JudgeResponse};
use crate::judge::http::HttpExecutionService;
use crate::observability::audit::events;
use crate::observability::metrics::get_metrics;
use crate::verdict::evaluator::TestCaseEvaluator;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Sends candidate code and the puzzle's ordered cases to the execution
/// service. Holds no participant state.
#[derive(Clone)]
pub struct SubmissionDispatcher {
    service: Arc<dyn ExecutionService>,
    timeout: Duration,
}

impl SubmissionDispatcher {
    pub fn new(service: Arc<dyn ExecutionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn from_config(config: &JudgeServiceConfig) -> Self {
        Self::new(
            Arc::new(HttpExecutionService::from_config(config)),
            config.timeout(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Judge synchronously: dispatch and wait for the verdict or the deadline
    pub fn submit(&self, puzzle: &Puzzle, code: &str) -> Result<SubmissionResult, DispatchError> {
        self.dispatch(puzzle, code).wait()
    }

    /// Start judging on a worker thread. The returned handle is the only way
    /// to observe the result; dropping or cancelling it discards the result.
    pub fn dispatch(&self, puzzle: &Puzzle, code: &str) -> PendingDispatch {
        let request = JudgeRequest {
            code: code.to_string(),
            test_cases: puzzle.all_cases(),
            submission_id: new_submission_id(),
        };

        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(1);

        let service = Arc::clone(&self.service);
        let language = puzzle.language;
        let worker_request = request.clone();
        let worker_tx = result_tx.clone();

        let metrics = get_metrics();
        metrics.submissions_total.inc();
        metrics.in_flight_submissions.inc();
        let spawned = thread::Builder::new()
            .name(format!("dispatch-{}", puzzle.index))
            .spawn(move || run_worker(service, language, worker_request, worker_tx));

        if let Err(e) = spawned {
            log::error!("Failed to spawn dispatch worker: {}", e);
            let _ = result_tx.send(Err(DispatchError::ServiceUnavailable(format!(
                "could not start dispatch worker: {}",
                e
            ))));
        }

        log::debug!(
            "Dispatched {} for puzzle {} via {} ({} cases)",
            request.submission_id,
            puzzle.index,
            self.service.name(),
            request.test_cases.len()
        );

        PendingDispatch {
            puzzle_index: puzzle.index,
            visible_count: puzzle.visible.len(),
            request,
            result_rx,
            cancel_tx,
            cancel_rx,
            started: Instant::now(),
            timeout: self.timeout,
        }
    }
}

fn run_worker(
    service: Arc<dyn ExecutionService>,
    language: Language,
    request: JudgeRequest,
    tx: Sender<Result<JudgeResponse, DispatchError>>,
) {
    let outcome = service.execute(language, &request);
    // The receiver may already be gone after a cancel or timeout.
    let _ = tx.send(outcome);
}

fn new_submission_id() -> String {
    format!("sub_{}", uuid::Uuid::new_v4().simple())
}

/// Handle that cancels an in-flight dispatch from another thread
#[derive(Clone)]
pub struct DispatchCanceller {
    tx: Sender<()>,
}

impl DispatchCanceller {
    pub fn cancel(&self) {
        let _ = self.tx.try_send(());
    }
}

/// An in-flight judging round trip
pub struct PendingDispatch {
    puzzle_index: usize,
    visible_count: usize,
    request: JudgeRequest,
    result_rx: Receiver<Result<JudgeResponse, DispatchError>>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    started: Instant,
    timeout: Duration,
}

impl PendingDispatch {
    pub fn submission_id(&self) -> &str {
        &self.request.submission_id
    }

    pub fn puzzle_index(&self) -> usize {
        self.puzzle_index
    }

    pub fn canceller(&self) -> DispatchCanceller {
        DispatchCanceller {
            tx: self.cancel_tx.clone(),
        }
    }

    /// Block until the verdict, a cancel, or the deadline
    pub fn wait(self) -> Result<SubmissionResult, DispatchError> {
        let remaining = self.timeout.saturating_sub(self.started.elapsed());

        let received = crossbeam_channel::select! {
            recv(self.result_rx) -> msg => match msg {
                Ok(outcome) => outcome,
                Err(_) => Err(DispatchError::ServiceUnavailable(
                    "dispatch worker exited without a reply".to_string(),
                )),
            },
            recv(self.cancel_rx) -> _ => Err(DispatchError::Cancelled),
            default(remaining) => Err(DispatchError::Timeout(self.timeout)),
        };

        let metrics = get_metrics();
        metrics.dispatch_latency.observe(self.started.elapsed());

        let result = received.and_then(|response| {
            reconcile(&self.request, self.visible_count, response)
        });

        match &result {
            Ok(judged) => {
                metrics.submissions_judged.inc();
                let disagreements = TestCaseEvaluator::disagreements(&judged.cases);
                if !disagreements.is_empty() {
                    log::warn!(
                        "Service verdicts for {} disagree with local comparison at cases {:?}",
                        judged.submission_id,
                        disagreements
                    );
                    metrics.verdict_disagreements.inc();
                    events::verdict_disagreement(&judged.submission_id, &disagreements);
                }
            }
            Err(e) => {
                metrics.record_dispatch_error(e);
                log::info!("Submission {} not judged: {}", self.request.submission_id, e);
            }
        }

        result
    }
}

impl Drop for PendingDispatch {
    fn drop(&mut self) {
        get_metrics().in_flight_submissions.dec();
    }
}

/// Validate a 2xx response against the request it answers
pub fn reconcile(
    request: &JudgeRequest,
    visible_count: usize,
    response: JudgeResponse,
) -> Result<SubmissionResult, DispatchError> {
    if response.results.is_empty() {
        if let Some(message) = response.compiler_message {
            return Err(DispatchError::CompileError(message));
        }
    }

    if response.results.len() != request.test_cases.len() {
        return Err(DispatchError::ServiceUnavailable(format!(
            "malformed response: {} results for {} test cases",
            response.results.len(),
            request.test_cases.len()
        )));
    }

    let echoed = response
        .results
        .iter()
        .zip(&request.test_cases)
        .position(|(got, sent)| {
            got.input != sent.input || got.expected_output != sent.expected_output
        });
    if let Some(position) = echoed {
        return Err(DispatchError::ServiceUnavailable(format!(
            "malformed response: result {} does not echo its test case",
            position
        )));
    }

    let diagnostic = response.diagnostic().map(str::to_string);
    Ok(SubmissionResult {
        submission_id: request.submission_id.clone(),
        cases: response.results,
        visible_count,
        diagnostic,
    })
}
