/// Portal audit trail
/// Structured JSON-lines record of every progress-relevant event, correlated
/// by session, participant and submission.
use crate::config::types::{Cohort, DispatchError, PortalError, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;
use uuid::Uuid;

/// Audit event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// Types of portal events we track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalEventType {
    SessionOpened,

    // Judging
    SubmissionStart,
    SubmissionJudged,
    SubmissionUnjudged,
    SubmissionDiscarded,
    VerdictDisagreement,

    // Progress
    FragmentAwarded,
    PuzzleCompleted,
    SideChallengeSelected,
    SideChallengeSolved,

    // Finale
    FinalAttemptRejected,
    FinaleSealed,

    InvariantViolation,
}

impl PortalEventType {
    /// Get the default severity for this event type
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            PortalEventType::SessionOpened => AuditSeverity::Low,
            PortalEventType::SubmissionStart => AuditSeverity::Low,
            PortalEventType::SubmissionJudged => AuditSeverity::Low,
            PortalEventType::SubmissionUnjudged => AuditSeverity::Medium,
            PortalEventType::SubmissionDiscarded => AuditSeverity::Low,
            PortalEventType::VerdictDisagreement => AuditSeverity::High,
            PortalEventType::FragmentAwarded => AuditSeverity::Low,
            PortalEventType::PuzzleCompleted => AuditSeverity::Low,
            PortalEventType::SideChallengeSelected => AuditSeverity::Low,
            PortalEventType::SideChallengeSolved => AuditSeverity::Low,
            PortalEventType::FinalAttemptRejected => AuditSeverity::Medium,
            PortalEventType::FinaleSealed => AuditSeverity::Low,
            PortalEventType::InvariantViolation => AuditSeverity::Critical,
        }
    }
}

/// Correlation identifiers for event tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationIds {
    /// One per opened participant session
    pub session_id: String,
    /// Short form of the participant id
    pub participant: Option<String>,
    /// `sub_<uuid>` of the submission in question
    pub submission_id: Option<String>,
}

impl CorrelationIds {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            participant: None,
            submission_id: None,
        }
    }

    pub fn with_participant(mut self, participant: &str) -> Self {
        self.participant = Some(participant.to_string());
        self
    }

    pub fn with_submission(mut self, submission_id: &str) -> Self {
        self.submission_id = Some(submission_id.to_string());
        self
    }
}

impl Default for CorrelationIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Individual audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalEvent {
    pub event_type: PortalEventType,
    pub severity: AuditSeverity,
    pub timestamp: SystemTime,
    pub details: String,
    pub correlation: Option<CorrelationIds>,
    pub cohort: Option<Cohort>,
    pub puzzle: Option<usize>,
}

impl PortalEvent {
    /// Create a new event with default severity
    pub fn new(event_type: PortalEventType, details: String) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: SystemTime::now(),
            details,
            correlation: None,
            cohort: None,
            puzzle: None,
        }
    }

    pub fn with_correlation(mut self, correlation: &CorrelationIds) -> Self {
        self.correlation = Some(correlation.clone());
        self
    }

    pub fn with_cohort(mut self, cohort: Cohort) -> Self {
        self.cohort = Some(cohort);
        self
    }

    pub fn with_puzzle(mut self, puzzle: usize) -> Self {
        self.puzzle = Some(puzzle);
        self
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    fn to_json(&self) -> serde_json::Value {
        let mut entry = serde_json::json!({
            "timestamp": self.timestamp
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            "event_type": self.event_type,
            "severity": self.severity,
            "details": self.details,
            "process_id": std::process::id(),
        });
        if let Some(correlation) = &self.correlation {
            entry["correlation"] = serde_json::json!({
                "session_id": correlation.session_id,
                "participant": correlation.participant,
                "submission_id": correlation.submission_id,
            });
        }
        if let Some(cohort) = self.cohort {
            entry["cohort"] = serde_json::json!(cohort);
        }
        if let Some(puzzle) = self.puzzle {
            entry["puzzle"] = serde_json::json!(puzzle);
        }
        entry
    }
}

fn log_to_stderr(event: &PortalEvent) {
    match event.severity {
        AuditSeverity::Critical | AuditSeverity::High => {
            error!("AUDIT {:?}: {}", event.event_type, event.details)
        }
        AuditSeverity::Medium => warn!("AUDIT {:?}: {}", event.event_type, event.details),
        AuditSeverity::Low => info!("AUDIT {:?}: {}", event.event_type, event.details),
    }
}

/// Audit logger writing one JSON object per line
pub struct AuditLogger {
    audit_file: Arc<Mutex<File>>,
    audit_path: PathBuf,
}

impl AuditLogger {
    pub fn new(audit_path: Option<PathBuf>) -> Result<Self> {
        let audit_path = audit_path.unwrap_or_else(default_audit_path);

        if let Some(parent) = audit_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PortalError::Config(format!("Failed to create audit log directory: {}", e))
            })?;
        }

        let audit_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&audit_path)
            .map_err(|e| PortalError::Config(format!("Failed to open audit log: {}", e)))?;

        Ok(Self {
            audit_file: Arc::new(Mutex::new(audit_file)),
            audit_path,
        })
    }

    pub fn log_event(&self, event: PortalEvent) {
        log_to_stderr(&event);

        let entry = event.to_json();
        if let Ok(mut file) = self.audit_file.lock() {
            if let Err(e) = writeln!(file, "{}", entry) {
                error!("Failed to write to audit log: {}", e);
            }
            if let Err(e) = file.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        } else {
            error!("Failed to acquire lock on audit file");
        }
    }

    pub fn audit_path(&self) -> &PathBuf {
        &self.audit_path
    }
}

fn default_audit_path() -> PathBuf {
    std::env::temp_dir().join("riftgate").join("audit.log")
}

/// Global audit logger instance
static AUDIT_LOGGER: OnceLock<AuditLogger> = OnceLock::new();

/// Initialize the global audit logger. Without an explicit path, falls back
/// through user-writable locations and finally to stderr-only events.
pub fn init_audit_logger(audit_path: Option<PathBuf>) -> Result<()> {
    let err = match AuditLogger::new(audit_path.clone()) {
        Ok(logger) => {
            if AUDIT_LOGGER.set(logger).is_err() {
                warn!("Audit logger already initialized");
            } else {
                info!("Audit logger initialized");
            }
            return Ok(());
        }
        Err(e) => e,
    };

    if audit_path.is_some() {
        error!("Failed to initialize audit logger: {}", err);
        return Err(err);
    }

    let fallback_paths = vec![
        std::env::temp_dir().join(format!("riftgate-audit-{}.log", std::process::id())),
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(".riftgate")
            .join("audit.log"),
    ];

    for fallback in fallback_paths {
        match AuditLogger::new(Some(fallback.clone())) {
            Ok(logger) => {
                if AUDIT_LOGGER.set(logger).is_ok() {
                    warn!(
                        "Audit logger initialized using fallback path: {}",
                        fallback.display()
                    );
                }
                return Ok(());
            }
            Err(fallback_err) => warn!(
                "Failed to initialize fallback audit logger at {}: {}",
                fallback.display(),
                fallback_err
            ),
        }
    }

    warn!(
        "Audit logger unavailable (all paths failed). Continuing with stderr-only audit events: {}",
        err
    );
    Ok(())
}

/// Log an event using the global logger
pub fn log_event(event: PortalEvent) {
    match AUDIT_LOGGER.get() {
        Some(logger) => logger.log_event(event),
        None => log_to_stderr(&event),
    }
}

/// Convenience functions for portal events
pub mod events {
    use super::*;

    pub fn session_opened(correlation: &CorrelationIds, cohort: Cohort, resumed: bool) {
        let details = if resumed {
            "Session resumed from stored progress"
        } else {
            "Session opened for new participant"
        };
        log_event(
            PortalEvent::new(PortalEventType::SessionOpened, details.to_string())
                .with_correlation(correlation)
                .with_cohort(cohort),
        );
    }

    pub fn submission_start(correlation: &CorrelationIds, puzzle: usize) {
        log_event(
            PortalEvent::new(
                PortalEventType::SubmissionStart,
                format!("Submission dispatched for puzzle {}", puzzle),
            )
            .with_correlation(correlation)
            .with_puzzle(puzzle),
        );
    }

    pub fn submission_judged(correlation: &CorrelationIds, puzzle: usize, passed: usize, total: usize) {
        log_event(
            PortalEvent::new(
                PortalEventType::SubmissionJudged,
                format!("Puzzle {} judged: {}/{} cases passed", puzzle, passed, total),
            )
            .with_correlation(correlation)
            .with_puzzle(puzzle),
        );
    }

    pub fn submission_unjudged(correlation: &CorrelationIds, puzzle: usize, error: &DispatchError) {
        log_event(
            PortalEvent::new(
                PortalEventType::SubmissionUnjudged,
                format!("Puzzle {} could not be judged ({}): {}", puzzle, error.kind(), error),
            )
            .with_correlation(correlation)
            .with_puzzle(puzzle),
        );
    }

    pub fn submission_discarded(correlation: &CorrelationIds, puzzle: usize) {
        log_event(
            PortalEvent::new(
                PortalEventType::SubmissionDiscarded,
                format!("Result for puzzle {} discarded", puzzle),
            )
            .with_correlation(correlation)
            .with_puzzle(puzzle),
        );
    }

    pub fn verdict_disagreement(submission_id: &str, positions: &[usize]) {
        log_event(
            PortalEvent::new(
                PortalEventType::VerdictDisagreement,
                format!(
                    "Service verdicts disagree with local comparison at cases {:?}",
                    positions
                ),
            )
            .with_correlation(&CorrelationIds::new().with_submission(submission_id)),
        );
    }

    pub fn fragment_awarded(correlation: &CorrelationIds, puzzle: usize, held: usize) {
        log_event(
            PortalEvent::new(
                PortalEventType::FragmentAwarded,
                format!("Fragment for puzzle {} awarded ({} held)", puzzle, held),
            )
            .with_correlation(correlation)
            .with_puzzle(puzzle),
        );
    }

    pub fn puzzle_completed(correlation: &CorrelationIds, puzzle: usize) {
        log_event(
            PortalEvent::new(
                PortalEventType::PuzzleCompleted,
                format!("Puzzle {} complete", puzzle),
            )
            .with_correlation(correlation)
            .with_puzzle(puzzle),
        );
    }

    pub fn side_challenge_selected(correlation: &CorrelationIds) {
        log_event(
            PortalEvent::new(
                PortalEventType::SideChallengeSelected,
                "All puzzles complete; side challenge selected".to_string(),
            )
            .with_correlation(correlation),
        );
    }

    pub fn side_challenge_solved(correlation: &CorrelationIds) {
        log_event(
            PortalEvent::new(
                PortalEventType::SideChallengeSolved,
                "Side challenge solved; finale open".to_string(),
            )
            .with_correlation(correlation),
        );
    }

    pub fn final_attempt_rejected(correlation: &CorrelationIds, attempts: u32) {
        log_event(
            PortalEvent::new(
                PortalEventType::FinalAttemptRejected,
                format!("Final answer rejected (attempt {})", attempts),
            )
            .with_correlation(correlation),
        );
    }

    pub fn finale_sealed(correlation: &CorrelationIds, attempts: u32) {
        log_event(
            PortalEvent::new(
                PortalEventType::FinaleSealed,
                format!("Finale sealed after {} rejected attempts", attempts),
            )
            .with_correlation(correlation),
        );
    }

    pub fn invariant_violation(correlation: &CorrelationIds, details: String) {
        log_event(
            PortalEvent::new(PortalEventType::InvariantViolation, details)
                .with_correlation(correlation),
        );
    }
}
