// Portal metrics
//
// Counters, gauges and histograms for:
// - Submission outcomes (accepted, rejected, already completed, discarded)
// - Dispatch failures by kind (compile, runtime, unavailable, timeout, cancelled)
// - Progress milestones (fragments, completions, side challenge, finale)
// - Dispatch latency and in-flight submissions

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::types::DispatchError;
use crate::progression::SubmissionOutcome;

/// Counter metric (monotonically increasing)
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge metric (can go up or down, never below zero)
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Histogram bucket for latency tracking
#[derive(Debug)]
pub struct HistogramBucket {
    pub le: f64, // upper bound in seconds
    pub count: AtomicU64,
}

/// Histogram metric for latency tracking
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<HistogramBucket>,
    sum: AtomicU64, // microseconds
    count: AtomicU64,
}

impl Histogram {
    /// Buckets sized for a remote judging round trip (seconds)
    pub fn new_dispatch_latency() -> Self {
        let buckets = [0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0]
            .into_iter()
            .map(|le| HistogramBucket {
                le,
                count: AtomicU64::new(0),
            })
            .collect();

        Self {
            buckets,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: Duration) {
        let seconds = value.as_secs_f64();
        self.sum
            .fetch_add(value.as_micros() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for bucket in &self.buckets {
            if seconds <= bucket.le {
                bucket.count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum_micros(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn get_bucket_count(&self, le: f64) -> u64 {
        self.buckets
            .iter()
            .find(|b| (b.le - le).abs() < 0.0001)
            .map(|b| b.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

/// Global metrics registry
#[derive(Debug)]
pub struct MetricsRegistry {
    pub sessions_opened: Counter,

    // Submissions
    pub submissions_total: Counter,
    pub submissions_judged: Counter,
    pub submissions_accepted: Counter,
    pub submissions_rejected: Counter,
    pub submissions_already_completed: Counter,
    pub submissions_discarded: Counter,
    pub verdict_disagreements: Counter,

    // Dispatch errors
    pub dispatch_compile_error: Counter,
    pub dispatch_runtime_error: Counter,
    pub dispatch_unavailable: Counter,
    pub dispatch_timeout: Counter,
    pub dispatch_cancelled: Counter,

    // Progress
    pub fragments_awarded: Counter,
    pub puzzles_completed: Counter,
    pub side_challenges_selected: Counter,
    pub side_challenges_solved: Counter,
    pub final_attempts_accepted: Counter,
    pub final_attempts_rejected: Counter,

    pub invariant_violations: Counter,

    pub in_flight_submissions: Gauge,
    pub dispatch_latency: Histogram,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            sessions_opened: Counter::new(),
            submissions_total: Counter::new(),
            submissions_judged: Counter::new(),
            submissions_accepted: Counter::new(),
            submissions_rejected: Counter::new(),
            submissions_already_completed: Counter::new(),
            submissions_discarded: Counter::new(),
            verdict_disagreements: Counter::new(),
            dispatch_compile_error: Counter::new(),
            dispatch_runtime_error: Counter::new(),
            dispatch_unavailable: Counter::new(),
            dispatch_timeout: Counter::new(),
            dispatch_cancelled: Counter::new(),
            fragments_awarded: Counter::new(),
            puzzles_completed: Counter::new(),
            side_challenges_selected: Counter::new(),
            side_challenges_solved: Counter::new(),
            final_attempts_accepted: Counter::new(),
            final_attempts_rejected: Counter::new(),
            invariant_violations: Counter::new(),
            in_flight_submissions: Gauge::new(),
            dispatch_latency: Histogram::new_dispatch_latency(),
        }
    }

    pub fn record_dispatch_error(&self, error: &DispatchError) {
        match error {
            DispatchError::CompileError(_) => self.dispatch_compile_error.inc(),
            DispatchError::RuntimeError(_) => self.dispatch_runtime_error.inc(),
            DispatchError::ServiceUnavailable(_) => self.dispatch_unavailable.inc(),
            DispatchError::Timeout(_) => self.dispatch_timeout.inc(),
            DispatchError::Cancelled => self.dispatch_cancelled.inc(),
        }
    }

    /// Record what a judged (or discarded) submission did to progress.
    /// Dispatch errors are counted at the dispatcher.
    pub fn record_outcome(&self, outcome: &SubmissionOutcome) {
        match outcome {
            SubmissionOutcome::Accepted { all_complete, .. } => {
                self.submissions_accepted.inc();
                self.fragments_awarded.inc();
                self.puzzles_completed.inc();
                if *all_complete {
                    self.side_challenges_selected.inc();
                }
            }
            SubmissionOutcome::Rejected { .. } => self.submissions_rejected.inc(),
            SubmissionOutcome::AlreadyCompleted { .. } => {
                self.submissions_already_completed.inc()
            }
            SubmissionOutcome::Discarded { .. } => self.submissions_discarded.inc(),
            SubmissionOutcome::Unjudged { .. } => {}
        }
    }

    pub fn record_final_attempt(&self, accepted: bool) {
        if accepted {
            self.final_attempts_accepted.inc();
        } else {
            self.final_attempts_rejected.inc();
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP riftgate_sessions_opened_total Participant sessions opened\n");
        output.push_str("# TYPE riftgate_sessions_opened_total counter\n");
        output.push_str(&format!(
            "riftgate_sessions_opened_total {}\n",
            self.sessions_opened.get()
        ));

        output.push_str("# HELP riftgate_submissions_total Submissions dispatched\n");
        output.push_str("# TYPE riftgate_submissions_total counter\n");
        output.push_str(&format!(
            "riftgate_submissions_total {}\n",
            self.submissions_total.get()
        ));

        output.push_str("# HELP riftgate_submissions_by_outcome Submissions by progress outcome\n");
        output.push_str("# TYPE riftgate_submissions_by_outcome counter\n");
        for (label, counter) in [
            ("accepted", &self.submissions_accepted),
            ("rejected", &self.submissions_rejected),
            ("already_completed", &self.submissions_already_completed),
            ("discarded", &self.submissions_discarded),
        ] {
            output.push_str(&format!(
                "riftgate_submissions_by_outcome{{outcome=\"{}\"}} {}\n",
                label,
                counter.get()
            ));
        }

        output.push_str("# HELP riftgate_dispatch_errors_total Submissions that could not be judged\n");
        output.push_str("# TYPE riftgate_dispatch_errors_total counter\n");
        for (label, counter) in [
            ("compile_error", &self.dispatch_compile_error),
            ("runtime_error", &self.dispatch_runtime_error),
            ("service_unavailable", &self.dispatch_unavailable),
            ("timeout", &self.dispatch_timeout),
            ("cancelled", &self.dispatch_cancelled),
        ] {
            output.push_str(&format!(
                "riftgate_dispatch_errors_total{{kind=\"{}\"}} {}\n",
                label,
                counter.get()
            ));
        }

        output.push_str("# HELP riftgate_verdict_disagreements_total Service verdicts contradicting local comparison\n");
        output.push_str("# TYPE riftgate_verdict_disagreements_total counter\n");
        output.push_str(&format!(
            "riftgate_verdict_disagreements_total {}\n",
            self.verdict_disagreements.get()
        ));

        output.push_str("# HELP riftgate_progress_total Progress milestones\n");
        output.push_str("# TYPE riftgate_progress_total counter\n");
        for (label, counter) in [
            ("fragment_awarded", &self.fragments_awarded),
            ("puzzle_completed", &self.puzzles_completed),
            ("side_challenge_selected", &self.side_challenges_selected),
            ("side_challenge_solved", &self.side_challenges_solved),
        ] {
            output.push_str(&format!(
                "riftgate_progress_total{{milestone=\"{}\"}} {}\n",
                label,
                counter.get()
            ));
        }

        output.push_str("# HELP riftgate_final_attempts_total Final answers by result\n");
        output.push_str("# TYPE riftgate_final_attempts_total counter\n");
        output.push_str(&format!(
            "riftgate_final_attempts_total{{result=\"accepted\"}} {}\n",
            self.final_attempts_accepted.get()
        ));
        output.push_str(&format!(
            "riftgate_final_attempts_total{{result=\"rejected\"}} {}\n",
            self.final_attempts_rejected.get()
        ));

        output.push_str("# HELP riftgate_invariant_violations_total Internal invariant violations\n");
        output.push_str("# TYPE riftgate_invariant_violations_total counter\n");
        output.push_str(&format!(
            "riftgate_invariant_violations_total {}\n",
            self.invariant_violations.get()
        ));

        output.push_str("# HELP riftgate_in_flight_submissions Submissions awaiting a verdict\n");
        output.push_str("# TYPE riftgate_in_flight_submissions gauge\n");
        output.push_str(&format!(
            "riftgate_in_flight_submissions {}\n",
            self.in_flight_submissions.get()
        ));

        output.push_str("# HELP riftgate_dispatch_latency_seconds Judging round trip latency\n");
        output.push_str("# TYPE riftgate_dispatch_latency_seconds histogram\n");
        for bucket in &self.dispatch_latency.buckets {
            output.push_str(&format!(
                "riftgate_dispatch_latency_seconds_bucket{{le=\"{}\"}} {}\n",
                bucket.le,
                bucket.count.load(Ordering::Relaxed)
            ));
        }
        output.push_str(&format!(
            "riftgate_dispatch_latency_seconds_sum {}\n",
            self.dispatch_latency.get_sum_micros() as f64 / 1_000_000.0
        ));
        output.push_str(&format!(
            "riftgate_dispatch_latency_seconds_count {}\n",
            self.dispatch_latency.get_count()
        ));

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global metrics instance
static METRICS: once_cell::sync::Lazy<Arc<MetricsRegistry>> =
    once_cell::sync::Lazy::new(|| Arc::new(MetricsRegistry::new()));

/// Get global metrics registry
pub fn get_metrics() -> Arc<MetricsRegistry> {
    Arc::clone(&METRICS)
}
