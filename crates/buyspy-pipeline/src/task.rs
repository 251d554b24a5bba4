//! Extraction task lifecycle.

use buyspy_core::{CandidateUrl, PriceRecord, Tier};
use serde::Serialize;

use crate::error::{ExtractionError, ExtractionErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    InFlight,
    Succeeded,
    AggregatorDetected,
    ParseFailed,
    TimedOut,
    NetworkFailed,
    Failed,
}

impl TaskState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Whether `self → next` is a legal move.
    ///
    /// ```text
    /// Pending → InFlight
    /// InFlight → Succeeded | AggregatorDetected | ParseFailed | TimedOut | NetworkFailed
    /// TimedOut | NetworkFailed → Pending | Failed
    /// ParseFailed → Failed
    /// AggregatorDetected → Succeeded | Failed
    /// ```
    #[must_use]
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::{
            AggregatorDetected, Failed, InFlight, NetworkFailed, ParseFailed, Pending, Succeeded,
            TimedOut,
        };
        matches!(
            (self, next),
            (Pending, InFlight)
                | (
                    InFlight,
                    Succeeded | AggregatorDetected | ParseFailed | TimedOut | NetworkFailed
                )
                | (TimedOut | NetworkFailed, Pending | Failed)
                | (ParseFailed, Failed)
                | (AggregatorDetected, Succeeded | Failed)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::InFlight => "in_flight",
            TaskState::Succeeded => "succeeded",
            TaskState::AggregatorDetected => "aggregator_detected",
            TaskState::ParseFailed => "parse_failed",
            TaskState::TimedOut => "timed_out",
            TaskState::NetworkFailed => "network_failed",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One candidate URL moving through analysis.
#[derive(Debug, Clone)]
pub struct ExtractionTask {
    pub candidate: CandidateUrl,
    state: TaskState,
    attempts: u32,
    last_error: Option<ExtractionErrorKind>,
}

impl ExtractionTask {
    #[must_use]
    pub fn new(candidate: CandidateUrl) -> Self {
        Self {
            candidate,
            state: TaskState::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Number of times the task entered `InFlight`.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn last_error(&self) -> Option<ExtractionErrorKind> {
        self.last_error
    }

    /// Moves to `next` if the transition is legal. Illegal moves leave the
    /// state unchanged and return `false`.
    pub fn transition(&mut self, next: TaskState) -> bool {
        let legal = self.state.can_transition_to(next);
        if !legal {
            tracing::error!(
                url = %self.candidate.canonical_url,
                from = %self.state,
                to = %next,
                "rejected illegal task transition"
            );
            debug_assert!(legal, "illegal task transition {} -> {next}", self.state);
            return false;
        }
        if next == TaskState::InFlight {
            self.attempts += 1;
        }
        self.state = next;
        true
    }

    /// Records `err` and moves to the matching failure state.
    pub fn fail_attempt(&mut self, err: &ExtractionError) -> bool {
        self.last_error = Some(err.kind());
        let next = match err.kind() {
            ExtractionErrorKind::Timeout => TaskState::TimedOut,
            ExtractionErrorKind::Network => TaskState::NetworkFailed,
            ExtractionErrorKind::Parse
            | ExtractionErrorKind::NotCommerce
            | ExtractionErrorKind::AggregatorResolution => TaskState::ParseFailed,
        };
        self.transition(next)
    }

    /// Records a failure that happened after `AggregatorDetected` and ends
    /// the task.
    pub fn fail_resolution(&mut self, err: &ExtractionError) -> bool {
        self.last_error = Some(err.kind());
        self.transition(TaskState::Failed)
    }

    #[must_use]
    pub fn into_outcome(
        self,
        record: Option<PriceRecord>,
        resolved_from: Option<String>,
    ) -> TaskOutcome {
        TaskOutcome {
            canonical_url: self.candidate.canonical_url,
            domain: self.candidate.domain,
            tier: self.candidate.tier,
            final_state: self.state,
            attempts: self.attempts,
            last_error: self.last_error,
            record,
            resolved_from,
            child: None,
        }
    }
}

/// Terminal summary of one task, appended to the results collector.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub canonical_url: String,
    pub domain: String,
    pub tier: Tier,
    pub final_state: TaskState,
    pub attempts: u32,
    pub last_error: Option<ExtractionErrorKind>,
    /// Present iff `final_state` is `Succeeded`.
    pub record: Option<PriceRecord>,
    /// The aggregator page a record was resolved from, if any.
    pub resolved_from: Option<String>,
    /// The store page followed from an aggregator, tracked as its own task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<TaskOutcome>>,
}

impl TaskOutcome {
    #[must_use]
    pub fn with_child(mut self, child: Option<TaskOutcome>) -> Self {
        self.child = child.map(Box::new);
        self
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.final_state == TaskState::Succeeded && self.record.is_some()
    }
}
