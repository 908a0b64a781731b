use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::errors::KeyrunError;
use super::guard::CleanupOutcome;
use super::tool::ToolOutcome;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    Idle,
    ExtractingCredential,
    MaterializingConfig,
    Invoking,
    CleaningUp,
    Done,
}

impl RunPhase {
    /// Every working phase may bail out straight to cleanup; cleanup always
    /// ends in `Done`.
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, ExtractingCredential)
                | (Idle, CleaningUp)
                | (ExtractingCredential, MaterializingConfig)
                | (ExtractingCredential, CleaningUp)
                | (MaterializingConfig, Invoking)
                | (MaterializingConfig, CleaningUp)
                | (Invoking, CleaningUp)
                | (CleaningUp, Done)
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ExtractingCredential => write!(f, "extracting-credential"),
            Self::MaterializingConfig => write!(f, "materializing-config"),
            Self::Invoking => write!(f, "invoking"),
            Self::CleaningUp => write!(f, "cleaning-up"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Phase bookkeeping for one run.
#[derive(Debug, Clone)]
pub struct RunState {
    phase: RunPhase,
    history: Vec<RunPhase>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            history: vec![RunPhase::Idle],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    /// The last working phase entered before cleanup.
    pub fn last_working_phase(&self) -> RunPhase {
        self.history
            .iter()
            .rev()
            .copied()
            .find(|p| !matches!(p, RunPhase::CleaningUp | RunPhase::Done))
            .unwrap_or(RunPhase::Idle)
    }

    pub fn advance(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid transition {} -> {}",
            self.phase,
            next
        );
        tracing::trace!(from = %self.phase, to = %next, "Run phase transition");
        self.phase = next;
        self.history.push(next);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a finished run has to say about itself.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub phase_reached: RunPhase,
    pub transitions: Vec<RunPhase>,
    pub tool_outcome: Option<ToolOutcome>,
    /// The error that ended the run, or the recoverable tool failure.
    pub failure: Option<KeyrunError>,
    pub cleanup: CleanupOutcome,
}

impl RunReport {
    pub fn tool_invoked(&self) -> bool {
        self.tool_outcome.is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && !self.cleanup.is_failure()
    }

    /// Exit code for the wrapper process. Outside strict mode a completed
    /// lifecycle always exits 0; failures were already reported.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if !strict {
            return 0;
        }
        if let Some(failure) = &self.failure {
            return failure.classify().exit_code;
        }
        match &self.cleanup {
            CleanupOutcome::Failed(e) => e.classify().exit_code,
            _ => 0,
        }
    }
}
