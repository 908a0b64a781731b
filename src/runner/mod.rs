pub mod check;
pub mod events;
pub mod guard;
pub mod state;
pub mod tool;

pub use check::{check, CheckReport};
pub use events::{discard_events, EventSink, RunEvent};
pub use guard::{CleanupOutcome, TempConfigGuard};
pub use state::{RunPhase, RunReport, RunState};
pub use tool::{CommandTool, EvalTool, ToolOutcome};

use chrono::Utc;
use std::time::Instant;

use crate::config::credentials::load_credential;
use crate::config::inject::{materialize, read_source_config};
use crate::config::{redact_credentials, Credential, RunnerConfig};
use crate::errors::KeyrunError;
use tracing::{error, info, warn};

/// Drives one credential-injected evaluation:
/// extract credential, materialize the temp config, invoke the tool, clean up.
pub struct Runner<T: EvalTool> {
    config: RunnerConfig,
    tool: T,
    events: EventSink,
}

impl<T: EvalTool> Runner<T> {
    pub fn new(config: RunnerConfig, tool: T) -> Self {
        Self { config, tool, events: discard_events() }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    fn emit(&self, event: RunEvent) {
        (self.events)(&event);
    }

    /// Run the full lifecycle. Never returns early: every failure is logged,
    /// recorded in the report, and followed by cleanup.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut state = RunState::new();
        let mut credential = None;

        let guard = TempConfigGuard::new(&self.config.temp_config);
        let result = self.execute(&mut state, &guard, &mut credential).await;
        let phase_reached = state.last_working_phase();
        state.advance(RunPhase::CleaningUp);

        let secrets: Vec<&str> = credential.iter().map(Credential::expose).collect();
        let (tool_outcome, failure) = match result {
            Ok(outcome) => {
                self.report_outcome(outcome);
                (Some(outcome), outcome.as_failure())
            }
            Err(e) => {
                let class = e.classify();
                let message = redact_credentials(&e.to_string(), &secrets);
                if class.recoverable {
                    warn!(phase = %phase_reached, error_type = class.error_type, error = %message, "Run stopped");
                } else {
                    error!(phase = %phase_reached, error_type = class.error_type, error = %message, "Run failed");
                }
                self.emit(RunEvent::RunFailed { error_type: class.error_type, message });
                (None, Some(e))
            }
        };

        let cleanup = guard.cleanup().await;
        match &cleanup {
            CleanupOutcome::Removed => {
                info!(path = %self.config.temp_config.display(), "Temporary config deleted");
                self.emit(RunEvent::CleanupRemoved { temp_config: self.config.temp_config.clone() });
            }
            CleanupOutcome::NothingToRemove => {}
            CleanupOutcome::Failed(e) => {
                self.emit(RunEvent::CleanupFailed {
                    temp_config: self.config.temp_config.clone(),
                    message: redact_credentials(&e.to_string(), &secrets),
                });
            }
        }
        state.advance(RunPhase::Done);

        RunReport {
            started_at,
            elapsed: clock.elapsed(),
            phase_reached,
            transitions: state.history().to_vec(),
            tool_outcome,
            failure,
            cleanup,
        }
    }

    async fn execute(
        &self,
        state: &mut RunState,
        guard: &TempConfigGuard,
        credential: &mut Option<Credential>,
    ) -> Result<ToolOutcome, KeyrunError> {
        let config = &self.config;

        state.advance(RunPhase::ExtractingCredential);
        let loaded = credential.insert(load_credential(&config.env_file, &config.key_name).await?);
        info!(env_file = %config.env_file.display(), key = %config.key_name, "Loaded API key");
        self.emit(RunEvent::CredentialLoaded {
            env_file: config.env_file.clone(),
            key_name: config.key_name.clone(),
        });

        state.advance(RunPhase::MaterializingConfig);
        let source = read_source_config(&config.source_config).await?;
        let materialized = materialize(&source, &config.placeholder, loaded);
        if materialized.replacements == 0 {
            warn!(
                config = %config.source_config.display(),
                placeholder = %config.placeholder,
                "Placeholder not found; config is used unchanged"
            );
            self.emit(RunEvent::PlaceholderMissing {
                source_config: config.source_config.clone(),
                placeholder: config.placeholder.clone(),
            });
        }
        guard.write(&materialized.text).await?;
        info!(path = %guard.path().display(), replacements = materialized.replacements, "Generated temporary config");
        self.emit(RunEvent::ConfigMaterialized {
            temp_config: guard.path().to_path_buf(),
            replacements: materialized.replacements,
        });

        state.advance(RunPhase::Invoking);
        let command = self.tool.describe(guard.path());
        info!(command = %command, "Running evaluation");
        self.emit(RunEvent::ToolStarting { command });
        self.tool.invoke(guard.path()).await
    }

    fn report_outcome(&self, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::Passed => {
                info!("Evaluation completed");
                self.emit(RunEvent::ToolPassed);
            }
            ToolOutcome::Failed { code } => {
                warn!(exit_code = ?code, "Evaluation finished with some failures");
                self.emit(RunEvent::ToolFailed { code });
            }
            ToolOutcome::Interrupted => {
                warn!("Evaluation interrupted");
                self.emit(RunEvent::ToolInterrupted);
            }
        }
    }
}
