use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use crate::config::RunnerConfig;
use crate::errors::KeyrunError;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum ToolOutcome {
    Passed,
    /// Non-zero exit; `None` when the process was killed by a signal.
    Failed { code: Option<i32> },
    Interrupted,
}

impl ToolOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            Self::Passed
        } else {
            Self::Failed { code: status.code() }
        }
    }

    /// The recoverable error this outcome is reported as, if any.
    pub fn as_failure(&self) -> Option<KeyrunError> {
        match self {
            Self::Passed => None,
            Self::Failed { code } => Some(KeyrunError::ExternalTool { code: *code }),
            Self::Interrupted => Some(KeyrunError::Interrupted),
        }
    }
}

/// The external evaluation tool, invoked against a materialized config.
#[async_trait]
pub trait EvalTool: Send + Sync {
    /// Human-readable command line, for status output.
    fn describe(&self, config_path: &Path) -> String;

    /// Run the tool to completion against `config_path`.
    async fn invoke(&self, config_path: &Path) -> Result<ToolOutcome, KeyrunError>;
}

/// Runs a local command with inherited stdio, e.g.
/// `npx promptfoo@0.60.0 eval --no-cache --config <path>`.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: String,
    base_args: Vec<String>,
    no_cache: bool,
    extra_args: Vec<String>,
}

impl CommandTool {
    pub fn new(command: &[String], no_cache: bool, extra_args: &[String]) -> Self {
        let (program, base_args) = match command.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self {
            program,
            base_args,
            no_cache,
            extra_args: extra_args.to_vec(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(&config.command, config.no_cache, &config.extra_args)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self, config_path: &Path) -> Vec<String> {
        let mut args = self.base_args.clone();
        if self.no_cache {
            args.push("--no-cache".to_string());
        }
        args.push("--config".to_string());
        args.push(config_path.display().to_string());
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl EvalTool for CommandTool {
    fn describe(&self, config_path: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args(config_path));
        parts.join(" ")
    }

    async fn invoke(&self, config_path: &Path) -> Result<ToolOutcome, KeyrunError> {
        let args = self.args(config_path);
        debug!(program = %self.program, args = ?args, "Spawning evaluation tool");

        let mut child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| KeyrunError::ToolLaunch {
                program: self.program.clone(),
                source,
            })?;

        // Ctrl-C reaches the child through the process group; keep waiting
        // for it so cleanup runs after it exits.
        let mut interrupted = false;
        let wait = child.wait();
        tokio::pin!(wait);
        let status = loop {
            tokio::select! {
                status = &mut wait => break status?,
                _ = tokio::signal::ctrl_c() => {
                    if !interrupted {
                        warn!("Interrupt received, waiting for the evaluation to exit before cleanup");
                    }
                    interrupted = true;
                }
            }
        };

        if interrupted {
            return Ok(ToolOutcome::Interrupted);
        }
        Ok(ToolOutcome::from_status(status))
    }
}
