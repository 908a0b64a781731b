use serde::Serialize;
use std::path::PathBuf;

use crate::config::credentials::load_credential;
use crate::config::inject::read_source_config;
use crate::config::RunnerConfig;

/// Dry-run diagnostics: what a run would find, without writing the temp
/// file or starting the tool.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub env_file: PathBuf,
    pub key_name: String,
    pub credential_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_error: Option<String>,
    pub source_config: PathBuf,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_occurrences: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
    pub temp_config: PathBuf,
    pub stale_temp_config: bool,
}

impl CheckReport {
    /// Ready means a run would reach the tool with the key injected.
    pub fn is_ready(&self) -> bool {
        self.credential_found && self.placeholder_occurrences.map_or(false, |n| n > 0)
    }
}

pub async fn check(config: &RunnerConfig) -> CheckReport {
    let (credential_found, credential_hint, credential_error) =
        match load_credential(&config.env_file, &config.key_name).await {
            Ok(credential) => (true, Some(credential.masked()), None),
            Err(e) => (false, None, Some(e.to_string())),
        };

    let (placeholder_occurrences, config_error) = match read_source_config(&config.source_config).await {
        Ok(source) => (Some(source.matches(config.placeholder.as_str()).count()), None),
        Err(e) => (None, Some(e.to_string())),
    };

    CheckReport {
        env_file: config.env_file.clone(),
        key_name: config.key_name.clone(),
        credential_found,
        credential_hint,
        credential_error,
        source_config: config.source_config.clone(),
        placeholder: config.placeholder.clone(),
        placeholder_occurrences,
        config_error,
        temp_config: config.temp_config.clone(),
        stale_temp_config: config.temp_config.exists(),
    }
}
