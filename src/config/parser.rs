use std::path::Path;
use crate::errors::KeyrunError;
use super::types::{RunnerSettings, DEFAULT_SETTINGS_FILE};
use tracing::debug;

const MAX_SETTINGS_BYTES: u64 = 65_536;

pub async fn parse_settings(path: &Path) -> Result<RunnerSettings, KeyrunError> {
    if !path.exists() {
        return Err(KeyrunError::Settings(format!("Settings file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_SETTINGS_BYTES {
        return Err(KeyrunError::Settings("Settings file exceeds 64KB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(RunnerSettings::default());
    }

    let settings: RunnerSettings = serde_yaml::from_str(&content)?;
    debug!(path = %path.display(), "Loaded runner settings");
    Ok(settings)
}

/// Load the settings layer. An explicit path must exist; otherwise
/// `keyrun.yaml` in `dir` is used when present.
pub async fn load_settings(explicit: Option<&Path>, dir: &Path) -> Result<RunnerSettings, KeyrunError> {
    match explicit {
        Some(path) => parse_settings(path).await,
        None => {
            let fallback = dir.join(DEFAULT_SETTINGS_FILE);
            if fallback.is_file() {
                parse_settings(&fallback).await
            } else {
                Ok(RunnerSettings::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_parse_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyrun.yaml");
        std::fs::write(
            &path,
            "env_file: secrets/.env\nkey_name: OPENAI_API_KEY\ncommand: [promptfoo, eval]\nno_cache: false\n",
        )
        .unwrap();

        let settings = parse_settings(&path).await.unwrap();
        assert_eq!(settings.env_file, Some(PathBuf::from("secrets/.env")));
        assert_eq!(settings.key_name.as_deref(), Some("OPENAI_API_KEY"));
        assert_eq!(settings.command, Some(vec!["promptfoo".to_string(), "eval".to_string()]));
        assert_eq!(settings.no_cache, Some(false));
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyrun.yaml");
        std::fs::write(&path, "api_key: sk-should-not-live-here\n").unwrap();
        assert!(matches!(parse_settings(&path).await, Err(KeyrunError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_missing_explicit_settings_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let result = load_settings(Some(&missing), dir.path()).await;
        assert!(matches!(result, Err(KeyrunError::Settings(_))));
    }

    #[tokio::test]
    async fn test_default_settings_file_optional() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings(None, dir.path()).await.unwrap();
        assert_eq!(settings, RunnerSettings::default());
    }

    #[tokio::test]
    async fn test_default_settings_file_picked_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_SETTINGS_FILE), "temp_config: scratch.yaml\n").unwrap();
        let settings = load_settings(None, dir.path()).await.unwrap();
        assert_eq!(settings.temp_config, Some(PathBuf::from("scratch.yaml")));
    }

    #[tokio::test]
    async fn test_empty_settings_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyrun.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(parse_settings(&path).await.unwrap(), RunnerSettings::default());
    }
}
