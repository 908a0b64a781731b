use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::errors::KeyrunError;

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_SOURCE_CONFIG: &str = "promptfooconfig.yaml";
pub const DEFAULT_TEMP_CONFIG: &str = "temp_promptfooconfig.yaml";
pub const DEFAULT_KEY_NAME: &str = "GROQ_API_KEY";
pub const DEFAULT_SETTINGS_FILE: &str = "keyrun.yaml";
pub const DEFAULT_COMMAND: &[&str] = &["npx", "promptfoo@0.60.0", "eval"];

/// Partial runner settings, as found in a `keyrun.yaml` file or built from
/// command-line flags. Every field is optional; unset fields fall through to
/// the next layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    pub env_file: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub temp_config: Option<PathBuf>,
    pub key_name: Option<String>,
    pub placeholder: Option<String>,
    pub command: Option<Vec<String>>,
    pub no_cache: Option<bool>,
    pub extra_args: Option<Vec<String>>,
}

impl RunnerSettings {
    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: RunnerSettings) -> RunnerSettings {
        RunnerSettings {
            env_file: overrides.env_file.or(self.env_file),
            config: overrides.config.or(self.config),
            temp_config: overrides.temp_config.or(self.temp_config),
            key_name: overrides.key_name.or(self.key_name),
            placeholder: overrides.placeholder.or(self.placeholder),
            command: overrides.command.or(self.command),
            no_cache: overrides.no_cache.or(self.no_cache),
            extra_args: overrides.extra_args.or(self.extra_args),
        }
    }
}

/// Fully resolved configuration for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub env_file: PathBuf,
    pub source_config: PathBuf,
    pub temp_config: PathBuf,
    pub key_name: String,
    pub placeholder: String,
    pub command: Vec<String>,
    pub no_cache: bool,
    pub extra_args: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
            source_config: PathBuf::from(DEFAULT_SOURCE_CONFIG),
            temp_config: PathBuf::from(DEFAULT_TEMP_CONFIG),
            key_name: DEFAULT_KEY_NAME.to_string(),
            placeholder: placeholder_for(DEFAULT_KEY_NAME),
            command: DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect(),
            no_cache: true,
            extra_args: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Resolve settings against the built-in defaults and validate the result.
    ///
    /// When only the key name is overridden, the placeholder follows it
    /// (`process.env.<KEY>`).
    pub fn from_settings(settings: RunnerSettings) -> Result<Self, KeyrunError> {
        let defaults = RunnerConfig::default();
        let key_name = settings.key_name.unwrap_or(defaults.key_name);
        let placeholder = settings
            .placeholder
            .unwrap_or_else(|| placeholder_for(&key_name));

        let config = RunnerConfig {
            env_file: settings.env_file.unwrap_or(defaults.env_file),
            source_config: settings.config.unwrap_or(defaults.source_config),
            temp_config: settings.temp_config.unwrap_or(defaults.temp_config),
            key_name,
            placeholder,
            command: settings.command.unwrap_or(defaults.command),
            no_cache: settings.no_cache.unwrap_or(defaults.no_cache),
            extra_args: settings.extra_args.unwrap_or(defaults.extra_args),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), KeyrunError> {
        if self.key_name.trim().is_empty() || self.key_name.contains('=') {
            return Err(KeyrunError::Settings(format!(
                "Invalid key name '{}'",
                self.key_name
            )));
        }
        if self.placeholder.is_empty() {
            return Err(KeyrunError::Settings("Placeholder token must not be empty".into()));
        }
        if self.command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(KeyrunError::Settings("Evaluation command must not be empty".into()));
        }
        // The temp file is deleted after every run, so it must never alias an input.
        if same_file(&self.temp_config, &self.source_config) || same_file(&self.temp_config, &self.env_file) {
            return Err(KeyrunError::Settings(format!(
                "Temporary config path {} collides with an input file",
                self.temp_config.display()
            )));
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` folded and the parent directory
/// canonicalized when it exists, so aliases of one file compare equal.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    match (lexical.parent(), lexical.file_name()) {
        (Some(parent), Some(name)) => match std::fs::canonicalize(parent) {
            Ok(parent) => parent.join(name),
            Err(_) => lexical,
        },
        _ => lexical,
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if normalize_path(a) == normalize_path(b) {
        return true;
    }
    // Hard links and symlinked files only show up through the inode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let (Ok(ma), Ok(mb)) = (std::fs::metadata(a), std::fs::metadata(b)) {
            return ma.dev() == mb.dev() && ma.ino() == mb.ino();
        }
    }
    false
}

pub fn placeholder_for(key_name: &str) -> String {
    format!("process.env.{}", key_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_promptfoo_layout() {
        let config = RunnerConfig::default();
        assert_eq!(config.env_file, PathBuf::from(".env"));
        assert_eq!(config.source_config, PathBuf::from("promptfooconfig.yaml"));
        assert_eq!(config.temp_config, PathBuf::from("temp_promptfooconfig.yaml"));
        assert_eq!(config.placeholder, "process.env.GROQ_API_KEY");
        assert!(config.no_cache);
    }

    #[test]
    fn test_merge_overrides_win() {
        let file = RunnerSettings {
            env_file: Some(PathBuf::from("file.env")),
            key_name: Some("FILE_KEY".into()),
            ..Default::default()
        };
        let cli = RunnerSettings {
            env_file: Some(PathBuf::from("cli.env")),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.env_file, Some(PathBuf::from("cli.env")));
        assert_eq!(merged.key_name.as_deref(), Some("FILE_KEY"));
    }

    #[test]
    fn test_placeholder_follows_key_name() {
        let config = RunnerConfig::from_settings(RunnerSettings {
            key_name: Some("OPENAI_API_KEY".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.placeholder, "process.env.OPENAI_API_KEY");
    }

    #[test]
    fn test_explicit_placeholder_kept() {
        let config = RunnerConfig::from_settings(RunnerSettings {
            key_name: Some("OPENAI_API_KEY".into()),
            placeholder: Some("{{API_KEY}}".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.placeholder, "{{API_KEY}}");
    }

    #[test]
    fn test_temp_path_must_not_alias_source() {
        let result = RunnerConfig::from_settings(RunnerSettings {
            temp_config: Some(PathBuf::from("promptfooconfig.yaml")),
            ..Default::default()
        });
        assert!(matches!(result, Err(KeyrunError::Settings(_))));
    }

    #[test]
    fn test_temp_path_alias_through_parent_dir_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("promptfooconfig.yaml");
        std::fs::write(&source, "apiKey: process.env.GROQ_API_KEY").unwrap();

        let result = RunnerConfig::from_settings(RunnerSettings {
            config: Some(source.clone()),
            temp_config: Some(dir.path().join("sub").join("..").join("promptfooconfig.yaml")),
            ..Default::default()
        });
        assert!(matches!(result, Err(KeyrunError::Settings(_))));
        assert!(source.exists());
    }

    #[test]
    fn test_temp_path_with_leading_dot_rejected() {
        let result = RunnerConfig::from_settings(RunnerSettings {
            temp_config: Some(PathBuf::from("./promptfooconfig.yaml")),
            ..Default::default()
        });
        assert!(matches!(result, Err(KeyrunError::Settings(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_path_symlink_to_env_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = dir.path().join(".env");
        std::fs::write(&env, "GROQ_API_KEY=abc").unwrap();
        let link = dir.path().join("temp.yaml");
        std::os::unix::fs::symlink(&env, &link).unwrap();

        let result = RunnerConfig::from_settings(RunnerSettings {
            env_file: Some(env),
            temp_config: Some(link),
            ..Default::default()
        });
        assert!(matches!(result, Err(KeyrunError::Settings(_))));
    }

    #[test]
    fn test_distinct_temp_path_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = RunnerConfig::from_settings(RunnerSettings {
            config: Some(dir.path().join("promptfooconfig.yaml")),
            temp_config: Some(dir.path().join("sub").join("..").join("temp_promptfooconfig.yaml")),
            ..Default::default()
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_command_rejected() {
        let result = RunnerConfig::from_settings(RunnerSettings {
            command: Some(vec![]),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_key_name_with_equals_rejected() {
        let result = RunnerConfig::from_settings(RunnerSettings {
            key_name: Some("A=B".into()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
