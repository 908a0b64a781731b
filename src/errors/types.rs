use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyrunError {
    #[error("Could not find a valid {key} in {path}: {reason}")]
    CredentialNotFound {
        key: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write temporary config {path}: {source}")]
    TempWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch `{program}`: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Evaluation finished with failures ({})", describe_exit(.code))]
    ExternalTool { code: Option<i32> },

    #[error("Interrupted while the evaluation was running")]
    Interrupted,

    #[error("Failed to delete temporary config {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_message_includes_code() {
        let err = KeyrunError::ExternalTool { code: Some(100) };
        assert_eq!(err.to_string(), "Evaluation finished with failures (exit code 100)");
    }

    #[test]
    fn test_external_tool_message_signal() {
        let err = KeyrunError::ExternalTool { code: None };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_credential_not_found_names_key_and_file() {
        let err = KeyrunError::CredentialNotFound {
            key: "GROQ_API_KEY".into(),
            path: PathBuf::from(".env"),
            reason: "no matching line".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GROQ_API_KEY"));
        assert!(msg.contains(".env"));
    }
}
