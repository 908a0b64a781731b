use super::types::KeyrunError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Recoverable errors are expected outcomes of a run (the tool reporting
    /// failing tests, an interrupt) and are logged as warnings.
    pub recoverable: bool,
    /// Process exit code used in strict mode.
    pub exit_code: i32,
}

impl KeyrunError {
    /// Classify this error to determine how it is reported and which exit
    /// code it maps to.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            KeyrunError::ExternalTool { .. } => ErrorClassification {
                error_type: "ExternalToolFailure",
                recoverable: true,
                exit_code: 1,
            },
            KeyrunError::Interrupted => ErrorClassification {
                error_type: "Interrupted",
                recoverable: true,
                exit_code: 130,
            },

            KeyrunError::CredentialNotFound { .. } => ErrorClassification {
                error_type: "CredentialNotFound",
                recoverable: false,
                exit_code: 2,
            },
            KeyrunError::ConfigRead { .. } => ErrorClassification {
                error_type: "ConfigReadFailure",
                recoverable: false,
                exit_code: 2,
            },
            KeyrunError::Settings(_) | KeyrunError::Yaml(_) => ErrorClassification {
                error_type: "SettingsError",
                recoverable: false,
                exit_code: 2,
            },
            KeyrunError::TempWrite { .. } => ErrorClassification {
                error_type: "TempWriteFailure",
                recoverable: false,
                exit_code: 2,
            },
            KeyrunError::ToolLaunch { .. } => ErrorClassification {
                error_type: "ToolLaunchFailure",
                recoverable: false,
                exit_code: 3,
            },
            KeyrunError::Cleanup { .. } => ErrorClassification {
                error_type: "CleanupFailure",
                recoverable: false,
                exit_code: 4,
            },
            KeyrunError::Io(_) => ErrorClassification {
                error_type: "IoError",
                recoverable: false,
                exit_code: 1,
            },
        }
    }
}
