use std::path::PathBuf;
use std::sync::Arc;

/// Progress notifications emitted by [`super::Runner`] as a run moves
/// through its phases. Never carries the credential.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    CredentialLoaded { env_file: PathBuf, key_name: String },
    PlaceholderMissing { source_config: PathBuf, placeholder: String },
    ConfigMaterialized { temp_config: PathBuf, replacements: usize },
    ToolStarting { command: String },
    ToolPassed,
    ToolFailed { code: Option<i32> },
    ToolInterrupted,
    RunFailed { error_type: &'static str, message: String },
    CleanupRemoved { temp_config: PathBuf },
    CleanupFailed { temp_config: PathBuf, message: String },
}

pub type EventSink = Arc<dyn Fn(&RunEvent) + Send + Sync>;

pub fn discard_events() -> EventSink {
    Arc::new(|_| {})
}
