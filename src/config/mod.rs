pub mod credentials;
pub mod inject;
pub mod parser;
pub mod types;

pub use types::*;
pub use credentials::{extract_credential, load_credential, Credential};
pub use inject::{materialize, Materialized};
pub use parser::load_settings;

/// Redact sensitive values in a string. Replaces every occurrence of a known
/// secret with [REDACTED].
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}
