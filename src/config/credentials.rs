use std::fmt;
use std::path::Path;
use crate::errors::KeyrunError;
use tracing::debug;

/// A secret value read from an environment file.
///
/// `Debug` and `Display` never print the value; use [`Credential::expose`]
/// at the single point where the raw secret is needed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// A short hint safe to show on a terminal, e.g. `gsk_****`.
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count >= 12 {
            let prefix: String = self.0.chars().take(4).collect();
            format!("{}**** ({} chars)", prefix, count)
        } else {
            format!("**** ({} chars)", count)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    NoMatchingLine,
    EmptyValue,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingLine => write!(f, "no matching line"),
            Self::EmptyValue => write!(f, "value is empty"),
        }
    }
}

/// Find `key_name` in dotenv-style text.
///
/// Blank lines and `#` comments are skipped. The first line containing
/// `KEY_NAME=` wins, even when its value is empty; the value is everything
/// after the line's first `=`, with surrounding quotes and whitespace
/// stripped.
pub fn extract_credential(content: &str, key_name: &str) -> Result<Credential, LookupFailure> {
    let marker = format!("{}=", key_name);

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if !trimmed.contains(&marker) {
            continue;
        }
        let Some((_, raw)) = trimmed.split_once('=') else {
            continue;
        };

        let value = strip_quotes(raw);
        if value.is_empty() {
            return Err(LookupFailure::EmptyValue);
        }
        return Ok(Credential::new(value));
    }

    Err(LookupFailure::NoMatchingLine)
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
}

/// Read `path` and extract `key_name` from it. A missing or unreadable file
/// is reported the same way as a missing key.
pub async fn load_credential(path: &Path, key_name: &str) -> Result<Credential, KeyrunError> {
    let not_found = |reason: String| KeyrunError::CredentialNotFound {
        key: key_name.to_string(),
        path: path.to_path_buf(),
        reason,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| not_found(format!("cannot read file ({})", e)))?;

    let credential = extract_credential(&content, key_name).map_err(|e| not_found(e.to_string()))?;
    debug!(path = %path.display(), key = %key_name, "Extracted credential");
    Ok(credential)
}
