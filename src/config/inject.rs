use std::fmt;
use std::path::Path;
use crate::errors::KeyrunError;
use super::credentials::Credential;

/// Source config with the placeholder replaced. Holds the raw secret, so
/// `Debug` only reports sizes.
pub struct Materialized {
    pub text: String,
    pub replacements: usize,
}

impl fmt::Debug for Materialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materialized")
            .field("len", &self.text.len())
            .field("replacements", &self.replacements)
            .finish()
    }
}

/// Render `value` as a YAML double-quoted scalar.
pub fn quote_yaml_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Replace every literal occurrence of `placeholder` with the quoted
/// credential. Text without the placeholder comes back unchanged.
pub fn materialize(source: &str, placeholder: &str, credential: &Credential) -> Materialized {
    if placeholder.is_empty() {
        return Materialized { text: source.to_string(), replacements: 0 };
    }

    let replacements = source.matches(placeholder).count();
    if replacements == 0 {
        return Materialized { text: source.to_string(), replacements };
    }

    let quoted = quote_yaml_string(credential.expose());
    Materialized {
        text: source.replace(placeholder, &quoted),
        replacements,
    }
}

pub async fn read_source_config(path: &Path) -> Result<String, KeyrunError> {
    tokio::fs::read_to_string(path).await.map_err(|source| KeyrunError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "process.env.GROQ_API_KEY";

    #[test]
    fn test_single_replacement() {
        let out = materialize("apiKey: process.env.GROQ_API_KEY", PLACEHOLDER, &Credential::new("abc123"));
        assert_eq!(out.text, "apiKey: \"abc123\"");
        assert_eq!(out.replacements, 1);
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let source = "providers:\n  - id: groq:a\n    config:\n      apiKey: process.env.GROQ_API_KEY\n  - id: groq:b\n    config:\n      apiKey: process.env.GROQ_API_KEY\n";
        let out = materialize(source, PLACEHOLDER, &Credential::new("k"));
        assert_eq!(out.replacements, 2);
        assert_eq!(out.text, source.replace(PLACEHOLDER, "\"k\""));
        assert!(!out.text.contains(PLACEHOLDER));
    }

    #[test]
    fn test_absent_placeholder_is_identity() {
        let source = "prompts:\n  - 'Hello {{name}}'\n";
        let out = materialize(source, PLACEHOLDER, &Credential::new("abc"));
        assert_eq!(out.text, source);
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn test_empty_placeholder_is_identity() {
        let out = materialize("abc", "", &Credential::new("x"));
        assert_eq!(out.text, "abc");
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn test_quotes_and_backslashes_escaped() {
        assert_eq!(quote_yaml_string(r#"a"b\c"#), r#""a\"b\\c""#);
        let yaml = format!("key: {}", quote_yaml_string(r#"a"b\c"#));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["key"].as_str(), Some(r#"a"b\c"#));
    }

    #[test]
    fn test_debug_hides_text() {
        let out = materialize("apiKey: process.env.GROQ_API_KEY", PLACEHOLDER, &Credential::new("topsecret"));
        assert!(!format!("{:?}", out).contains("topsecret"));
    }
}
