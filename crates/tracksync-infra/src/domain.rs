//! Domain file loader.

use std::path::Path;

use tracksync_types::domain::Domain;
use tracksync_types::error::DomainError;

/// Parse the slot definitions of the `domain.yml` at `path`.
pub async fn load_domain(path: &Path) -> Result<Domain, DomainError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::Io(format!("{}: {e}", path.display())))?;
    let domain = parse_domain(&content)?;
    tracing::debug!(path = %path.display(), slots = domain.slots.len(), "Loaded domain");
    Ok(domain)
}

/// Parse domain YAML. An empty document is an empty domain.
pub fn parse_domain(content: &str) -> Result<Domain, DomainError> {
    if content.trim().is_empty() {
        return Ok(Domain::default());
    }
    serde_yaml_ng::from_str(content).map_err(|e| DomainError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOMAIN: &str = r#"
intents:
  - greet
slots:
  city:
    type: text
    initial_value: Oulu
  confirmed:
    type: bool
responses:
  utter_greet:
    - text: Hei!
"#;

    #[test]
    fn parse_reads_slots_and_ignores_other_sections() {
        let domain = parse_domain(DOMAIN).unwrap();

        assert_eq!(domain.slots.len(), 2);
        assert_eq!(domain.slots["city"].slot_type.as_deref(), Some("text"));
        assert_eq!(domain.slots["city"].initial_value, "Oulu");
        assert!(domain.slots["confirmed"].initial_value.is_null());
    }

    #[test]
    fn parse_empty_document_is_empty_domain() {
        assert_eq!(parse_domain("").unwrap(), Domain::default());
    }

    #[test]
    fn parse_rejects_malformed_yaml() {
        let err = parse_domain("slots: [unclosed").unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
    }

    #[tokio::test]
    async fn load_domain_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("domain.yml");
        tokio::fs::write(&path, DOMAIN).await.unwrap();

        let domain = load_domain(&path).await.unwrap();
        assert!(domain.has_slot("city"));
    }

    #[tokio::test]
    async fn load_domain_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_domain(&tmp.path().join("missing.yml")).await.unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
    }
}
