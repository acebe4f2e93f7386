//! JSON export and import of quote lists.
//!
//! Exports are pretty-printed arrays in the same shape the store persists.
//! Imports accept any such array and are appended as-is by the caller.

use std::fs;
use std::path::Path;

use crate::error::{QuoteError, QuoteResult};
use crate::models::{Quote, QuoteList};
use crate::validation::validate_timestamp;

/// Default file name offered for exports
pub const DEFAULT_EXPORT_FILE_NAME: &str = "quotes.json";

/// Serialize a list as a pretty-printed JSON document
pub fn export_json(quotes: &[Quote]) -> QuoteResult<String> {
    Ok(serde_json::to_string_pretty(quotes)?)
}

/// Write an export document to `path`
pub fn export_to_file(quotes: &[Quote], path: &Path) -> QuoteResult<()> {
    let json = export_json(quotes)?;
    fs::write(path, json)?;
    tracing::info!("Exported {} quotes to {}", quotes.len(), path.display());
    Ok(())
}

/// Parse an imported JSON document.
///
/// Every record needs string `text` and `category` fields, and a timestamp
/// when present must be RFC 3339. Duplicates are kept.
pub fn parse_import(content: &str) -> QuoteResult<QuoteList> {
    let quotes = serde_json::from_str::<QuoteList>(content).map_err(|e| {
        tracing::warn!("Rejected import document: {}", e);
        QuoteError::import_parse(e.to_string())
    })?;

    for (index, quote) in quotes.iter().enumerate() {
        if let Some(timestamp) = &quote.timestamp {
            validate_timestamp(timestamp, "timestamp").map_err(|e| {
                tracing::warn!("Rejected import record {}: {}", index, e);
                QuoteError::import_parse(format!("record {}: {}", index, e))
            })?;
        }
    }

    Ok(quotes)
}

/// Read and parse an import document from `path`
pub fn import_from_file(path: &Path) -> QuoteResult<QuoteList> {
    let content = fs::read_to_string(path)?;
    parse_import(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteId;
    use crate::storage::SqliteStore;
    use crate::store::QuoteStore;
    use tempfile::TempDir;

    #[test]
    fn test_export_is_pretty_array() {
        let json = export_json(&[Quote::new("A", "X")]).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("  {"));
        assert!(json.contains("\"text\": \"A\""));
    }

    #[test]
    fn test_export_empty_list() {
        assert_eq!(export_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_parse_import_keeps_optional_fields() {
        let quotes = parse_import(
            r#"[{"text":"A","category":"X"},{"id":3,"text":"B","category":"Y","timestamp":"2025-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].id, Some(QuoteId::Number(3)));
    }

    #[test]
    fn test_parse_import_rejects_malformed() {
        assert!(matches!(parse_import("{oops"), Err(QuoteError::ImportParse(_))));
        assert!(matches!(parse_import(r#"{"text":"A"}"#), Err(QuoteError::ImportParse(_))));
        assert!(matches!(
            parse_import(r#"[{"text":"A"}]"#),
            Err(QuoteError::ImportParse(_))
        ));
    }

    #[test]
    fn test_parse_import_rejects_bad_timestamp() {
        let result = parse_import(
            r#"[{"text":"A","category":"X"},{"text":"B","category":"Y","timestamp":"yesterday"}]"#,
        );
        match result {
            Err(QuoteError::ImportParse(message)) => assert!(message.starts_with("record 1:")),
            other => panic!("expected import parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_export_then_import_appends_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(DEFAULT_EXPORT_FILE_NAME);

        let mut store = QuoteStore::open(Box::new(SqliteStore::new_in_memory().unwrap())).unwrap();
        let original = store.len();
        export_to_file(store.quotes(), &file).unwrap();

        let imported = import_from_file(&file).unwrap();
        store.import(imported).unwrap();

        assert_eq!(store.len(), original * 2);
        assert_eq!(store.quotes()[..original], store.quotes()[original..]);
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = import_from_file(&temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(QuoteError::Io(_))));
    }
}
