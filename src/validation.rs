//! Input validation for quotekeeper.
//!
//! All validators return QuoteError::Validation on failure.

use chrono::DateTime;

use crate::error::{QuoteError, QuoteResult};

pub const MAX_QUOTE_TEXT_LENGTH: usize = 10_000;
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// Filter value selecting every category
pub const ALL_CATEGORIES: &str = "all";

/// Validate quote text, returning the trimmed value.
pub fn validate_quote_text(text: &str) -> QuoteResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(QuoteError::validation("text", "quote text is required"));
    }
    if trimmed.chars().count() > MAX_QUOTE_TEXT_LENGTH {
        return Err(QuoteError::validation(
            "text",
            format!("quote text exceeds maximum length of {} characters", MAX_QUOTE_TEXT_LENGTH),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a category name, returning the trimmed value.
pub fn validate_category(category: &str) -> QuoteResult<String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(QuoteError::validation("category", "category is required"));
    }
    if trimmed.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(QuoteError::validation(
            "category",
            format!("category exceeds maximum length of {} characters", MAX_CATEGORY_LENGTH),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a category filter. `"all"` is always accepted.
pub fn validate_filter(filter: &str) -> QuoteResult<String> {
    if filter.trim() == ALL_CATEGORIES {
        return Ok(ALL_CATEGORIES.to_string());
    }
    validate_category(filter).map_err(|_| QuoteError::validation("filter", "invalid category filter"))
}

/// Validate an RFC 3339 timestamp string.
pub fn validate_timestamp(value: &str, field_name: &str) -> QuoteResult<()> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|e| QuoteError::validation(field_name, format!("invalid RFC 3339 timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(validate_quote_text("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(validate_quote_text("").is_err());
        assert!(validate_quote_text(" \t\n").is_err());
    }

    #[test]
    fn test_long_text_rejected() {
        let long = "x".repeat(MAX_QUOTE_TEXT_LENGTH + 1);
        assert!(validate_quote_text(&long).is_err());
    }

    #[test]
    fn test_category_rules() {
        assert_eq!(validate_category(" Life ").unwrap(), "Life");
        assert!(validate_category("   ").is_err());
        assert!(validate_category(&"c".repeat(MAX_CATEGORY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_filter_accepts_all() {
        assert_eq!(validate_filter("all").unwrap(), "all");
        assert_eq!(validate_filter("Life").unwrap(), "Life");
        let err = validate_filter("").unwrap_err();
        assert!(matches!(err, QuoteError::Validation { ref field, .. } if field == "filter"));
    }

    #[test]
    fn test_timestamp() {
        assert!(validate_timestamp("2025-01-01T00:00:00Z", "ts").is_ok());
        assert!(validate_timestamp("2025-01-01 00:00:00", "ts").is_err());
    }
}
