//! Tag name normalization and validation.
//!
//! A tag is identified by its normalized name: surrounding whitespace trimmed,
//! then lower-cased. `"  Work "` and `"work"` are the same tag.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Maximum length of a normalized tag name, in characters.
pub const MAX_TAG_NAME_LEN: usize = 100;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid color regex"));

/// Normalize a raw tag name.
///
/// Returns `None` for empty or whitespace-only input; callers skip those.
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalize a list of raw names into the desired tag set.
///
/// Blank names are dropped and duplicates collapse, so order and repetition in
/// the input do not matter.
pub fn normalize_tag_names<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|name| normalize_tag_name(name.as_ref()))
        .collect()
}

/// Validate an already-normalized tag name.
pub fn validate_tag_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("Tag name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "Tag name must be {} characters or less",
            MAX_TAG_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidInput(
            "Tag name cannot contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate a tag display color (`#rgb` or `#rrggbb`).
pub fn validate_color(color: &str) -> Result<()> {
    if COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid color '{}': expected #rgb or #rrggbb",
            color
        )))
    }
}
