//! Data models for notes, tags, and their API shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned note identity.
pub type NoteId = i64;

/// Store-assigned tag identity.
pub type TagId = i64;

// =============================================================================
// STORED RECORDS
// =============================================================================

/// A note row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tag row. `name` is always normalized (trimmed, lower-case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// Display color, `#rgb` or `#rrggbb`. Never set by reconciliation.
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// RESPONSE SHAPES
// =============================================================================

/// A note with its tags inlined, the shape every note endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithTags {
    #[serde(flatten)]
    pub note: Note,
    /// Sorted by name
    pub tags: Vec<Tag>,
}

impl NoteWithTags {
    /// Normalized names of the attached tags.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A tag together with the number of notes carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    #[serde(flatten)]
    pub tag: Tag,
    /// Number of notes with this tag (computed)
    #[serde(default)]
    pub note_count: i64,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request for creating a note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request for updating a note.
///
/// `tags: None` leaves the note's tags alone; `Some(vec![])` clears them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Ordering of note listings by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this order.
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Request for listing notes. No pagination.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    /// Only notes carrying this normalized tag name
    pub tag: Option<String>,
    pub order: SortOrder,
}
