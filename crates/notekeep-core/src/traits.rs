//! Store traits.
//!
//! Writes happen inside a unit of work ([`StoreTx`]) so a note's fields and its
//! tag associations commit together. Reads go straight through [`Store`].

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of an insert that may collide with a unique constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome<T> {
    /// The row was inserted.
    Created(T),
    /// A row with the same unique key already exists (possibly just created by
    /// a concurrent writer).
    AlreadyExists,
}

/// Result of associating a tag with a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyExists,
}

// =============================================================================
// UNIT OF WORK TRAITS
// =============================================================================

/// Tag lookups and creation.
#[async_trait]
pub trait TagStore: Send {
    /// Find a tag by its normalized name.
    async fn find_tag_by_name(&mut self, name: &str) -> Result<Option<Tag>>;

    /// Create a tag with a normalized name.
    ///
    /// Returns [`CreateOutcome::AlreadyExists`] when the name is taken instead
    /// of surfacing the uniqueness violation.
    async fn create_tag(&mut self, name: &str) -> Result<CreateOutcome<Tag>>;
}

/// Note↔tag association operations.
#[async_trait]
pub trait AssociationStore: Send {
    /// Tag ids currently associated with a note.
    async fn tag_ids_for_note(&mut self, note_id: NoteId) -> Result<BTreeSet<TagId>>;

    /// Associate a tag with a note.
    async fn link(&mut self, note_id: NoteId, tag_id: TagId) -> Result<LinkOutcome>;

    /// Remove one association. Removing a missing association is a no-op.
    async fn unlink(&mut self, note_id: NoteId, tag_id: TagId) -> Result<()>;

    /// Remove every association of a note, returning how many were removed.
    async fn unlink_all(&mut self, note_id: NoteId) -> Result<u64>;
}

/// Note writes.
#[async_trait]
pub trait NoteStore: Send {
    /// Insert a note and return the stored row.
    async fn insert_note(&mut self, title: &str, content: Option<&str>) -> Result<Note>;

    /// Overwrite title and content. Errors with `NoteNotFound` if missing.
    async fn update_note(
        &mut self,
        id: NoteId,
        title: &str,
        content: Option<&str>,
    ) -> Result<Note>;

    /// Lock the note row for the rest of the unit of work.
    /// Errors with `NoteNotFound` if missing.
    async fn lock_note(&mut self, id: NoteId) -> Result<()>;

    /// Delete a note and, with it, all of its associations.
    /// Errors with `NoteNotFound` if missing.
    async fn delete_note(&mut self, id: NoteId) -> Result<()>;
}

/// A unit of work over the store.
///
/// Dropping it without calling [`StoreTx::commit`] discards its writes.
#[async_trait]
pub trait StoreTx: TagStore + AssociationStore + NoteStore {
    async fn commit(self: Box<Self>) -> Result<()>;
}

// =============================================================================
// STORE HANDLE
// =============================================================================

/// Process-wide store handle, created once at startup and shared by all
/// requests.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;

    /// Fetch a note with its tags.
    async fn fetch_note(&self, id: NoteId) -> Result<NoteWithTags>;

    /// List notes with their tags.
    async fn list_notes(&self, req: ListNotesRequest) -> Result<Vec<NoteWithTags>>;

    /// List all tags with usage counts, ordered by name.
    async fn list_tags(&self) -> Result<Vec<TagSummary>>;

    /// Tags whose name contains `fragment` (case-insensitive), ordered by name.
    async fn search_tags(&self, fragment: &str, limit: i64) -> Result<Vec<Tag>>;

    /// Set or clear a tag's display color. Errors with `TagNotFound`.
    async fn update_tag_color(&self, id: TagId, color: Option<&str>) -> Result<Tag>;

    /// Round-trip to the store.
    async fn ping(&self) -> Result<()>;
}
