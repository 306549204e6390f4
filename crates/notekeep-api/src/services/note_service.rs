//! Note and tag operations behind the HTTP handlers.
//!
//! Every write runs in one unit of work: a note's fields and its tag
//! associations commit together or not at all.

use std::sync::Arc;

use notekeep_core::{
    normalize_tag_name, validate_color, CreateNoteRequest, Error, ListNotesRequest, NoteId,
    NoteStore, NoteWithTags, Result, SortOrder, Store, Tag, TagId, TagStore, TagSummary,
    UpdateNoteRequest,
};
use tracing::{debug, info};

use super::tag_reconciler::{ReconcileReport, TagReconciler};
use super::tag_resolver::TagResolver;

/// Default number of tag suggestions.
pub const DEFAULT_SUGGESTION_LIMIT: i64 = 10;

/// Upper bound on tag suggestions per request.
pub const MAX_SUGGESTION_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn Store>,
    reconciler: TagReconciler,
}

impl NoteService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_resolver(store, TagResolver::new())
    }

    pub fn with_resolver(store: Arc<dyn Store>, resolver: TagResolver) -> Self {
        Self {
            store,
            reconciler: TagReconciler::new(resolver),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    pub async fn create(&self, req: CreateNoteRequest) -> Result<NoteWithTags> {
        let title = validate_title(&req.title)?;

        let mut tx = self.store.begin().await?;
        let note = tx.insert_note(title, req.content.as_deref()).await?;
        let report = self
            .reconciler
            .reconcile(&mut *tx, note.id, req.tags.as_slice())
            .await?;
        tx.commit().await?;

        info!(
            subsystem = "notes",
            op = "create",
            note_id = note.id,
            tags = report.added.len(),
            "Note created"
        );
        self.store.fetch_note(note.id).await
    }

    pub async fn get(&self, id: NoteId) -> Result<NoteWithTags> {
        self.store.fetch_note(id).await
    }

    /// List notes, optionally only those carrying `tag`.
    ///
    /// The tag filter is normalized like any tag name; a blank filter lists
    /// every note.
    pub async fn list(&self, tag: Option<&str>, order: SortOrder) -> Result<Vec<NoteWithTags>> {
        let req = ListNotesRequest {
            tag: tag.and_then(normalize_tag_name),
            order,
        };
        let notes = self.store.list_notes(req).await?;
        debug!(
            subsystem = "notes",
            op = "list",
            result_count = notes.len(),
            "Listed notes"
        );
        Ok(notes)
    }

    /// Overwrite a note's title and content. Tags are reconciled only when
    /// `req.tags` is present.
    pub async fn update(&self, id: NoteId, req: UpdateNoteRequest) -> Result<NoteWithTags> {
        let title = validate_title(&req.title)?;

        let mut tx = self.store.begin().await?;
        // The row update also takes the row lock, serializing concurrent
        // reconciliations of the same note.
        tx.update_note(id, title, req.content.as_deref()).await?;
        let report = match &req.tags {
            Some(tags) => Some(
                self.reconciler
                    .reconcile(&mut *tx, id, tags.as_slice())
                    .await?,
            ),
            None => None,
        };
        tx.commit().await?;

        log_write("update", id, report.as_ref());
        self.store.fetch_note(id).await
    }

    /// Replace a note's tags without touching its fields.
    pub async fn set_tags(&self, id: NoteId, tags: &[String]) -> Result<NoteWithTags> {
        let mut tx = self.store.begin().await?;
        tx.lock_note(id).await?;
        let report = self.reconciler.reconcile(&mut *tx, id, tags).await?;
        tx.commit().await?;

        log_write("set_tags", id, Some(&report));
        self.store.fetch_note(id).await
    }

    /// Delete a note. Its associations go with it; its tags stay.
    pub async fn delete(&self, id: NoteId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        tx.delete_note(id).await?;
        tx.commit().await?;
        info!(subsystem = "notes", op = "delete", note_id = id, "Note deleted");
        Ok(())
    }

    // =========================================================================
    // TAGS
    // =========================================================================

    pub async fn list_tags(&self) -> Result<Vec<TagSummary>> {
        self.store.list_tags().await
    }

    /// Tags whose name contains `query`, for autocomplete.
    ///
    /// A blank query yields no suggestions. `limit` defaults to
    /// [`DEFAULT_SUGGESTION_LIMIT`] and is clamped to `1..=MAX_SUGGESTION_LIMIT`.
    pub async fn suggest_tags(&self, query: &str, limit: Option<i64>) -> Result<Vec<Tag>> {
        let Some(fragment) = normalize_tag_name(query) else {
            return Ok(Vec::new());
        };
        let limit = limit
            .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
            .clamp(1, MAX_SUGGESTION_LIMIT);
        self.store.search_tags(&fragment, limit).await
    }

    /// Get or create the tag for `name`. The flag is true if it was created.
    pub async fn resolve_tag(&self, name: &str) -> Result<(Tag, bool)> {
        let mut tx = self.store.begin().await?;
        let resolved = self.reconciler.resolver().resolve(&mut *tx, name).await?;
        let tag = tx.find_tag_by_name(&resolved.name).await?.ok_or_else(|| {
            Error::Internal(format!("resolved tag '{}' is missing", resolved.name))
        })?;
        tx.commit().await?;
        Ok((tag, resolved.created))
    }

    /// Set or clear a tag's display color. Blank clears it.
    pub async fn set_tag_color(&self, id: TagId, color: Option<&str>) -> Result<Tag> {
        let color = color.map(str::trim).filter(|c| !c.is_empty());
        if let Some(c) = color {
            validate_color(c)?;
        }
        let tag = self.store.update_tag_color(id, color).await?;
        debug!(subsystem = "tags", op = "set_color", tag_id = id, "Tag color updated");
        Ok(tag)
    }

    /// Round-trip to the store.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Title cannot be empty".to_string()));
    }
    Ok(title)
}

fn log_write(op: &'static str, note_id: NoteId, report: Option<&ReconcileReport>) {
    match report {
        Some(r) => info!(
            subsystem = "notes",
            op,
            note_id,
            added = r.added.len(),
            removed = r.removed.len(),
            retained = r.retained.len(),
            "Note updated"
        ),
        None => info!(subsystem = "notes", op, note_id, "Note updated"),
    }
}
