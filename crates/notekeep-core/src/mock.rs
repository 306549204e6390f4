//! In-memory [`Store`] for deterministic testing.
//!
//! Writes are applied to shared state immediately and undone if the unit of
//! work is dropped without committing. There is no isolation between
//! concurrent units of work, which is enough for exercising the reconciliation
//! logic but not a substitute for the PostgreSQL store.
//!
//! ## Usage
//!
//! ```ignore
//! use notekeep_core::mock::MemoryStore;
//! use notekeep_core::{Store, TagStore, CreateOutcome};
//!
//! # tokio_test_block(async {
//! let store = MemoryStore::new();
//! let mut tx = store.begin().await.unwrap();
//! assert!(matches!(tx.create_tag("work").await.unwrap(), CreateOutcome::Created(_)));
//! tx.commit().await.unwrap();
//! assert_eq!(store.tags_named("work"), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::assemble::attach_tags;
use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::*;

/// A recorded store mutation, for asserting what a unit of work did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryOp {
    CreateTag(String),
    Link(NoteId, TagId),
    Unlink(NoteId, TagId),
    UnlinkAll(NoteId),
}

#[derive(Debug, Default, Clone)]
struct State {
    next_note_id: NoteId,
    next_tag_id: TagId,
    notes: BTreeMap<NoteId, Note>,
    tags: BTreeMap<TagId, Tag>,
    links: BTreeSet<(NoteId, TagId)>,
}

impl State {
    fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.values().find(|t| t.name == name)
    }

    fn insert_tag(&mut self, name: &str) -> Tag {
        self.next_tag_id += 1;
        let tag = Tag {
            id: self.next_tag_id,
            name: name.to_string(),
            color: None,
            created_at: Utc::now(),
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    fn note_with_tags(&self, note: &Note) -> NoteWithTags {
        let links = self
            .links
            .iter()
            .filter(|(n, _)| *n == note.id)
            .filter_map(|(n, t)| self.tags.get(t).map(|tag| (*n, tag.clone())))
            .collect();
        attach_tags(vec![note.clone()], links)
            .pop()
            .unwrap_or_else(|| NoteWithTags {
                note: note.clone(),
                tags: Vec::new(),
            })
    }
}

/// Inverse of a write, replayed on rollback.
#[derive(Debug)]
enum Undo {
    RemoveTag(TagId),
    RemoveNote(NoteId),
    RestoreNote(Note),
    RemoveLink(NoteId, TagId),
    RestoreLinks(Vec<(NoteId, TagId)>),
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    unavailable: AtomicBool,
    racing_names: Mutex<HashSet<String>>,
    failing_names: Mutex<HashSet<String>>,
    ops: Mutex<Vec<MemoryOp>>,
}

/// In-memory store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not wedge the other tests' assertions.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Simulate a concurrent writer: the next `create_tag(name)` finds that
    /// another caller inserted `name` first and reports `AlreadyExists`.
    pub fn race_tag_creation(&self, name: &str) {
        lock(&self.inner.racing_names).insert(name.to_string());
    }

    /// Make `create_tag(name)` fail with `StoreUnavailable`.
    pub fn fail_tag_creation(&self, name: &str) {
        lock(&self.inner.failing_names).insert(name.to_string());
    }

    /// Mutations recorded so far, in order.
    pub fn ops(&self) -> Vec<MemoryOp> {
        lock(&self.inner.ops).clone()
    }

    pub fn clear_ops(&self) {
        lock(&self.inner.ops).clear();
    }

    /// Number of tags stored under exactly this name.
    pub fn tags_named(&self, name: &str) -> usize {
        lock(&self.inner.state)
            .tags
            .values()
            .filter(|t| t.name == name)
            .count()
    }

    pub fn tag_count(&self) -> usize {
        lock(&self.inner.state).tags.len()
    }

    pub fn note_count(&self) -> usize {
        lock(&self.inner.state).notes.len()
    }

    /// Id of the tag with this name, if any.
    pub fn tag_id(&self, name: &str) -> Option<TagId> {
        lock(&self.inner.state).tag_by_name(name).map(|t| t.id)
    }

    /// Association rows for a note, read directly from state.
    pub fn links_for(&self, note_id: NoteId) -> BTreeSet<TagId> {
        lock(&self.inner.state)
            .links
            .iter()
            .filter(|(n, _)| *n == note_id)
            .map(|(_, t)| *t)
            .collect()
    }

    /// Normalized tag names associated with a note.
    pub fn tag_names_for(&self, note_id: NoteId) -> BTreeSet<String> {
        let state = lock(&self.inner.state);
        state
            .links
            .iter()
            .filter(|(n, _)| *n == note_id)
            .filter_map(|(_, t)| state.tags.get(t).map(|tag| tag.name.clone()))
            .collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(Error::StoreUnavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn record(&self, op: MemoryOp) {
        lock(&self.inner.ops).push(op);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        self.check_available()?;
        Ok(Box::new(MemoryTx {
            store: self.clone(),
            undo: Vec::new(),
            committed: false,
        }))
    }

    async fn fetch_note(&self, id: NoteId) -> Result<NoteWithTags> {
        self.check_available()?;
        let state = lock(&self.inner.state);
        let note = state.notes.get(&id).ok_or(Error::NoteNotFound(id))?;
        Ok(state.note_with_tags(note))
    }

    async fn list_notes(&self, req: ListNotesRequest) -> Result<Vec<NoteWithTags>> {
        self.check_available()?;
        let state = lock(&self.inner.state);
        let tag_filter = match req.tag.as_deref() {
            Some(name) => match state.tag_by_name(name) {
                Some(tag) => Some(tag.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut notes: Vec<&Note> = state
            .notes
            .values()
            .filter(|n| tag_filter.map_or(true, |t| state.links.contains(&(n.id, t))))
            .collect();
        notes.sort_by_key(|n| (n.created_at, n.id));
        if req.order == SortOrder::Desc {
            notes.reverse();
        }

        Ok(notes.into_iter().map(|n| state.note_with_tags(n)).collect())
    }

    async fn list_tags(&self) -> Result<Vec<TagSummary>> {
        self.check_available()?;
        let state = lock(&self.inner.state);
        let mut summaries: Vec<TagSummary> = state
            .tags
            .values()
            .map(|tag| TagSummary {
                tag: tag.clone(),
                note_count: state.links.iter().filter(|(_, t)| *t == tag.id).count() as i64,
            })
            .collect();
        summaries.sort_by(|a, b| a.tag.name.cmp(&b.tag.name));
        Ok(summaries)
    }

    async fn search_tags(&self, fragment: &str, limit: i64) -> Result<Vec<Tag>> {
        self.check_available()?;
        let needle = fragment.to_lowercase();
        let state = lock(&self.inner.state);
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|t| t.name.contains(&needle))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags.truncate(limit.max(0) as usize);
        Ok(tags)
    }

    async fn update_tag_color(&self, id: TagId, color: Option<&str>) -> Result<Tag> {
        self.check_available()?;
        let mut state = lock(&self.inner.state);
        let tag = state.tags.get_mut(&id).ok_or(Error::TagNotFound(id))?;
        tag.color = color.map(str::to_string);
        Ok(tag.clone())
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

/// Unit of work over a [`MemoryStore`].
pub struct MemoryTx {
    store: MemoryStore,
    undo: Vec<Undo>,
    committed: bool,
}

impl MemoryTx {
    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.store.inner.state)
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = lock(&self.store.inner.state);
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::RemoveTag(id) => {
                    state.tags.remove(&id);
                }
                Undo::RemoveNote(id) => {
                    state.notes.remove(&id);
                }
                Undo::RestoreNote(note) => {
                    state.notes.insert(note.id, note);
                }
                Undo::RemoveLink(n, t) => {
                    state.links.remove(&(n, t));
                }
                Undo::RestoreLinks(links) => {
                    state.links.extend(links);
                }
            }
        }
    }
}

#[async_trait]
impl TagStore for MemoryTx {
    async fn find_tag_by_name(&mut self, name: &str) -> Result<Option<Tag>> {
        self.store.check_available()?;
        Ok(self.state().tag_by_name(name).cloned())
    }

    async fn create_tag(&mut self, name: &str) -> Result<CreateOutcome<Tag>> {
        self.store.check_available()?;
        if lock(&self.store.inner.failing_names).contains(name) {
            return Err(Error::StoreUnavailable(format!(
                "memory store dropped insert of tag '{}'",
                name
            )));
        }

        // The simulated racing writer commits on its own, outside this unit of work.
        if lock(&self.store.inner.racing_names).remove(name) {
            let mut state = self.state();
            if state.tag_by_name(name).is_none() {
                state.insert_tag(name);
            }
        }

        let created = {
            let mut state = self.state();
            if state.tag_by_name(name).is_some() {
                None
            } else {
                Some(state.insert_tag(name))
            }
        };

        match created {
            Some(tag) => {
                self.undo.push(Undo::RemoveTag(tag.id));
                self.store.record(MemoryOp::CreateTag(name.to_string()));
                Ok(CreateOutcome::Created(tag))
            }
            None => Ok(CreateOutcome::AlreadyExists),
        }
    }
}

#[async_trait]
impl AssociationStore for MemoryTx {
    async fn tag_ids_for_note(&mut self, note_id: NoteId) -> Result<BTreeSet<TagId>> {
        self.store.check_available()?;
        Ok(self.store.links_for(note_id))
    }

    async fn link(&mut self, note_id: NoteId, tag_id: TagId) -> Result<LinkOutcome> {
        self.store.check_available()?;
        let inserted = {
            let mut state = self.state();
            if !state.notes.contains_key(&note_id) {
                return Err(Error::NoteNotFound(note_id));
            }
            if !state.tags.contains_key(&tag_id) {
                return Err(Error::TagNotFound(tag_id));
            }
            state.links.insert((note_id, tag_id))
        };
        self.store.record(MemoryOp::Link(note_id, tag_id));
        if inserted {
            self.undo.push(Undo::RemoveLink(note_id, tag_id));
            Ok(LinkOutcome::Created)
        } else {
            Ok(LinkOutcome::AlreadyExists)
        }
    }

    async fn unlink(&mut self, note_id: NoteId, tag_id: TagId) -> Result<()> {
        self.store.check_available()?;
        let removed = self.state().links.remove(&(note_id, tag_id));
        self.store.record(MemoryOp::Unlink(note_id, tag_id));
        if removed {
            self.undo.push(Undo::RestoreLinks(vec![(note_id, tag_id)]));
        }
        Ok(())
    }

    async fn unlink_all(&mut self, note_id: NoteId) -> Result<u64> {
        self.store.check_available()?;
        let removed: Vec<(NoteId, TagId)> = {
            let mut state = self.state();
            let removed: Vec<_> = state
                .links
                .iter()
                .filter(|(n, _)| *n == note_id)
                .copied()
                .collect();
            for link in &removed {
                state.links.remove(link);
            }
            removed
        };
        self.store.record(MemoryOp::UnlinkAll(note_id));
        let count = removed.len() as u64;
        self.undo.push(Undo::RestoreLinks(removed));
        Ok(count)
    }
}

#[async_trait]
impl NoteStore for MemoryTx {
    async fn insert_note(&mut self, title: &str, content: Option<&str>) -> Result<Note> {
        self.store.check_available()?;
        let note = {
            let mut state = self.state();
            state.next_note_id += 1;
            // Strictly increasing timestamps keep ordering deterministic in tests.
            let created_at = Utc::now() + Duration::microseconds(state.next_note_id);
            let note = Note {
                id: state.next_note_id,
                title: title.to_string(),
                content: content.map(str::to_string),
                created_at,
                updated_at: created_at,
            };
            state.notes.insert(note.id, note.clone());
            note
        };
        self.undo.push(Undo::RemoveNote(note.id));
        Ok(note)
    }

    async fn update_note(
        &mut self,
        id: NoteId,
        title: &str,
        content: Option<&str>,
    ) -> Result<Note> {
        self.store.check_available()?;
        let (previous, updated) = {
            let mut state = self.state();
            let note = state.notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
            let previous = note.clone();
            note.title = title.to_string();
            note.content = content.map(str::to_string);
            note.updated_at = Utc::now();
            (previous, note.clone())
        };
        self.undo.push(Undo::RestoreNote(previous));
        Ok(updated)
    }

    async fn lock_note(&mut self, id: NoteId) -> Result<()> {
        self.store.check_available()?;
        if self.state().notes.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::NoteNotFound(id))
        }
    }

    async fn delete_note(&mut self, id: NoteId) -> Result<()> {
        self.store.check_available()?;
        let (note, links) = {
            let mut state = self.state();
            let note = state.notes.remove(&id).ok_or(Error::NoteNotFound(id))?;
            let links: Vec<_> = state
                .links
                .iter()
                .filter(|(n, _)| *n == id)
                .copied()
                .collect();
            for link in &links {
                state.links.remove(link);
            }
            (note, links)
        };
        self.undo.push(Undo::RestoreNote(note));
        self.undo.push(Undo::RestoreLinks(links));
        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.store.check_available()?;
        self.committed = true;
        self.undo.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dropped_tx_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            let note = tx.insert_note("draft", None).await.unwrap();
            let tag = match tx.create_tag("temp").await.unwrap() {
                CreateOutcome::Created(tag) => tag,
                CreateOutcome::AlreadyExists => panic!("tag should be new"),
            };
            tx.link(note.id, tag.id).await.unwrap();
        }
        assert_eq!(store.note_count(), 0);
        assert_eq!(store.tag_count(), 0);
    }

    #[tokio::test]
    async fn test_committed_tx_persists() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let note = tx.insert_note("kept", Some("body")).await.unwrap();
        tx.commit().await.unwrap();

        let fetched = store.fetch_note(note.id).await.unwrap();
        assert_eq!(fetched.note.title, "kept");
        assert_eq!(fetched.note.content.as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn test_duplicate_link_is_already_exists() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let note = tx.insert_note("n", None).await.unwrap();
        let CreateOutcome::Created(tag) = tx.create_tag("t").await.unwrap() else {
            panic!("tag should be new");
        };
        assert_eq!(tx.link(note.id, tag.id).await.unwrap(), LinkOutcome::Created);
        assert_eq!(
            tx.link(note.id, tag.id).await.unwrap(),
            LinkOutcome::AlreadyExists
        );
        tx.commit().await.unwrap();
        assert_eq!(store.links_for(note.id).len(), 1);
    }

    #[tokio::test]
    async fn test_unlink_all_is_undone_on_rollback() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let note = tx.insert_note("n", None).await.unwrap();
        for name in ["a", "b"] {
            let CreateOutcome::Created(tag) = tx.create_tag(name).await.unwrap() else {
                panic!("tag should be new");
            };
            tx.link(note.id, tag.id).await.unwrap();
        }
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.unlink_all(note.id).await.unwrap(), 2);
        assert!(tx.tag_ids_for_note(note.id).await.unwrap().is_empty());
        drop(tx);

        assert_eq!(store.links_for(note.id).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_note_removes_links() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let note = tx.insert_note("n", None).await.unwrap();
        let CreateOutcome::Created(tag) = tx.create_tag("t").await.unwrap() else {
            panic!("tag should be new");
        };
        tx.link(note.id, tag.id).await.unwrap();
        tx.delete_note(note.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.links_for(note.id).is_empty());
        // Tags outlive their notes
        assert_eq!(store.tags_named("t"), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.ping().await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.begin().await.err(),
            Some(Error::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_race_tag_creation_reports_already_exists() {
        let store = MemoryStore::new();
        store.race_tag_creation("new");
        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.create_tag("new").await.unwrap(),
            CreateOutcome::AlreadyExists
        );
        drop(tx);
        // The racing writer's row is not part of the rolled-back unit of work
        assert_eq!(store.tags_named("new"), 1);
    }

    #[tokio::test]
    async fn test_search_tags_is_case_insensitive_substring() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for name in ["work", "homework", "home"] {
            tx.create_tag(name).await.unwrap();
        }
        tx.commit().await.unwrap();

        let found = store.search_tags("WORK", 10).await.unwrap();
        let names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["homework", "work"]);

        let limited = store.search_tags("o", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
