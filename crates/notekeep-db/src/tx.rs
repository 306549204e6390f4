//! Transactional unit of work.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use notekeep_core::{
    AssociationStore, CreateOutcome, LinkOutcome, Note, NoteId, NoteStore, Result, StoreTx, Tag,
    TagId, TagStore,
};

use crate::{note_tags, notes, tags};

/// A PostgreSQL transaction implementing the store's write traits.
///
/// Runs at the default READ COMMITTED level: each statement sees rows
/// committed before it started, which is what the tag resolver's re-fetch
/// after a lost creation race relies on. Dropping without commit rolls back.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

impl PgStoreTx {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }
}

#[async_trait]
impl TagStore for PgStoreTx {
    async fn find_tag_by_name(&mut self, name: &str) -> Result<Option<Tag>> {
        tags::find_by_name(&mut *self.tx, name).await
    }

    async fn create_tag(&mut self, name: &str) -> Result<CreateOutcome<Tag>> {
        tags::create(&mut *self.tx, name).await
    }
}

#[async_trait]
impl AssociationStore for PgStoreTx {
    async fn tag_ids_for_note(&mut self, note_id: NoteId) -> Result<BTreeSet<TagId>> {
        note_tags::tag_ids_for_note(&mut *self.tx, note_id).await
    }

    async fn link(&mut self, note_id: NoteId, tag_id: TagId) -> Result<LinkOutcome> {
        note_tags::link(&mut *self.tx, note_id, tag_id).await
    }

    async fn unlink(&mut self, note_id: NoteId, tag_id: TagId) -> Result<()> {
        note_tags::unlink(&mut *self.tx, note_id, tag_id).await
    }

    async fn unlink_all(&mut self, note_id: NoteId) -> Result<u64> {
        note_tags::unlink_all(&mut *self.tx, note_id).await
    }
}

#[async_trait]
impl NoteStore for PgStoreTx {
    async fn insert_note(&mut self, title: &str, content: Option<&str>) -> Result<Note> {
        notes::insert(&mut *self.tx, title, content).await
    }

    async fn update_note(
        &mut self,
        id: NoteId,
        title: &str,
        content: Option<&str>,
    ) -> Result<Note> {
        notes::update(&mut *self.tx, id, title, content).await
    }

    async fn lock_note(&mut self, id: NoteId) -> Result<()> {
        notes::lock(&mut *self.tx, id).await
    }

    async fn delete_note(&mut self, id: NoteId) -> Result<()> {
        notes::delete(&mut *self.tx, id).await
    }
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
