//! Note↔tag association queries.

use std::collections::BTreeSet;

use sqlx::{Executor, Postgres};

use notekeep_core::{LinkOutcome, NoteId, Result, TagId};

/// Tag ids currently associated with a note.
pub async fn tag_ids_for_note<'c, E>(executor: E, note_id: NoteId) -> Result<BTreeSet<TagId>>
where
    E: Executor<'c, Database = Postgres>,
{
    let ids = sqlx::query_scalar::<_, i64>("SELECT tag_id FROM note_tags WHERE note_id = $1")
        .bind(note_id)
        .fetch_all(executor)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Associate a tag with a note; an existing pair is `AlreadyExists`.
pub async fn link<'c, E>(executor: E, note_id: NoteId, tag_id: TagId) -> Result<LinkOutcome>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        "INSERT INTO note_tags (note_id, tag_id) VALUES ($1, $2)
         ON CONFLICT (note_id, tag_id) DO NOTHING",
    )
    .bind(note_id)
    .bind(tag_id)
    .execute(executor)
    .await?;

    Ok(if result.rows_affected() == 0 {
        LinkOutcome::AlreadyExists
    } else {
        LinkOutcome::Created
    })
}

/// Remove one association.
pub async fn unlink<'c, E>(executor: E, note_id: NoteId, tag_id: TagId) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("DELETE FROM note_tags WHERE note_id = $1 AND tag_id = $2")
        .bind(note_id)
        .bind(tag_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Remove all associations of a note.
pub async fn unlink_all<'c, E>(executor: E, note_id: NoteId) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM note_tags WHERE note_id = $1")
        .bind(note_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
