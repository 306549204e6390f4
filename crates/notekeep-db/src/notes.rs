//! Note queries.

use sqlx::{Executor, PgPool, Postgres};

use notekeep_core::{attach_tags, Error, ListNotesRequest, Note, NoteId, NoteWithTags, Result};

use crate::tags;

const NOTE_COLUMNS: &str = "n.id, n.title, n.content, n.created_at, n.updated_at";

/// Insert a note. Timestamps come from the database.
pub async fn insert<'c, E>(executor: E, title: &str, content: Option<&str>) -> Result<Note>
where
    E: Executor<'c, Database = Postgres>,
{
    let note = sqlx::query_as::<_, Note>(
        r#"
        INSERT INTO notes (title, content)
        VALUES ($1, $2)
        RETURNING id, title, content, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(content)
    .fetch_one(executor)
    .await?;
    Ok(note)
}

/// Overwrite a note's title and content. Takes the row lock until commit.
pub async fn update<'c, E>(
    executor: E,
    id: NoteId,
    title: &str,
    content: Option<&str>,
) -> Result<Note>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes
        SET title = $2, content = $3, updated_at = now()
        WHERE id = $1
        RETURNING id, title, content, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .fetch_optional(executor)
    .await?
    .ok_or(Error::NoteNotFound(id))
}

/// Lock a note row for the remainder of the transaction.
pub async fn lock<'c, E>(executor: E, id: NoteId) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>("SELECT id FROM notes WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .map(|_| ())
        .ok_or(Error::NoteNotFound(id))
}

/// Delete a note. `note_tags` rows go with it via `ON DELETE CASCADE`.
pub async fn delete<'c, E>(executor: E, id: NoteId) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NoteNotFound(id));
    }
    Ok(())
}

/// Fetch one note with its tags.
pub async fn fetch(pool: &PgPool, id: NoteId) -> Result<NoteWithTags> {
    let note = sqlx::query_as::<_, Note>(&format!(
        "SELECT {} FROM notes n WHERE n.id = $1",
        NOTE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(Error::NoteNotFound(id))?;

    let links = tags::for_notes(pool, &[id]).await?;
    attach_tags(vec![note], links)
        .pop()
        .ok_or_else(|| Error::Internal(format!("note {} lost while attaching tags", id)))
}

/// List notes with their tags, newest first unless asked otherwise.
///
/// Tags for the whole page are fetched with one batched query rather than
/// one query per note.
pub async fn list(pool: &PgPool, req: ListNotesRequest) -> Result<Vec<NoteWithTags>> {
    let order = req.order.as_sql();

    let notes = match req.tag.as_deref() {
        Some(tag_name) => {
            let sql = format!(
                r#"
                SELECT {cols}
                FROM notes n
                WHERE EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = n.id AND t.name = $1
                )
                ORDER BY n.created_at {order}, n.id {order}
                "#,
                cols = NOTE_COLUMNS,
                order = order,
            );
            sqlx::query_as::<_, Note>(&sql)
                .bind(tag_name)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {cols} FROM notes n ORDER BY n.created_at {order}, n.id {order}",
                cols = NOTE_COLUMNS,
                order = order,
            );
            sqlx::query_as::<_, Note>(&sql).fetch_all(pool).await?
        }
    };

    let ids: Vec<NoteId> = notes.iter().map(|n| n.id).collect();
    let links = tags::for_notes(pool, &ids).await?;
    Ok(attach_tags(notes, links))
}
