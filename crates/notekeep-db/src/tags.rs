//! Tag queries.
//!
//! Functions take any Postgres executor so the same query runs against the
//! pool for reads and inside a transaction for the get-or-create path.

use sqlx::{Executor, PgPool, Postgres, Row};
use tracing::debug;

use notekeep_core::{CreateOutcome, Error, NoteId, Result, Tag, TagId, TagSummary};

use crate::escape_like;

/// Look up a tag by its normalized name.
pub async fn find_by_name<'c, E>(executor: E, name: &str) -> Result<Option<Tag>>
where
    E: Executor<'c, Database = Postgres>,
{
    let tag = sqlx::query_as::<_, Tag>(
        "SELECT id, name, color, created_at FROM tags WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;
    Ok(tag)
}

/// Insert a tag, reporting a name collision as `AlreadyExists`.
///
/// `ON CONFLICT DO NOTHING` waits for a concurrent inserter of the same name
/// to finish, so a losing caller that re-queries sees the winner's row.
pub async fn create<'c, E>(executor: E, name: &str) -> Result<CreateOutcome<Tag>>
where
    E: Executor<'c, Database = Postgres>,
{
    let inserted = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name) VALUES ($1)
        ON CONFLICT (name) DO NOTHING
        RETURNING id, name, color, created_at
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;

    Ok(match inserted {
        Some(tag) => {
            debug!(subsystem = "db", component = "tags", tag_id = tag.id, tag_name = %tag.name, "Tag created");
            CreateOutcome::Created(tag)
        }
        None => CreateOutcome::AlreadyExists,
    })
}

/// List all tags with the number of notes carrying each.
pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<TagSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT
            t.id,
            t.name,
            t.color,
            t.created_at,
            COUNT(nt.note_id) AS note_count
        FROM tags t
        LEFT JOIN note_tags nt ON nt.tag_id = t.id
        GROUP BY t.id, t.name, t.color, t.created_at
        ORDER BY t.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let tags = rows
        .into_iter()
        .map(|row| TagSummary {
            tag: Tag {
                id: row.get("id"),
                name: row.get("name"),
                color: row.get("color"),
                created_at: row.get("created_at"),
            },
            note_count: row.get("note_count"),
        })
        .collect();

    Ok(tags)
}

/// Tags whose name contains `fragment`, case-insensitively.
pub async fn search(pool: &PgPool, fragment: &str, limit: i64) -> Result<Vec<Tag>> {
    let pattern = format!("%{}%", escape_like(fragment));
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, name, color, created_at
        FROM tags
        WHERE name ILIKE $1
        ORDER BY name
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

/// Set or clear a tag's color.
pub async fn update_color(pool: &PgPool, id: TagId, color: Option<&str>) -> Result<Tag> {
    sqlx::query_as::<_, Tag>(
        "UPDATE tags SET color = $2 WHERE id = $1 RETURNING id, name, color, created_at",
    )
    .bind(id)
    .bind(color)
    .fetch_optional(pool)
    .await?
    .ok_or(Error::TagNotFound(id))
}

/// All `(note_id, tag)` association rows for a batch of notes, in one query.
pub async fn for_notes(pool: &PgPool, note_ids: &[NoteId]) -> Result<Vec<(NoteId, Tag)>> {
    if note_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(
        r#"
        SELECT nt.note_id, t.id, t.name, t.color, t.created_at
        FROM note_tags nt
        JOIN tags t ON t.id = nt.tag_id
        WHERE nt.note_id = ANY($1)
        ORDER BY nt.note_id, t.name
        "#,
    )
    .bind(note_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.get("note_id"),
                Tag {
                    id: row.get("id"),
                    name: row.get("name"),
                    color: row.get("color"),
                    created_at: row.get("created_at"),
                },
            )
        })
        .collect())
}
