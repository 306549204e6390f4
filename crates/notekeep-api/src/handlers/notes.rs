use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use notekeep_core::{CreateNoteRequest, NoteId, SortOrder, UpdateNoteRequest};
use serde::Deserialize;

use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    /// Only notes with this tag
    pub tag: Option<String>,
    /// `asc` or `desc` by creation time (default `desc`)
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Deserialize)]
pub struct SetTagsBody {
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state.notes.list(query.tag.as_deref(), query.order).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    Json(body): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.create(body).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.get(id).await?))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.update(id, body).await?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> Result<impl IntoResponse, ApiError> {
    state.notes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a note's tags, leaving title and content alone.
pub async fn set_note_tags(
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
    Json(body): Json<SetTagsBody>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.set_tags(id, &body.tags).await?))
}
