use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use notekeep_core::TagId;
use serde::Deserialize;

use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveTagBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagBody {
    /// New color, or null to clear it
    pub color: Option<String>,
}

pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.list_tags().await?))
}

/// Autocomplete: tags whose name contains `q`.
pub async fn suggest_tags(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.suggest_tags(&query.q, query.limit).await?))
}

/// Get or create a tag by name. 201 if it was created, 200 if it existed.
pub async fn resolve_tag(
    State(state): State<AppState>,
    Json(body): Json<ResolveTagBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (tag, created) = state.notes.resolve_tag(&body.name).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    Json(body): Json<UpdateTagBody>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.notes.set_tag_color(id, body.color.as_deref()).await?,
    ))
}
