use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use proverbs_types::forms::ReferenceForm;
use proverbs_types::models::Reference;

use crate::extract::FormJson;
use crate::{ApiError, AppState, AppStateInner, with_db};

pub async fn list_references(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let references = with_db(&state, |app| Ok(app.db.list_references()?)).await?;
    Ok(Json(references))
}

pub async fn get_reference(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = with_db(&state, move |app| Ok(app.db.get_reference(id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("reference {}", id)))?;
    Ok(Json(reference))
}

pub async fn create_reference(
    State(state): State<AppState>,
    FormJson(form): FormJson<ReferenceForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let reference = with_db(&state, move |app| {
        Ok(app.db.insert_reference(form.chapter, form.verse)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(reference)))
}

pub async fn delete_reference(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_db(&state, move |app| Ok(app.db.delete_reference(id)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("reference {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn require_reference(app: &AppStateInner, id: i64) -> Result<Reference, ApiError> {
    app.db
        .get_reference(id)?
        .ok_or_else(|| ApiError::NotFound(format!("reference {}", id)))
}
