use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use proverbs_types::forms::VerseForm;

use crate::extract::FormJson;
use crate::references::require_reference;
use crate::versions::require_version;
use crate::{ApiError, AppState, with_db};

pub async fn list_verses(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let verses = with_db(&state, |app| Ok(app.db.list_verses()?)).await?;
    Ok(Json(verses))
}

pub async fn get_verse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let verse = with_db(&state, move |app| Ok(app.db.get_verse(id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("verse {}", id)))?;
    Ok(Json(verse))
}

pub async fn create_verse(
    State(state): State<AppState>,
    FormJson(form): FormJson<VerseForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let verse = with_db(&state, move |app| {
        require_reference(app, form.reference_id)?;
        require_version(app, form.version_id)?;
        Ok(app.db.insert_verse(&form)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(verse)))
}

pub async fn update_verse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    FormJson(form): FormJson<VerseForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let verse = with_db(&state, move |app| {
        require_reference(app, form.reference_id)?;
        require_version(app, form.version_id)?;
        Ok(app.db.update_verse(id, &form)?)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("verse {}", id)))?;
    Ok(Json(verse))
}

pub async fn delete_verse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_db(&state, move |app| Ok(app.db.delete_verse(id)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("verse {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
