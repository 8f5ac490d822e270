use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use proverbs_types::forms::VersionForm;
use proverbs_types::models::Version;

use crate::extract::FormJson;
use crate::{ApiError, AppState, AppStateInner, with_db};

pub async fn list_versions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let versions = with_db(&state, |app| Ok(app.db.list_versions()?)).await?;
    Ok(Json(versions))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let version = with_db(&state, move |app| Ok(app.db.get_version(id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("version {}", id)))?;
    Ok(Json(version))
}

pub async fn create_version(
    State(state): State<AppState>,
    FormJson(form): FormJson<VersionForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let version = with_db(&state, move |app| Ok(app.db.insert_version(&form)?)).await?;
    Ok((StatusCode::CREATED, Json(version)))
}

pub async fn update_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    FormJson(form): FormJson<VersionForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let version = with_db(&state, move |app| Ok(app.db.update_version(id, &form)?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("version {}", id)))?;
    Ok(Json(version))
}

/// 409 while verses, passages or profiles still use the version.
pub async fn delete_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_db(&state, move |app| Ok(app.db.delete_version(id)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("version {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve a version id a form points at.
pub(crate) fn require_version(app: &AppStateInner, id: i64) -> Result<Version, ApiError> {
    app.db
        .get_version(id)?
        .ok_or_else(|| ApiError::NotFound(format!("version {}", id)))
}
