use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use proverbs_types::api::{PassageResponse, ScriptureResponse};
use proverbs_types::forms::PassageForm;

use crate::extract::FormJson;
use crate::versions::require_version;
use crate::{ApiError, AppState, AppStateInner, with_db};

pub async fn list_passages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let passages = with_db(&state, |app| Ok(app.db.list_passages()?)).await?;
    let body: Vec<PassageResponse> = passages.iter().map(PassageResponse::from).collect();
    Ok(Json(body))
}

pub async fn get_passage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let passage = with_db(&state, move |app| Ok(app.db.get_passage(id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("passage {}", id)))?;
    Ok(Json(PassageResponse::from(&passage)))
}

pub async fn create_passage(
    State(state): State<AppState>,
    FormJson(form): FormJson<PassageForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let passage = with_db(&state, move |app| {
        let reference_ids = checked_references(app, &form)?;
        Ok(app.db.insert_passage(form.version_id, &reference_ids)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(PassageResponse::from(&passage))))
}

/// Replace the version and the full reference set.
pub async fn replace_passage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    FormJson(form): FormJson<PassageForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let passage = with_db(&state, move |app| {
        let reference_ids = checked_references(app, &form)?;
        Ok(app.db.replace_passage(id, form.version_id, &reference_ids)?)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("passage {}", id)))?;
    Ok(Json(PassageResponse::from(&passage)))
}

pub async fn delete_passage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_db(&state, move |app| Ok(app.db.delete_passage(id)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("passage {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// The passage text in its version: verse texts appended as stored, in
/// reference order.
pub async fn get_scripture(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let body = with_db(&state, move |app| {
        let passage = app
            .db
            .get_passage(id)?
            .ok_or_else(|| ApiError::NotFound(format!("passage {}", id)))?;
        let version = require_version(app, passage.version_id)?;

        let mut texts = Vec::with_capacity(passage.references.len());
        for (reference, text) in app.db.passage_verses(&passage)? {
            let text = text.ok_or_else(|| {
                ApiError::NotFound(format!("verse {} in {}", reference, version.short_name))
            })?;
            texts.push(text);
        }

        Ok(ScriptureResponse {
            reference: passage.reference(),
            version: version.full_name,
            scripture: texts.concat(),
        })
    })
    .await?;

    Ok(Json(body))
}

/// Version exists and every reference resolves; returns the ids with
/// duplicates dropped.
fn checked_references(app: &AppStateInner, form: &PassageForm) -> Result<Vec<i64>, ApiError> {
    require_version(app, form.version_id)?;

    let reference_ids = form.unique_reference_ids();
    let missing = app.db.missing_references(&reference_ids)?;
    if let Some(first) = missing.first() {
        return Err(ApiError::NotFound(format!("reference {}", first)));
    }
    Ok(reference_ids)
}
