use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;

use proverbs_db::get_or_create_profile;
use proverbs_types::forms::ProfileForm;

use crate::extract::FormJson;
use crate::middleware::Claims;
use crate::versions::require_version;
use crate::{ApiError, AppState, AppStateInner, with_db};

/// The caller's profile, created on first access.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = with_db(&state, move |app| {
        let user_id = require_account(app, &claims)?;
        let row = get_or_create_profile(
            &app.db,
            &user_id,
            &claims.username,
            &app.default_version,
            Utc::now(),
        )?;
        Ok(row.into_profile()?)
    })
    .await?;

    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    FormJson(form): FormJson<ProfileForm>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = with_db(&state, move |app| {
        let user_id = require_account(app, &claims)?;
        let current = get_or_create_profile(
            &app.db,
            &user_id,
            &claims.username,
            &app.default_version,
            Utc::now(),
        )?;

        let default_version_id = form.default_version_id.unwrap_or(current.default_version_id);
        require_version(app, default_version_id)?;
        let show_references = form.show_references.unwrap_or(current.show_references);

        let row = app
            .db
            .update_profile(&user_id, default_version_id, show_references)?
            .ok_or_else(|| ApiError::NotFound(format!("profile for {}", claims.username)))?;
        Ok(row.into_profile()?)
    })
    .await?;

    Ok(Json(profile))
}

/// Tokens outlive accounts: a user removed after login is no longer
/// authorized.
fn require_account(app: &AppStateInner, claims: &Claims) -> Result<String, ApiError> {
    let user_id = claims.sub.to_string();
    app.db
        .get_user_by_id(&user_id)?
        .ok_or(ApiError::Unauthorized)?;
    Ok(user_id)
}
