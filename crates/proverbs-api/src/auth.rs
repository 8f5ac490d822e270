use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use proverbs_crypto::generate_activation_key;
use proverbs_db::{ProfileStore, get_or_create_profile};
use proverbs_types::api::{
    ActivateRequest, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    ReissueRequest, ReissueResponse,
};

use crate::extract::FormJson;
use crate::middleware::Claims;
use crate::{ApiError, AppState, with_db};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 8;
const TOKEN_DAYS: i64 = 30;

/// Create an inactive account and its profile. The activation key is
/// stored with the profile and delivered out of band.
pub async fn register(
    State(state): State<AppState>,
    FormJson(req): FormJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let name_len = req.username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&name_len) {
        return Err(ApiError::BadRequest(format!(
            "username must be {}-{} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    if req.password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            PASSWORD_MIN
        )));
    }

    let password_hash = hash_password(&req.password)?;

    let user_id = Uuid::new_v4();
    let username = req.username;

    let profile = with_db(&state, move |app| {
        if app.db.get_user_by_username(&username)?.is_some() {
            return Err(ApiError::Conflict("username is taken".into()));
        }
        // Refuse before creating the account so a misconfigured default
        // version does not leave orphaned users behind.
        if app.db.find_version_id(&app.default_version)?.is_none() {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "default version '{}' is not configured",
                app.default_version
            )));
        }

        let id = user_id.to_string();
        app.db.create_user(&id, &username, &password_hash)?;
        let profile = get_or_create_profile(&app.db, &id, &username, &app.default_version, Utc::now())?;
        Ok(profile.into_profile()?)
    })
    .await?;

    info!("Registered {} (activation pending)", profile.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            key_expires: profile.key_expires,
        }),
    ))
}

/// Confirm a registration with the key issued for it.
pub async fn activate(
    State(state): State<AppState>,
    FormJson(req): FormJson<ActivateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    with_db(&state, move |app| {
        let invalid = || ApiError::BadRequest("invalid activation key".into());

        let user = app
            .db
            .get_user_by_username(&req.username)?
            .ok_or_else(invalid)?;
        if user.is_active {
            return Ok(());
        }

        let profile = app.db.find_profile(&user.id)?.ok_or_else(invalid)?;
        let activation = profile.activation()?;

        // A wrong key must not learn whether the real one expired
        if !activation.matches(&req.activation_key) {
            return Err(invalid());
        }
        if activation.is_expired(Utc::now()) {
            return Err(ApiError::Expired);
        }

        app.db.activate_user(&user.id)?;
        info!("Activated {}", user.username);
        Ok(())
    })
    .await?;

    Ok(Json(serde_json::json!({ "activated": true })))
}

/// Replace the activation key of an account that is still inactive.
pub async fn reissue(
    State(state): State<AppState>,
    FormJson(req): FormJson<ReissueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key_expires = with_db(&state, move |app| {
        let user = app
            .db
            .get_user_by_username(&req.username)?
            .ok_or_else(|| ApiError::NotFound(format!("user {}", req.username)))?;
        if user.is_active {
            return Err(ApiError::Conflict("account is already active".into()));
        }

        // Make sure there is a profile to hold the new key
        get_or_create_profile(&app.db, &user.id, &user.username, &app.default_version, Utc::now())?;

        let activation = generate_activation_key(&user.username);
        app.db.replace_activation_key(&user.id, &activation)?;
        info!("Reissued activation key for {}", user.username);
        Ok(activation.expires)
    })
    .await?;

    Ok(Json(ReissueResponse { key_expires }))
}

pub async fn login(
    State(state): State<AppState>,
    FormJson(req): FormJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = with_db(&state, move |app| Ok(app.db.get_user_by_username(&username)?))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&req.password, &user.password)?;

    if !user.is_active {
        return Err(ApiError::Forbidden("account is not activated".into()));
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

/// Argon2id PHC string with a fresh OS-random salt.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<(), ApiError> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (Utc::now() + chrono::Duration::days(TOKEN_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hashes_are_salted_and_verifiable() {
        let a = hash_password("wisdom-is-supreme").unwrap();
        let b = hash_password("wisdom-is-supreme").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);

        assert!(verify_password("wisdom-is-supreme", &a).is_ok());
        assert!(matches!(
            verify_password("folly-is-loud", &a),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            verify_password("wisdom-is-supreme", "not-a-phc-string"),
            Err(ApiError::Internal(_))
        ));
    }
}
