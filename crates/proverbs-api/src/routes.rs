use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::middleware::require_auth;
use crate::{AppState, auth, passages, profile, references, verses, versions};

/// Every API route. Reads and the auth flow are public; writes and the
/// profile need a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/activate", post(auth::activate))
        .route("/auth/reissue", post(auth::reissue))
        .route("/auth/login", post(auth::login))
        .route("/versions", get(versions::list_versions))
        .route("/versions/{id}", get(versions::get_version))
        .route("/references", get(references::list_references))
        .route("/references/{id}", get(references::get_reference))
        .route("/verses", get(verses::list_verses))
        .route("/verses/{id}", get(verses::get_verse))
        .route("/passages", get(passages::list_passages))
        .route("/passages/{id}", get(passages::get_passage))
        .route("/passages/{id}/scripture", get(passages::get_scripture));

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/versions", post(versions::create_version))
        .route(
            "/versions/{id}",
            put(versions::update_version).delete(versions::delete_version),
        )
        .route("/references", post(references::create_reference))
        .route(
            "/references/{id}",
            delete(references::delete_reference),
        )
        .route("/verses", post(verses::create_verse))
        .route(
            "/verses/{id}",
            put(verses::update_verse).delete(verses::delete_verse),
        )
        .route("/passages", post(passages::create_passage))
        .route(
            "/passages/{id}",
            put(passages::replace_passage).delete(passages::delete_passage),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
