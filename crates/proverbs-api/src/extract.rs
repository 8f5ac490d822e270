use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::ApiError;

/// JSON request body whose rejections (bad syntax, wrong types, unknown
/// fields, missing content type) answer like any other invalid form.
pub struct FormJson<T>(pub T);

impl<S, T> FromRequest<S> for FormJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
