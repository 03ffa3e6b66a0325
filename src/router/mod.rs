//! HTTP API.
pub mod create;
pub mod login;
pub mod recipe;
pub mod status;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::response::Response;
use axum::{Json, middleware};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;
use crate::user::Caller;
use crate::AppState;

const BEARER: &str = "Bearer ";
const TOKEN: &str = "Token ";

/// JSON body which passed [`Validate`] checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Extract the token from an `Authorization` header value.
fn credentials(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER)
        .or_else(|| header.strip_prefix(TOKEN))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Custom middleware for authentification.
///
/// Inserts the [`Caller`] behind the bearer token into request extensions.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response, ServerError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(credentials)
        .map(str::to_owned)
        .ok_or(ServerError::Unauthorized)?;

    let caller: Caller = state.users.resolve(&token).await?;
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

/// Fallback for methods a route does not serve.
pub async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
