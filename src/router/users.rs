//! Users-related HTTP API.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, auth, create, login, method_not_allowed};
use crate::user::{Caller, Profile, ProfileUpdate};

#[derive(Debug, Default, Serialize, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    #[validate(length(
        max = 255,
        message = "Ensure this field has no more than 255 characters."
    ))]
    pub name: Option<String>,
    #[validate(length(
        min = 5,
        message = "Ensure this field has at least 5 characters."
    ))]
    pub password: Option<String>,
}

/// Get profile of the authenticated user.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Profile>> {
    Ok(Json(state.users.get_profile(&caller).await?.into()))
}

/// Update `name` and/or `password` of the authenticated user.
pub async fn patch_me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<Body>,
) -> Result<Json<Profile>> {
    let update = ProfileUpdate {
        name: body.name.clone(),
        password: body.password.clone(),
    };
    let user = state.users.update_profile(&caller, update).await?;

    Ok(Json(user.into()))
}

pub fn router(state: AppState) -> Router<AppState> {
    let me = Router::new()
        // `GET /user/me` and `PATCH /user/me`. Authorization required.
        .route(
            "/me",
            get(get_me).patch(patch_me).fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state, auth));

    Router::new()
        // `POST /user/create` goes to `create`.
        .route(
            "/create",
            post(create::handler).fallback(method_not_allowed),
        )
        // `POST /user/token` goes to `login`.
        .route("/token", post(login::handler).fallback(method_not_allowed))
        .merge(me)
}
