//! Tags and ingredients of the authenticated user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::resource::{Resource, ResourceService};
use crate::router::{Valid, auth, method_not_allowed};
use crate::user::Caller;

/// Owner is never read from the body.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        max = 255,
        message = "Ensure this field has no more than 255 characters."
    ))]
    pub name: String,
}

async fn list(
    service: &ResourceService,
    caller: &Caller,
) -> Result<Json<Vec<Resource>>> {
    Ok(Json(service.list(caller).await?))
}

async fn create(
    service: &ResourceService,
    caller: &Caller,
    body: Body,
) -> Result<(StatusCode, Json<Resource>)> {
    let resource = service.create(caller, &body.name).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Resource>>> {
    list(&state.tags, &caller).await
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Resource>)> {
    create(&state.tags, &caller, body).await
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Resource>>> {
    list(&state.ingredients, &caller).await
}

pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Resource>)> {
    create(&state.ingredients, &caller, body).await
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET|POST /recipe/tags`. Authorization required.
        .route(
            "/tags",
            get(list_tags).post(create_tag).fallback(method_not_allowed),
        )
        // `GET|POST /recipe/ingredients`. Authorization required.
        .route(
            "/ingredients",
            get(list_ingredients)
                .post(create_ingredient)
                .fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state, auth))
}
