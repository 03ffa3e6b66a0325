//! recipe-api manages user accounts and the tags and ingredients each of
//! them owns.

#![forbid(unsafe_code)]

pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
#[cfg(test)]
mod memory;
pub mod readiness;
pub mod resource;
mod router;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

pub use error::ServerError;

use crate::config::Configuration;
use crate::crypto::{CryptoError, PasswordManager};
use crate::database::Database;
use crate::resource::{
    PgResourceStore, ResourceKind, ResourceService, ResourceStore,
};
use crate::user::{PgUserStore, UserService, UserStore};

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub users: UserService,
    pub tags: ResourceService,
    pub ingredients: ResourceService,
}

impl AppState {
    /// Wire services on top of the given stores.
    pub fn new(
        config: Arc<Configuration>,
        users: Arc<dyn UserStore>,
        resources: Arc<dyn ResourceStore>,
    ) -> Result<Self, CryptoError> {
        let pwd = Arc::new(PasswordManager::new(Some(config.argon2.clone()))?);

        Ok(Self {
            users: UserService::new(users, pwd),
            tags: ResourceService::new(ResourceKind::Tag, Arc::clone(&resources)),
            ingredients: ResourceService::new(ResourceKind::Ingredient, resources),
            config,
        })
    }

    /// State backed by PostgreSQL.
    pub fn postgres(
        config: Arc<Configuration>,
        db: &Database,
    ) -> Result<Self, CryptoError> {
        Self::new(
            config,
            Arc::new(PgUserStore::new(db.postgres.clone())),
            Arc::new(PgResourceStore::new(db.postgres.clone())),
        )
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Mark sensitive headers before the trace span records them.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/user", router::users::router(state.clone()))
        .nest("/recipe", router::recipe::router(state.clone()))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::extract::Request;
    use axum::http::{Method, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::memory::{MemoryResourceStore, MemoryUserStore};

    /// Cheap Argon2 parameters.
    fn argon2() -> config::Argon2 {
        config::Argon2 {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }
    }

    pub fn passwords() -> PasswordManager {
        PasswordManager::new(Some(argon2())).unwrap()
    }

    /// State on top of empty in-memory stores.
    pub fn state() -> AppState {
        let mut config = Configuration::default();
        config.argon2 = argon2();

        AppState::new(
            Arc::new(config),
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemoryResourceStore::default()),
        )
        .unwrap()
    }

    /// Register a user named `Waqas` and return a fresh token.
    pub async fn login(state: &AppState, email: &str) -> String {
        state.users.signup(email, "Password1", "Waqas").await.unwrap();
        state.users.authenticate(email, "Password1").await.unwrap()
    }

    /// MUST NEVER be used in production.
    pub async fn make_request(
        app: Router,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: String,
    ) -> axum::http::Response<axum::body::Body> {
        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response =
            make_request(app(state()), Method::GET, "/recipe/unknown", None, String::default())
                .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Log sink shared with the test body.
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_token_is_not_logged() {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let state = state();
        let token = login(&state, "whafeez21@gmail.com").await;

        let response = make_request(
            app(state),
            Method::POST,
            "/recipe/tags",
            Some(&token),
            serde_json::json!({ "name": "Vegan" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("resource created"));
        assert!(logs.contains("authorization"));
        assert!(!logs.contains(&token));
    }
}
