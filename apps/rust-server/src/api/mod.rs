// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::auth_middleware,
    models::{
        CreateTodoRequest, PatchTodoRequest, SuggestionsResponse, Todo, TodoType,
        UpdateTodoRequest, UserResponse,
    },
    state::AppState,
};

pub mod health;
pub mod suggestions;
pub mod todo_types;
pub mod todos;
pub mod users;

pub fn router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/todos/{id}",
            get(todos::get_todo)
                .put(todos::update_todo)
                .patch(todos::patch_todo)
                .delete(todos::delete_todo),
        )
        .route("/todo-types", get(todo_types::list_todo_types))
        .route("/todo-types/{id}", get(todo_types::get_todo_type))
        .route("/youtube/search", get(suggestions::search_suggestions))
        .route("/users/me", get(users::get_current_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(cors_allowed_origins)),
        )
}

/// Permissive CORS unless origins are configured. Configured origins may
/// send credentials (the `access_token` cookie).
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        todos::list_todos,
        todos::create_todo,
        todos::get_todo,
        todos::update_todo,
        todos::patch_todo,
        todos::delete_todo,
        todo_types::list_todo_types,
        todo_types::get_todo_type,
        suggestions::search_suggestions,
        users::get_current_user,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Todo,
            TodoType,
            CreateTodoRequest,
            UpdateTodoRequest,
            PatchTodoRequest,
            SuggestionsResponse,
            UserResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Todos", description = "Personal task items"),
        (name = "Todo Types", description = "Shared task categories"),
        (name = "Suggestions", description = "Search-suggestion proxy"),
        (name = "Users", description = "Current user"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
