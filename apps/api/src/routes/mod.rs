pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_bearer;
use crate::cv::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // CV API
        .route("/api/v1/cv/generate", post(handlers::handle_generate))
        .route("/api/v1/cv/parse", post(handlers::handle_parse))
        .route(
            "/api/v1/cv/parse-and-generate",
            post(handlers::handle_parse_and_generate),
        )
        // Format adapter
        .route(
            "/api/v1/adapter/parser-to-generator",
            post(handlers::handle_parser_to_generator),
        )
        .route(
            "/api/v1/adapter/generator-to-parser",
            post(handlers::handle_generator_to_parser),
        )
        // Direct uploads
        .route("/api/v1/uploads/token", post(handlers::handle_upload_token))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}
