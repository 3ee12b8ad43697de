use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{handlers, request_context::request_context_middleware, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/:slug", get(handlers::get_category))
        .route(
            "/api/categories/:slug/articles/:article_slug",
            get(handlers::get_category_article),
        )
        .route("/api/articles/:id", get(handlers::get_article))
        .route("/api/authors/:author", get(handlers::list_author_articles))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_context_middleware))
                .layer(cors),
        )
}
