//! Backend for the receiver/QB catch game: random picks and the players admin.

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod catches;
pub mod config;
pub mod error;
pub mod http;
pub mod images;
pub mod players;
pub mod random;
pub mod sheets;
pub mod telemetry;

pub use http::routes::AppState;

pub fn app(state: AppState) -> Router {
    use http::routes;

    let api = Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/random-player", get(routes::random_player))
        .route("/api/random-catch", get(routes::random_catch))
        .route("/api/random-image", get(routes::random_image))
        .route("/api/random-image-batch", get(routes::random_image_batch))
        .route(
            "/api/admin/receiver-players",
            get(routes::list_players).post(routes::add_player).delete(routes::delete_player),
        );

    Router::new()
        .merge(api)
        // everything else is a static asset under STATIC_DIR
        .fallback_service(ServeDir::new(&state.static_dir))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
