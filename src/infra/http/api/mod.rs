pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/categories", get(handlers::list_categories))
        .route(
            "/api/v1/tips",
            get(handlers::list_tips).post(handlers::create_tip),
        )
        .route("/api/v1/tips/today", get(handlers::today_tip))
        .route(
            "/api/v1/tips/{id}",
            get(handlers::get_tip).delete(handlers::delete_tip),
        )
        .route("/api/v1/rotation/run", post(handlers::run_rotation))
        .route("/api/v1/history", get(handlers::list_history))
        .with_state(state)
}
