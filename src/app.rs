use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/command", post(handlers::post_command))
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/report.png", get(handlers::get_report))
        .with_state(state)
}
