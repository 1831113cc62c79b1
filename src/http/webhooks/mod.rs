use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

mod handlers;
mod models;
mod payload;
mod validators;

/// Build the routes for the webhook receivers
pub fn routes() -> Router {
    Router::new()
        .route("/webhook", post(handlers::github))
        .route("/health", get(health))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
