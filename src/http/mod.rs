use crate::{git::Syncer, registry::Registry};
use axum::{Extension, Router};
use std::sync::Arc;

mod error;
mod logging;
mod webhooks;

pub(crate) use error::{Error, Result};

/// Everything needed to handle a webhook
pub struct State {
    /// The secret shared with the hosting service
    pub secret: String,
    pub registry: Registry,
    pub syncer: Arc<dyn Syncer>,
}

/// Build all the routes for the service
pub fn routes(state: Arc<State>) -> Router {
    Router::new()
        .merge(webhooks::routes())
        .layer(Extension(state))
        .layer(logging::layer())
}
