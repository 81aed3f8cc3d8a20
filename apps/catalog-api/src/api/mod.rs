//! API routes module
//!
//! This module defines all HTTP API routes for the catalog API.

pub mod catalog;
pub mod health;

use axum::{Router, middleware};
use axum_helpers::gateway_identity;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(catalog::router(state))
        .merge(health::router(state.clone()))
        // Lift gateway-asserted identity headers into request extensions
        .layer(middleware::from_fn(gateway_identity))
}
