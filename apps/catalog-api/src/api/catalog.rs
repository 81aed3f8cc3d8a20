//! Catalog API routes
//!
//! This module wires up the catalog domain to HTTP routes.

use axum::Router;
use domain_catalog::{CatalogService, HttpMediaClient, MongoCatalogRepository, handlers};
use tracing::info;

use crate::state::AppState;

/// Create catalog router
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoCatalogRepository::new(state.db.clone());

    // Create the media host client
    let media = HttpMediaClient::new(state.config.media.clone());

    // Create the service
    let service = CatalogService::new(repository, media);

    // Return the domain's router
    handlers::router(service)
}

/// Initialize product indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    let repository = MongoCatalogRepository::new(db.clone());
    repository
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create product indexes: {}", e))?;
    info!("Product collection indexes created");
    Ok(())
}
