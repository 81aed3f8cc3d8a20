//! Catalog Domain
//!
//! This module provides a complete domain implementation for a product
//! catalog using MongoDB: product lifecycle CRUD, image upload orchestration
//! against an external media host, and a review subsystem with aggregate
//! rating recomputation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, validation, media orchestration
//! └──────┬──────┘
//!        │
//! ┌──────▼─────────────┐
//! │ Repository │ Media │  ← Data access + media host (traits + impls)
//! └──────┬─────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, query builder
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{
//!     handlers,
//!     media_client::HttpMediaClient,
//!     mongodb::MongoCatalogRepository,
//!     service::CatalogService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a MongoDB client
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("catalog");
//!
//! // Create a repository, media client, and service
//! let repository = MongoCatalogRepository::new(db);
//! let media = HttpMediaClient::from_env()?;
//! let service = CatalogService::new(repository, media);
//!
//! // Create Axum router
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod media;
pub mod media_client;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{CatalogError, CatalogResult};
pub use handlers::ApiDoc;
pub use media::{MediaError, MediaStore, UploadedImage};
pub use media_client::{HttpMediaClient, MediaConfig};
pub use models::{
    CreateProduct, CreateReview, Product, ProductImage, ProductListing, Review, UpdateProduct,
};
pub use mongodb::MongoCatalogRepository;
pub use query::CatalogQuery;
pub use repository::CatalogRepository;
pub use service::{CatalogService, RES_PER_PAGE};
