use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::models::{Product, Review};
use crate::query::CatalogQuery;

/// Repository trait for product persistence
///
/// This trait defines the data access interface for the catalog.
/// Implementations can use different storage backends (MongoDB, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist a new product
    async fn insert(&self, product: Product) -> CatalogResult<Product>;

    /// Get a product by ID
    async fn find_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>>;

    /// Every product, unpaginated
    async fn find_all(&self) -> CatalogResult<Vec<Product>>;

    /// Size of the whole collection, before any filtering
    async fn count_all(&self) -> CatalogResult<u64>;

    /// Products matching the search + filter stages, unpaginated
    async fn find_filtered(&self, query: &CatalogQuery) -> CatalogResult<Vec<Product>>;

    /// One page of products matching the search + filter stages
    async fn find_page(&self, query: &CatalogQuery, per_page: i64) -> CatalogResult<Vec<Product>>;

    /// Replace an existing product document
    async fn replace(&self, id: Uuid, product: Product) -> CatalogResult<Product>;

    /// Delete a product by ID
    async fn delete(&self, id: Uuid) -> CatalogResult<bool>;

    /// Persist the review array and its derived fields, bypassing
    /// document-level validation
    async fn set_reviews(
        &self,
        id: Uuid,
        reviews: &[Review],
        num_of_reviews: u32,
        ratings: Option<f64>,
    ) -> CatalogResult<()>;
}
