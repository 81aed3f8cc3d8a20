//! MongoDB implementation of CatalogRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Bson, doc, to_bson},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Product, Review};
use crate::query::CatalogQuery;
use crate::repository::CatalogRepository;

/// MongoDB implementation of the CatalogRepository
pub struct MongoCatalogRepository {
    collection: Collection<Product>,
}

impl MongoCatalogRepository {
    /// Create a new MongoCatalogRepository
    ///
    /// # Arguments
    /// * `db` - MongoDB database instance
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let db = client.database("catalog");
    /// let repo = MongoCatalogRepository::new(db);
    /// ```
    pub fn new(db: Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoCatalogRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    fn id_filter(id: Uuid) -> mongodb::bson::Document {
        doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) }
    }

    /// Create the indexes backing the listing queries
    pub async fn create_indexes(&self) -> CatalogResult<()> {
        use mongodb::IndexModel;

        let created_at = IndexModel::builder()
            .keys(doc! { "createdAt": -1 })
            .build();
        let category = IndexModel::builder().keys(doc! { "category": 1 }).build();

        self.collection
            .create_indexes(vec![created_at, category])
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MongoCatalogRepository {
    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn insert(&self, product: Product) -> CatalogResult<Product> {
        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> CatalogResult<Option<Product>> {
        let product = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> CatalogResult<Vec<Product>> {
        let options = mongodb::options::FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count_all(&self) -> CatalogResult<u64> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    #[instrument(skip(self, query))]
    async fn find_filtered(&self, query: &CatalogQuery) -> CatalogResult<Vec<Product>> {
        let options = mongodb::options::FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self
            .collection
            .find(query.to_filter())
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, query))]
    async fn find_page(&self, query: &CatalogQuery, per_page: i64) -> CatalogResult<Vec<Product>> {
        let cursor = self
            .collection
            .find(query.to_filter())
            .with_options(query.pagination(per_page))
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, product))]
    async fn replace(&self, id: Uuid, product: Product) -> CatalogResult<Product> {
        let result = self
            .collection
            .replace_one(Self::id_filter(id), &product)
            .await?;

        if result.matched_count == 0 {
            return Err(CatalogError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;

        if result.deleted_count == 0 {
            return Err(CatalogError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted successfully");
        Ok(true)
    }

    #[instrument(skip(self, reviews))]
    async fn set_reviews(
        &self,
        id: Uuid,
        reviews: &[Review],
        num_of_reviews: u32,
        ratings: Option<f64>,
    ) -> CatalogResult<()> {
        let reviews_bson = to_bson(&reviews)
            .map_err(|e| CatalogError::Internal(format!("review serialization: {}", e)))?;

        // Partial $set skips document validation, mirroring a
        // save-without-validation persist of the derived fields.
        let update = match ratings {
            Some(mean) => doc! {
                "$set": {
                    "reviews": reviews_bson,
                    "numOfReviews": num_of_reviews,
                    "ratings": mean,
                }
            },
            None => doc! {
                "$set": {
                    "reviews": reviews_bson,
                    "numOfReviews": num_of_reviews,
                },
                "$unset": { "ratings": "" }
            },
        };

        self.collection
            .update_one(Self::id_filter(id), update)
            .await?;

        tracing::info!(product_id = %id, num_of_reviews, "Product reviews updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_filter_shape() {
        let id = Uuid::now_v7();
        let filter = MongoCatalogRepository::id_filter(id);
        assert!(filter.contains_key("_id"));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_insert_and_find_round_trip() {
        use crate::models::CreateProduct;

        let client = mongodb::Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let repo =
            MongoCatalogRepository::with_collection(client.database("catalog_test"), "products_it");

        let input: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Integration lamp",
            "price": 19.5
        }))
        .unwrap();
        let product = Product::new(input, Vec::new(), Uuid::now_v7());
        let id = product.id;

        repo.insert(product).await.unwrap();
        let found = repo.find_by_id(id).await.unwrap();
        assert!(found.is_some());

        repo.delete(id).await.unwrap();
    }
}
